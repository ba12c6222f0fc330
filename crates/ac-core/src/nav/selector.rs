//! Hyphen-delimited node selector parsing
//!
//! Selectors name a node within one layer: `series-<seriesKey>`,
//! `datapoint-<seriesKey>-<index>` and
//! `sequence-<seriesKey>-<start>-<end>`. Series keys may themselves
//! contain hyphens, so numeric fields are split off from the right.

use super::{NavNodeType, NodeQuery};
use crate::NavError;

/// Parse a selector into the node type and exact-match query it names
pub(crate) fn parse(selector: &str) -> Result<(NavNodeType, NodeQuery), NavError> {
    let (prefix, rest) = match selector.split_once('-') {
        Some(split) => split,
        None => (selector, ""),
    };
    match prefix {
        "series" => {
            if rest.is_empty() {
                return Err(NavError::MalformedSelector(selector.to_string()));
            }
            Ok((NavNodeType::Series, NodeQuery::series(rest)))
        }
        "datapoint" => {
            let (series_key, index) = rsplit_number(rest)
                .ok_or_else(|| NavError::MalformedSelector(selector.to_string()))?;
            Ok((
                NavNodeType::Datapoint,
                NodeQuery::series_index(series_key, index),
            ))
        }
        "sequence" => {
            let (head, end) = rsplit_number(rest)
                .ok_or_else(|| NavError::MalformedSelector(selector.to_string()))?;
            let (series_key, start) = rsplit_number(head)
                .ok_or_else(|| NavError::MalformedSelector(selector.to_string()))?;
            Ok((
                NavNodeType::Sequence,
                NodeQuery::range(series_key, start, end),
            ))
        }
        _ => Err(NavError::UnsupportedSelector(selector.to_string())),
    }
}

/// Split a trailing `-<number>` segment off a selector body
fn rsplit_number(text: &str) -> Option<(&str, usize)> {
    let (head, tail) = text.rsplit_once('-')?;
    if head.is_empty() {
        return None;
    }
    let number = tail.parse().ok()?;
    Some((head, number))
}
