//! Sequence nodes: trend segments spliced over a series' datapoint run

use ahash::AHashMap;
use tracing::debug;

use super::{attach_group_chain, detach_datapoint_run, link_adjacent_rows};
use crate::model::{SequenceRange, SeriesAnalysis};
use crate::nav::{Direction, NavMap, NavNodeType, NodeKey, NodeOptions, NodeQuery};
use crate::NavError;

/// Splice trend-analysis sequences into a layer's graph
///
/// Requires an analysis entry for every series key; sequence nodes are
/// only built once the whole analysis is in. Per series, the sequence
/// chain takes the datapoint run's place on the horizontal axis: the
/// series node's `right` is redirected to the first sequence and the
/// run's boundary edges are severed. Group membership stays discoverable
/// top-down only: member datapoints get a non-reciprocal `out` link to
/// their owning sequence, and a sequence links `in` to its first
/// datapoint only when that datapoint is not already claimed as the
/// previous sequence's boundary.
pub fn splice_sequences(
    map: &NavMap,
    layer: &str,
    analysis: &AHashMap<String, SeriesAnalysis>,
) -> Result<(), NavError> {
    let model = map.model();
    for series in model.series() {
        if !analysis.contains_key(&series.key) {
            return Err(NavError::MissingAnalysis(series.key.clone()));
        }
    }

    let mut rows: Vec<Vec<(NodeKey, SequenceRange)>> = Vec::new();
    for series in model.series() {
        let ranges = &analysis[&series.key].sequences;
        if ranges.is_empty() {
            rows.push(Vec::new());
            continue;
        }
        let series_node = map
            .get_in(layer, NavNodeType::Series, &NodeQuery::series(&series.key))
            .ok_or(NavError::NodeNotFound(NavNodeType::Series))?;
        let after = detach_datapoint_run(map, &series_node, series.len());

        let mut chain: Vec<NodeKey> = Vec::with_capacity(ranges.len());
        let mut row: Vec<(NodeKey, SequenceRange)> = Vec::with_capacity(ranges.len());
        for range in ranges {
            let sequence = map.add_node(
                layer,
                NodeOptions::Sequence {
                    series_key: series.key.clone(),
                    start: range.start,
                    end: range.end,
                },
            )?;
            if let Some(previous) = chain.last() {
                map.connect_nodes(&sequence, Direction::Left, previous, true);
            }
            for index in range.start..range.end.min(series.len()) {
                let Some(dp) = map.get_in(
                    layer,
                    NavNodeType::Datapoint,
                    &NodeQuery::series_index(&series.key, index),
                ) else {
                    continue;
                };
                if index == range.start {
                    // A shared boundary datapoint already belongs to the
                    // previous sequence; it keeps that out link
                    if map.link(&dp, Direction::Out).is_none() {
                        map.connect_nodes(&sequence, Direction::In, &dp, true);
                    }
                } else {
                    map.connect_nodes(&dp, Direction::Out, &sequence, false);
                }
            }
            chain.push(sequence.clone());
            row.push((sequence, *range));
        }
        attach_group_chain(map, &series_node, &chain, after);
        rows.push(row);
    }

    for i in 0..rows.len().saturating_sub(1) {
        link_adjacent_rows(map, &rows[i], &rows[i + 1]);
    }
    debug!(layer, series = rows.len(), "spliced sequence nodes");
    Ok(())
}
