//! Graph-construction algorithms
//!
//! Every chart family builds its navigation graph from the same
//! skeleton: a primary horizontal chain of series and datapoint nodes,
//! optional vertical inter-series links, and optional group nodes
//! (chords, sequences, clusters) spliced in on top. Construction is
//! not idempotent; rebuilding a chart means building a fresh map.

mod chord;
mod cluster;
mod primary;
mod sequence;

pub use chord::build_chords;
pub use cluster::splice_clusters;
pub use primary::{build_primary_chain, link_series_vertically, DatapointKind};
pub use sequence::splice_sequences;

use crate::model::SequenceRange;
use crate::nav::{Direction, NavMap, NavTarget, NodeKey};

/// Sever a series' datapoint run from its horizontal surroundings
///
/// Removes the first datapoint's `left` edge to the series node and the
/// last datapoint's `right` edge, returning what that edge pointed at so
/// a group chain can take the run's place. The severed edges are cut one
/// way only; the series node's stale `right` is overwritten by the
/// splice that follows.
pub(crate) fn detach_datapoint_run(
    map: &NavMap,
    series_node: &NodeKey,
    len: usize,
) -> Option<NavTarget> {
    let first = map.peek_node(series_node, Direction::Right, 1)?;
    let last = map.peek_node(series_node, Direction::Right, len)?;
    let after = map.link(&last, Direction::Right);
    map.disconnect(&first, Direction::Left, false);
    map.disconnect(&last, Direction::Right, false);
    after
}

/// Put a group chain where a series' datapoint run used to hang
pub(crate) fn attach_group_chain(
    map: &NavMap,
    series_node: &NodeKey,
    chain: &[NodeKey],
    after: Option<NavTarget>,
) {
    let Some(first) = chain.first() else {
        return;
    };
    map.connect_nodes(series_node, Direction::Right, first, true);
    if let (Some(last), Some(NavTarget::Node(next))) = (chain.last(), after) {
        map.connect_nodes(last, Direction::Right, &next, true);
    }
}

/// Vertical links between two adjacent series' group rows
///
/// Each group links one way to the group in the other row whose range
/// contains its start. One row's segmentation need not align with the
/// next row's, which is why these links are never reciprocal.
pub(crate) fn link_adjacent_rows(
    map: &NavMap,
    upper: &[(NodeKey, SequenceRange)],
    lower: &[(NodeKey, SequenceRange)],
) {
    for (node, range) in upper {
        if let Some((target, _)) = lower.iter().find(|(_, r)| r.contains(range.start)) {
            map.connect(node, Direction::Down, NavTarget::Node(target.clone()), false);
        }
    }
    for (node, range) in lower {
        if let Some((target, _)) = upper.iter().find(|(_, r)| r.contains(range.start)) {
            map.connect(node, Direction::Up, NavTarget::Node(target.clone()), false);
        }
    }
}
