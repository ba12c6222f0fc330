use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::model::DatapointId;

mod layer;
mod map;
mod node;
mod selector;
mod subscriber;

pub use layer::NavLayer;
pub use map::NavMap;
pub use node::NavNode;
pub use subscriber::{NavSubscriber, RunContext};

/// Name of the layer every nav map starts with
pub const ROOT_LAYER: &str = "root";

/// Shared name of a registered nav layer
pub type LayerName = Arc<str>;

/// Directions a nav node can link in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    In,
    Out,
}

impl Direction {
    /// The opposite direction, used for reciprocal linking
    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::In => Direction::Out,
            Direction::Out => Direction::In,
        }
    }
}

/// The closed set of nav node kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NavNodeType {
    /// Chart landing position
    Top,
    /// One whole series
    Series,
    /// A single datapoint of one series
    Datapoint,
    /// All series' datapoints at a shared index
    Chord,
    /// A contiguous trend segment of one series
    Sequence,
    /// An externally clustered group of scatter points
    Cluster,
    /// A single scatter-plot datapoint
    ScatterPoint,
}

impl NavNodeType {
    /// Whether this kind represents a single datapoint
    pub fn is_datapoint_kind(self) -> bool {
        matches!(self, NavNodeType::Datapoint | NavNodeType::ScatterPoint)
    }
}

/// Type-specific options carried by a nav node
///
/// One variant per node kind, so reading a node's options always goes
/// through an exhaustive match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeOptions {
    Top,
    Series {
        series_key: String,
    },
    Datapoint {
        series_key: String,
        index: usize,
    },
    Chord {
        index: usize,
    },
    Sequence {
        series_key: String,
        start: usize,
        end: usize,
    },
    Cluster {
        series_key: String,
        start: usize,
        end: usize,
        datapoints: Vec<DatapointId>,
        clustering: usize,
    },
    ScatterPoint {
        series_key: String,
        index: usize,
        /// Ordinal of the owning cluster, assigned once clustering arrives
        cluster: Option<usize>,
    },
}

impl NodeOptions {
    /// The node kind these options belong to
    pub fn node_type(&self) -> NavNodeType {
        match self {
            NodeOptions::Top => NavNodeType::Top,
            NodeOptions::Series { .. } => NavNodeType::Series,
            NodeOptions::Datapoint { .. } => NavNodeType::Datapoint,
            NodeOptions::Chord { .. } => NavNodeType::Chord,
            NodeOptions::Sequence { .. } => NavNodeType::Sequence,
            NodeOptions::Cluster { .. } => NavNodeType::Cluster,
            NodeOptions::ScatterPoint { .. } => NavNodeType::ScatterPoint,
        }
    }

    /// Series key, for the variants that carry one
    pub fn series_key(&self) -> Option<&str> {
        match self {
            NodeOptions::Series { series_key }
            | NodeOptions::Datapoint { series_key, .. }
            | NodeOptions::Sequence { series_key, .. }
            | NodeOptions::Cluster { series_key, .. }
            | NodeOptions::ScatterPoint { series_key, .. } => Some(series_key),
            NodeOptions::Top | NodeOptions::Chord { .. } => None,
        }
    }

    /// Within-series or chord index, for the variants that carry one
    pub fn index(&self) -> Option<usize> {
        match self {
            NodeOptions::Datapoint { index, .. }
            | NodeOptions::Chord { index }
            | NodeOptions::ScatterPoint { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Start of the covered index range, for group nodes
    pub fn start(&self) -> Option<usize> {
        match self {
            NodeOptions::Sequence { start, .. } | NodeOptions::Cluster { start, .. } => {
                Some(*start)
            }
            _ => None,
        }
    }

    /// End of the covered index range (exclusive), for group nodes
    pub fn end(&self) -> Option<usize> {
        match self {
            NodeOptions::Sequence { end, .. } | NodeOptions::Cluster { end, .. } => Some(*end),
            _ => None,
        }
    }

    /// Cluster ordinal: the owning cluster for a scatter point, or the
    /// clustering position of a cluster node itself
    pub fn cluster_index(&self) -> Option<usize> {
        match self {
            NodeOptions::ScatterPoint { cluster, .. } => *cluster,
            NodeOptions::Cluster { clustering, .. } => Some(*clustering),
            _ => None,
        }
    }
}

/// A partial-options filter for node lookup
///
/// `matches_all` is the exact-lookup contract: every field given in the
/// query must equal the candidate's field. `matches_any` is the query
/// contract: an empty query matches every node, otherwise a single
/// matching field suffices. The any-field behavior is load-bearing for
/// callers that pass multi-key filters; do not tighten it to all-fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeQuery {
    pub series_key: Option<String>,
    pub index: Option<usize>,
    pub start: Option<usize>,
    pub end: Option<usize>,
    pub cluster: Option<usize>,
}

impl NodeQuery {
    /// Filter on a series key
    pub fn series(series_key: impl Into<String>) -> Self {
        Self {
            series_key: Some(series_key.into()),
            ..Self::default()
        }
    }

    /// Filter on an index
    pub fn at_index(index: usize) -> Self {
        Self {
            index: Some(index),
            ..Self::default()
        }
    }

    /// Filter on a series key and index
    pub fn series_index(series_key: impl Into<String>, index: usize) -> Self {
        Self {
            series_key: Some(series_key.into()),
            index: Some(index),
            ..Self::default()
        }
    }

    /// Filter on a series key and index range
    pub fn range(series_key: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            series_key: Some(series_key.into()),
            start: Some(start),
            end: Some(end),
            ..Self::default()
        }
    }

    /// Whether no fields are set
    pub fn is_empty(&self) -> bool {
        self.series_key.is_none()
            && self.index.is_none()
            && self.start.is_none()
            && self.end.is_none()
            && self.cluster.is_none()
    }

    /// Every given field must equal the candidate's field
    pub fn matches_all(&self, options: &NodeOptions) -> bool {
        if let Some(series_key) = &self.series_key {
            if options.series_key() != Some(series_key.as_str()) {
                return false;
            }
        }
        if let Some(index) = self.index {
            if options.index() != Some(index) {
                return false;
            }
        }
        if let Some(start) = self.start {
            if options.start() != Some(start) {
                return false;
            }
        }
        if let Some(end) = self.end {
            if options.end() != Some(end) {
                return false;
            }
        }
        if let Some(cluster) = self.cluster {
            if options.cluster_index() != Some(cluster) {
                return false;
            }
        }
        true
    }

    /// An empty query matches everything; otherwise any one matching
    /// field suffices
    pub fn matches_any(&self, options: &NodeOptions) -> bool {
        if self.is_empty() {
            return true;
        }
        if let Some(series_key) = &self.series_key {
            if options.series_key() == Some(series_key.as_str()) {
                return true;
            }
        }
        if let Some(index) = self.index {
            if options.index() == Some(index) {
                return true;
            }
        }
        if let Some(start) = self.start {
            if options.start() == Some(start) {
                return true;
            }
        }
        if let Some(end) = self.end {
            if options.end() == Some(end) {
                return true;
            }
        }
        if let Some(cluster) = self.cluster {
            if options.cluster_index() == Some(cluster) {
                return true;
            }
        }
        false
    }
}

/// Arena handle for a registered nav node
///
/// The index is the node's position in its layer's type bucket, assigned
/// on registration and never reassigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeKey {
    pub layer: LayerName,
    pub ty: NavNodeType,
    pub index: usize,
}

/// What a directional link points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavTarget {
    /// Another node, possibly in another layer
    Node(NodeKey),
    /// A layer escape: following it switches the map's current layer
    Layer(LayerName),
}

impl NavTarget {
    /// The linked node, if this is a node link
    pub fn as_node(&self) -> Option<&NodeKey> {
        match self {
            NavTarget::Node(key) => Some(key),
            NavTarget::Layer(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_directions_pair_up() {
        for dir in [
            Direction::Up,
            Direction::Down,
            Direction::Left,
            Direction::Right,
            Direction::In,
            Direction::Out,
        ] {
            assert_eq!(dir.opposite().opposite(), dir);
            assert_ne!(dir.opposite(), dir);
        }
    }

    #[test]
    fn matches_all_requires_every_given_field() {
        let options = NodeOptions::Datapoint {
            series_key: "alpha".into(),
            index: 3,
        };
        assert!(NodeQuery::series("alpha").matches_all(&options));
        assert!(NodeQuery::series_index("alpha", 3).matches_all(&options));
        assert!(!NodeQuery::series_index("alpha", 4).matches_all(&options));
        assert!(!NodeQuery::series_index("beta", 3).matches_all(&options));
        // Empty query matches vacuously
        assert!(NodeQuery::default().matches_all(&options));
    }

    #[test]
    fn matches_any_is_a_union_over_fields() {
        let options = NodeOptions::Datapoint {
            series_key: "alpha".into(),
            index: 3,
        };
        // Wrong series but right index still matches
        assert!(NodeQuery::series_index("beta", 3).matches_any(&options));
        // Right series but wrong index still matches
        assert!(NodeQuery::series_index("alpha", 9).matches_any(&options));
        assert!(!NodeQuery::series_index("beta", 9).matches_any(&options));
        assert!(NodeQuery::default().matches_any(&options));
    }

    #[test]
    fn group_options_expose_their_range() {
        let options = NodeOptions::Sequence {
            series_key: "alpha".into(),
            start: 2,
            end: 6,
        };
        assert_eq!(options.start(), Some(2));
        assert_eq!(options.end(), Some(6));
        assert_eq!(options.index(), None);
        assert!(NodeQuery::range("alpha", 2, 6).matches_all(&options));
        assert!(!NodeQuery::range("alpha", 2, 7).matches_all(&options));
    }
}
