//! Core navigation engine for the accessible charting platform
//!
//! This crate models a chart's data as a traversable directed graph of
//! nav nodes (chart landing, series, datapoint, chord, sequence, cluster,
//! scatter point) and drives cursor movement, debounced visit
//! notifications, and the graph-construction algorithms each chart
//! family uses to wire the nodes together.

pub mod graph;
pub mod model;
pub mod nav;
pub mod settings;
pub mod visited;

use thiserror::Error;

// Re-export commonly used types
pub use model::{
    ChartModel, ClusterResult, Datapoint, DatapointId, FacetValue, InMemoryModel, SequenceRange,
    Series, SeriesAnalysis,
};
pub use nav::{
    Direction, LayerName, NavLayer, NavMap, NavNode, NavNodeType, NavSubscriber, NavTarget,
    NodeKey, NodeOptions, NodeQuery, RunContext, ROOT_LAYER,
};
pub use settings::{ChartSettings, UiSettings};
pub use visited::{MemoryVisitedStore, VisitedStore};

/// Errors that can occur in navigation operations
#[derive(Error, Debug)]
pub enum NavError {
    #[error("no {0:?} node matches the given options")]
    NodeNotFound(NavNodeType),

    #[error("unknown navigation layer '{0}'")]
    LayerNotFound(String),

    #[error("unsupported selector prefix in '{0}'")]
    UnsupportedSelector(String),

    #[error("malformed selector '{0}'")]
    MalformedSelector(String),

    #[error("missing trend analysis for series '{0}'")]
    MissingAnalysis(String),

    #[error("missing clustering for series '{0}'")]
    MissingClustering(String),
}
