//! Primary chain and vertical inter-series links

use tracing::debug;

use crate::nav::{Direction, NavMap, NavNodeType, NodeKey, NodeOptions, NodeQuery};
use crate::NavError;

/// Which datapoint node kind the primary chain is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatapointKind {
    Datapoint,
    ScatterPoint,
}

impl DatapointKind {
    fn options(self, series_key: &str, index: usize) -> NodeOptions {
        match self {
            DatapointKind::Datapoint => NodeOptions::Datapoint {
                series_key: series_key.to_string(),
                index,
            },
            DatapointKind::ScatterPoint => NodeOptions::ScatterPoint {
                series_key: series_key.to_string(),
                index,
                cluster: None,
            },
        }
    }

    /// The node type this kind registers as
    pub fn node_type(self) -> NavNodeType {
        match self {
            DatapointKind::Datapoint => NavNodeType::Datapoint,
            DatapointKind::ScatterPoint => NavNodeType::ScatterPoint,
        }
    }
}

/// Build the horizontal chain every chart starts from
///
/// One top node, then per series a series node followed by its
/// datapoint nodes, each linked `left` to the running tail:
/// `top — series0 — dp0,0 — dp0,1 — … — series1 — dp1,0 — …`.
/// Returns the top node, which is also the layer's initial cursor.
pub fn build_primary_chain(
    map: &NavMap,
    layer: &str,
    kind: DatapointKind,
) -> Result<NodeKey, NavError> {
    let top = map.add_node(layer, NodeOptions::Top)?;
    let mut tail = top.clone();
    let model = map.model();
    for series in model.series() {
        let series_node = map.add_node(
            layer,
            NodeOptions::Series {
                series_key: series.key.clone(),
            },
        )?;
        map.connect_nodes(&series_node, Direction::Left, &tail, true);
        tail = series_node;
        for index in 0..series.len() {
            let dp = map.add_node(layer, kind.options(&series.key, index))?;
            map.connect_nodes(&dp, Direction::Left, &tail, true);
            tail = dp;
        }
    }
    debug!(layer, series = model.series().len(), "built primary chain");
    Ok(top)
}

/// Connect adjacent series rows vertically
///
/// Series nodes of rows `i` and `i+1` get reciprocal `down`/`up` links,
/// as do the datapoint nodes at each shared within-series offset,
/// located by peeking right from each series head.
pub fn link_series_vertically(map: &NavMap, layer: &str) -> Result<(), NavError> {
    let model = map.model();
    let series = model.series();
    for i in 0..series.len().saturating_sub(1) {
        let upper = map
            .get_in(layer, NavNodeType::Series, &NodeQuery::series(&series[i].key))
            .ok_or(NavError::NodeNotFound(NavNodeType::Series))?;
        let lower = map
            .get_in(
                layer,
                NavNodeType::Series,
                &NodeQuery::series(&series[i + 1].key),
            )
            .ok_or(NavError::NodeNotFound(NavNodeType::Series))?;
        map.connect_nodes(&upper, Direction::Down, &lower, true);

        let pairs = series[i].len().min(series[i + 1].len());
        for offset in 0..pairs {
            let (Some(a), Some(b)) = (
                map.peek_node(&upper, Direction::Right, offset + 1),
                map.peek_node(&lower, Direction::Right, offset + 1),
            ) else {
                break;
            };
            map.connect_nodes(&a, Direction::Down, &b, true);
        }
    }
    Ok(())
}
