//! Cluster nodes: externally clustered scatter-point groups

use std::cmp::Ordering;

use ahash::AHashMap;
use tracing::debug;

use super::{attach_group_chain, detach_datapoint_run, link_adjacent_rows};
use crate::model::{ClusterResult, DatapointId, SequenceRange};
use crate::nav::{Direction, NavMap, NavNodeType, NavTarget, NodeKey, NodeOptions, NodeQuery};
use crate::NavError;

/// Splice clustering results into a scatter chart's graph
///
/// Structurally the sequence splice with externally computed groups:
/// clusters within a series are ordered by ascending centroid rather
/// than arrival order, the outlier bucket is folded into the last
/// cluster, and every cluster gets a synthetic `out` escape to the
/// layer's top node so leaving a cluster is always defined. Member
/// scatter points are tagged with their owning cluster's ordinal.
pub fn splice_clusters(
    map: &NavMap,
    layer: &str,
    clusters: &AHashMap<String, Vec<ClusterResult>>,
) -> Result<(), NavError> {
    let model = map.model();
    for series in model.series() {
        if !clusters.contains_key(&series.key) {
            return Err(NavError::MissingClustering(series.key.clone()));
        }
    }
    let top = map
        .get_indexed_in(layer, NavNodeType::Top, 0)
        .ok_or(NavError::NodeNotFound(NavNodeType::Top))?;

    let mut rows: Vec<Vec<(NodeKey, SequenceRange)>> = Vec::new();
    for series in model.series() {
        let mut sorted = clusters[&series.key].clone();
        sorted.sort_by(|a, b| {
            a.centroid
                .partial_cmp(&b.centroid)
                .unwrap_or(Ordering::Equal)
        });
        let outliers: Vec<DatapointId> = sorted
            .iter()
            .flat_map(|cluster| cluster.outlier_ids.iter().cloned())
            .collect();
        if let Some(last) = sorted.last_mut() {
            last.datapoint_ids.extend(outliers);
        }
        if sorted.is_empty() {
            rows.push(Vec::new());
            continue;
        }

        let series_node = map
            .get_in(layer, NavNodeType::Series, &NodeQuery::series(&series.key))
            .ok_or(NavError::NodeNotFound(NavNodeType::Series))?;
        let after = detach_datapoint_run(map, &series_node, series.len());

        let mut chain: Vec<NodeKey> = Vec::with_capacity(sorted.len());
        let mut row: Vec<(NodeKey, SequenceRange)> = Vec::with_capacity(sorted.len());
        for (ordinal, cluster) in sorted.iter().enumerate() {
            let mut members: Vec<usize> = cluster
                .datapoint_ids
                .iter()
                .filter(|id| id.series_key == series.key)
                .map(|id| id.index)
                .collect();
            members.sort_unstable();
            members.dedup();
            let start = members.first().copied().unwrap_or(0);
            let end = members.last().map(|index| index + 1).unwrap_or(0);
            let datapoints: Vec<DatapointId> = members
                .iter()
                .map(|&index| DatapointId {
                    series_key: series.key.clone(),
                    index,
                })
                .collect();

            let node = map.add_node(
                layer,
                NodeOptions::Cluster {
                    series_key: series.key.clone(),
                    start,
                    end,
                    datapoints,
                    clustering: ordinal,
                },
            )?;
            if let Some(previous) = chain.last() {
                map.connect_nodes(&node, Direction::Left, previous, true);
            }
            map.connect(&node, Direction::Out, NavTarget::Node(top.clone()), false);

            for (position, &index) in members.iter().enumerate() {
                let Some(point) = map.get_in(
                    layer,
                    NavNodeType::ScatterPoint,
                    &NodeQuery::series_index(&series.key, index),
                ) else {
                    continue;
                };
                map.set_scatter_cluster(&point, ordinal);
                if position == 0 {
                    if map.link(&point, Direction::Out).is_none() {
                        map.connect_nodes(&node, Direction::In, &point, true);
                    }
                } else {
                    map.connect_nodes(&point, Direction::Out, &node, false);
                }
            }
            chain.push(node.clone());
            row.push((node, SequenceRange::new(start, end)));
        }
        attach_group_chain(map, &series_node, &chain, after);
        rows.push(row);
    }

    for i in 0..rows.len().saturating_sub(1) {
        link_adjacent_rows(map, &rows[i], &rows[i + 1]);
    }
    debug!(layer, series = rows.len(), "spliced cluster nodes");
    Ok(())
}
