//! Scatter chart navigation wiring
//!
//! Scatter charts chain scatter-point nodes and, once the external
//! clustering collaborator delivers, splice cluster groups over the
//! point runs in place.

use std::sync::Arc;

use ahash::AHashMap;
use anyhow::Result;
use tracing::debug;

use ac_core::{
    graph::{self, DatapointKind},
    ChartModel, ChartSettings, ClusterResult, NavMap, VisitedStore, ROOT_LAYER,
};

use crate::{command, ChartId, NavCommand};

/// Navigation graph owner for one scatter chart instance
pub struct ScatterChartNav {
    id: ChartId,
    map: NavMap,
}

impl ScatterChartNav {
    pub fn build(
        model: Arc<dyn ChartModel>,
        settings: &ChartSettings,
        visited: Arc<dyn VisitedStore>,
    ) -> Result<Self> {
        let map = NavMap::new(model, settings, visited);
        graph::build_primary_chain(&map, ROOT_LAYER, DatapointKind::ScatterPoint)?;
        if map.model().series().len() > 1 {
            graph::link_series_vertically(&map, ROOT_LAYER)?;
        }
        let id = ChartId::new_v4();
        debug!(%id, "built scatter chart navigation");
        Ok(Self { id, map })
    }

    pub fn id(&self) -> ChartId {
        self.id
    }

    pub fn map(&self) -> &NavMap {
        &self.map
    }

    /// Splice clustering results in, once they cover every series
    pub fn apply_clustering(
        &self,
        clusters: &AHashMap<String, Vec<ClusterResult>>,
    ) -> Result<()> {
        graph::splice_clusters(&self.map, ROOT_LAYER, clusters)?;
        debug!(id = %self.id, "applied clustering");
        Ok(())
    }

    pub async fn handle(&self, command: NavCommand) -> Result<()> {
        command::dispatch(&self.map, command).await
    }
}
