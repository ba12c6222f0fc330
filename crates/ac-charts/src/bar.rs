//! Bar chart navigation wiring (grouped and stacked bars)

use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use ac_core::{
    graph::{self, DatapointKind},
    ChartModel, ChartSettings, NavMap, VisitedStore, ROOT_LAYER,
};

use crate::{command, ChartId, NavCommand};

/// Navigation graph owner for one bar chart instance
pub struct BarChartNav {
    id: ChartId,
    map: NavMap,
}

impl BarChartNav {
    /// Build the chart's graph: primary chain, and vertical links plus
    /// chords when the chart has more than one series
    pub fn build(
        model: Arc<dyn ChartModel>,
        settings: &ChartSettings,
        visited: Arc<dyn VisitedStore>,
    ) -> Result<Self> {
        let map = NavMap::new(model, settings, visited);
        graph::build_primary_chain(&map, ROOT_LAYER, DatapointKind::Datapoint)?;
        if map.model().series().len() > 1 {
            graph::link_series_vertically(&map, ROOT_LAYER)?;
            graph::build_chords(&map, ROOT_LAYER)?;
        }
        let id = ChartId::new_v4();
        debug!(%id, "built bar chart navigation");
        Ok(Self { id, map })
    }

    pub fn id(&self) -> ChartId {
        self.id
    }

    pub fn map(&self) -> &NavMap {
        &self.map
    }

    /// Forward a keyboard command to the graph
    pub async fn handle(&self, command: NavCommand) -> Result<()> {
        command::dispatch(&self.map, command).await
    }
}
