//! Line chart navigation wiring
//!
//! A line chart starts with the same graph as a bar chart. Once the
//! external trend analysis has produced segments for every series, the
//! root layer is cloned and the sequences are spliced into the clone,
//! so the plain datapoint view stays intact alongside the trend view.

use std::sync::Arc;

use ahash::AHashMap;
use anyhow::Result;
use tracing::debug;

use ac_core::{
    graph::{self, DatapointKind},
    ChartModel, ChartSettings, Direction, NavMap, NavNodeType, NavTarget, SeriesAnalysis,
    VisitedStore, ROOT_LAYER,
};

use crate::{command, ChartId, NavCommand};

/// Name of the cloned layer carrying sequence nodes
pub const SEQUENCE_LAYER: &str = "sequence";

/// Navigation graph owner for one line chart instance
pub struct LineChartNav {
    id: ChartId,
    map: NavMap,
}

impl LineChartNav {
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
        debug!(%id, "built line chart navigation");
        Ok(Self { id, map })
    }

    pub fn id(&self) -> ChartId {
        self.id
    }

    pub fn map(&self) -> &NavMap {
        &self.map
    }

    /// Whether the trend view has been built yet
    pub fn has_sequences(&self) -> bool {
        self.map.has_layer(SEQUENCE_LAYER)
    }

    /// Splice trend segments in, once analysis covers every series
    ///
    /// Clones the root layer under [`SEQUENCE_LAYER`], splices the
    /// sequence nodes into the clone, and wires layer escapes between
    /// the two top nodes: `in` from the root top dives into the trend
    /// view, `out` from the trend top returns.
    pub fn apply_trend_analysis(
        &self,
        analysis: &AHashMap<String, SeriesAnalysis>,
    ) -> Result<()> {
        self.map.clone_layer(ROOT_LAYER, SEQUENCE_LAYER)?;
        graph::splice_sequences(&self.map, SEQUENCE_LAYER, analysis)?;

        if let Some(root_top) = self.map.get_indexed_in(ROOT_LAYER, NavNodeType::Top, 0) {
            self.map.connect(
                &root_top,
                Direction::In,
                NavTarget::Layer(Arc::from(SEQUENCE_LAYER)),
                false,
            );
        }
        if let Some(trend_top) = self.map.get_indexed_in(SEQUENCE_LAYER, NavNodeType::Top, 0) {
            self.map.connect(
                &trend_top,
                Direction::Out,
                NavTarget::Layer(Arc::from(ROOT_LAYER)),
                false,
            );
        }
        debug!(id = %self.id, "applied trend analysis");
        Ok(())
    }

    pub async fn handle(&self, command: NavCommand) -> Result<()> {
        command::dispatch(&self.map, command).await
    }
}
