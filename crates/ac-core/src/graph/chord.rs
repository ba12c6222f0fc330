//! Chord nodes: cross-series grouping at a shared index

use tracing::debug;

use crate::nav::{Direction, NavMap, NodeKey, NodeOptions};
use crate::NavError;

/// Build one chord node per index position of the first series
///
/// Chords chain `left`/`right` among themselves, independent of the
/// primary chain; chord mode is entered by an explicit `go_to`, not by
/// horizontal movement. Charts with a single series get no chords.
pub fn build_chords(map: &NavMap, layer: &str) -> Result<Vec<NodeKey>, NavError> {
    let model = map.model();
    let series = model.series();
    if series.len() < 2 {
        return Ok(Vec::new());
    }
    let count = series[0].len();
    let mut chords: Vec<NodeKey> = Vec::with_capacity(count);
    for index in 0..count {
        let chord = map.add_node(layer, NodeOptions::Chord { index })?;
        if let Some(previous) = chords.last() {
            map.connect_nodes(&chord, Direction::Left, previous, true);
        }
        chords.push(chord);
    }
    debug!(layer, count, "built chord nodes");
    Ok(chords)
}
