//! Keyboard command dispatch onto a nav map

use anyhow::Result;

use ac_core::{Direction, NavMap, NavNodeType, NodeOptions, NodeQuery};

/// Commands the keyboard handler forwards to the navigation graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavCommand {
    /// Follow the cursor's link in a direction (arrow keys, in/out)
    Move(Direction),
    /// Jump to the start of the cursor's horizontal chain
    First,
    /// Jump to the end of the cursor's horizontal chain
    Last,
    /// Toggle between a datapoint and the chord at its index
    ChordMode,
}

/// Apply a command to the map's cursor
pub async fn dispatch(map: &NavMap, command: NavCommand) -> Result<()> {
    match command {
        NavCommand::Move(direction) => {
            map.move_cursor(direction).await;
            Ok(())
        }
        NavCommand::First => jump_along(map, Direction::Left).await,
        NavCommand::Last => jump_along(map, Direction::Right).await,
        NavCommand::ChordMode => toggle_chord_mode(map).await,
    }
}

async fn jump_along(map: &NavMap, direction: Direction) -> Result<()> {
    let Some(cursor) = map.cursor() else {
        return Ok(());
    };
    let chain = map.all_nodes(&cursor, direction, None);
    if let Some(end) = chain.last() {
        if *end != cursor {
            map.go(end).await;
        }
    }
    Ok(())
}

async fn toggle_chord_mode(map: &NavMap) -> Result<()> {
    let Some(cursor) = map.cursor() else {
        return Ok(());
    };
    match map.options(&cursor) {
        Some(NodeOptions::Chord { index }) => {
            // Back to the first series' datapoint at this index
            let Some(series_key) = map.model().series().first().map(|s| s.key.clone()) else {
                return Ok(());
            };
            let query = NodeQuery::series_index(series_key, index);
            if map.node(NavNodeType::Datapoint, &query).is_some() {
                map.go_to(NavNodeType::Datapoint, &query).await?;
            }
            Ok(())
        }
        Some(options) if options.node_type().is_datapoint_kind() => {
            let index = options.index().unwrap_or(0);
            let query = NodeQuery::at_index(index);
            // Single-series charts have no chords; ignore the toggle
            if map.node(NavNodeType::Chord, &query).is_some() {
                map.go_to(NavNodeType::Chord, &query).await?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}
