//! Run-notification subscriber trait

use async_trait::async_trait;

use super::{LayerName, NodeKey, NodeOptions};
use crate::model::Datapoint;

/// Cursor snapshot passed with run notifications
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Layer the cursor sits in
    pub layer: LayerName,
    /// The cursor node
    pub node: NodeKey,
    /// The cursor node's options
    pub options: NodeOptions,
    /// Datapoints the cursor resolves to
    pub datapoints: Vec<Datapoint>,
}

/// Trait for components that respond to navigation runs
///
/// A run is a burst of cursor movement collapsed into one start/end
/// pair by the map's debounce timer. Handlers may await summarization
/// or other slow work; the map awaits the start notification before
/// arming its timer.
#[async_trait]
pub trait NavSubscriber: Send + Sync {
    /// Called when a new run of cursor movement begins
    async fn nav_run_did_start(&self, context: &RunContext);

    /// Called once movement has settled for the configured timeout
    async fn nav_run_did_end(&self, context: &RunContext);
}
