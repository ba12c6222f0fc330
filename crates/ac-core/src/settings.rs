use serde::{Deserialize, Serialize};

/// Settings the navigation engine consumes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSettings {
    /// UI timing settings
    pub ui: UiSettings,
}

/// UI timing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiSettings {
    /// Quiet time in milliseconds after which a run of cursor movement
    /// is considered finished
    pub nav_run_timeout_ms: u64,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            ui: UiSettings::default(),
        }
    }
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            nav_run_timeout_ms: 300,
        }
    }
}
