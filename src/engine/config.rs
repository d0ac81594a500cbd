use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::geometry::Size;
use crate::lifecycle::StartupConfig;
use crate::logging::Logger;
use crate::metrics::RuntimeMetrics;

/// Names of the views the engine treats specially.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewNames {
    pub main: String,
    pub secondary: String,
    /// Shown instead of the layout when the terminal is too small.
    pub limit: String,
    pub menu: String,
    pub tooltip: String,
    pub information: String,
    /// Bottom-to-top order applied when a repository session starts.
    pub stacking_order: Vec<String>,
}

impl Default for ViewNames {
    fn default() -> Self {
        let stacking_order = [
            "status",
            "files",
            "branches",
            "commits",
            "stash",
            "main",
            "secondary",
            "extras",
            "appStatus",
            "options",
            "information",
            "menu",
            "tooltip",
            "confirmation",
            "limit",
        ];
        Self {
            main: "main".to_string(),
            secondary: "secondary".to_string(),
            limit: "limit".to_string(),
            menu: "menu".to_string(),
            tooltip: "tooltip".to_string(),
            information: "information".to_string(),
            stacking_order: stacking_order.iter().map(|name| name.to_string()).collect(),
        }
    }
}

/// Configuration knobs for the layout engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub views: ViewNames,
    pub startup: StartupConfig,
    /// Below this size the limit view covers the screen.
    pub min_size: Size,
    /// Optional structured logger used by every pass.
    pub logger: Option<Logger>,
    /// Counters updated after every pass.
    pub metrics: Option<Arc<Mutex<RuntimeMetrics>>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            views: ViewNames::default(),
            startup: StartupConfig::default(),
            min_size: Size::new(10, 9),
            logger: None,
            metrics: None,
        }
    }
}

impl EngineConfig {
    /// Enable metrics collection if it has not already been configured.
    pub fn enable_metrics(&mut self) {
        if self.metrics.is_none() {
            self.metrics = Some(Arc::new(Mutex::new(RuntimeMetrics::new())));
        }
    }

    /// Access the shared metrics handle if metrics are enabled.
    pub fn metrics_handle(&self) -> Option<Arc<Mutex<RuntimeMetrics>>> {
        self.metrics.as_ref().map(Arc::clone)
    }
}
