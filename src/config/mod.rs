//! Dashboard Configuration Module
//!
//! Operator-tunable settings loaded from TOML.
//!
//! ## Loading Order
//!
//! 1. `SENSOR_EXPLORER_CONFIG` environment variable (path to TOML file)
//! 2. `sensor_explorer.toml` in the current working directory
//! 3. Built-in defaults (see [`defaults`])
//!
//! ## Usage
//!
//! ```ignore
//! // In main():
//! config::init(DashboardConfig::load());
//!
//! // Anywhere else:
//! let top_n = config::get().view.top_n;
//! ```

mod dashboard_config;
pub mod defaults;
pub mod validation;

pub use dashboard_config::*;

use std::sync::OnceLock;

/// Global configuration, set once at startup.
static DASHBOARD_CONFIG: OnceLock<DashboardConfig> = OnceLock::new();

/// Install the global configuration. Later calls are ignored with a warning.
pub fn init(config: DashboardConfig) {
    if DASHBOARD_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once, ignoring");
    }
}

/// The global configuration; built-in defaults if `init()` was never called.
pub fn get() -> &'static DashboardConfig {
    DASHBOARD_CONFIG.get_or_init(DashboardConfig::default)
}

pub fn is_initialized() -> bool {
    DASHBOARD_CONFIG.get().is_some()
}
