//! Configuration Module
//!
//! Tunable values loaded from TOML, with built-in defaults matching the
//! shipped behavior.
//!
//! ## Loading Order
//!
//! 1. `REPARA_CONFIG` environment variable (path to TOML file)
//! 2. `repara.toml` in the current working directory
//! 3. Built-in defaults
//!
//! Call `config::init()` once at startup, then `config::get()` anywhere.

mod app_config;

pub use app_config::*;

use std::sync::OnceLock;

/// Global application configuration, initialized once at startup.
static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Initialize the global configuration.
///
/// Repeat calls are ignored with a warning so tests can initialize freely.
pub fn init(config: AppConfig) {
    if APP_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once — ignoring");
    }
}

/// Get a reference to the global configuration.
///
/// Falls back to defaults when `init()` has not been called, so library
/// consumers and tests don't need a startup sequence.
pub fn get() -> &'static AppConfig {
    APP_CONFIG.get_or_init(AppConfig::default)
}

/// Check whether the config has been initialized.
pub fn is_initialized() -> bool {
    APP_CONFIG.get().is_some()
}
