//! Courier configuration system.
//!
//! TOML-based configuration with serde defaults so partial configs work
//! out of the box. Validation warns and falls back to defaults rather
//! than refusing to start.

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{CourierConfig, RealtimeSettings, ServerConfig};
pub use toml_loader::{default_config_path, load_default, load_from_path};

use courier_common::ConfigError;

/// Convenience function to load config from the platform default path.
///
/// Loads `config.toml` from the OS config directory, creating a commented
/// default file if none exists.
pub fn load_config() -> Result<CourierConfig, ConfigError> {
    load_default()
}
