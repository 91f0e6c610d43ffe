//! Configuration validation.

use courier_common::ConfigError;

use crate::schema::CourierConfig;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &CourierConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    if !config.server.url.starts_with("http://") && !config.server.url.starts_with("https://") {
        errors.push(format!(
            "server.url must start with http:// or https://, got '{}'",
            config.server.url
        ));
    }

    validate_range(&mut errors, "realtime.reconnect_delay_ms", config.realtime.reconnect_delay_ms, 100, 60_000);
    validate_range(&mut errors, "realtime.connect_timeout_ms", config.realtime.connect_timeout_ms, 100, 60_000);
    validate_range(&mut errors, "realtime.typing_quiet_ms", config.realtime.typing_quiet_ms, 100, 30_000);
    validate_range(&mut errors, "realtime.typing_throttle_ms", config.realtime.typing_throttle_ms, 100, 30_000);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_range(errors: &mut Vec<String>, field: &str, value: u64, min: u64, max: u64) {
    if value < min || value > max {
        errors.push(format!("{field} must be between {min} and {max}, got {value}"));
    }
}
