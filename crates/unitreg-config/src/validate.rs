//! Configuration validation rules.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Log formats understood by the telemetry layer.
pub const LOG_FORMATS: &[&str] = &["pretty", "compact", "json", "full"];

/// Validate a fully merged configuration.
///
/// # Errors
///
/// Returns [`ConfigError::ValidationError`] for the first rule violated.
pub fn validate(config: &Config) -> ConfigResult<()> {
    for (name, section) in &config.namespaces {
        let field = format!("namespaces.{name}");
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(invalid(
                &field,
                "namespace names may only contain ASCII letters, digits, '-' and '_'",
            ));
        }
        if section.directory.as_os_str().is_empty() {
            return Err(invalid(
                &format!("{field}.directory"),
                "a namespace must name its unit directory",
            ));
        }
        if section.extension.is_empty() {
            return Err(invalid(
                &format!("{field}.extension"),
                "extension must not be empty",
            ));
        }
        if section.extension.starts_with('.') || section.extension.contains(['/', '\\']) {
            return Err(invalid(
                &format!("{field}.extension"),
                "extension must be given without a leading dot or path separators",
            ));
        }
    }

    if config.logging.level.trim().is_empty() {
        return Err(invalid("logging.level", "log level must not be empty"));
    }
    if !LOG_FORMATS.contains(&config.logging.format.as_str()) {
        return Err(invalid(
            "logging.format",
            &format!(
                "unknown format '{}', expected one of {}",
                config.logging.format,
                LOG_FORMATS.join(", ")
            ),
        ));
    }

    Ok(())
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.to_owned(),
    }
}
