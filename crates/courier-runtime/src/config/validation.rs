//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{CourierConfig, LogOutput, LoggingConfig, MediatorConfig};

/// Upper bound accepted for `mediator.max_depth`.
pub const MAX_DEPTH_LIMIT: usize = 4096;

/// Validates the entire configuration.
pub fn validate_config(config: &CourierConfig) -> ConfigResult<()> {
    validate_mediator_config(&config.mediator)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

fn validate_mediator_config(mediator: &MediatorConfig) -> ConfigResult<()> {
    if mediator.max_depth > MAX_DEPTH_LIMIT {
        return Err(ConfigError::validation(format!(
            "mediator.max_depth must be at most {MAX_DEPTH_LIMIT} (0 disables the limit), got {}",
            mediator.max_depth
        )));
    }
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File {
        match &logging.file_path {
            None => {
                return Err(ConfigError::validation(
                    "logging.file_path is required when logging.output is \"file\"",
                ));
            }
            Some(path) if path.file_name().is_none() => {
                return Err(ConfigError::validation(format!(
                    "logging.file_path must name a file: {}",
                    path.display()
                )));
            }
            Some(_) => {}
        }
    }

    for target in logging.filters.keys() {
        if target.is_empty() || target.contains([' ', '=', ',']) {
            return Err(ConfigError::validation(format!(
                "Invalid log filter target: {target:?}"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::schema::LogLevel;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&CourierConfig::default()).is_ok());
    }

    #[test]
    fn test_validate_depth_limit() {
        let mut config = CourierConfig::default();
        config.mediator.max_depth = 0;
        assert!(validate_config(&config).is_ok());

        config.mediator.max_depth = MAX_DEPTH_LIMIT + 1;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_validate_file_output_needs_path() {
        let mut config = CourierConfig::default();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());

        config.logging.file_path = Some(PathBuf::from("logs/courier.log"));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_filter_target() {
        let mut config = CourierConfig::default();
        config
            .logging
            .filters
            .insert("courier_core".to_string(), LogLevel::Trace);
        assert!(validate_config(&config).is_ok());

        config
            .logging
            .filters
            .insert("courier core".to_string(), LogLevel::Debug);
        assert!(validate_config(&config).is_err());
    }
}
