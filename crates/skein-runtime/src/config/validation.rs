//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{ChainConfig, LogOutput, LoggingConfig, SkeinConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &SkeinConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_chain_config(&config.chain)?;
    Ok(())
}

/// Validates logging settings.
fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    if logging.max_files == 0 {
        return Err(ConfigError::validation(
            "logging.max_files must be greater than 0",
        ));
    }

    for target in logging.filters.keys() {
        validate_filter_target(target)?;
    }

    Ok(())
}

/// Filter targets are Rust module paths such as `skein_core::executor`.
fn validate_filter_target(target: &str) -> ConfigResult<()> {
    let valid = !target.is_empty()
        && target.split("::").all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        });

    if valid {
        Ok(())
    } else {
        Err(ConfigError::validation(format!(
            "Invalid log filter target: '{target}'"
        )))
    }
}

/// Validates handler defaults.
fn validate_chain_config(chain: &ChainConfig) -> ConfigResult<()> {
    if chain.max_depth == Some(0) {
        return Err(ConfigError::validation(
            "chain.max_depth must be greater than 0 when set",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LogLevel;
    use std::path::PathBuf;

    #[test]
    fn test_default_is_valid() {
        assert!(validate_config(&SkeinConfig::default()).is_ok());
    }

    #[test]
    fn test_file_output_needs_path() {
        let mut config = SkeinConfig::default();
        config.logging.output = LogOutput::File;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { .. })
        ));

        config.logging.file_path = Some(PathBuf::from("logs/skein.log"));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_filter_targets() {
        let mut config = SkeinConfig::default();
        config
            .logging
            .filters
            .insert("skein_core::executor".into(), LogLevel::Trace);
        assert!(validate_config(&config).is_ok());

        config
            .logging
            .filters
            .insert("skein core".into(), LogLevel::Debug);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_max_depth() {
        let mut config = SkeinConfig::default();
        config.chain.max_depth = Some(0);
        assert!(validate_config(&config).is_err());

        config.chain.max_depth = Some(1);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_zero_rotation_limits() {
        let mut config = SkeinConfig::default();
        config.logging.max_files = 0;
        assert!(validate_config(&config).is_err());
    }
}
