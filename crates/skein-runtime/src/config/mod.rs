//! Configuration module for the Skein runtime.
//!
//! This module provides figment-based configuration loading and validation
//! for logging and handler defaults.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    ChainConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, SkeinConfig,
    SpanEventConfig,
};
pub use validation::validate_config;
