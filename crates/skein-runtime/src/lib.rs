//! Skein Runtime - configuration and logging for Skein applications.
//!
//! This crate provides:
//! - Layered configuration loading (`ConfigLoader`, `SkeinConfig`)
//! - Logging setup over `tracing-subscriber` (`LoggingBuilder`)
//! - Handler defaults from configuration (`ChainConfig::handler_options`)
//!
//! ```ignore
//! use skein_core::Handler;
//! use skein_runtime::{ConfigLoader, logging};
//!
//! let config = ConfigLoader::new().load()?;
//! logging::init_from_config(&config.logging);
//!
//! let handler = Handler::with_options(target, config.chain.handler_options("checkout"));
//! ```

pub mod config;
pub mod logging;

// Re-exports
pub use config::{ChainConfig, ConfigError, ConfigLoader, ConfigResult, LoggingConfig, SkeinConfig};
pub use logging::{LoggingBuilder, SpanEvents};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides the commonly used logging macros and `Level`.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, span, trace, warn};
}
