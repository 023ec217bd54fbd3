//! # Skein
//!
//! Composable before/after/around advice around any invocable target.
//!
//! ## Architecture
//!
//! ```text
//! exec(args)
//!   └─▶ advice 3 before ─▶ advice 2 before ─▶ advice 1 before ─┐
//!                                                             target
//!   ◀── advice 3 after  ◀── advice 2 after  ◀── advice 1 after ◀┘
//! ```
//!
//! - **Core** (`skein-core`): advice, signals, the chain executor and `Handler`
//! - **Bus** (`skein-bus`): a wildcard `channel:topic` event bus
//! - **Runtime** (`skein-runtime`): configuration loading and logging setup
//!
//! ## Quick Start
//!
//! ```rust
//! use skein::prelude::*;
//!
//! let mut handler = Handler::new(Method::from_fn("sum", |args: &[Value]| {
//!     Ok(Value::from(args.iter().filter_map(Value::as_i64).sum::<i64>()))
//! }));
//!
//! handler
//!     .before(
//!         |_, _| Ok(Some(Signal::alter_args("double", vec![Value::from(2), Value::from(4)]))),
//!         (),
//!     )
//!     .unwrap();
//!
//! assert_eq!(handler.exec(&[Value::from(1), Value::from(2)]).unwrap(), Value::from(6));
//! ```
//!
//! ## Features
//!
//! - `toml-config`: TOML configuration files (default)
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use skein_bus as bus;
pub use skein_core as core;
pub use skein_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use skein::prelude::*;
/// ```
pub mod prelude {
    // Engine
    pub use skein_core::prelude::*;
    pub use skein_core::{AdviceError, AdviceResult, BoxError};

    // Event bus
    pub use skein_bus::{EventBus, SubscriptionId};

    // Configuration and logging
    pub use skein_runtime::config::{ConfigLoader, SkeinConfig, load_config};
    pub use skein_runtime::logging::{self, LoggingBuilder, SpanEvents};
}
