//! Error types for the Skein core.
//!
//! Only configuration mistakes are modelled here. Errors raised while a chain
//! executes are [`BoxError`](crate::BoxError)s owned by whoever raised them.

use thiserror::Error;

use crate::advice::{AdviceId, Mode};

/// Errors raised while building advice or wiring it into a chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdviceError {
    /// The mode bits decode to no dispatch point, or combine AROUND with
    /// BEFORE/AFTER.
    #[error(
        "invalid advice mode {bits:#05b}: expected before (1), after (2), before|after (3) or around (4)"
    )]
    InvalidMode {
        /// The rejected bit pattern.
        bits: u8,
    },

    /// The callback shape does not fit the mode.
    #[error("advice mode '{mode}' cannot use {callback} callback")]
    CallbackMismatch {
        /// The requested mode.
        mode: Mode,
        /// The callback shape that was supplied.
        callback: &'static str,
    },

    /// The owner has no operation registered under the given name.
    #[error("operation '{name}' not found on target")]
    UnknownOperation {
        /// The missing operation name.
        name: String,
    },

    /// The advice already sits in this chain.
    #[error("{advice} is already installed in this chain")]
    AlreadyInstalled {
        /// The duplicate advice.
        advice: AdviceId,
    },

    /// Adding another node would exceed the configured depth limit.
    #[error("chain depth limit of {limit} exceeded")]
    DepthExceeded {
        /// The configured limit.
        limit: usize,
    },
}

/// Result type for advice configuration.
pub type AdviceResult<T> = Result<T, AdviceError>;
