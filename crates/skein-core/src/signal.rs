//! Control signals returned by before/after callbacks.

use serde::{Deserialize, Serialize};

use crate::invoke::{BoxError, Value};

/// Steers the chain driver from inside a before/after callback.
///
/// A callback returns `Ok(None)` when it wants no change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Signal {
    /// Ends the whole chain; `value` becomes the final result.
    Halt {
        /// Why the chain was halted.
        reason: String,
        /// The forced result.
        value: Value,
    },

    /// Skips the inner invocation of the current layer only.
    ///
    /// Meaningful from a before callback; after callbacks still run.
    Prevent {
        /// Why the invocation was skipped.
        reason: String,
    },

    /// Replaces the arguments handed inward. Honoured from before callbacks.
    AlterArgs {
        /// Why the arguments were replaced.
        reason: String,
        /// The replacement arguments.
        args: Vec<Value>,
    },

    /// Replaces the result flowing outward. Honoured from after callbacks.
    AlterReturn {
        /// Why the result was replaced.
        reason: String,
        /// The replacement result.
        value: Value,
    },
}

impl Signal {
    /// Creates a [`Signal::Halt`].
    pub fn halt(reason: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Halt {
            reason: reason.into(),
            value: value.into(),
        }
    }

    /// Creates a [`Signal::Prevent`].
    pub fn prevent(reason: impl Into<String>) -> Self {
        Self::Prevent {
            reason: reason.into(),
        }
    }

    /// Creates a [`Signal::AlterArgs`].
    pub fn alter_args(reason: impl Into<String>, args: Vec<Value>) -> Self {
        Self::AlterArgs {
            reason: reason.into(),
            args,
        }
    }

    /// Creates a [`Signal::AlterReturn`].
    pub fn alter_return(reason: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::AlterReturn {
            reason: reason.into(),
            value: value.into(),
        }
    }

    /// Returns the human-readable reason carried by every variant.
    pub fn reason(&self) -> &str {
        match self {
            Self::Halt { reason, .. }
            | Self::Prevent { reason }
            | Self::AlterArgs { reason, .. }
            | Self::AlterReturn { reason, .. } => reason,
        }
    }

    /// Returns the variant name, as used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Halt { .. } => "halt",
            Self::Prevent { .. } => "prevent",
            Self::AlterArgs { .. } => "alter_args",
            Self::AlterReturn { .. } => "alter_return",
        }
    }
}

/// Result of a before/after callback.
pub type HookResult = Result<Option<Signal>, BoxError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reason_and_kind() {
        let signals = [
            Signal::halt("done", 789),
            Signal::prevent("stop"),
            Signal::alter_args("swap", vec![json!(4), json!(5), json!(6)]),
            Signal::alter_return("shout", "X"),
        ];

        let kinds: Vec<_> = signals.iter().map(Signal::kind).collect();
        assert_eq!(kinds, ["halt", "prevent", "alter_args", "alter_return"]);

        let reasons: Vec<_> = signals.iter().map(Signal::reason).collect();
        assert_eq!(reasons, ["done", "stop", "swap", "shout"]);
    }

    #[test]
    fn test_serialized_form() {
        let value = serde_json::to_value(Signal::halt("r", 789)).unwrap();
        assert_eq!(value, json!({"kind": "halt", "reason": "r", "value": 789}));
    }
}
