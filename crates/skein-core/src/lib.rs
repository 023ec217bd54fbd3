//! # Skein Core
//!
//! The interceptor chain engine of the Skein advice framework.
//!
//! A [`Handler`] wraps a target operation ([`Method`]) with a chain of
//! [`Advice`]. Each advice runs before the call, after the call, or around
//! the whole call, and steers the chain by returning a [`Signal`].
//!
//! ## Onion Ordering
//!
//! Every [`Handler::add`] wraps the current head in a new [`Executor`], so the
//! advice added last runs outermost on both legs:
//!
//! ```text
//!  exec(args)
//!     │
//!     ▼
//! ┌──────────── V3 ────────────┐
//! │ ┌────────── V2 ──────────┐ │
//! │ │ ┌──────── V1 ────────┐ │ │
//! │ │ │      Method        │ │ │
//! │ │ └────────────────────┘ │ │
//! │ └────────────────────────┘ │
//! └────────────────────────────┘
//!  before: V3 → V2 → V1 → target
//!  after:  target → V1 → V2 → V3
//! ```
//!
//! ## Example
//!
//! ```rust
//! use serde_json::json;
//! use skein_core::{Handler, Method, Signal};
//!
//! let target = Method::from_fn("greet", |_args| Ok(json!("hello world")));
//! let mut handler = Handler::new(target);
//!
//! handler
//!     .after(|_, jp| {
//!         assert_eq!(jp.result(), Some(&json!("hello world")));
//!         Ok(Some(Signal::alter_return("shout", "HELLO WORLD")))
//!     }, ())
//!     .unwrap();
//!
//! assert_eq!(handler.exec(&[]).unwrap(), json!("HELLO WORLD"));
//! ```

pub mod advice;
pub mod error;
pub mod executor;
pub mod handler;
pub mod invoke;
pub mod method;
pub mod publish;
pub mod signal;

pub use advice::{Advice, AdviceId, Callback, Joinpoint, Mode, Phase};
pub use error::{AdviceError, AdviceResult};
pub use executor::{Advices, Chain, Executor};
pub use handler::{Handler, HandlerOptions};
pub use invoke::{BoxError, Invoke, InvokeResult, Value};
pub use method::{Method, Operation, Resolve};
pub use publish::Publish;
pub use signal::{HookResult, Signal};

/// Prelude for common imports.
pub mod prelude {
    pub use super::{
        Advice, Callback, Chain, Handler, HandlerOptions, HookResult, Invoke, InvokeResult,
        Joinpoint, Method, Mode, Operation, Phase, Publish, Resolve, Signal, Value,
    };
}
