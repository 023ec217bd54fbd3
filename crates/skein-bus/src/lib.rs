//! # Skein Bus
//!
//! A synchronous publish/subscribe bus keyed by `channel:topic` strings.
//!
//! Either segment may be the wildcard `*`, on either side:
//!
//! | Type | Normalised | Receives |
//! |---|---|---|
//! | `""`, `"*"`, `":"`, `"*:"`, `":*"` | `*:*` | everything |
//! | `":click"`, `"*:click"` | `*:click` | `click` on any channel |
//! | `"post"`, `"post:"`, `"post:*"` | `post:*` | any topic on `post` |
//! | `"post:click"` | `post:click` | exactly `post:click` |
//!
//! The bus implements [`skein_core::Publish`], so advice can notify it
//! without knowing the concrete type.
//!
//! ```rust
//! use serde_json::json;
//! use skein_bus::EventBus;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let bus = EventBus::new();
//! let hits = Arc::new(AtomicUsize::new(0));
//!
//! let h = Arc::clone(&hits);
//! bus.on("post:*", move |_| {
//!     h.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! bus.fire("post:click", &json!({"x": 1}));
//! bus.fire("user:click", &json!(null));
//! assert_eq!(hits.load(Ordering::SeqCst), 1);
//! ```

pub mod bus;
pub mod pattern;

pub use bus::{EventBus, Listener, SubscriptionId};
pub use pattern::EventType;
