//! The notification capability advice may use.
//!
//! The chain engine never calls this itself. It exists so advice can emit
//! `channel:topic` notifications without depending on a concrete bus; the
//! `skein-bus` crate provides one.

use std::sync::Arc;

use crate::invoke::Value;

/// Something that accepts `channel:topic` notifications.
pub trait Publish: Send + Sync {
    /// Publishes `payload` under `channel_topic`.
    ///
    /// Either segment of `channel_topic` may be `*`.
    fn publish(&self, channel_topic: &str, payload: &Value);
}

impl<T: Publish + ?Sized> Publish for Arc<T> {
    fn publish(&self, channel_topic: &str, payload: &Value) {
        (**self).publish(channel_topic, payload)
    }
}

impl<T: Publish + ?Sized> Publish for &T {
    fn publish(&self, channel_topic: &str, payload: &Value) {
        (**self).publish(channel_topic, payload)
    }
}
