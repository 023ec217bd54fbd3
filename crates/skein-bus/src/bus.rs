//! The event bus.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde_json::Value;
use skein_core::Publish;
use tracing::{debug, trace};

use crate::pattern::EventType;

/// A type-erased subscriber callback.
pub type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

/// Identifies one subscription on one bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscriber {
    id: SubscriptionId,
    once: bool,
    listener: Listener,
}

/// Subscribers registered under one normalised key.
struct Bucket {
    key: EventType,
    subscribers: Vec<Subscriber>,
}

/// A synchronous `channel:topic` publish/subscribe bus.
///
/// Delivery order is grouped by key, keys in the order they were first
/// subscribed to, subscribers in subscription order within a key.
///
/// Listeners run after the internal lock is released, so they may subscribe,
/// fire or detach on the same bus.
#[derive(Default)]
pub struct EventBus {
    buckets: Mutex<Vec<Bucket>>,
    next_id: AtomicU64,
}

impl EventBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes `f` to `event_type`.
    pub fn on<F>(&self, event_type: &str, f: F) -> SubscriptionId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.subscribe(event_type, Arc::new(f), false)
    }

    /// Subscribes `f` to `event_type` for a single delivery.
    pub fn once<F>(&self, event_type: &str, f: F) -> SubscriptionId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.subscribe(event_type, Arc::new(f), true)
    }

    /// Subscribes a pre-built listener.
    pub fn subscribe(&self, event_type: &str, listener: Listener, once: bool) -> SubscriptionId {
        let key = EventType::parse(event_type);
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let subscriber = Subscriber { id, once, listener };

        debug!(event = %key, once, "Subscribed");

        let mut buckets = self.buckets.lock();
        match buckets.iter_mut().find(|b| b.key == key) {
            Some(bucket) => bucket.subscribers.push(subscriber),
            None => buckets.push(Bucket {
                key,
                subscribers: vec![subscriber],
            }),
        }

        id
    }

    /// Delivers `payload` to every subscription selected by `event_type`.
    ///
    /// Returns the number of listeners called. One-shot subscriptions are
    /// dropped before their listener runs.
    pub fn fire(&self, event_type: &str, payload: &Value) -> usize {
        let pattern = EventType::parse(event_type);

        let listeners: Vec<Listener> = {
            let mut buckets = self.buckets.lock();
            let mut selected = Vec::new();
            for bucket in buckets.iter_mut().filter(|b| pattern.selects(&b.key)) {
                selected.extend(bucket.subscribers.iter().map(|s| Arc::clone(&s.listener)));
                bucket.subscribers.retain(|s| !s.once);
            }
            buckets.retain(|b| !b.subscribers.is_empty());
            selected
        };

        trace!(event = %pattern, listeners = listeners.len(), "Firing event");

        for listener in &listeners {
            listener(payload);
        }

        listeners.len()
    }

    /// Removes every subscription selected by `event_type`.
    ///
    /// Returns the number of subscriptions removed.
    pub fn detach(&self, event_type: &str) -> usize {
        let pattern = EventType::parse(event_type);
        let mut removed = 0;

        let mut buckets = self.buckets.lock();
        for bucket in buckets.iter_mut().filter(|b| pattern.selects(&b.key)) {
            removed += bucket.subscribers.len();
            bucket.subscribers.clear();
        }
        buckets.retain(|b| !b.subscribers.is_empty());

        debug!(event = %pattern, removed, "Detached");
        removed
    }

    /// Removes every subscription.
    pub fn detach_all(&self) -> usize {
        self.detach("*:*")
    }

    /// Removes a single subscription. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut buckets = self.buckets.lock();
        for bucket in buckets.iter_mut() {
            if let Some(pos) = bucket.subscribers.iter().position(|s| s.id == id) {
                bucket.subscribers.remove(pos);
                buckets.retain(|b| !b.subscribers.is_empty());
                return true;
            }
        }
        false
    }

    /// Returns the number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.buckets.lock().iter().map(|b| b.subscribers.len()).sum()
    }
}

impl Publish for EventBus {
    fn publish(&self, channel_topic: &str, payload: &Value) {
        self.fire(channel_topic, payload);
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    type Log = Arc<Mutex<Vec<String>>>;

    fn recorder(log: &Log, name: &'static str) -> impl Fn(&Value) + Send + Sync + 'static {
        let log = Arc::clone(log);
        move |payload: &Value| log.lock().push(format!("{name} {payload}"))
    }

    #[test]
    fn test_on_and_fire() {
        let bus = EventBus::new();
        let log: Log = Arc::default();

        bus.on("post:click", recorder(&log, "exact"));
        bus.on("post", recorder(&log, "channel"));
        bus.on(":click", recorder(&log, "topic"));
        bus.on("user:click", recorder(&log, "other"));

        assert_eq!(bus.fire("post:click", &json!(1)), 3);
        assert_eq!(*log.lock(), ["exact 1", "channel 1", "topic 1"]);
    }

    #[test]
    fn test_wildcard_fire_broadcasts() {
        let bus = EventBus::new();
        let log: Log = Arc::default();

        bus.on("post:click", recorder(&log, "post"));
        bus.on("user:click", recorder(&log, "user"));
        bus.on("user:change", recorder(&log, "change"));

        assert_eq!(bus.fire(":click", &json!("c")), 2);
        assert_eq!(bus.fire("", &json!("all")), 3);
        assert_eq!(
            *log.lock(),
            [r#"post "c""#, r#"user "c""#, r#"post "all""#, r#"user "all""#, r#"change "all""#]
        );
    }

    #[test]
    fn test_once_delivers_a_single_time() {
        let bus = EventBus::new();
        let log: Log = Arc::default();

        bus.on("post:click", recorder(&log, "on"));
        bus.once("post:click", recorder(&log, "once1"));
        bus.once("post:click", recorder(&log, "once2"));

        assert_eq!(bus.fire("post:click", &json!(1)), 3);
        assert_eq!(bus.fire("post:click", &json!(2)), 1);
        assert_eq!(*log.lock(), ["on 1", "once1 1", "once2 1", "on 2"]);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn test_detach_and_unsubscribe() {
        let bus = EventBus::new();
        let log: Log = Arc::default();

        let keep = bus.on("user:click", recorder(&log, "user"));
        bus.on("post:click", recorder(&log, "click"));
        bus.on("post:change", recorder(&log, "change"));

        assert_eq!(bus.detach("post"), 2);
        assert_eq!(bus.fire("*:*", &json!(0)), 1);

        assert!(bus.unsubscribe(keep));
        assert!(!bus.unsubscribe(keep));
        assert_eq!(bus.fire("*:*", &json!(0)), 0);
        assert_eq!(bus.detach_all(), 0);
    }

    #[test]
    fn test_emptied_keys_are_dropped() {
        let bus = EventBus::new();
        let log: Log = Arc::default();
        let bucket_count = |bus: &EventBus| bus.buckets.lock().len();

        bus.once("post:click", recorder(&log, "once"));
        bus.on("post:change", recorder(&log, "change"));
        let user = bus.on("user:click", recorder(&log, "user"));
        assert_eq!(bucket_count(&bus), 3);

        bus.fire("post:click", &json!(1));
        assert_eq!(bucket_count(&bus), 2);

        bus.detach("post");
        assert_eq!(bucket_count(&bus), 1);

        bus.unsubscribe(user);
        assert_eq!(bucket_count(&bus), 0);

        bus.on("post:click", recorder(&log, "again"));
        assert_eq!(bus.fire("post:click", &json!(2)), 1);
        assert_eq!(*log.lock(), ["once 1", "again 2"]);
    }

    #[test]
    fn test_listener_may_reenter() {
        let bus = Arc::new(EventBus::new());
        let log: Log = Arc::default();

        let inner = Arc::clone(&bus);
        let inner_log = Arc::clone(&log);
        bus.once("post:click", move |_| {
            inner.on("post:change", recorder(&inner_log, "late"));
            inner.fire("post:change", &json!("nested"));
        });

        bus.fire("post:click", &json!(null));
        assert_eq!(*log.lock(), [r#"late "nested""#]);
    }

    #[test]
    fn test_publish_fires() {
        let bus = EventBus::new();
        let log: Log = Arc::default();
        bus.on("chain:halt", recorder(&log, "halt"));

        let publisher: &dyn Publish = &bus;
        publisher.publish("chain:halt", &json!({"value": 789}));
        assert_eq!(*log.lock(), [r#"halt {"value":789}"#]);
    }
}
