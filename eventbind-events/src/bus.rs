//! Event Bus implementation

use crate::event::{Event, EventTypeInfo};
use crate::key::{EventTypeKey, EventTypeRegistry};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::any::TypeId;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

/// Callback invoked with the type-erased event on publish
pub type EventCallback = Arc<dyn Fn(&(dyn Event + 'static)) + Send + Sync>;

type SubscriberMap = DashMap<EventTypeKey, Vec<Subscriber>>;

#[derive(Clone)]
struct Subscriber {
    id: u64,
    callback: EventCallback,
}

/// Event bus for in-process event publishing and handling
///
/// Publishing is synchronous: every callback subscribed under the event's
/// key runs on the calling thread, in the order it was subscribed.
#[derive(Clone)]
pub struct EventBus {
    /// Subscribers registered for each event key
    handlers: Arc<SubscriberMap>,

    /// Source of subscriber ids
    next_id: Arc<AtomicU64>,

    /// Configuration
    config: Arc<EventBusConfig>,
}

/// Event bus configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventBusConfig {
    /// Enable event logging
    pub enable_logging: bool,

    /// Warn when an event is published with no subscribers
    pub warn_on_unhandled: bool,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            enable_logging: true,
            warn_on_unhandled: false,
        }
    }
}

impl EventBus {
    /// Create new event bus
    pub fn new() -> Self {
        Self::with_config(EventBusConfig::default())
    }

    /// Create event bus with custom config
    pub fn with_config(config: EventBusConfig) -> Self {
        Self {
            handlers: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(1)),
            config: Arc::new(config),
        }
    }

    pub fn builder() -> EventBusBuilder {
        EventBusBuilder::new()
    }

    pub fn config(&self) -> &EventBusConfig {
        &self.config
    }

    /// Get or create the key for an event type
    pub fn key_for(&self, info: &EventTypeInfo) -> EventTypeKey {
        EventTypeRegistry::global().key_for(info)
    }

    pub fn key_of<E: Event>(&self) -> EventTypeKey {
        EventTypeRegistry::global().key_of::<E>()
    }

    /// Subscribe a type-erased callback under a key
    ///
    /// The subscription is filed under the process-wide key for the key's
    /// event type. The returned token removes exactly this subscription.
    pub fn subscribe_key(&self, key: EventTypeKey, callback: EventCallback) -> SubscriptionToken {
        let key = self.key_for(key.info());
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        self.handlers
            .entry(key.clone())
            .or_default()
            .push(Subscriber { id, callback });

        if self.config.enable_logging {
            debug!(
                subscription = id,
                key = key.id(),
                "Subscribed handler for event type: {}",
                key.name()
            );
        }

        SubscriptionToken {
            handlers: Arc::downgrade(&self.handlers),
            key,
            id,
            removed: AtomicBool::new(false),
            log: self.config.enable_logging,
        }
    }

    /// Subscribe a typed callback to an event type
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let bus = EventBus::new();
    /// let token = bus.subscribe(|event: &ContactsLoaded| println!("{:?}", event));
    /// ```
    pub fn subscribe<E, F>(&self, handler: F) -> SubscriptionToken
    where
        E: Event,
        F: Fn(&E) + Send + Sync + 'static,
    {
        let callback: EventCallback = Arc::new(move |event: &(dyn Event + 'static)| {
            if let Some(typed_event) = event.as_any().downcast_ref::<E>() {
                handler(typed_event);
            }
        });

        self.subscribe_key(self.key_of::<E>(), callback)
    }

    /// Publish an event
    ///
    /// All callbacks registered for this event type are invoked.
    pub fn publish<E: Event>(&self, event: E) {
        self.dispatch(TypeId::of::<E>(), &event);
    }

    /// Publish an event whose concrete type is only known at runtime
    pub fn publish_dyn(&self, event: &(dyn Event + 'static)) {
        self.dispatch(event.as_any().type_id(), event);
    }

    fn dispatch(&self, type_id: TypeId, event: &(dyn Event + 'static)) {
        if self.config.enable_logging {
            match event.metadata() {
                Some(metadata) => info!(
                    "Publishing event: {} (id: {})",
                    event.event_name(),
                    metadata.id
                ),
                None => info!("Publishing event: {}", event.event_name()),
            }
        }

        // Snapshot so callbacks can subscribe, unsubscribe or publish
        let subscribers = EventTypeRegistry::global()
            .get(type_id)
            .and_then(|key| self.handlers.get(&key).map(|subs| subs.clone()))
            .unwrap_or_default();

        if subscribers.is_empty() {
            if self.config.warn_on_unhandled {
                warn!("No handlers registered for event: {}", event.event_name());
            }
            return;
        }

        for subscriber in &subscribers {
            (subscriber.callback)(event);
        }

        if self.config.enable_logging {
            debug!(
                handlers = subscribers.len(),
                "Event published successfully: {}",
                event.event_name()
            );
        }
    }

    /// Unsubscribe all handlers for an event type
    pub fn unsubscribe_all<E: Event>(&self) {
        let key = self.key_of::<E>();
        self.handlers.remove(&key);

        if self.config.enable_logging {
            debug!("Unsubscribed all handlers for event type: {}", key.name());
        }
    }

    /// Clear all handlers
    pub fn clear(&self) {
        self.handlers.clear();
        if self.config.enable_logging {
            info!("Cleared all event handlers");
        }
    }

    /// Get handler count for an event type
    pub fn handler_count<E: Event>(&self) -> usize {
        let key = self.key_of::<E>();
        self.handlers.get(&key).map(|h| h.len()).unwrap_or(0)
    }

    /// Total number of live subscriptions across every event type
    pub fn total_handlers(&self) -> usize {
        self.handlers.iter().map(|entry| entry.value().len()).sum()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("event_types", &self.handlers.len())
            .field("config", &self.config)
            .finish()
    }
}

/// Removal capability for one subscription.
///
/// Holds only a weak reference to the bus, so a token outliving its bus is
/// harmless.
pub struct SubscriptionToken {
    handlers: Weak<SubscriberMap>,
    key: EventTypeKey,
    id: u64,
    removed: AtomicBool,
    log: bool,
}

impl SubscriptionToken {
    /// Remove the subscription. Calling this again does nothing.
    pub fn remove(&self) {
        if self.removed.swap(true, Ordering::AcqRel) {
            return;
        }

        let Some(handlers) = self.handlers.upgrade() else {
            return;
        };

        if let Some(mut subscribers) = handlers.get_mut(&self.key) {
            subscribers.retain(|subscriber| subscriber.id != self.id);
        }
        handlers.remove_if(&self.key, |_, subscribers| subscribers.is_empty());

        if self.log {
            debug!(
                subscription = self.id,
                key = self.key.id(),
                "Removed handler for event type: {}",
                self.key.name()
            );
        }
    }

    pub fn key(&self) -> &EventTypeKey {
        &self.key
    }

    pub fn is_removed(&self) -> bool {
        self.removed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for SubscriptionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionToken")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("removed", &self.is_removed())
            .finish()
    }
}

/// Event bus builder
pub struct EventBusBuilder {
    config: EventBusConfig,
}

impl EventBusBuilder {
    /// Create new event bus builder
    pub fn new() -> Self {
        Self {
            config: EventBusConfig::default(),
        }
    }

    /// Enable/disable logging
    pub fn enable_logging(mut self, enabled: bool) -> Self {
        self.config.enable_logging = enabled;
        self
    }

    /// Enable/disable the warning for events nobody handles
    pub fn warn_on_unhandled(mut self, enabled: bool) -> Self {
        self.config.warn_on_unhandled = enabled;
        self
    }

    /// Build the event bus
    pub fn build(self) -> EventBus {
        EventBus::with_config(self.config)
    }
}

impl Default for EventBusBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventMetadata;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicU32;

    #[derive(Debug, Clone)]
    struct TestEvent {
        metadata: EventMetadata,
        message: String,
    }

    impl TestEvent {
        fn new(message: &str) -> Self {
            Self {
                metadata: EventMetadata::new("test_event"),
                message: message.to_string(),
            }
        }
    }

    impl Event for TestEvent {
        fn event_name(&self) -> &str {
            &self.metadata.name
        }

        fn metadata(&self) -> Option<&EventMetadata> {
            Some(&self.metadata)
        }
    }

    #[derive(Debug)]
    struct UnrelatedEvent;
    impl Event for UnrelatedEvent {}

    #[derive(Debug)]
    struct NeverSubscribedEvent;
    impl Event for NeverSubscribedEvent {}

    fn counter() -> (Arc<AtomicU32>, impl Fn(&TestEvent) + Send + Sync + 'static) {
        let count = Arc::new(AtomicU32::new(0));
        let handle = count.clone();
        (count, move |_: &TestEvent| {
            handle.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_event_bus_publish() {
        let bus = EventBus::new();
        let (count, handler) = counter();
        let _token = bus.subscribe(handler);

        bus.publish(TestEvent::new("Hello"));
        assert_eq!(count.load(Ordering::SeqCst), 1);

        bus.publish(UnrelatedEvent);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handlers_run_in_subscription_order() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut tokens = Vec::new();
        for n in 0..3 {
            let order = order.clone();
            tokens.push(bus.subscribe(move |_: &TestEvent| order.lock().unwrap().push(n)));
        }

        bus.publish(TestEvent::new("ordered"));
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_typed_payload_reaches_handler() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(String::new()));
        let sink = seen.clone();
        let _token = bus.subscribe(move |event: &TestEvent| {
            *sink.lock().unwrap() = event.message.clone();
        });

        bus.publish(TestEvent::new("payload"));
        assert_eq!(*seen.lock().unwrap(), "payload");
    }

    #[test]
    fn test_token_removes_only_its_subscription() {
        let bus = EventBus::new();
        let (first, first_handler) = counter();
        let (second, second_handler) = counter();

        let first_token = bus.subscribe(first_handler);
        let _second_token = bus.subscribe(second_handler);
        assert_eq!(bus.handler_count::<TestEvent>(), 2);

        first_token.remove();
        assert!(first_token.is_removed());
        assert_eq!(bus.handler_count::<TestEvent>(), 1);

        bus.publish(TestEvent::new("after remove"));
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_token_remove_is_idempotent() {
        let bus = EventBus::new();
        let (count, handler) = counter();
        let token = bus.subscribe(handler);

        token.remove();
        token.remove();

        bus.publish(TestEvent::new("ignored"));
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(bus.total_handlers(), 0);
    }

    #[test]
    fn test_token_outliving_bus() {
        let bus = EventBus::new();
        let (_count, handler) = counter();
        let token = bus.subscribe(handler);
        drop(bus);

        token.remove();
        assert!(token.is_removed());
    }

    #[test]
    fn test_publish_dyn_uses_runtime_type() {
        let bus = EventBus::new();
        let (count, handler) = counter();
        let _token = bus.subscribe(handler);

        let event: Box<dyn Event> = Box::new(TestEvent::new("boxed"));
        bus.publish_dyn(event.as_ref());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_key_from_another_registry_is_rekeyed() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicU32::new(0));
        let sink = hits.clone();
        let callback: EventCallback = Arc::new(move |_: &(dyn Event + 'static)| {
            sink.fetch_add(1, Ordering::SeqCst);
        });

        let foreign = EventTypeRegistry::new().key_of::<TestEvent>();
        let token = bus.subscribe_key(foreign.clone(), callback);
        assert_ne!(*token.key(), foreign);
        assert_eq!(*token.key(), EventTypeKey::of::<TestEvent>());
        assert_eq!(bus.handler_count::<TestEvent>(), 1);

        bus.publish(TestEvent::new("rekeyed"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        token.remove();
        assert_eq!(bus.total_handlers(), 0);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::builder().warn_on_unhandled(true).build();
        bus.publish(NeverSubscribedEvent);
        assert_eq!(bus.handler_count::<NeverSubscribedEvent>(), 0);
    }

    #[test]
    fn test_callback_may_unsubscribe_itself() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicU32::new(0));
        let slot: Arc<Mutex<Option<SubscriptionToken>>> = Arc::new(Mutex::new(None));

        let token = {
            let count = count.clone();
            let slot = slot.clone();
            bus.subscribe(move |_: &TestEvent| {
                count.fetch_add(1, Ordering::SeqCst);
                if let Some(token) = slot.lock().unwrap().as_ref() {
                    token.remove();
                }
            })
        };
        *slot.lock().unwrap() = Some(token);

        bus.publish(TestEvent::new("once"));
        bus.publish(TestEvent::new("twice"));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_buses_are_isolated() {
        let bus_a = EventBus::new();
        let bus_b = EventBus::new();
        let (count, handler) = counter();
        let _token = bus_a.subscribe(handler);

        bus_b.publish(TestEvent::new("elsewhere"));
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(bus_a.key_of::<TestEvent>(), bus_b.key_of::<TestEvent>());
    }

    #[test]
    fn test_unsubscribe_all_and_clear() {
        let bus = EventBus::new();
        let _a = bus.subscribe(counter().1);
        let _b = bus.subscribe(|_: &UnrelatedEvent| {});

        bus.unsubscribe_all::<TestEvent>();
        assert_eq!(bus.handler_count::<TestEvent>(), 0);
        assert_eq!(bus.handler_count::<UnrelatedEvent>(), 1);

        bus.clear();
        assert_eq!(bus.total_handlers(), 0);
    }

    #[test]
    fn test_config_deserialize_defaults() {
        let config: EventBusConfig =
            serde_json::from_str(r#"{ "warn_on_unhandled": true }"#).unwrap();
        assert!(config.enable_logging);
        assert!(config.warn_on_unhandled);

        let bus = EventBus::builder().enable_logging(false).build();
        assert!(!bus.config().enable_logging);
    }
}
