//! In-process event delivery for eventbind
//!
//! This crate is the delivery substrate the binder subscribes handlers on.
//!
//! ## Features
//!
//! - **Event Bus** - Synchronous publish/subscribe keyed by event type
//! - **Event Type Keys** - One stable key per event type, process-wide
//! - **Subscription Tokens** - Each subscription can be removed on its own
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use eventbind_events::*;
//!
//! #[derive(Debug)]
//! struct ContactsLoaded {
//!     count: usize,
//! }
//!
//! impl Event for ContactsLoaded {}
//!
//! let bus = EventBus::new();
//! let token = bus.subscribe(|event: &ContactsLoaded| {
//!     println!("loaded {} contacts", event.count);
//! });
//!
//! bus.publish(ContactsLoaded { count: 3 });
//! token.remove();
//! ```
//!
//! ## Type-erased Subscriptions
//!
//! ```rust,ignore
//! let key = bus.key_of::<ContactsLoaded>();
//! let token = bus.subscribe_key(key, Arc::new(|event: &(dyn Event + 'static)| {
//!     println!("got {}", event.event_name());
//! }));
//! ```
//!
//! ## Configuration
//!
//! ```rust,ignore
//! let bus = EventBusBuilder::new()
//!     .enable_logging(true)           // Log subscriptions and publishes
//!     .warn_on_unhandled(true)        // Warn on events nobody listens to
//!     .build();
//! ```

pub mod bus;
pub mod event;
pub mod key;

pub use bus::{EventBus, EventBusBuilder, EventBusConfig, EventCallback, SubscriptionToken};
pub use event::{AsAny, Event, EventMetadata, EventTypeInfo, HandlerParam};
pub use key::{EventTypeKey, EventTypeRegistry};
