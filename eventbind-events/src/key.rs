//! Event type keys
//!
//! A key is the token subscribers are filed under. Every event type maps to
//! exactly one key for the lifetime of a registry, and keys compare by
//! identity, so two lookups for the same type always land on the same
//! subscriber list.

use crate::event::{Event, EventTypeInfo};
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

static GLOBAL_REGISTRY: Lazy<EventTypeRegistry> = Lazy::new(EventTypeRegistry::new);

static NEXT_KEY_ID: AtomicU64 = AtomicU64::new(1);

struct KeyInner {
    id: u64,
    info: EventTypeInfo,
}

/// Unique key for one event type.
#[derive(Clone)]
pub struct EventTypeKey {
    inner: Arc<KeyInner>,
}

impl EventTypeKey {
    fn new(info: EventTypeInfo) -> Self {
        Self {
            inner: Arc::new(KeyInner {
                id: NEXT_KEY_ID.fetch_add(1, Ordering::Relaxed),
                info,
            }),
        }
    }

    /// Key for `E` in the process-wide registry
    pub fn of<E: Event>() -> Self {
        EventTypeRegistry::global().key_of::<E>()
    }

    /// Process-unique numeric id, useful in logs
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn name(&self) -> &'static str {
        self.inner.info.name()
    }

    pub fn info(&self) -> &EventTypeInfo {
        &self.inner.info
    }
}

impl PartialEq for EventTypeKey {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for EventTypeKey {}

impl Hash for EventTypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.inner), state);
    }
}

impl fmt::Debug for EventTypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventTypeKey")
            .field("id", &self.inner.id)
            .field("name", &self.inner.info.name())
            .finish()
    }
}

/// Type to key cache with create-if-absent semantics.
///
/// Only the process-wide instance is reachable from outside this crate, so
/// every key handed to a bus is the one dispatch looks up.
pub struct EventTypeRegistry {
    keys: DashMap<TypeId, EventTypeKey>,
}

impl EventTypeRegistry {
    pub(crate) fn new() -> Self {
        Self {
            keys: DashMap::new(),
        }
    }

    /// The registry shared by every bus in the process
    pub fn global() -> &'static EventTypeRegistry {
        &GLOBAL_REGISTRY
    }

    /// Get the key for an event type, creating it on first use.
    ///
    /// Concurrent callers racing on the same type all receive the key that
    /// won the insert.
    pub fn key_for(&self, info: &EventTypeInfo) -> EventTypeKey {
        if let Some(key) = self.keys.get(&info.type_id()) {
            return key.clone();
        }

        self.keys
            .entry(info.type_id())
            .or_insert_with(|| {
                let key = EventTypeKey::new(*info);
                trace!(key = key.id(), event_type = info.name(), "Created event type key");
                key
            })
            .clone()
    }

    pub fn key_of<E: Event>(&self) -> EventTypeKey {
        self.key_for(&EventTypeInfo::of::<E>())
    }

    /// Existing key for a type, without creating one
    pub fn get(&self, type_id: TypeId) -> Option<EventTypeKey> {
        self.keys.get(&type_id).map(|key| key.clone())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
