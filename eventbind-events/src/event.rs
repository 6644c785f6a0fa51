//! Event definitions and traits

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::fmt::Debug;
use uuid::Uuid;

/// Upcast to `Any` for downcasting.
///
/// Implemented for every `'static` type, so events never write it by hand.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Event trait
///
/// All events must implement this trait to be published through the event bus.
/// The runtime type of the value is what subscribers are keyed on.
///
/// ```rust,ignore
/// #[derive(Debug)]
/// struct ContactsLoaded;
///
/// impl Event for ContactsLoaded {}
/// ```
pub trait Event: AsAny + Send + Sync + Debug {
    /// Get event name
    fn event_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Optional metadata carried by the event
    fn metadata(&self) -> Option<&EventMetadata> {
        None
    }
}

/// Base event metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique event ID
    pub id: Uuid,

    /// Event name/type
    pub name: String,

    /// Timestamp when event was created
    pub timestamp: DateTime<Utc>,

    /// Optional correlation ID for tracing
    pub correlation_id: Option<Uuid>,

    /// Optional causation ID (ID of the event that caused this event)
    pub causation_id: Option<Uuid>,

    /// Custom metadata
    pub metadata: serde_json::Value,
}

impl EventMetadata {
    /// Create new event metadata
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            timestamp: Utc::now(),
            correlation_id: None,
            causation_id: None,
            metadata: serde_json::Value::Object(serde_json::Map::new()),
        }
    }

    /// Set correlation ID
    pub fn with_correlation_id(mut self, id: Uuid) -> Self {
        self.correlation_id = Some(id);
        self
    }

    /// Set causation ID
    pub fn with_causation_id(mut self, id: Uuid) -> Self {
        self.causation_id = Some(id);
        self
    }

    /// Attach a custom metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        if let serde_json::Value::Object(map) = &mut self.metadata {
            map.insert(key.into(), value);
        }
        self
    }
}

/// Static description of an event type.
///
/// Two infos are equal when they describe the same Rust type.
#[derive(Debug, Clone, Copy)]
pub struct EventTypeInfo {
    type_id: TypeId,
    name: &'static str,
    is_abstract: bool,
}

impl EventTypeInfo {
    /// Info for a concrete event type
    pub fn of<E: Event>() -> Self {
        Self {
            type_id: TypeId::of::<E>(),
            name: std::any::type_name::<E>(),
            is_abstract: false,
        }
    }

    /// Info for the base event contract, `dyn Event`.
    ///
    /// No value has this runtime type, so it can never be subscribed to directly.
    pub fn base() -> Self {
        Self {
            type_id: TypeId::of::<dyn Event>(),
            name: std::any::type_name::<dyn Event>(),
            is_abstract: true,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Last path segment of the type name, without generic arguments
    pub fn short_name(&self) -> &'static str {
        let path = self.name.split('<').next().unwrap_or(self.name);
        path.rsplit("::").next().unwrap_or(path)
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Whether a value of this type can be handed to a handler declared
    /// with `target` as its parameter type.
    pub fn is_assignable_to(&self, target: &EventTypeInfo) -> bool {
        self.type_id == target.type_id || target.type_id == TypeId::of::<dyn Event>()
    }
}

impl PartialEq for EventTypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for EventTypeInfo {}

/// A type a handler method may take by reference.
///
/// Implemented for every concrete [`Event`] and for `dyn Event`. Generated
/// handler thunks use [`HandlerParam::cast`] to turn the delivered event back
/// into the declared parameter type.
pub trait HandlerParam: 'static {
    fn event_type() -> EventTypeInfo;

    fn cast<'a>(event: &'a (dyn Event + 'static)) -> Option<&'a Self>;
}

impl<E: Event> HandlerParam for E {
    fn event_type() -> EventTypeInfo {
        EventTypeInfo::of::<E>()
    }

    fn cast<'a>(event: &'a (dyn Event + 'static)) -> Option<&'a Self> {
        event.as_any().downcast_ref::<E>()
    }
}

impl HandlerParam for dyn Event {
    fn event_type() -> EventTypeInfo {
        EventTypeInfo::base()
    }

    fn cast<'a>(event: &'a (dyn Event + 'static)) -> Option<&'a Self> {
        Some(event)
    }
}
