//! Name lookup for event types referenced by string

use eventbind_events::{Event, EventTypeInfo};
use std::collections::HashMap;

/// Known event types, addressable by full type path or by bare type name.
#[derive(Debug, Clone, Default)]
pub struct EventCatalog {
    by_path: HashMap<&'static str, EventTypeInfo>,
    by_short_name: HashMap<&'static str, Vec<EventTypeInfo>>,
}

/// Outcome of a failed catalog lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupFailure {
    NotFound,
    /// The bare name matches more than one registered type
    Ambiguous,
}

impl EventCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<E: Event>(mut self) -> Self {
        self.insert(EventTypeInfo::of::<E>());
        self
    }

    pub fn insert(&mut self, info: EventTypeInfo) {
        if self.by_path.insert(info.name(), info).is_some() {
            return;
        }
        self.by_short_name
            .entry(info.short_name())
            .or_default()
            .push(info);
    }

    pub fn lookup(&self, name: &str) -> Result<EventTypeInfo, LookupFailure> {
        if let Some(info) = self.by_path.get(name) {
            return Ok(*info);
        }

        match self.by_short_name.get(name).map(Vec::as_slice) {
            Some([info]) => Ok(*info),
            Some([_, _, ..]) => Err(LookupFailure::Ambiguous),
            _ => Err(LookupFailure::NotFound),
        }
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }
}
