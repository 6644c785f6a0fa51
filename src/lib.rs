// eventbind - declarative event handler binding for Rust
//
// Handler methods are marked with attributes, resolved once per type, and
// subscribed on a typed in-process event bus behind a single unbind handle.

//! ## Quick Start
//!
//! ```rust,ignore
//! use eventbind::prelude::*;
//! use std::sync::Arc;
//!
//! #[derive(Debug)]
//! struct ContactsLoaded;
//! impl Event for ContactsLoaded {}
//!
//! #[derive(Default)]
//! struct Sidebar;
//!
//! #[event_binder]
//! impl Sidebar {
//!     #[event_handler]
//!     fn on_contacts_loaded(&self, _event: &ContactsLoaded) {}
//! }
//!
//! let bus = EventBus::new();
//! let sidebar = Arc::new(Sidebar::default());
//! let mut handle = sidebar.bind_event_handlers(&bus)?;
//!
//! bus.publish(ContactsLoaded);
//! handle.unbind();
//! ```

// Re-export core functionality
pub use eventbind_core::*;

// Re-export the delivery substrate
pub use eventbind_events::*;

// Re-export procedural macros
pub use eventbind_macro::{event_binder, event_handler};

/// Everything needed to declare, bind and publish
pub mod prelude {
    pub use crate::{
        BindingHandle, BindingState, Event, EventBinder, EventBus, EventBusBuilder,
        EventBusConfig, EventTarget, ResolveError, SubscriptionToken, event_binder,
        event_handler,
    };
}
