//! Handler resolution and registration runtime for eventbind
//!
//! Given the methods a target type declares, this crate decides which of
//! them handle which event types, then subscribes them on an
//! [`EventBus`](eventbind_events::EventBus) and hands back one handle that
//! removes them all.
//!
//! ## Features
//!
//! - **Type Models** - Declared methods, handler markers and inheritance
//! - **Resolution** - Override-aware, validated, deterministic wiring tables
//! - **Binding** - One subscription per handler and event type
//! - **Binding Handles** - Idempotent unbind of a whole bind pass
//!
//! ## Hand-written Models
//!
//! `#[event_binder]` generates [`EventTarget`] impls. Writing one by hand
//! looks like this:
//!
//! ```rust,ignore
//! use eventbind_core::*;
//!
//! impl EventTarget for Sidebar {
//!     fn type_model() -> TypeModel<Self> {
//!         TypeModel::new("Sidebar")
//!             .method(MethodDecl::new("on_contacts_loaded").handles_event(Sidebar::on_contacts_loaded))
//!             .method(
//!                 MethodDecl::new("refresh")
//!                     .handles_none(Sidebar::refresh)
//!                     .annotated(HandlerAnnotation::handles([
//!                         EventRef::of::<ContactsLoaded>(),
//!                         EventRef::of::<ContactsCleared>(),
//!                     ])),
//!             )
//!     }
//! }
//!
//! let sidebar = Arc::new(Sidebar::default());
//! let mut handle = sidebar.bind_event_handlers(&bus)?;
//! handle.unbind();
//! ```

pub mod binder;
pub mod catalog;
pub mod error;
pub mod handle;
pub mod model;
pub mod resolver;

pub use binder::{EventBinder, EventTarget};
pub use catalog::{EventCatalog, LookupFailure};
pub use error::ResolveError;
pub use handle::{BindingHandle, BindingState};
pub use model::{EventRef, HandlerAnnotation, Invoker, MethodDecl, MethodSignature, ParamType, TypeModel};
pub use resolver::{HandlerDescriptor, Resolver, resolve};
