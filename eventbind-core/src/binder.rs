//! Registration runtime
//!
//! An [`EventBinder`] is the resolved wiring table for one target type. It
//! is built once per type and then binds any number of target instances to
//! any number of buses.
//!
//! ```rust,ignore
//! #[event_binder]
//! impl ContactsPresenter {
//!     #[event_handler]
//!     fn on_contacts_loaded(&self, event: &ContactsLoaded) {
//!         self.view.show(&event.contacts);
//!     }
//! }
//!
//! let presenter = Arc::new(ContactsPresenter::new(view));
//! let mut handle = presenter.bind_event_handlers(&bus)?;
//!
//! // Later, when the presenter is torn down
//! handle.unbind();
//! ```

use crate::catalog::EventCatalog;
use crate::error::ResolveError;
use crate::handle::BindingHandle;
use crate::model::TypeModel;
use crate::resolver::{HandlerDescriptor, Resolver};
use dashmap::DashMap;
use eventbind_events::{Event, EventBus, EventCallback};
use once_cell::sync::Lazy;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Binders already resolved, one per target type
static BINDERS: Lazy<DashMap<TypeId, Arc<dyn Any + Send + Sync>>> = Lazy::new(DashMap::new);

/// A type whose methods can be bound to an event bus.
///
/// Implemented by `#[event_binder]`; can be implemented by hand with a
/// manually built [`TypeModel`].
pub trait EventTarget: Sized + Send + Sync + 'static {
    /// Declared methods of this type
    fn type_model() -> TypeModel<Self>;

    /// Subscribe every handler of this target on `bus`
    ///
    /// Resolves the type on first use and reuses the result afterwards.
    fn bind_event_handlers(self: &Arc<Self>, bus: &EventBus) -> Result<BindingHandle, ResolveError> {
        Ok(EventBinder::<Self>::shared()?.bind_event_handlers(self, bus))
    }
}

/// Resolved handlers of `T`, ready to subscribe.
pub struct EventBinder<T> {
    target_name: &'static str,
    descriptors: Arc<[HandlerDescriptor<T>]>,
}

impl<T: Send + Sync + 'static> EventBinder<T> {
    /// Resolve a registration table
    pub fn from_model(model: &TypeModel<T>) -> Result<Self, ResolveError> {
        Self::resolve_with(Resolver::new(), model)
    }

    /// Resolve a registration table whose explicit lists name events by string
    pub fn from_model_with_catalog(
        model: &TypeModel<T>,
        catalog: &EventCatalog,
    ) -> Result<Self, ResolveError> {
        Self::resolve_with(Resolver::new().with_catalog(catalog), model)
    }

    fn resolve_with(resolver: Resolver<'_>, model: &TypeModel<T>) -> Result<Self, ResolveError> {
        let descriptors = resolver.resolve(model)?;
        Ok(Self {
            target_name: model.name(),
            descriptors: descriptors.into(),
        })
    }

    pub fn target_name(&self) -> &'static str {
        self.target_name
    }

    pub fn descriptors(&self) -> &[HandlerDescriptor<T>] {
        &self.descriptors
    }

    /// Subscribe every resolved handler of `target` on `bus`.
    ///
    /// Handlers are subscribed in resolution order, and each handler once per
    /// event type it lists. Each call returns a new, independent handle.
    pub fn bind_event_handlers(&self, target: &Arc<T>, bus: &EventBus) -> BindingHandle {
        let mut handle = BindingHandle::new();

        for descriptor in self.descriptors.iter() {
            for event_type in descriptor.event_types() {
                let key = bus.key_for(event_type);
                let target = Arc::clone(target);
                let invoker = descriptor.invoker().clone();
                let callback: EventCallback =
                    Arc::new(move |event: &(dyn Event + 'static)| invoker(&*target, event));

                handle.push(bus.subscribe_key(key, callback));
            }
        }

        debug!(
            target_type = self.target_name,
            subscriptions = handle.len(),
            "Bound event handlers"
        );

        handle
    }
}

impl<T: EventTarget> EventBinder<T> {
    /// Resolve `T`'s generated model
    pub fn new() -> Result<Self, ResolveError> {
        Self::from_model(&T::type_model())
    }

    /// The process-wide binder for `T`, resolving it on first use.
    ///
    /// A failed resolution is returned as an error and not remembered.
    pub fn shared() -> Result<Arc<Self>, ResolveError> {
        let type_id = TypeId::of::<T>();

        if let Some(binder) = Self::cached(type_id) {
            return Ok(binder);
        }

        let binder = Arc::new(Self::new()?);
        let stored = BINDERS
            .entry(type_id)
            .or_insert_with(|| binder.clone() as Arc<dyn Any + Send + Sync>)
            .clone();

        // Another thread may have won the race; prefer its binder
        Ok(stored.downcast::<Self>().unwrap_or(binder))
    }

    fn cached(type_id: TypeId) -> Option<Arc<Self>> {
        let entry = BINDERS.get(&type_id)?.clone();
        entry.downcast::<Self>().ok()
    }
}

impl<T> Clone for EventBinder<T> {
    fn clone(&self) -> Self {
        Self {
            target_name: self.target_name,
            descriptors: self.descriptors.clone(),
        }
    }
}

impl<T> fmt::Debug for EventBinder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBinder")
            .field("target", &self.target_name)
            .field("descriptors", &self.descriptors)
            .finish()
    }
}
