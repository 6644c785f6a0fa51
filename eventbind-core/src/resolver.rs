//! Binding resolution
//!
//! Turns a [`TypeModel`] into the ordered wiring table the registration
//! runtime subscribes from. Resolution is pure and deterministic: the same
//! model always yields the same descriptors, in the same order.
//!
//! Rules, per handler method (most-derived first, overrides already
//! resolved by the model):
//!
//! - one event parameter, no explicit list: bound to the parameter's type,
//!   which must be concrete
//! - explicit list: bound to each listed type in order, replacing the
//!   implicit binding; each listed type must be concrete and, when the
//!   method takes a parameter, assignable to it
//! - no parameter: an explicit list is required
//! - two or more parameters: rejected
//!
//! The first violation aborts resolution for the whole type.

use crate::catalog::{EventCatalog, LookupFailure};
use crate::error::ResolveError;
use crate::model::{EventRef, HandlerAnnotation, Invoker, MethodDecl, MethodSignature, TypeModel};
use eventbind_events::{Event, EventTypeInfo};
use std::fmt;
use tracing::{debug, error};

/// One resolved handler: a method and the event types it is wired to.
pub struct HandlerDescriptor<T> {
    signature: MethodSignature,
    declared_by: &'static str,
    event_types: Vec<EventTypeInfo>,
    invoker: Invoker<T>,
}

impl<T> HandlerDescriptor<T> {
    pub fn signature(&self) -> &MethodSignature {
        &self.signature
    }

    pub fn method(&self) -> &'static str {
        self.signature.name()
    }

    pub fn declared_by(&self) -> &'static str {
        self.declared_by
    }

    /// Event types this handler is subscribed for, never empty
    pub fn event_types(&self) -> &[EventTypeInfo] {
        &self.event_types
    }

    pub fn invoker(&self) -> &Invoker<T> {
        &self.invoker
    }

    pub fn invoke(&self, target: &T, event: &(dyn Event + 'static)) {
        (self.invoker)(target, event)
    }
}

impl<T> Clone for HandlerDescriptor<T> {
    fn clone(&self) -> Self {
        Self {
            signature: self.signature.clone(),
            declared_by: self.declared_by,
            event_types: self.event_types.clone(),
            invoker: self.invoker.clone(),
        }
    }
}

impl<T> fmt::Debug for HandlerDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let events: Vec<_> = self.event_types.iter().map(EventTypeInfo::name).collect();
        f.debug_struct("HandlerDescriptor")
            .field("method", &self.signature.to_string())
            .field("declared_by", &self.declared_by)
            .field("event_types", &events)
            .finish()
    }
}

/// Resolver with optional name lookup for [`EventRef::Named`] entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct Resolver<'a> {
    catalog: Option<&'a EventCatalog>,
}

impl<'a> Resolver<'a> {
    pub fn new() -> Self {
        Self { catalog: None }
    }

    pub fn with_catalog(mut self, catalog: &'a EventCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn resolve<T: 'static>(
        &self,
        model: &TypeModel<T>,
    ) -> Result<Vec<HandlerDescriptor<T>>, ResolveError> {
        let mut descriptors = Vec::new();

        for method in model.inheritable_methods() {
            let Some(annotation) = method.annotation() else {
                continue;
            };

            match self.resolve_method(method, annotation) {
                Ok(descriptor) => descriptors.push(descriptor),
                Err(err) => {
                    error!(
                        target_type = model.name(),
                        method = method.name(),
                        "{}",
                        err
                    );
                    return Err(err);
                }
            }
        }

        debug!(
            target_type = model.name(),
            handlers = descriptors.len(),
            "Resolved event handlers"
        );

        Ok(descriptors)
    }

    fn resolve_method<T: 'static>(
        &self,
        method: &MethodDecl<T>,
        annotation: &HandlerAnnotation,
    ) -> Result<HandlerDescriptor<T>, ResolveError> {
        let declared_by = method.declared_by().to_string();
        let name = method.name().to_string();
        let params = method.params();

        if params.len() > 1 {
            return Err(ResolveError::Arity {
                declared_by,
                method: name,
                count: params.len(),
            });
        }

        // Event type of the single parameter, if there is one
        let param = match params.first() {
            Some(param) => match param.event_type() {
                Some(info) => Some(info),
                None => {
                    return Err(ResolveError::NotAnEvent {
                        declared_by,
                        method: name,
                        param: param.type_name().to_string(),
                    });
                }
            },
            None => None,
        };

        let event_types = if annotation.is_explicit() {
            let mut listed = Vec::with_capacity(annotation.events().len());
            for event_ref in annotation.events() {
                let info = self.lookup(method, event_ref)?;

                if info.is_abstract() {
                    return Err(ResolveError::AbstractEvent {
                        declared_by,
                        method: name,
                        event: info.name().to_string(),
                    });
                }

                if let Some(param) = &param
                    && !info.is_assignable_to(param)
                {
                    return Err(ResolveError::NotAssignable {
                        declared_by,
                        method: name,
                        event: info.name().to_string(),
                        param: param.name().to_string(),
                    });
                }

                listed.push(info);
            }
            listed
        } else {
            match param {
                None => {
                    return Err(ResolveError::MissingEventList {
                        declared_by,
                        method: name,
                    });
                }
                Some(info) if info.is_abstract() => {
                    return Err(ResolveError::AbstractParameter {
                        declared_by,
                        method: name,
                        param: info.name().to_string(),
                    });
                }
                Some(info) => vec![info],
            }
        };

        let Some(invoker) = method.invoker().cloned() else {
            return Err(ResolveError::MissingInvoker {
                declared_by,
                method: name,
            });
        };

        Ok(HandlerDescriptor {
            signature: method.signature(),
            declared_by: method.declared_by(),
            event_types,
            invoker,
        })
    }

    fn lookup<T: 'static>(
        &self,
        method: &MethodDecl<T>,
        event_ref: &EventRef,
    ) -> Result<EventTypeInfo, ResolveError> {
        let name = match event_ref {
            EventRef::Type(info) => return Ok(*info),
            EventRef::Named(name) => name,
        };

        let found = match self.catalog {
            Some(catalog) => catalog.lookup(name),
            None => Err(LookupFailure::NotFound),
        };

        found.map_err(|failure| match failure {
            LookupFailure::NotFound => ResolveError::UnknownEventType {
                declared_by: method.declared_by().to_string(),
                method: method.name().to_string(),
                name: name.clone(),
            },
            LookupFailure::Ambiguous => ResolveError::AmbiguousEventType {
                declared_by: method.declared_by().to_string(),
                method: method.name().to_string(),
                name: name.clone(),
            },
        })
    }
}

/// Resolve a model without a catalog
pub fn resolve<T: 'static>(model: &TypeModel<T>) -> Result<Vec<HandlerDescriptor<T>>, ResolveError> {
    Resolver::new().resolve(model)
}
