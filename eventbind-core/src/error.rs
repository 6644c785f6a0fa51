//! Resolution errors

/// Why a target type could not produce a binder.
///
/// Every variant names the offending method and the type that declared it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error(
        "Method {declared_by}::{method} annotated with #[event_handler] takes {count} parameters; \
         handlers take at most one event parameter"
    )]
    Arity {
        declared_by: String,
        method: String,
        count: usize,
    },

    #[error(
        "Method {declared_by}::{method} annotated with #[event_handler] has no parameter, \
         so it must list the events it handles"
    )]
    MissingEventList { declared_by: String, method: String },

    #[error(
        "Method {declared_by}::{method} annotated with #[event_handler] must have exactly one \
         argument of a concrete type implementing Event, found {param}"
    )]
    NotAnEvent {
        declared_by: String,
        method: String,
        param: String,
    },

    #[error(
        "Method {declared_by}::{method} annotated with #[event_handler] must have exactly one \
         argument of a concrete type implementing Event, found abstract {param}"
    )]
    AbstractParameter {
        declared_by: String,
        method: String,
        param: String,
    },

    #[error("Method {declared_by}::{method} lists {event}, which is not a concrete event type")]
    AbstractEvent {
        declared_by: String,
        method: String,
        event: String,
    },

    #[error(
        "Method {declared_by}::{method} lists {event}, which cannot be passed as its \
         parameter type {param}"
    )]
    NotAssignable {
        declared_by: String,
        method: String,
        event: String,
        param: String,
    },

    #[error("Method {declared_by}::{method} lists unknown event type {name}")]
    UnknownEventType {
        declared_by: String,
        method: String,
        name: String,
    },

    #[error("Method {declared_by}::{method} lists {name}, which matches more than one event type")]
    AmbiguousEventType {
        declared_by: String,
        method: String,
        name: String,
    },

    #[error("Method {declared_by}::{method} is marked as a handler but has no invoker")]
    MissingInvoker { declared_by: String, method: String },
}

impl ResolveError {
    /// Name of the method that failed validation
    pub fn method(&self) -> &str {
        match self {
            ResolveError::Arity { method, .. }
            | ResolveError::MissingEventList { method, .. }
            | ResolveError::NotAnEvent { method, .. }
            | ResolveError::AbstractParameter { method, .. }
            | ResolveError::AbstractEvent { method, .. }
            | ResolveError::NotAssignable { method, .. }
            | ResolveError::UnknownEventType { method, .. }
            | ResolveError::AmbiguousEventType { method, .. }
            | ResolveError::MissingInvoker { method, .. } => method,
        }
    }
}
