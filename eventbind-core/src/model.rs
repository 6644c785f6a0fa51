//! Type models
//!
//! A [`TypeModel`] is the registration table for one target type: the
//! methods it declares, which of them are event handlers, and the model of
//! the type it extends. `#[event_binder]` generates one per annotated impl
//! block; it can also be written by hand.
//!
//! Inheritance is expressed by composition. A model that `extends` a parent
//! projects the parent's methods through an accessor from the child to the
//! embedded parent value, so every inherited handler still receives the
//! child as its target.

use eventbind_events::{Event, EventTypeInfo, HandlerParam};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Thunk that invokes one handler method on a target with a delivered event.
pub type Invoker<T> = Arc<dyn Fn(&T, &(dyn Event + 'static)) + Send + Sync>;

/// Declared type of one method parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamType {
    type_name: &'static str,
    event: Option<EventTypeInfo>,
}

impl ParamType {
    /// A `&P` parameter where `P` is an event type or `dyn Event`
    pub fn event<P: HandlerParam + ?Sized>() -> Self {
        Self {
            type_name: std::any::type_name::<&'static P>(),
            event: Some(P::event_type()),
        }
    }

    /// A parameter of any other type, taken exactly as written
    pub fn opaque<P: ?Sized>() -> Self {
        Self {
            type_name: std::any::type_name::<P>(),
            event: None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The event type behind the parameter, if it is an event
    pub fn event_type(&self) -> Option<EventTypeInfo> {
        self.event
    }
}

/// Method name plus parameter types; the identity overrides are matched on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    name: &'static str,
    params: Vec<&'static str>,
}

impl MethodSignature {
    pub fn new(name: &'static str, params: Vec<&'static str>) -> Self {
        Self { name, params }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn params(&self) -> &[&'static str] {
        &self.params
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.params.join(", "))
    }
}

/// Reference to an event type inside an explicit handler list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventRef {
    /// Statically known type
    Type(EventTypeInfo),
    /// Type looked up by name in an [`EventCatalog`](crate::EventCatalog)
    Named(String),
}

impl EventRef {
    pub fn of<E: Event>() -> Self {
        EventRef::Type(EventTypeInfo::of::<E>())
    }

    pub fn named(name: impl Into<String>) -> Self {
        EventRef::Named(name.into())
    }
}

impl From<EventTypeInfo> for EventRef {
    fn from(info: EventTypeInfo) -> Self {
        EventRef::Type(info)
    }
}

/// The `#[event_handler]` marker on a method.
///
/// An empty list means the handled type comes from the method's parameter.
/// A non-empty list replaces that implicit binding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerAnnotation {
    events: Vec<EventRef>,
}

impl HandlerAnnotation {
    pub fn implicit() -> Self {
        Self::default()
    }

    pub fn handles(events: impl IntoIterator<Item = EventRef>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }

    pub fn events(&self) -> &[EventRef] {
        &self.events
    }

    pub fn is_explicit(&self) -> bool {
        !self.events.is_empty()
    }
}

/// One method declared on a target type.
pub struct MethodDecl<T> {
    name: &'static str,
    declared_by: &'static str,
    params: Vec<ParamType>,
    annotation: Option<HandlerAnnotation>,
    invoker: Option<Invoker<T>>,
}

impl<T: 'static> MethodDecl<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            declared_by: "",
            params: Vec::new(),
            annotation: None,
            invoker: None,
        }
    }

    pub fn param_event<P: HandlerParam + ?Sized>(mut self) -> Self {
        self.params.push(ParamType::event::<P>());
        self
    }

    pub fn param_opaque<P: ?Sized>(mut self) -> Self {
        self.params.push(ParamType::opaque::<P>());
        self
    }

    pub fn param(mut self, param: ParamType) -> Self {
        self.params.push(param);
        self
    }

    pub fn annotated(mut self, annotation: HandlerAnnotation) -> Self {
        self.annotation = Some(annotation);
        self
    }

    pub fn with_invoker<F>(mut self, invoker: F) -> Self
    where
        F: Fn(&T, &(dyn Event + 'static)) + Send + Sync + 'static,
    {
        self.invoker = Some(Arc::new(invoker));
        self
    }

    /// Declare a handler taking `&P`, with the downcast thunk built in.
    ///
    /// Marks the method as a handler unless an annotation was already set.
    ///
    /// ```rust,ignore
    /// MethodDecl::new("on_contacts_loaded")
    ///     .handles_event(|target: &Sidebar, event: &ContactsLoaded| target.on_contacts_loaded(event))
    /// ```
    pub fn handles_event<P, F>(mut self, handler: F) -> Self
    where
        P: HandlerParam + ?Sized,
        F: Fn(&T, &P) + Send + Sync + 'static,
    {
        self.params = vec![ParamType::event::<P>()];
        if self.annotation.is_none() {
            self.annotation = Some(HandlerAnnotation::implicit());
        }
        self.with_invoker(move |target: &T, event: &(dyn Event + 'static)| {
            if let Some(event) = P::cast(event) {
                handler(target, event);
            }
        })
    }

    /// Declare a handler that takes no event parameter
    pub fn handles_none<F>(mut self, handler: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.params.clear();
        if self.annotation.is_none() {
            self.annotation = Some(HandlerAnnotation::implicit());
        }
        self.with_invoker(move |target: &T, _event: &(dyn Event + 'static)| handler(target))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Name of the type whose model declared this method
    pub fn declared_by(&self) -> &'static str {
        self.declared_by
    }

    pub fn params(&self) -> &[ParamType] {
        &self.params
    }

    pub fn signature(&self) -> MethodSignature {
        MethodSignature::new(
            self.name,
            self.params.iter().map(ParamType::type_name).collect(),
        )
    }

    pub fn annotation(&self) -> Option<&HandlerAnnotation> {
        self.annotation.as_ref()
    }

    pub fn is_handler(&self) -> bool {
        self.annotation.is_some()
    }

    pub fn invoker(&self) -> Option<&Invoker<T>> {
        self.invoker.as_ref()
    }

    /// Re-target this method at a type that embeds `T`
    fn project<C: 'static>(self, accessor: fn(&C) -> &T) -> MethodDecl<C> {
        let invoker = self.invoker.map(|inner| -> Invoker<C> {
            Arc::new(move |child: &C, event: &(dyn Event + 'static)| {
                inner(accessor(child), event)
            })
        });

        MethodDecl {
            name: self.name,
            declared_by: self.declared_by,
            params: self.params,
            annotation: self.annotation,
            invoker,
        }
    }
}

impl<T> fmt::Debug for MethodDecl<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDecl")
            .field("name", &self.name)
            .field("declared_by", &self.declared_by)
            .field("params", &self.params)
            .field("annotation", &self.annotation)
            .field("has_invoker", &self.invoker.is_some())
            .finish()
    }
}

/// Declared methods of a target type and, optionally, of the type it extends.
pub struct TypeModel<T> {
    name: &'static str,
    declared: Vec<MethodDecl<T>>,
    parent: Option<Box<TypeModel<T>>>,
}

impl<T: 'static> TypeModel<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            declared: Vec::new(),
            parent: None,
        }
    }

    /// Add a declared method; order of calls is declaration order
    pub fn method(mut self, mut decl: MethodDecl<T>) -> Self {
        decl.declared_by = self.name;
        self.declared.push(decl);
        self
    }

    /// Inherit every method of `parent`, reached through `accessor`
    ///
    /// ```rust,ignore
    /// TypeModel::new("SubPresenter")
    ///     .method(...)
    ///     .extends(Presenter::type_model(), |sub: &SubPresenter| &sub.base)
    /// ```
    pub fn extends<P: 'static>(mut self, parent: TypeModel<P>, accessor: fn(&T) -> &P) -> Self {
        self.parent = Some(Box::new(parent.project(accessor)));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn declared_methods(&self) -> &[MethodDecl<T>] {
        &self.declared
    }

    pub fn parent(&self) -> Option<&TypeModel<T>> {
        self.parent.as_deref()
    }

    /// This model followed by each ancestor, most-derived first
    pub fn lineage(&self) -> impl Iterator<Item = &TypeModel<T>> {
        std::iter::successors(Some(self), |model| model.parent())
    }

    /// Every method callable on the type, with overrides resolved.
    ///
    /// Walks the most-derived type first, then each ancestor, keeping the
    /// first method seen for each signature. A method redeclared lower in
    /// the hierarchy hides the ancestor's version whether or not either one
    /// is a handler.
    pub fn inheritable_methods(&self) -> Vec<&MethodDecl<T>> {
        let mut seen = HashSet::new();
        self.lineage()
            .flat_map(|model| model.declared.iter())
            .filter(|method| seen.insert(method.signature()))
            .collect()
    }

    fn project<C: 'static>(self, accessor: fn(&C) -> &T) -> TypeModel<C> {
        TypeModel {
            name: self.name,
            declared: self
                .declared
                .into_iter()
                .map(|method| method.project(accessor))
                .collect(),
            parent: self
                .parent
                .map(|parent| Box::new(parent.project(accessor))),
        }
    }
}

impl<T> fmt::Debug for TypeModel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeModel")
            .field("name", &self.name)
            .field("declared", &self.declared)
            .field("parent", &self.parent)
            .finish()
    }
}
