// Procedural macros for eventbind
// Handler methods are declared with attributes and wired to an event bus at runtime

use proc_macro::TokenStream;

mod binder;
mod handler_attr;

/// Generates the `EventTarget` impl for an inherent impl block
///
/// Every method marked `#[event_handler]` becomes a handler in the type's
/// model. With `extends = Parent, via = field` the type also inherits the
/// handlers of `Parent`, stored in `field`; a method with the same name and
/// parameter type overrides the parent's one.
///
/// ```rust,ignore
/// #[event_binder(extends = TestPresenter, via = base)]
/// impl SubPresenter {
///     #[event_handler]
///     fn on_second_event(&self, event: &SecondEvent) { ... }
///
///     #[event_handler(handles = [FirstEvent, SecondEvent])]
///     fn on_any(&self) { ... }
/// }
/// ```
#[proc_macro_attribute]
pub fn event_binder(attr: TokenStream, item: TokenStream) -> TokenStream {
    binder::event_binder_impl(attr.into(), item.into()).into()
}

/// Marks a handler method inside an `#[event_binder]` impl block
///
/// `#[event_handler]` handles the type of the method's `&Event` parameter.
/// `#[event_handler(handles = [A, B])]` handles each listed type instead.
#[proc_macro_attribute]
pub fn event_handler(_attr: TokenStream, item: TokenStream) -> TokenStream {
    handler_attr::event_handler_impl(item.into()).into()
}
