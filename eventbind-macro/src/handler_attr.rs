//! `#[event_handler]` markers inside an `#[event_binder]` impl block
//!
//! Checks done here are the ones the method signature alone can answer:
//! - receiver must be `&self`
//! - no generic parameters, not `async`
//! - at most one parameter besides `self`, passed by shared reference
//! - a method without a parameter must list the events it handles
//! - the parameter type cannot contain `impl Trait`
//!
//! Whether the parameter is an event, and whether listed events fit it, is
//! left to the trait bounds and to the resolver.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    Attribute, Error, FnArg, GenericArgument, Ident, ImplItemFn, Meta, PathArguments, Token, Type,
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    spanned::Spanned,
};

/// Options of one `#[event_handler(...)]`
#[derive(Debug, Default)]
pub struct HandlerArgs {
    /// `handles = [A, B]`, empty when absent
    pub handles: Vec<Type>,
}

impl Parse for HandlerArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut handles: Option<Vec<Type>> = None;

        while !input.is_empty() {
            let key: Ident = input.parse()?;

            match key.to_string().as_str() {
                "handles" => {
                    if handles.is_some() {
                        return Err(Error::new(key.span(), "duplicate `handles` option"));
                    }
                    input.parse::<Token![=]>()?;

                    let content;
                    syn::bracketed!(content in input);
                    let types: Punctuated<Type, Token![,]> =
                        content.parse_terminated(Type::parse, Token![,])?;
                    handles = Some(types.into_iter().collect());
                }
                other => {
                    return Err(Error::new(
                        key.span(),
                        format!(
                            "unknown #[event_handler] option `{}`\n\
                             hint: the only option is `handles = [EventA, EventB]`",
                            other
                        ),
                    ));
                }
            }

            if !input.is_empty() {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(HandlerArgs {
            handles: handles.unwrap_or_default(),
        })
    }
}

/// Whether `attr` is an `#[event_handler]` marker, however it is imported
pub fn is_handler_attr(attr: &Attribute) -> bool {
    attr.path()
        .segments
        .last()
        .is_some_and(|segment| segment.ident == "event_handler")
}

/// Strip the `#[event_handler]` marker off `method` and parse its options.
///
/// Returns `None` for methods without a marker.
pub fn take_marker(method: &mut ImplItemFn) -> syn::Result<Option<HandlerArgs>> {
    let (markers, rest): (Vec<_>, Vec<_>) = method.attrs.drain(..).partition(is_handler_attr);
    method.attrs = rest;

    let mut markers = markers.into_iter();
    let Some(marker) = markers.next() else {
        return Ok(None);
    };

    if let Some(duplicate) = markers.next() {
        return Err(Error::new_spanned(
            duplicate,
            format!(
                "method `{}` has more than one #[event_handler] marker\n\
                 hint: list every event in a single `handles = [...]`",
                method.sig.ident
            ),
        ));
    }

    let args = match &marker.meta {
        Meta::Path(_) => HandlerArgs::default(),
        Meta::List(_) => marker.parse_args::<HandlerArgs>()?,
        Meta::NameValue(_) => {
            return Err(Error::new_spanned(
                &marker,
                "expected #[event_handler] or #[event_handler(handles = [...])]",
            ));
        }
    };

    Ok(Some(args))
}

/// Parameter shape of a method that enters the type model
#[derive(Debug)]
enum Shape {
    /// `&self` only
    NoParam,
    /// `&self` plus one `&Elem` parameter
    Event { written: Type, elem: Type },
}

/// One method declared in the generated type model
#[derive(Debug)]
pub struct DeclaredMethod {
    ident: Ident,
    shape: Shape,
    handler: Option<HandlerArgs>,
}

impl DeclaredMethod {
    /// Validate a method carrying `#[event_handler]`
    pub fn handler(method: &ImplItemFn, args: HandlerArgs) -> syn::Result<Self> {
        let sig = &method.sig;
        let ident = &sig.ident;

        if !sig.generics.params.is_empty() {
            return Err(Error::new_spanned(
                &sig.generics,
                format!("#[event_handler] method `{}` cannot be generic", ident),
            ));
        }

        if let Some(asyncness) = &sig.asyncness {
            return Err(Error::new_spanned(
                asyncness,
                format!(
                    "#[event_handler] method `{}` cannot be async\n\
                     hint: events are delivered synchronously on the publishing thread",
                    ident
                ),
            ));
        }

        if !has_ref_self(method) {
            return Err(Error::new(
                sig.inputs.first().map_or(ident.span(), |arg| arg.span()),
                format!("#[event_handler] method `{}` must take `&self`", ident),
            ));
        }

        let params: Vec<_> = sig.inputs.iter().skip(1).collect();
        if params.len() > 1 {
            return Err(Error::new_spanned(
                &sig.inputs,
                format!(
                    "#[event_handler] method `{}` takes {} parameters; handlers take at most one event parameter",
                    ident,
                    params.len()
                ),
            ));
        }

        let shape = match params.first() {
            None if args.handles.is_empty() => {
                return Err(Error::new_spanned(
                    sig,
                    format!(
                        "#[event_handler] method `{}` has no parameter, so it must list the events it handles\n\
                         hint: use #[event_handler(handles = [SomeEvent])]",
                        ident
                    ),
                ));
            }
            None => Shape::NoParam,
            Some(FnArg::Typed(param)) if contains_impl_trait(&param.ty) => {
                return Err(Error::new_spanned(
                    &param.ty,
                    format!(
                        "#[event_handler] method `{}` cannot take `impl Trait`\n\
                         hint: name the event type, or take `&dyn Event`",
                        ident
                    ),
                ));
            }
            Some(param) => event_shape(param).ok_or_else(|| {
                Error::new_spanned(
                    param,
                    format!(
                        "#[event_handler] method `{}` must take its event by shared reference, e.g. `event: &SomeEvent`",
                        ident
                    ),
                )
            })?,
        };

        Ok(Self {
            ident: ident.clone(),
            shape,
            handler: Some(args),
        })
    }

    /// A method without a marker, kept in the model when it could override
    /// an inherited handler.
    pub fn plain(method: &ImplItemFn) -> Option<Self> {
        let sig = &method.sig;
        if !sig.generics.params.is_empty() || sig.asyncness.is_some() || !has_ref_self(method) {
            return None;
        }

        let mut params = sig.inputs.iter().skip(1);
        let shape = match (params.next(), params.next()) {
            (None, _) => Shape::NoParam,
            (Some(param), None) => event_shape(param)?,
            _ => return None,
        };

        Some(Self {
            ident: sig.ident.clone(),
            shape,
            handler: None,
        })
    }

    /// `MethodDecl` builder expression for this method
    pub fn to_decl(&self) -> TokenStream {
        let ident = &self.ident;
        let name = ident.to_string();

        // Naming the method path counts as a use, so a method that only
        // hides an inherited handler does not warn as dead code.
        let Some(args) = &self.handler else {
            return match &self.shape {
                Shape::NoParam => quote! {{
                    let _ = Self::#ident;
                    ::eventbind::MethodDecl::new(#name)
                }},
                Shape::Event { written, .. } => quote! {{
                    let _ = Self::#ident;
                    ::eventbind::MethodDecl::new(#name).param_opaque::<#written>()
                }},
            };
        };

        let annotation = if args.handles.is_empty() {
            quote! {}
        } else {
            let handles = &args.handles;
            quote! {
                .annotated(::eventbind::HandlerAnnotation::handles([
                    #(::eventbind::EventRef::from(<#handles as ::eventbind::HandlerParam>::event_type())),*
                ]))
            }
        };

        match &self.shape {
            Shape::NoParam => quote! {
                ::eventbind::MethodDecl::new(#name)
                    #annotation
                    .handles_none(|target: &Self| Self::#ident(target))
            },
            Shape::Event { elem, .. } => quote! {
                ::eventbind::MethodDecl::new(#name)
                    #annotation
                    .handles_event::<#elem, _>(|target: &Self, event| Self::#ident(target, event))
            },
        }
    }
}

fn has_ref_self(method: &ImplItemFn) -> bool {
    matches!(
        method.sig.inputs.first(),
        Some(FnArg::Receiver(receiver)) if receiver.reference.is_some() && receiver.mutability.is_none()
    )
}

fn event_shape(param: &FnArg) -> Option<Shape> {
    let FnArg::Typed(pat_type) = param else {
        return None;
    };
    let Type::Reference(reference) = pat_type.ty.as_ref() else {
        return None;
    };
    if reference.mutability.is_some() || contains_impl_trait(&pat_type.ty) {
        return None;
    }

    Some(Shape::Event {
        written: (*pat_type.ty).clone(),
        elem: (*reference.elem).clone(),
    })
}

/// Whether `ty` mentions `impl Trait` anywhere, which cannot be named in a
/// turbofish
fn contains_impl_trait(ty: &Type) -> bool {
    match ty {
        Type::ImplTrait(_) => true,
        Type::Reference(reference) => contains_impl_trait(&reference.elem),
        Type::Ptr(ptr) => contains_impl_trait(&ptr.elem),
        Type::Paren(paren) => contains_impl_trait(&paren.elem),
        Type::Group(group) => contains_impl_trait(&group.elem),
        Type::Slice(slice) => contains_impl_trait(&slice.elem),
        Type::Array(array) => contains_impl_trait(&array.elem),
        Type::Tuple(tuple) => tuple.elems.iter().any(contains_impl_trait),
        Type::Path(path) => path.path.segments.iter().any(|segment| match &segment.arguments {
            PathArguments::AngleBracketed(args) => args.args.iter().any(|arg| match arg {
                GenericArgument::Type(ty) => contains_impl_trait(ty),
                GenericArgument::AssocType(assoc) => contains_impl_trait(&assoc.ty),
                _ => false,
            }),
            _ => false,
        }),
        _ => false,
    }
}

/// Standalone `#[event_handler]`, reached only outside `#[event_binder]`
pub fn event_handler_impl(item: TokenStream) -> TokenStream {
    let err = Error::new_spanned(
        &item,
        "#[event_handler] only has an effect inside an #[event_binder] impl block\n\
         hint: add #[event_binder] to the enclosing impl",
    );
    let err = err.to_compile_error();

    quote! {
        #err
        #item
    }
}
