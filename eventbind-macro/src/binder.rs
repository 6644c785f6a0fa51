use crate::handler_attr::{DeclaredMethod, take_marker};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    Error, Ident, ImplItem, ItemImpl, Member, Token, Type,
    parse::{Parse, ParseStream},
};

/// Options of `#[event_binder(...)]`
#[derive(Debug, Default)]
struct BinderArgs {
    /// Parent type and the field that embeds it
    parent: Option<(Type, Member)>,
}

impl Parse for BinderArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut extends: Option<Type> = None;
        let mut via: Option<Member> = None;

        while !input.is_empty() {
            let key: Ident = input.parse()?;

            match key.to_string().as_str() {
                "extends" if extends.is_none() => {
                    input.parse::<Token![=]>()?;
                    extends = Some(input.parse()?);
                }
                "via" if via.is_none() => {
                    input.parse::<Token![=]>()?;
                    via = Some(input.parse()?);
                }
                "extends" | "via" => {
                    return Err(Error::new(key.span(), format!("duplicate `{}` option", key)));
                }
                other => {
                    return Err(Error::new(
                        key.span(),
                        format!(
                            "unknown #[event_binder] option `{}`\n\
                             hint: expected `extends = Parent, via = field`",
                            other
                        ),
                    ));
                }
            }

            if !input.is_empty() {
                input.parse::<Token![,]>()?;
            }
        }

        let parent = match (extends, via) {
            (Some(parent), Some(via)) => Some((parent, via)),
            (None, None) => None,
            (Some(parent), None) => {
                return Err(Error::new_spanned(
                    parent,
                    "`extends` needs `via = field` naming the field that holds the parent",
                ));
            }
            (None, Some(via)) => {
                return Err(Error::new_spanned(via, "`via` is only meaningful together with `extends`"));
            }
        };

        Ok(BinderArgs { parent })
    }
}

pub fn event_binder_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand(attr, item).unwrap_or_else(Error::into_compile_error)
}

/// Expand `#[event_binder]` on an inherent impl block
pub fn expand(attr: TokenStream, item: TokenStream) -> syn::Result<TokenStream> {
    let args: BinderArgs = syn::parse2(attr)?;
    let mut input: ItemImpl = syn::parse2(item)?;

    if let Some((_, path, _)) = &input.trait_ {
        return Err(Error::new_spanned(
            path,
            "#[event_binder] must be placed on an inherent impl block, not a trait impl",
        ));
    }

    if !input.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &input.generics,
            "#[event_binder] does not support generic impl blocks\n\
             hint: bind a concrete type",
        ));
    }

    let mut declared = Vec::new();
    let mut errors: Option<Error> = None;

    for item in &mut input.items {
        let ImplItem::Fn(method) = item else {
            continue;
        };

        let result = match take_marker(method) {
            Ok(Some(handler)) => DeclaredMethod::handler(method, handler).map(Some),
            Ok(None) => Ok(DeclaredMethod::plain(method)),
            Err(err) => Err(err),
        };

        match result {
            Ok(Some(decl)) => declared.push(decl),
            Ok(None) => {}
            Err(err) => {
                errors = Some(match errors.take() {
                    Some(mut combined) => {
                        combined.combine(err);
                        combined
                    }
                    None => err,
                });
            }
        }
    }

    if let Some(errors) = errors {
        // Markers are already stripped from `input`
        let errors = errors.to_compile_error();
        return Ok(quote! {
            #errors
            #input
        });
    }

    let self_ty = &input.self_ty;
    let target_name = target_name(self_ty);
    let decls = declared.iter().map(DeclaredMethod::to_decl);

    let extends = args.parent.map(|(parent, via)| {
        quote! {
            .extends(<#parent as ::eventbind::EventTarget>::type_model(), {
                fn __eventbind_project(target: &#self_ty) -> &#parent {
                    &target.#via
                }
                __eventbind_project
            })
        }
    });

    Ok(quote! {
        #input

        impl ::eventbind::EventTarget for #self_ty {
            fn type_model() -> ::eventbind::TypeModel<Self> {
                ::eventbind::TypeModel::new(#target_name)
                    #(.method(#decls))*
                    #extends
            }
        }
    })
}

/// Display name of the target type, its last path segment when it has one
fn target_name(ty: &Type) -> String {
    match ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map(|segment| segment.ident.to_string())
            .unwrap_or_else(|| quote!(#ty).to_string()),
        _ => quote!(#ty).to_string(),
    }
}
