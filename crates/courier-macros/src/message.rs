//! Message derive macro implementation.
//!
//! `#[derive(Message)]` generates a single `impl Message` block.
//!
//! # Container attributes `#[message(...)]`
//!
//! | Key | Example | Required | Description |
//! |-----|---------|----------|-------------|
//! | `reply` | `"Option<Account>"` | No | Reply type threaded through the chain (default `()`) |
//! | `name` | `"accounts.get"` | No | Name reported by `message_name()` |
//! | `crate` | `"::courier::core"` | No | Path to the crate exporting `Message` |

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, GenericParam, Path, Type, parse_quote, spanned::Spanned};

// ============================================================================
// Attribute structures
// ============================================================================

/// Parsed `#[message(...)]` attributes.
#[derive(Default)]
struct MessageAttrs {
    reply: Option<Type>,
    name: Option<String>,
    krate: Option<Path>,
}

// ============================================================================
// Entry point
// ============================================================================

pub fn derive_message(input: &DeriveInput) -> syn::Result<TokenStream> {
    if let Data::Union(_) = &input.data {
        return Err(syn::Error::new(input.span(), "Message cannot be derived for unions"));
    }

    let attrs = parse_attrs(&input.attrs)?;
    Ok(generate_impl(input, attrs))
}

// ============================================================================
// Attribute parsing
// ============================================================================

fn parse_attrs(attrs: &[Attribute]) -> syn::Result<MessageAttrs> {
    let mut result = MessageAttrs::default();

    for attr in attrs {
        if !attr.path().is_ident("message") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("reply") {
                let lit = meta.value()?.parse::<syn::LitStr>()?;
                result.reply = Some(lit.parse::<Type>()?);
            } else if meta.path.is_ident("name") {
                result.name = Some(meta.value()?.parse::<syn::LitStr>()?.value());
            } else if meta.path.is_ident("crate") {
                let lit = meta.value()?.parse::<syn::LitStr>()?;
                result.krate = Some(lit.parse::<Path>()?);
            } else {
                return Err(meta.error(
                    "unknown message attribute; expected `reply`, `name` or `crate`",
                ));
            }
            Ok(())
        })?;
    }

    Ok(result)
}

// ============================================================================
// Code generation
// ============================================================================

fn generate_impl(input: &DeriveInput, attrs: MessageAttrs) -> TokenStream {
    let ident = &input.ident;
    let krate = attrs.krate.unwrap_or_else(|| parse_quote!(::courier_core));
    let reply = attrs.reply.unwrap_or_else(|| parse_quote!(()));

    // `Message: Any` needs every type parameter to be 'static.
    let mut generics = input.generics.clone();
    let static_params: Vec<_> = generics
        .params
        .iter()
        .filter_map(|param| match param {
            GenericParam::Type(ty) => Some(ty.ident.clone()),
            _ => None,
        })
        .collect();
    let where_clause = generics.make_where_clause();
    for param in static_params {
        where_clause.predicates.push(parse_quote!(#param: 'static));
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let name_impl = attrs.name.map(|name| {
        let lit = syn::LitStr::new(&name, ident.span());
        quote! {
            fn message_name() -> &'static str {
                #lit
            }
        }
    });

    quote! {
        impl #impl_generics #krate::Message for #ident #ty_generics #where_clause {
            type Reply = #reply;

            #name_impl
        }
    }
}
