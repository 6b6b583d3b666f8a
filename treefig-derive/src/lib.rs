//! `#[derive(Configure)]` for treefig.
//!
//! Each named field becomes a child node keyed by its (normalized) name.
//!
//! ```rust,ignore
//! #[derive(Configure, Default)]
//! struct AppConfig {
//!     /// Address to bind.
//!     host: String,
//!     #[configure(name = "listen-port")]
//!     port: u16,
//!     #[configure(embed)]
//!     logging: Logging,
//!     #[configure(skip)]
//!     cache: Cache,
//! }
//! ```
//!
//! # Field attributes
//!
//! - `name = "..."`: display name and key source (default: the field name).
//! - `description = "..."`: help text (default: the doc comment).
//! - `skip`: leave the field out of the tree.
//! - `embed`: splice the field's own fields into this struct's level.
//!
//! Every bound field's type must implement `Configure`; the generated impl
//! carries those bounds, so generic structs work when their parameters do.

mod attrs;

use proc_macro::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Fields, parse_macro_input, parse_quote};

use crate::attrs::FieldAttrs;

#[proc_macro_derive(Configure, attributes(configure))]
pub fn derive_configure(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(mut input: DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => named.named.clone(),
            _ => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "Configure can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Configure can only be derived for structs",
            ));
        }
    };

    let mut bindings = Vec::new();
    let mut steps = Vec::new();
    for field in &fields {
        let attrs = FieldAttrs::parse(field)?;
        if attrs.skip {
            continue;
        }
        let Some(ident) = &field.ident else {
            continue;
        };
        let ty = &field.ty;
        input
            .generics
            .make_where_clause()
            .predicates
            .push(parse_quote!(#ty: ::treefig::Configure));

        bindings.push(ident.clone());
        if attrs.embed {
            steps.push(quote! {
                __treefig_node.embed(#ident)?;
            });
        } else {
            let field_name = ident.unraw().to_string();
            let name = attrs.name.unwrap_or_else(|| field_name.clone());
            let description = attrs.description.unwrap_or_default();
            steps.push(quote! {
                __treefig_node.field(#field_name, #name, #description, #ident)?;
            });
        }
    }

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::treefig::Configure for #ident #ty_generics #where_clause {
            fn compile<'__treefig>(
                &'__treefig mut self,
                __treefig_node: &mut ::treefig::Node<'__treefig>,
            ) -> ::treefig::Result<()> {
                __treefig_node.bind_struct();
                #[allow(unused_variables)]
                let Self { #(#bindings,)* .. } = self;
                #(#steps)*
                ::core::result::Result::Ok(())
            }
        }
    })
}
