//! Derive macro for `desensitize`.
//!
//! This crate generates the class schema behind `#[derive(Sensitive)]`. It:
//! - reads `#[sensitive(...)]` container and field attributes
//! - emits a `Composite` implementation that describes the struct as a class
//!   and moves its fields in and out of object slots
//! - emits a `SensitiveType` implementation that bridges through that class
//!
//! It does **not** define markers or transformers. Those live in the main
//! `desensitize` crate and are applied at runtime by the engine.

// <https://doc.rust-lang.org/rustc/lints/listing/allowed-by-default.html>
#![warn(
    anonymous_parameters,
    bare_trait_objects,
    elided_lifetimes_in_paths,
    missing_copy_implementations,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unsafe_code,
    unused_extern_crates,
    unused_import_braces
)]
// <https://rust-lang.github.io/rust-clippy/stable>
#![warn(
    clippy::all,
    clippy::cargo,
    clippy::dbg_macro,
    clippy::float_cmp_const,
    clippy::get_unwrap,
    clippy::mem_forget,
    clippy::nursery,
    clippy::pedantic,
    clippy::todo,
    clippy::unwrap_used,
    clippy::uninlined_format_args
)]
// Allow some clippy lints
#![allow(
    clippy::default_trait_access,
    clippy::doc_markdown,
    clippy::if_not_else,
    clippy::module_name_repetitions,
    clippy::multiple_crate_versions,
    clippy::must_use_candidate,
    clippy::needless_pass_by_value,
    clippy::needless_ifs,
    clippy::use_self,
    clippy::cargo_common_metadata,
    clippy::missing_errors_doc,
    clippy::enum_glob_use,
    clippy::struct_excessive_bools,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::result_large_err,
    clippy::future_not_send,
    clippy::option_if_let_else,
    clippy::from_over_into,
    clippy::manual_inspect
)]
// Allow some lints while testing
#![cfg_attr(test, allow(clippy::non_ascii_literal, clippy::unwrap_used))]

#[allow(unused_extern_crates)]
extern crate proc_macro;

use proc_macro2::TokenStream;
use proc_macro_crate::{crate_name, FoundCrate};
use quote::{format_ident, quote};
use syn::{parse_macro_input, spanned::Spanned, Data, DeriveInput, Fields, LitStr, Result};

mod container;
mod derive_struct;
mod generics;
mod strategy;
use container::parse_container_options;
use derive_struct::{derive_struct, StructOutput};
use generics::add_bounds;

/// Derives `desensitize::SensitiveType` for structs with named fields.
///
/// The struct is described as a class named after it, with one slot per
/// field. Values go through the engine as objects of that class and come
/// back as a new instance.
///
/// # Container Attributes
///
/// - `#[sensitive(cascade)]` (or bare `#[sensitive]`): every field of the
///   struct is walked even without its own annotation, so nested structs
///   are desensitized according to their own field markers.
///
/// # Field Attributes
///
/// - **No annotation**: The field is copied unchanged.
///
/// - `#[sensitive]`: Walk into nested `Sensitive` structs, including inside
///   `Option`, `Vec`, map values, and arrays.
///
/// - `#[sensitive(Marker)]`: Attach the marker of a type implementing
///   `MarkerDefinition` (e.g., `Phone`, `IdCard`) to every string leaf of the
///   field.
///
/// - `#[sensitive(start = 3, end = 4, regexp = "..", placeholder = '#',
///   condition = "non_empty", transformer = "mask")]`: Inline marker options.
///   Combined with a marker type they override its settings; on their own
///   they describe a `mask` marker.
///
/// - `#[sensitive(immutable)]`: Copy the field verbatim, never resolve it.
///   Combines with the options above.
///
/// - `#[sensitive(parent)]`: The field holds the struct's parent, itself a
///   `Sensitive` struct. Its fields come first in the class layout, so the
///   derived struct is treated as a subclass. At most one per struct.
///
/// Enums, unions, tuple structs, and unit structs are rejected at compile
/// time.
#[proc_macro_derive(Sensitive, attributes(sensitive))]
pub fn derive_sensitive(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.into_compile_error().into(),
    }
}

/// Returns the token stream to reference the desensitize crate root.
///
/// Handles crate renaming (e.g., `masking = { package = "desensitize", ... }`).
/// Inside desensitize itself, including its doctests, the crate is reached as
/// `::desensitize` through its `extern crate self as desensitize`.
fn crate_root() -> TokenStream {
    match crate_name("desensitize") {
        Ok(FoundCrate::Itself) => quote! { ::desensitize },
        Ok(FoundCrate::Name(name)) => {
            let ident = format_ident!("{}", name);
            quote! { ::#ident }
        }
        Err(_) => quote! { ::desensitize },
    }
}

fn expand(input: DeriveInput) -> Result<TokenStream> {
    let DeriveInput {
        ident,
        generics,
        data,
        attrs,
        ..
    } = input;

    let container = parse_container_options(&attrs)?;
    let root = crate_root();
    let private = quote! { #root::__private };

    let fields = match &data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => fields,
            Fields::Unnamed(fields) => {
                return Err(syn::Error::new(
                    fields.span(),
                    "`Sensitive` requires named fields; tuple structs are not supported",
                ));
            }
            Fields::Unit => {
                return Err(syn::Error::new(
                    ident.span(),
                    "`Sensitive` requires named fields; unit structs are not supported",
                ));
            }
        },
        Data::Enum(e) => {
            return Err(syn::Error::new(
                e.enum_token.span(),
                "`Sensitive` cannot be derived for enums",
            ));
        }
        Data::Union(u) => {
            return Err(syn::Error::new(
                u.union_token.span(),
                "`Sensitive` cannot be derived for unions",
            ));
        }
    };

    let StructOutput {
        class_body,
        into_slots_body,
        from_slots_body,
        value_generics,
        parent_generics,
    } = derive_struct(fields, &generics, &container, &root)?;

    let bounded = add_bounds(generics.clone(), &value_generics, &quote! { #root::SensitiveType });
    let bounded = add_bounds(bounded, &parent_generics, &quote! { #private::Composite });
    let (impl_generics, ty_generics, where_clause) = bounded.split_for_impl();

    let name = LitStr::new(&ident.to_string(), ident.span());
    let build_class = quote! {
        #root::Class::builder(#name)
            #class_body
            .build()
    };
    // A static inside a generic fn is shared by every instantiation and cannot
    // name the impl's parameters, so generic structs build the class per call.
    let class_fn = if generics.params.is_empty() {
        quote! {
            static CLASS: #private::Lazy<::std::sync::Arc<#root::Class>> =
                #private::Lazy::new(|| #build_class);
            ::std::sync::Arc::clone(&CLASS)
        }
    } else {
        build_class
    };

    Ok(quote! {
        #[automatically_derived]
        impl #impl_generics #private::Composite for #ident #ty_generics #where_clause {
            fn class() -> ::std::sync::Arc<#root::Class> {
                #class_fn
            }

            fn into_slots(self, __slots: &mut ::std::vec::Vec<#root::Value>) {
                #into_slots_body
            }

            fn from_slots(
                __slots: &mut dyn ::core::iter::Iterator<Item = #root::Value>,
            ) -> #root::Result<Self> {
                #from_slots_body
            }
        }

        #[automatically_derived]
        impl #impl_generics #root::SensitiveType for #ident #ty_generics #where_clause {
            fn type_node() -> #root::TypeNode {
                #root::TypeNode::scalar(#name)
            }

            fn into_value(self) -> #root::Value {
                #private::composite_into_value(self)
            }

            fn from_value(value: #root::Value) -> #root::Result<Self> {
                #private::composite_from_value(value)
            }
        }
    })
}
