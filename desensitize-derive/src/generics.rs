//! Generic type parameter handling and trait bound management.
//!
//! Bounds are added only for generics that appear in field types.
//!
//! ## PhantomData Handling
//!
//! `PhantomData<T>` fields are skipped when collecting generics:
//!
//! ```ignore
//! struct TypedId<T> {
//!     id: String,
//!     _marker: PhantomData<T>,  // T does not need SensitiveType
//! }
//! ```
//!
//! `PhantomData` is always a passthrough leaf, so `TypedId<DateTime<Utc>>`
//! works even though `DateTime<Utc>` has no `SensitiveType` impl.

use proc_macro2::TokenStream;
use syn::{parse_quote, Ident};

pub(crate) fn collect_generics_from_type(
    ty: &syn::Type,
    generics: &syn::Generics,
    result: &mut Vec<Ident>,
) {
    match ty {
        syn::Type::Path(path) => {
            let Some(segment) = path.path.segments.last() else {
                return;
            };
            if segment.ident == "PhantomData" {
                return;
            }

            if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                for arg in &args.args {
                    if let syn::GenericArgument::Type(inner_ty) = arg {
                        collect_generics_from_type(inner_ty, generics, result);
                    }
                }
            }

            for param in generics.type_params() {
                if segment.ident == param.ident && !result.iter().any(|g| g == &param.ident) {
                    result.push(param.ident.clone());
                }
            }
        }
        syn::Type::Array(array) => collect_generics_from_type(&array.elem, generics, result),
        syn::Type::Paren(paren) => collect_generics_from_type(&paren.elem, generics, result),
        syn::Type::Group(group) => collect_generics_from_type(&group.elem, generics, result),
        _ => {}
    }
}

/// Adds `bound` to every generic parameter listed in `used_generics`.
pub(crate) fn add_bounds(
    mut generics: syn::Generics,
    used_generics: &[Ident],
    bound: &TokenStream,
) -> syn::Generics {
    for param in generics.type_params_mut() {
        if used_generics.iter().any(|g| g == &param.ident) {
            param.bounds.push(parse_quote!(#bound));
        }
    }
    generics
}

#[cfg(test)]
mod tests {
    use quote::quote;

    use super::*;

    fn generics(tokens: TokenStream) -> syn::Generics {
        let input: syn::DeriveInput = syn::parse2(quote! { struct Dummy #tokens {} }).unwrap();
        input.generics
    }

    fn collect(ty: TokenStream, generics: &syn::Generics) -> Vec<String> {
        let ty: syn::Type = syn::parse2(ty).unwrap();
        let mut used = Vec::new();
        collect_generics_from_type(&ty, generics, &mut used);
        used.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn nested_parameters_are_collected() {
        let g = generics(quote! { <K, V, U> });
        assert_eq!(collect(quote! { HashMap<K, Vec<V>> }, &g), ["K", "V"]);
        assert_eq!(collect(quote! { [U; 4] }, &g), ["U"]);
    }

    #[test]
    fn phantom_data_is_skipped() {
        let g = generics(quote! { <T> });
        assert!(collect(quote! { PhantomData<T> }, &g).is_empty());
        assert!(collect(quote! { ::core::marker::PhantomData<T> }, &g).is_empty());
    }

    #[test]
    fn bounds_are_added_to_used_parameters_only() {
        let g = generics(quote! { <T, U> });
        let used = vec![Ident::new("T", proc_macro2::Span::call_site())];
        let bounded = add_bounds(g, &used, &quote! { ::core::clone::Clone });
        let params: Vec<_> = bounded.type_params().collect();
        assert_eq!(params[0].bounds.len(), 1);
        assert!(params[1].bounds.is_empty());
    }
}
