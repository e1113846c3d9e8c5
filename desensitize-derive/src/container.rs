//! Container-level attribute parsing for `#[derive(Sensitive)]`.
//!
//! This module handles attributes on the struct itself, not on fields.

use syn::{Attribute, Meta, Result};

/// Options parsed from container-level `#[sensitive(...)]` attributes.
#[derive(Clone, Debug, Default)]
pub(crate) struct ContainerOptions {
    /// If true, the generated class cascades: every field of every instance
    /// is walked even when the field itself carries no annotation.
    pub(crate) cascade: bool,
}

/// Parses container-level `#[sensitive(...)]` attributes.
pub(crate) fn parse_container_options(attrs: &[Attribute]) -> Result<ContainerOptions> {
    let mut options = ContainerOptions::default();

    for attr in attrs {
        if !attr.path().is_ident("sensitive") {
            continue;
        }

        match &attr.meta {
            // Bare #[sensitive] on the container is shorthand for `cascade`.
            Meta::Path(_) => options.cascade = true,
            Meta::List(list) => {
                list.parse_nested_meta(|meta| {
                    if meta.path.is_ident("cascade") {
                        options.cascade = true;
                        Ok(())
                    } else {
                        Err(meta.error(format!(
                            "unknown container option `{}`; expected `cascade`",
                            meta.path
                                .get_ident()
                                .map_or_else(|| "?".to_string(), ToString::to_string)
                        )))
                    }
                })?;
            }
            Meta::NameValue(nv) => {
                return Err(syn::Error::new_spanned(
                    nv,
                    "name-value syntax is not supported for container-level #[sensitive]",
                ));
            }
        }
    }

    Ok(options)
}

#[cfg(test)]
mod tests {
    use quote::quote;
    use syn::DeriveInput;

    use super::*;

    fn parse_attrs(tokens: proc_macro2::TokenStream) -> Vec<Attribute> {
        let input: DeriveInput = syn::parse2(quote! {
            #tokens
            struct Dummy;
        })
        .expect("should parse as DeriveInput");
        input.attrs
    }

    #[test]
    fn no_attribute_returns_defaults() {
        let attrs = parse_attrs(quote! {});
        let options = parse_container_options(&attrs).unwrap();
        assert!(!options.cascade);
    }

    #[test]
    fn cascade_is_parsed() {
        let attrs = parse_attrs(quote! { #[sensitive(cascade)] });
        assert!(parse_container_options(&attrs).unwrap().cascade);

        let attrs = parse_attrs(quote! { #[sensitive] });
        assert!(parse_container_options(&attrs).unwrap().cascade);
    }

    #[test]
    fn unknown_option_errors() {
        let attrs = parse_attrs(quote! { #[sensitive(skip_debug)] });
        let err = parse_container_options(&attrs).unwrap_err();
        assert!(err
            .to_string()
            .contains("unknown container option `skip_debug`"));
    }

    #[test]
    fn name_value_syntax_errors() {
        let attrs = parse_attrs(quote! { #[sensitive = "value"] });
        let err = parse_container_options(&attrs).unwrap_err();
        assert!(err.to_string().contains("name-value syntax is not supported"));
    }

    #[test]
    fn other_attributes_ignored() {
        let attrs = parse_attrs(quote! {
            #[derive(Clone)]
            #[serde(rename_all = "camelCase")]
        });
        let options = parse_container_options(&attrs).unwrap();
        assert!(!options.cascade);
    }
}
