//! Code generation for structs with named fields.
//!
//! A derived struct becomes a class: one slot per field, ancestors first. The
//! generated `Composite` impl builds that class and moves the fields in and
//! out of slots; the `SensitiveType` impl bridges through it.

use proc_macro2::{Ident, TokenStream};
use quote::{quote, quote_spanned};
use syn::{ext::IdentExt, spanned::Spanned, FieldsNamed, LitStr, Result};

use crate::{
    container::ContainerOptions,
    generics::collect_generics_from_type,
    strategy::{parse_field_options, MarkerArgs, Override, Strategy},
};

pub(crate) struct StructOutput {
    /// Builder chain producing the class, without the trailing `.build()`.
    pub(crate) class_body: TokenStream,
    pub(crate) into_slots_body: TokenStream,
    pub(crate) from_slots_body: TokenStream,
    /// Generics that must implement `SensitiveType`.
    pub(crate) value_generics: Vec<Ident>,
    /// Generics that must implement `Composite` (used by the parent field).
    pub(crate) parent_generics: Vec<Ident>,
}

fn marker_tokens(args: &MarkerArgs, root: &TokenStream) -> TokenStream {
    let base = match &args.definition {
        Some(path) => quote_spanned! { path.span() =>
            <#path as #root::MarkerDefinition>::marker()
        },
        None => quote! { #root::Marker::new(#root::MarkerKind::MASK) },
    };
    let overrides = args.overrides.iter().map(|o| match o {
        Override::Start(lit) => quote! { .with_start_offset(#lit) },
        Override::End(lit) => quote! { .with_end_offset(#lit) },
        Override::Regexp(lit) => quote! { .with_regexp(#lit) },
        Override::Placeholder(lit) => quote! { .with_placeholder(#lit) },
        Override::Condition(lit) => quote! { .with_condition_named(#lit) },
        Override::Transformer(lit) => quote! { .with_transformer_named(#lit) },
    });
    quote! { #base #(#overrides)* }
}

pub(crate) fn derive_struct(
    fields: &FieldsNamed,
    generics: &syn::Generics,
    container: &ContainerOptions,
    root: &TokenStream,
) -> Result<StructOutput> {
    let private = quote! { #root::__private };

    let mut parent: Option<(&Ident, &syn::Type)> = None;
    let mut field_calls = Vec::new();
    let mut into_slots = Vec::new();
    let mut from_slots = Vec::new();
    let mut idents = Vec::new();
    let mut value_generics = Vec::new();
    let mut parent_generics = Vec::new();

    for field in &fields.named {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let ty = &field.ty;
        let options = parse_field_options(&field.attrs)?;
        idents.push(ident);

        if let Strategy::Parent = options.strategy {
            if parent.is_some() {
                return Err(syn::Error::new(
                    field.span(),
                    "only one field may be marked #[sensitive(parent)]",
                ));
            }
            parent = Some((ident, ty));
            collect_generics_from_type(ty, generics, &mut parent_generics);
            continue;
        }

        collect_generics_from_type(ty, generics, &mut value_generics);

        let name = LitStr::new(&ident.unraw().to_string(), ident.span());
        let shape = quote_spanned! { ty.span() => <#ty as #root::SensitiveType>::type_node() };
        // A cascading container walks every field it doesn't otherwise mark.
        let node = match &options.strategy {
            Strategy::PassThrough if container.cascade => quote! { #shape.cascade_leaves() },
            Strategy::PassThrough | Strategy::Parent => shape,
            Strategy::Cascade => quote! { #shape.cascade_leaves() },
            Strategy::Mark(args) => {
                let marker = marker_tokens(args, root);
                quote! { #shape.mark_leaves(&#marker) }
            }
        };
        field_calls.push(if options.immutable {
            quote! { .immutable_field(#name, #node) }
        } else {
            quote! { .field(#name, #node) }
        });
        into_slots.push(quote_spanned! { ty.span() =>
            __slots.push(#root::SensitiveType::into_value(self.#ident));
        });
        from_slots.push(quote_spanned! { ty.span() =>
            let #ident = <#ty as #root::SensitiveType>::from_value(#private::next_slot(__slots))?;
        });
    }

    // The parent's slots precede this struct's own, whatever the field order.
    let (parent_call, parent_into, parent_from) = match parent {
        Some((ident, ty)) => (
            quote_spanned! { ty.span() => .parent(<#ty as #private::Composite>::class()) },
            quote_spanned! { ty.span() => #private::Composite::into_slots(self.#ident, __slots); },
            quote_spanned! { ty.span() =>
                let #ident = <#ty as #private::Composite>::from_slots(__slots)?;
            },
        ),
        None => (quote! {}, quote! {}, quote! {}),
    };

    let cascade = container.cascade;
    let class_body = quote! {
        #parent_call
        #(#field_calls)*
        .cascade(#cascade)
        .zeroed()
    };
    let into_slots_body = quote! {
        #parent_into
        #(#into_slots)*
    };
    let from_slots_body = quote! {
        #parent_from
        #(#from_slots)*
        ::core::result::Result::Ok(Self { #(#idents),* })
    };

    Ok(StructOutput {
        class_body,
        into_slots_body,
        from_slots_body,
        value_generics,
        parent_generics,
    })
}
