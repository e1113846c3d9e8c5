//! Parsing of `#[sensitive(...)]` field attributes.
//!
//! This module maps attribute syntax to descriptor decisions and produces
//! structured errors for invalid forms.

use proc_macro2::{Span, TokenStream, TokenTree};
use syn::{meta::ParseNestedMeta, spanned::Spanned, Attribute, LitChar, LitInt, LitStr, Meta, Result};

/// How a field's descriptor is built.
///
/// | Attribute | Strategy | Behavior |
/// |-----------|----------|----------|
/// | None | `PassThrough` | Field copied unchanged |
/// | `#[sensitive]` | `Cascade` | Walk nested composite values |
/// | `#[sensitive(Marker, ...)]` | `Mark` | Attach the marker to every leaf |
/// | `#[sensitive(start = 3, ...)]` | `Mark` | Attach a `mask` marker to every leaf |
/// | `#[sensitive(parent)]` | `Parent` | Embedded ancestor struct |
#[derive(Clone, Debug)]
pub(crate) enum Strategy {
    /// No annotation: the field's shape without markers.
    PassThrough,
    /// Bare `#[sensitive]`: cascade into composite values at the leaves.
    Cascade,
    /// A marker, from a definition type and/or inline options.
    Mark(MarkerArgs),
    /// The struct's parent; its fields come first in the class layout.
    Parent,
}

/// Marker named on a field.
#[derive(Clone, Debug, Default)]
pub(crate) struct MarkerArgs {
    /// Type implementing `MarkerDefinition`; `None` means a plain `mask` marker.
    pub(crate) definition: Option<syn::Path>,
    pub(crate) overrides: Vec<Override>,
}

/// Inline marker option.
#[derive(Clone, Debug)]
pub(crate) enum Override {
    Start(LitInt),
    End(LitInt),
    Regexp(LitStr),
    Placeholder(LitChar),
    Condition(LitStr),
    Transformer(LitStr),
}

impl Override {
    fn key(&self) -> &'static str {
        match self {
            Self::Start(_) => "start",
            Self::End(_) => "end",
            Self::Regexp(_) => "regexp",
            Self::Placeholder(_) => "placeholder",
            Self::Condition(_) => "condition",
            Self::Transformer(_) => "transformer",
        }
    }
}

/// Everything `#[sensitive(...)]` says about one field.
#[derive(Clone, Debug)]
pub(crate) struct FieldOptions {
    pub(crate) strategy: Strategy,
    /// Copied verbatim, never resolved.
    pub(crate) immutable: bool,
}

impl Default for FieldOptions {
    fn default() -> Self {
        Self {
            strategy: Strategy::PassThrough,
            immutable: false,
        }
    }
}

#[derive(Default)]
struct ListOptions {
    definition: Option<syn::Path>,
    overrides: Vec<Override>,
    immutable: bool,
    parent: bool,
}

impl ListOptions {
    fn push_override(&mut self, next: Override, meta: &ParseNestedMeta<'_>) -> Result<()> {
        if self.overrides.iter().any(|o| o.key() == next.key()) {
            return Err(meta.error(format!("duplicate marker option `{}`", next.key())));
        }
        self.overrides.push(next);
        Ok(())
    }

    fn parse(&mut self, meta: &ParseNestedMeta<'_>) -> Result<()> {
        let path = &meta.path;
        if path.is_ident("start") {
            let lit = meta.value()?.parse()?;
            self.push_override(Override::Start(lit), meta)
        } else if path.is_ident("end") {
            let lit = meta.value()?.parse()?;
            self.push_override(Override::End(lit), meta)
        } else if path.is_ident("regexp") {
            let lit = meta.value()?.parse()?;
            self.push_override(Override::Regexp(lit), meta)
        } else if path.is_ident("placeholder") {
            let lit = meta.value()?.parse()?;
            self.push_override(Override::Placeholder(lit), meta)
        } else if path.is_ident("condition") {
            let lit = meta.value()?.parse()?;
            self.push_override(Override::Condition(lit), meta)
        } else if path.is_ident("transformer") {
            let lit = meta.value()?.parse()?;
            self.push_override(Override::Transformer(lit), meta)
        } else if path.is_ident("immutable") {
            self.immutable = true;
            Ok(())
        } else if path.is_ident("parent") {
            self.parent = true;
            Ok(())
        } else if meta.input.peek(syn::Token![=]) {
            Err(meta.error(format!(
                "unknown marker option `{}`; expected one of `start`, `end`, `regexp`, \
`placeholder`, `condition`, `transformer`",
                path.get_ident()
                    .map_or_else(|| "?".to_string(), ToString::to_string)
            )))
        } else if self.definition.is_some() {
            Err(meta.error("only one marker type may be named per field"))
        } else {
            self.definition = Some(path.clone());
            Ok(())
        }
    }

    fn finish(self, span: Span) -> Result<FieldOptions> {
        if self.parent {
            if self.immutable || self.definition.is_some() || !self.overrides.is_empty() {
                return Err(syn::Error::new(
                    span,
                    "`parent` cannot be combined with other #[sensitive] options",
                ));
            }
            return Ok(FieldOptions {
                strategy: Strategy::Parent,
                immutable: false,
            });
        }

        let strategy = if self.definition.is_none() && self.overrides.is_empty() {
            Strategy::PassThrough
        } else {
            Strategy::Mark(MarkerArgs {
                definition: self.definition,
                overrides: self.overrides,
            })
        };
        Ok(FieldOptions {
            strategy,
            immutable: self.immutable,
        })
    }
}

fn set_options(target: &mut Option<FieldOptions>, next: FieldOptions, span: Span) -> Result<()> {
    if target.is_some() {
        return Err(syn::Error::new(
            span,
            "multiple #[sensitive] attributes specified on the same field",
        ));
    }
    *target = Some(next);
    Ok(())
}

/// Rejects list entries that don't start with a path, such as `#[sensitive(123)]`.
fn check_entries(tokens: &TokenStream) -> Result<()> {
    let mut entry_start = true;
    for token in tokens.clone() {
        if entry_start {
            let is_path = match &token {
                TokenTree::Ident(_) => true,
                TokenTree::Punct(punct) => punct.as_char() == ':',
                _ => false,
            };
            if !is_path {
                return Err(syn::Error::new(
                    token.span(),
                    "expected a marker type or marker options \
(e.g., #[sensitive(Phone)] or #[sensitive(start = 3, end = 4)])",
                ));
            }
        }
        entry_start = matches!(&token, TokenTree::Punct(punct) if punct.as_char() == ',');
    }
    Ok(())
}

pub(crate) fn parse_field_options(attrs: &[Attribute]) -> Result<FieldOptions> {
    let mut options: Option<FieldOptions> = None;
    for attr in attrs {
        if !attr.path().is_ident("sensitive") {
            continue;
        }

        match &attr.meta {
            Meta::Path(_) => {
                let cascade = FieldOptions {
                    strategy: Strategy::Cascade,
                    immutable: false,
                };
                set_options(&mut options, cascade, attr.span())?;
            }
            Meta::List(list) => {
                check_entries(&list.tokens)?;
                let mut parsed = ListOptions::default();
                list.parse_nested_meta(|meta| parsed.parse(&meta))?;
                set_options(&mut options, parsed.finish(attr.span())?, attr.span())?;
            }
            Meta::NameValue(_) => {
                return Err(syn::Error::new(
                    attr.span(),
                    "name-value syntax is not supported for #[sensitive]",
                ));
            }
        }
    }

    Ok(options.unwrap_or_default())
}
