//! Built-in marker definitions for common kinds of personal data.
//!
//! These types are zero-sized. They name a marker at the type level so derive
//! attributes can refer to it: `#[sensitive(Phone)]`.
//!
//! Every definition has its own [`MarkerKind`], handled by [`MaskTransformer`]
//! unless the engine registers something else for it, and is gated on the
//! `non_empty` condition so absent or empty values are left as they are.
//!
//! | Definition | Kind | Keeps |
//! |------------|------|-------|
//! | [`Phone`] | `phone` | first 3, last 4 |
//! | [`IdCard`] | `id_card` | first 6, last 4 |
//! | [`BankCard`] | `bank_card` | first 4, last 4 |
//! | [`Name`] | `name` | first 1 |
//! | [`Password`] | `password` | nothing |
//! | [`Email`] | `email` | first 1 of the local part, the domain |
//! | [`Address`] | `address` | first 6 |

use crate::{
    engine::EngineBuilder,
    marker::{Marker, MarkerDefinition, MarkerKind},
    transform::MaskTransformer,
};

const NON_EMPTY: &str = "non_empty";

fn masked(kind: &'static str, start: usize, end: usize) -> Marker {
    Marker::new(kind)
        .with_offsets(start, end)
        .with_condition_named(NON_EMPTY)
}

/// Mobile phone numbers.
#[derive(Clone, Copy, Debug)]
pub struct Phone;
impl MarkerDefinition for Phone {
    fn marker() -> Marker {
        masked("phone", 3, 4)
    }
}

/// Identity card numbers.
#[derive(Clone, Copy, Debug)]
pub struct IdCard;
impl MarkerDefinition for IdCard {
    fn marker() -> Marker {
        masked("id_card", 6, 4)
    }
}

/// Bank card numbers or PANs.
#[derive(Clone, Copy, Debug)]
pub struct BankCard;
impl MarkerDefinition for BankCard {
    fn marker() -> Marker {
        masked("bank_card", 4, 4)
    }
}

/// Personal names.
#[derive(Clone, Copy, Debug)]
pub struct Name;
impl MarkerDefinition for Name {
    fn marker() -> Marker {
        masked("name", 1, 0)
    }
}

/// Passwords and other secrets that are never shown.
#[derive(Clone, Copy, Debug)]
pub struct Password;
impl MarkerDefinition for Password {
    fn marker() -> Marker {
        masked("password", 0, 0)
    }
}

/// Email addresses.
#[derive(Clone, Copy, Debug)]
pub struct Email;
impl MarkerDefinition for Email {
    fn marker() -> Marker {
        Marker::new(MarkerKind::EMAIL)
            .with_offsets(1, 0)
            .with_condition_named(NON_EMPTY)
    }
}

/// Postal addresses.
#[derive(Clone, Copy, Debug)]
pub struct Address;
impl MarkerDefinition for Address {
    fn marker() -> Marker {
        masked("address", 6, 0)
    }
}

/// Registers the transformers for the catalog's kinds.
pub(crate) fn register(builder: EngineBuilder) -> EngineBuilder {
    ["phone", "id_card", "bank_card", "name", "password", "address"]
        .into_iter()
        .fold(builder, |builder, kind| {
            builder.transformer(kind, MaskTransformer)
        })
}
