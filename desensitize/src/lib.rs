//! Type-directed desensitization of structured data.
//!
//! This crate separates:
//! - **Shape**: a [`TypeNode`] describing where a value's leaves are, and which
//!   [`Marker`]s sit on them.
//! - **Transformation**: the [`Transformer`] registered for each marker kind.
//!
//! An [`Engine`] walks a value against its shape through a priority-ordered
//! resolver pipeline (bounds, sequences, maps, arrays, markers, cascade) and
//! returns a desensitized copy. The input is never modified.
//!
//! Key rules:
//! - Use `#[sensitive(Marker)]` on leaf fields (`String`, or containers of them).
//! - Use `#[sensitive]` on fields holding nested `Sensitive` types to walk them.
//! - Unannotated fields pass through unchanged.
//! - Misconfiguration (bad offsets, unknown marker kinds) is an error; a failure
//!   inside one object returns that object unchanged and is reported through the
//!   engine's [`FailureReporter`].
//!
//! ```rust
//! use desensitize::{Desensitize, Phone, Sensitive};
//!
//! #[derive(Debug, Sensitive)]
//! struct Contact {
//!     name: String,
//!     #[sensitive(Phone)]
//!     phone: String,
//! }
//!
//! let contact = Contact {
//!     name: "Ann".into(),
//!     phone: "19962000001".into(),
//! }
//! .desensitize()
//! .unwrap();
//! assert_eq!(contact.phone, "199****0001");
//! assert_eq!(contact.name, "Ann");
//! ```
//!
//! Values without a static type (including self-referential graphs) are built
//! from [`Value`], [`Class`] and [`ObjectRef`] and passed to
//! [`Engine::desensitize_value_with`].
//!
//! Integrations live behind feature flags: `catalog` (built-in markers, on by
//! default), `serde` (JSON view of [`Value`], deserializable marker options),
//! `slog` (log desensitized values as structured JSON).

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

pub use desensitize_derive::Sensitive;

#[allow(unused_extern_crates)]
extern crate self as desensitize;

// Module declarations
#[cfg(feature = "catalog")]
mod catalog;
mod class;
mod construct;
mod descriptor;
mod engine;
mod error;
mod marker;
pub mod resolve;
#[cfg(feature = "serde")]
mod serde;
#[cfg(feature = "slog")]
pub mod slog;
pub mod transform;
mod typed;
mod value;
mod visited;

// Re-exports
#[cfg(feature = "catalog")]
pub use catalog::{Address, BankCard, Email, IdCard, Name, Password, Phone};
pub use class::{Class, ClassBuilder, Field, SlotIter};
pub use construct::{ConstructionStrategy, FamilyCopyConstructor, ZeroArgConstructor};
pub use descriptor::{NodeKind, TypeNode};
pub use engine::{desensitize, desensitize_with, global, install, Engine, EngineBuilder};
pub use error::{DesensitizeError, FailureReporter, FieldFailure, Result, TracingReporter};
#[cfg(feature = "serde")]
pub use marker::MarkerConfig;
pub use marker::{
    ConditionRef, Marker, MarkerDefinition, MarkerKind, Pattern, Reference, TransformerRef,
    MASK_CHAR,
};
pub use resolve::{Context, Resolver};
pub use transform::{Condition, Transformer};
pub use typed::{Desensitize, SensitiveType};
pub use value::{Array, Mapping, Object, ObjectRef, Sequence, TypeName, Value, ValueClass};
pub use visited::VisitedSet;

/// Items used by code generated from `#[derive(Sensitive)]`.
#[doc(hidden)]
pub mod __private {
    pub use once_cell::sync::Lazy;

    pub use crate::typed::{composite_from_value, composite_into_value, next_slot, Composite};
}
