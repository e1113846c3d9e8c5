//! Transformers and conditions.
//!
//! A [`Transformer`] turns a marked value into its desensitized form. It is a
//! pure function of `(value, marker)` plus two gates:
//!
//! - [`Transformer::supports`]: which runtime value classes it handles at all.
//!   Dispatch on anything else is skipped with a warning, because a marker is
//!   often reused across types it was never meant for.
//! - [`Transformer::should_transform`]: a per-value guard.
//!
//! A [`Condition`] is the marker-side gate: it decides whether this particular
//! value needs desensitizing (for example, skip empty strings).

mod condition;
mod mask;

pub use condition::{Always, Condition, NonEmpty};
pub use mask::{mask_matches, mask_range, EmailTransformer, MaskTransformer};

use crate::{
    error::Result,
    marker::Marker,
    value::{Value, ValueClass},
};

/// Maps a marked value to its desensitized form.
pub trait Transformer: Send + Sync {
    /// Whether values of `class` can be transformed.
    fn supports(&self, class: ValueClass) -> bool {
        let _ = class;
        true
    }

    /// Per-value guard evaluated after the marker's condition.
    fn should_transform(&self, value: &Value) -> bool {
        let _ = value;
        true
    }

    /// Produces the desensitized value.
    fn transform(&self, value: Value, marker: &Marker) -> Result<Value>;
}

impl<F> Transformer for F
where
    F: Fn(Value, &Marker) -> Result<Value> + Send + Sync,
{
    fn transform(&self, value: Value, marker: &Marker) -> Result<Value> {
        self(value, marker)
    }
}
