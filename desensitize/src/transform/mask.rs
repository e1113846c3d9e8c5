//! Character masking transformers.
//!
//! Masking is a pure string transformation operating on Unicode scalar values.
//! Two modes exist, picked by the marker:
//!
//! - **pattern mode** (the marker has a non-empty `regexp`): every character of
//!   every non-empty match is replaced with the placeholder;
//! - **offset mode**: the characters in `[start, len - end)` are replaced,
//!   keeping `start` leading and `end` trailing characters visible.
//!
//! Offset mode fails fast when `start + end` exceeds the length of the target.
//! Both modes are idempotent: masking an already-masked value with the same
//! marker returns it unchanged.

use regex::Regex;

use super::Transformer;
use crate::{
    error::{DesensitizeError, Result},
    marker::Marker,
    value::{Value, ValueClass},
};

/// Replaces the characters in `[start, len - end)` with `placeholder`.
///
/// Empty input is returned as-is when both offsets are zero.
pub fn mask_range(value: &str, start: usize, end: usize, placeholder: char) -> Result<String> {
    let mut chars: Vec<char> = value.chars().collect();
    let total = chars.len();
    let fits = start.checked_add(end).is_some_and(|span| span <= total);
    if !fits {
        return Err(DesensitizeError::OffsetOutOfRange {
            start,
            end,
            len: total,
        });
    }

    chars[start..total - end].fill(placeholder);
    Ok(chars.into_iter().collect())
}

/// Replaces every character of every non-empty match of `pattern`.
pub fn mask_matches(value: &str, pattern: &Regex, placeholder: char) -> String {
    let mut out = String::with_capacity(value.len());
    let mut cursor = 0;
    for found in pattern.find_iter(value).filter(|m| !m.as_str().is_empty()) {
        out.push_str(&value[cursor..found.start()]);
        out.extend(std::iter::repeat(placeholder).take(found.as_str().chars().count()));
        cursor = found.end();
    }
    out.push_str(&value[cursor..]);
    out
}

fn mask_with_marker(value: &str, marker: &Marker) -> Result<String> {
    match marker.regexp() {
        Some(pattern) => Ok(mask_matches(value, pattern.regex()?, marker.placeholder())),
        None => mask_range(
            value,
            marker.start_offset(),
            marker.end_offset(),
            marker.placeholder(),
        ),
    }
}

/// Masks strings (and single characters) by offsets or pattern.
///
/// Registered under [`crate::MarkerKind::MASK`].
#[derive(Clone, Copy, Debug, Default)]
pub struct MaskTransformer;

impl Transformer for MaskTransformer {
    fn supports(&self, class: ValueClass) -> bool {
        matches!(class, ValueClass::Str | ValueClass::Char)
    }

    fn transform(&self, value: Value, marker: &Marker) -> Result<Value> {
        match value {
            Value::Str(s) => mask_with_marker(&s, marker).map(Value::Str),
            Value::Char(c) => {
                let masked = mask_with_marker(c.encode_utf8(&mut [0; 4]), marker)?;
                Ok(masked.chars().next().map_or(Value::Char(c), Value::Char))
            }
            other => Ok(other),
        }
    }
}

/// Masks the local part of an email address, leaving the domain readable.
///
/// Offsets apply to the local part only (`"alice@example.com"` with offsets
/// `(1, 0)` becomes `"a****@example.com"`). Values without `@` are masked as a
/// whole. A pattern on the marker switches to pattern mode over the full value.
///
/// Registered under [`crate::MarkerKind::EMAIL`].
#[derive(Clone, Copy, Debug, Default)]
pub struct EmailTransformer;

impl Transformer for EmailTransformer {
    fn supports(&self, class: ValueClass) -> bool {
        class == ValueClass::Str
    }

    fn transform(&self, value: Value, marker: &Marker) -> Result<Value> {
        let Value::Str(address) = value else {
            return Ok(value);
        };
        if marker.regexp().is_some() {
            return mask_with_marker(&address, marker).map(Value::Str);
        }
        let masked = match address.split_once('@') {
            Some((local, domain)) => {
                let local = mask_with_marker(local, marker)?;
                format!("{local}@{domain}")
            }
            None => mask_with_marker(&address, marker)?,
        };
        Ok(Value::Str(masked))
    }
}
