//! Sensitivity markers attached to type positions.
//!
//! A [`Marker`] names the transformer that handles a position (its
//! [`MarkerKind`]) together with the configuration that transformer reads:
//! offsets, an optional pattern, the placeholder character, an optional
//! condition and an optional transformer override.
//!
//! Markers are plain data. Validation of offsets happens where the target
//! length is known, inside the transformer; an out-of-range configuration is
//! reported as an error, never clamped.

use std::{borrow::Cow, fmt, sync::Arc};

use once_cell::sync::OnceCell;
use regex::Regex;

use crate::{
    error::{DesensitizeError, Result},
    transform::{Condition, Transformer},
};

/// Default replacement character.
pub const MASK_CHAR: char = '*';

/// Identifies which registered transformer handles a marker.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerKind(Cow<'static, str>);

impl MarkerKind {
    /// Character masking by offsets or pattern.
    pub const MASK: Self = Self(Cow::Borrowed("mask"));
    /// Email masking confined to the local part.
    pub const EMAIL: Self = Self(Cow::Borrowed("email"));

    pub fn new(kind: impl Into<Cow<'static, str>>) -> Self {
        Self(kind.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for MarkerKind {
    fn from(kind: &'static str) -> Self {
        Self(Cow::Borrowed(kind))
    }
}

/// A regular expression compiled on first use and cached.
#[derive(Clone)]
pub struct Pattern {
    source: String,
    compiled: OnceCell<std::result::Result<Regex, String>>,
}

impl Pattern {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            compiled: OnceCell::new(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns the compiled expression.
    ///
    /// A pattern that fails to compile keeps failing with the same error.
    pub fn regex(&self) -> Result<&Regex> {
        self.compiled
            .get_or_init(|| Regex::new(&self.source).map_err(|err| err.to_string()))
            .as_ref()
            .map_err(|message| DesensitizeError::InvalidPattern {
                pattern: self.source.clone(),
                message: message.clone(),
            })
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.source).finish()
    }
}

/// Either a registry name or an inline instance.
pub enum Reference<T: ?Sized> {
    /// Looked up in the engine's registry at dispatch time.
    Named(Cow<'static, str>),
    /// Used directly.
    Instance(Arc<T>),
}

impl<T: ?Sized> Clone for Reference<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Named(name) => Self::Named(name.clone()),
            Self::Instance(instance) => Self::Instance(Arc::clone(instance)),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Reference<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Instance(_) => f.write_str("Instance(..)"),
        }
    }
}

/// Condition deciding whether a marked value needs desensitizing at all.
pub type ConditionRef = Reference<dyn Condition>;
/// Transformer used instead of the one registered for the marker's kind.
pub type TransformerRef = Reference<dyn Transformer>;

/// Metadata attached to a type position.
#[derive(Clone, Debug)]
pub struct Marker {
    kind: MarkerKind,
    start_offset: usize,
    end_offset: usize,
    regexp: Option<Pattern>,
    placeholder: char,
    condition: Option<ConditionRef>,
    transformer: Option<TransformerRef>,
}

impl Marker {
    /// A marker of `kind` with zero offsets and the default placeholder.
    pub fn new(kind: impl Into<MarkerKind>) -> Self {
        Self {
            kind: kind.into(),
            start_offset: 0,
            end_offset: 0,
            regexp: None,
            placeholder: MASK_CHAR,
            condition: None,
            transformer: None,
        }
    }

    /// Character masking keeping `start` leading and `end` trailing characters.
    pub fn mask(start: usize, end: usize) -> Self {
        Self::new(MarkerKind::MASK).with_offsets(start, end)
    }

    /// Character masking of every match of `pattern`.
    pub fn pattern(pattern: impl Into<String>) -> Self {
        Self::new(MarkerKind::MASK).with_regexp(pattern)
    }

    #[must_use]
    pub fn with_offsets(mut self, start: usize, end: usize) -> Self {
        self.start_offset = start;
        self.end_offset = end;
        self
    }

    #[must_use]
    pub fn with_start_offset(mut self, start: usize) -> Self {
        self.start_offset = start;
        self
    }

    #[must_use]
    pub fn with_end_offset(mut self, end: usize) -> Self {
        self.end_offset = end;
        self
    }

    /// Sets a pattern; when non-empty it overrides the offsets.
    #[must_use]
    pub fn with_regexp(mut self, pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        self.regexp = (!pattern.is_empty()).then(|| Pattern::new(pattern));
        self
    }

    #[must_use]
    pub fn with_placeholder(mut self, placeholder: char) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Gates the marker on a condition registered under `name`.
    #[must_use]
    pub fn with_condition_named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.condition = Some(Reference::Named(name.into()));
        self
    }

    /// Gates the marker on an inline condition.
    #[must_use]
    pub fn with_condition<C>(mut self, condition: C) -> Self
    where
        C: Condition + 'static,
    {
        self.condition = Some(Reference::Instance(Arc::new(condition)));
        self
    }

    /// Routes the marker to the transformer registered for another kind.
    #[must_use]
    pub fn with_transformer_named(mut self, kind: impl Into<Cow<'static, str>>) -> Self {
        self.transformer = Some(Reference::Named(kind.into()));
        self
    }

    /// Routes the marker to an inline transformer.
    #[must_use]
    pub fn with_transformer<T>(mut self, transformer: T) -> Self
    where
        T: Transformer + 'static,
    {
        self.transformer = Some(Reference::Instance(Arc::new(transformer)));
        self
    }

    pub fn kind(&self) -> &MarkerKind {
        &self.kind
    }

    pub fn start_offset(&self) -> usize {
        self.start_offset
    }

    pub fn end_offset(&self) -> usize {
        self.end_offset
    }

    pub fn regexp(&self) -> Option<&Pattern> {
        self.regexp.as_ref()
    }

    pub fn placeholder(&self) -> char {
        self.placeholder
    }

    pub fn condition(&self) -> Option<&ConditionRef> {
        self.condition.as_ref()
    }

    pub fn transformer(&self) -> Option<&TransformerRef> {
        self.transformer.as_ref()
    }

    /// Checks `start + end <= len` for offset-mode masking.
    pub fn check_offsets(&self, len: usize) -> Result<()> {
        let fits = self
            .start_offset
            .checked_add(self.end_offset)
            .is_some_and(|span| span <= len);
        if fits {
            Ok(())
        } else {
            Err(DesensitizeError::OffsetOutOfRange {
                start: self.start_offset,
                end: self.end_offset,
                len,
            })
        }
    }
}

/// Associates a zero-sized marker type with its default marker.
///
/// Implement this for unit structs to use them in `#[sensitive(...)]`:
///
/// ```rust
/// use desensitize::{Marker, MarkerDefinition};
///
/// struct OrderNumber;
///
/// impl MarkerDefinition for OrderNumber {
///     fn marker() -> Marker {
///         Marker::mask(2, 2).with_placeholder('#')
///     }
/// }
/// ```
pub trait MarkerDefinition {
    /// The marker with this definition's default configuration.
    fn marker() -> Marker;
}

/// Marker options in a deserializable form, for markers kept in configuration.
#[cfg(feature = "serde")]
#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkerConfig {
    pub kind: Option<String>,
    pub start_offset: Option<usize>,
    pub end_offset: Option<usize>,
    pub regexp: Option<String>,
    pub placeholder: Option<char>,
    pub condition: Option<String>,
    pub transformer: Option<String>,
}

#[cfg(feature = "serde")]
impl MarkerConfig {
    /// Builds a marker, falling back to `base` for every unset option.
    pub fn apply_to(self, base: Marker) -> Marker {
        let mut marker = base;
        if let Some(kind) = self.kind {
            marker.kind = MarkerKind::new(kind);
        }
        if let Some(start) = self.start_offset {
            marker.start_offset = start;
        }
        if let Some(end) = self.end_offset {
            marker.end_offset = end;
        }
        if let Some(pattern) = self.regexp {
            marker = marker.with_regexp(pattern);
        }
        if let Some(placeholder) = self.placeholder {
            marker.placeholder = placeholder;
        }
        if let Some(condition) = self.condition {
            marker = marker.with_condition_named(condition);
        }
        if let Some(transformer) = self.transformer {
            marker = marker.with_transformer_named(transformer);
        }
        marker
    }

    /// Builds a marker from scratch; `kind` defaults to [`MarkerKind::MASK`].
    pub fn into_marker(self) -> Marker {
        self.apply_to(Marker::new(MarkerKind::MASK))
    }
}
