//! Error taxonomy for desensitization.
//!
//! Two families live here:
//!
//! - **Configuration errors**: the caller wired something up wrong (bad
//!   offsets, unknown transformer, missing constructor, ...). These are fatal
//!   and always surface from the entry API.
//! - **Transformation failures**: a transformer or resolver could not process
//!   one value. Inside a composite object these are recovered at the object
//!   boundary and handed to the engine's [`FailureReporter`].

use std::fmt;

use crate::value::TypeName;

/// Result alias used throughout the crate.
pub type Result<T, E = DesensitizeError> = std::result::Result<T, E>;

/// Everything that can go wrong while desensitizing a value.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DesensitizeError {
    /// Offset-mode masking was asked to keep more characters than exist.
    #[error("marker offsets out of range: start {start} + end {end} exceeds length {len}")]
    OffsetOutOfRange {
        start: usize,
        end: usize,
        len: usize,
    },
    /// A marker's `regexp` failed to compile.
    #[error("invalid marker pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },
    /// A marker names a transformer kind nobody registered.
    #[error("no transformer registered for marker kind `{0}`")]
    UnknownTransformer(String),
    /// A marker names a condition nobody registered.
    #[error("no condition registered under `{0}`")]
    UnknownCondition(String),
    /// A composite or container type has no reachable construction strategy.
    #[error("no construction strategy for type `{0}`")]
    NoConstructionStrategy(TypeName),
    /// Two resolvers were registered with the same priority.
    #[error("resolver priority {priority} is already taken by `{existing}`")]
    DuplicatePriority { priority: i32, existing: String },
    /// A type descriptor violates its arity invariants.
    #[error("malformed type descriptor: {0}")]
    MalformedDescriptor(String),
    /// The typed bridge could not rebuild a Rust value from the value graph.
    #[error("expected {expected}, found {found}")]
    Mismatch {
        expected: &'static str,
        found: String,
    },
    /// A transformer or resolver failed on a particular value.
    #[error("desensitization failed: {0}")]
    Failed(String),
}

impl DesensitizeError {
    /// Shorthand for [`DesensitizeError::Failed`].
    pub fn failed(message: impl fmt::Display) -> Self {
        Self::Failed(message.to_string())
    }

    pub(crate) fn mismatch(expected: &'static str, found: impl fmt::Display) -> Self {
        Self::Mismatch {
            expected,
            found: found.to_string(),
        }
    }

    /// Returns `true` for caller misconfiguration, which is never recovered.
    ///
    /// Everything except [`DesensitizeError::Failed`] is configuration.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

/// A field whose desensitization failed and was recovered at the object boundary.
#[derive(Debug, Clone)]
pub struct FieldFailure {
    /// Runtime class of the object that was being rebuilt.
    pub class: TypeName,
    /// Name of the field whose resolution failed.
    pub field: String,
    /// The underlying failure.
    pub error: DesensitizeError,
}

impl fmt::Display for FieldFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}: {}", self.class, self.field, self.error)
    }
}

/// Receives field failures recovered during a desensitize call.
///
/// Desensitization is best-effort: when one field of an object cannot be
/// processed the whole object is returned unchanged and the failure is
/// reported here instead of being raised.
pub trait FailureReporter: Send + Sync {
    /// Called once per recovered failure.
    fn report(&self, failure: &FieldFailure);
}

/// Default reporter: emits a `tracing` warning.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingReporter;

impl FailureReporter for TracingReporter {
    fn report(&self, failure: &FieldFailure) {
        tracing::warn!(
            class = %failure.class,
            field = %failure.field,
            error = %failure.error,
            "field desensitization failed; object returned unchanged"
        );
    }
}

impl<F> FailureReporter for F
where
    F: Fn(&FieldFailure) + Send + Sync,
{
    fn report(&self, failure: &FieldFailure) {
        self(failure);
    }
}
