//! Adapters for emitting desensitized values through `slog`.
//!
//! This module connects [`crate::Desensitize`] with `slog` by providing
//! `slog::Value` implementations that serialize desensitized outputs as
//! structured JSON via `slog`'s nested-value support.
//!
//! The logged representation is always derived from the desensitized copy,
//! never from the original value. Logging stays infallible: a failed
//! desensitization or serialization is logged as a placeholder string.

use serde::Serialize;
use serde_json::Value as JsonValue;
use slog::{Key, Record, Result as SlogResult, Serializer, Value as SlogValue};

use crate::{engine::Engine, typed::SensitiveType};

/// Placeholder logged when a value could not be desensitized.
pub const DESENSITIZE_FAILED: &str = "Failed to desensitize value";
/// Placeholder logged when a desensitized value could not be serialized.
pub const SERIALIZE_FAILED: &str = "Failed to serialize desensitized value";

/// A `slog::Value` that emits an owned desensitized payload as structured
/// JSON.
pub struct DesensitizedJson {
    value: JsonValue,
}

impl DesensitizedJson {
    fn new(value: JsonValue) -> Self {
        Self { value }
    }

    /// The JSON payload that will be logged.
    pub fn json(&self) -> &JsonValue {
        &self.value
    }
}

impl SlogValue for DesensitizedJson {
    fn serialize(
        &self,
        record: &Record<'_>,
        key: Key,
        serializer: &mut dyn Serializer,
    ) -> SlogResult {
        let nested = slog::Serde(self.value.clone());
        SlogValue::serialize(&nested, record, key, serializer)
    }
}

/// Converts values into a `slog::Value` that logs their desensitized form as
/// JSON.
///
/// ## Example
/// ```ignore
/// use desensitize::slog::IntoDesensitizedJson;
///
/// info!(logger, "signup"; "user" => user.into_desensitized_json());
/// ```
pub trait IntoDesensitizedJson: SensitiveType + Serialize {
    /// Desensitizes `self` with the global engine.
    fn into_desensitized_json(self) -> DesensitizedJson {
        self.into_desensitized_json_with(crate::engine::global())
    }

    /// Desensitizes `self` with `engine`.
    fn into_desensitized_json_with(self, engine: &Engine) -> DesensitizedJson {
        let json = match engine.desensitize(self) {
            Ok(copy) => serde_json::to_value(copy)
                .unwrap_or_else(|_| JsonValue::String(SERIALIZE_FAILED.to_owned())),
            Err(error) => {
                tracing::warn!(%error, "value could not be desensitized for logging");
                JsonValue::String(DESENSITIZE_FAILED.to_owned())
            }
        };
        DesensitizedJson::new(json)
    }
}

impl<T> IntoDesensitizedJson for T where T: SensitiveType + Serialize {}
