//! Schema normalization
//!
//! Pure functions mapping the upstream JSON shapes onto the canonical field
//! names of the metadata model. Normalization is best effort: a field whose
//! extraction fails is skipped and reported as a [`FieldWarning`] instead of
//! failing the whole record.
mod art;
mod cast;
mod episode;
mod show;

pub use art::{banners_from_images, poster_banner};
pub use cast::{actor_from_cast, cast_fields};
pub use episode::{EpisodeOrder, episode_fields, resolve_numbering};
pub use show::show_fields;

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A field skipped during normalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldWarning {
    /// Upstream name of the skipped field
    pub field: String,
    pub reason: String,
}

impl FieldWarning {
    pub(crate) fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FieldWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Canonical fields of one record plus the fields that had to be skipped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub fields: BTreeMap<String, Value>,
    pub warnings: Vec<FieldWarning>,
}

/// Outcome of mapping a single upstream field
pub(crate) enum FieldOutcome {
    /// Canonical fields produced from the upstream field
    Mapped(Vec<(String, Value)>),
    /// The field was skipped on purpose and is not worth reporting
    Ignored,
    /// The field was malformed and had to be skipped
    Skipped(String),
}

impl Normalized {
    pub(crate) fn apply(&mut self, upstream_name: &str, outcome: FieldOutcome) {
        match outcome {
            FieldOutcome::Mapped(fields) => self.fields.extend(fields),
            FieldOutcome::Ignored => {}
            FieldOutcome::Skipped(reason) => {
                self.warnings.push(FieldWarning::new(upstream_name, reason))
            }
        }
    }
}

/// Cleans a string as delivered upstream
///
/// Unescapes the HTML ampersand entity and strips surrounding whitespace.
pub fn clean_text(text: &str) -> String {
    text.replace("&amp;", "&").trim().to_string()
}

/// Applies [`clean_text`] to string values, leaving other values untouched
pub(crate) fn clean_value(value: Value) -> Value {
    match value {
        Value::String(text) => Value::String(clean_text(&text)),
        other => other,
    }
}

/// Applies [`clean_text`] to all strings, descending into arrays and objects
pub(crate) fn clean_value_deep(value: Value) -> Value {
    match value {
        Value::String(text) => Value::String(clean_text(&text)),
        Value::Array(items) => Value::Array(items.into_iter().map(clean_value_deep).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, clean_value_deep(value)))
                .collect(),
        ),
        other => other,
    }
}

/// Coerces a season or episode number into an integer
///
/// Numbers may arrive as integers, floats or strings holding either (upstream
/// data is known to contain values like `"1.0"`), so everything goes through
/// a float parse before being truncated. Negative and non-finite values are
/// rejected.
pub fn coerce_number(value: &Value) -> Option<u32> {
    let number = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !number.is_finite() || number < 0.0 || number > f64::from(u32::MAX) {
        return None;
    }
    Some(number.trunc() as u32)
}
