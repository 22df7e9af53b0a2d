use super::lookup::LookupError;
use crate::normalize::{FieldWarning, Normalized};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Scalar fields of a show as returned by a search, without any episodes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShowSummary {
    id: u64,
    fields: BTreeMap<String, Value>,
    warnings: Vec<FieldWarning>,
}

impl ShowSummary {
    /// Builds a summary from normalized fields
    ///
    /// Returns `None` when the fields carry no usable numeric `id`, since
    /// such a candidate could never be resolved into a full show.
    pub fn from_normalized(normalized: Normalized) -> Option<Self> {
        let id = normalized.fields.get("id").and_then(Value::as_u64)?;
        Some(Self {
            id,
            fields: normalized.fields,
            warnings: normalized.warnings,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn get(&self, name: &str) -> Result<&Value, LookupError> {
        self.fields
            .get(name)
            .ok_or_else(|| LookupError::AttributeNotFound(name.to_string()))
    }

    pub fn name(&self) -> Option<&str> {
        self.fields.get("seriesname").and_then(Value::as_str)
    }

    pub fn first_aired(&self) -> Option<&str> {
        self.fields.get("firstaired").and_then(Value::as_str)
    }

    pub fn network(&self) -> Option<&str> {
        self.fields.get("network").and_then(Value::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    pub fn warnings(&self) -> &[FieldWarning] {
        &self.warnings
    }
}

impl fmt::Display for ShowSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name().unwrap_or("Unknown"))?;
        if let Some(year) = self.first_aired().and_then(|date| date.get(..4)) {
            write!(f, " ({})", year)?;
        }
        if let Some(network) = self.network() {
            write!(f, " [{}]", network)?;
        }
        Ok(())
    }
}
