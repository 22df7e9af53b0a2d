//! Keys and lookup errors shared by all metadata entities

use serde_json::Value;
use thiserror::Error;

/// A failed lookup in the metadata model
///
/// Each variant corresponds to exactly one way a lookup can miss, so callers
/// can tell a missing season from a missing episode or attribute.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The show has no season with this number
    #[error("Could not find season {0}")]
    SeasonNotFound(u32),

    /// No episode matched the requested number or date
    #[error("Could not find episode {0}")]
    EpisodeNotFound(String),

    /// The entity has no attribute with this name
    #[error("Cannot find attribute {0:?}")]
    AttributeNotFound(String),
}

/// Addresses an entry of a show or season
///
/// Numbers address the child collection (seasons of a show, episodes of a
/// season), names address scalar attributes. Both live in one namespace from
/// the caller's point of view but never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key<'a> {
    /// A season or episode number
    Index(u32),
    /// A named scalar attribute
    Name(&'a str),
}

impl From<u32> for Key<'_> {
    fn from(number: u32) -> Self {
        Key::Index(number)
    }
}

impl<'a> From<&'a str> for Key<'a> {
    /// Strings made up only of ASCII digits are treated as numbers
    fn from(key: &'a str) -> Self {
        if !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(number) = key.parse() {
                return Key::Index(number);
            }
        }
        Key::Name(key)
    }
}

/// Renders a field value the way search compares it
///
/// Strings are used verbatim, nulls are never matched, everything else is
/// compared by its JSON rendering.
pub(crate) fn searchable_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.to_lowercase()),
        other => Some(other.to_string().to_lowercase()),
    }
}
