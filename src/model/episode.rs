use super::lookup::{LookupError, searchable_text};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Positional identity of an episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EpisodeKey {
    pub show_id: u64,
    pub season_number: u32,
    pub episode_number: u32,
}

/// A single episode with its flat field mapping
///
/// The owning season is referenced by number only; use
/// [`Show::season_of`](super::Show::season_of) to resolve it. Two episodes
/// are equal when they sit at the same position of the same show, regardless
/// of their field contents.
#[derive(Debug, Clone, Serialize)]
pub struct Episode {
    #[serde(flatten)]
    key: EpisodeKey,
    fields: BTreeMap<String, Value>,
}

impl Episode {
    pub(crate) fn new(show_id: u64, season_number: u32, episode_number: u32) -> Self {
        Self {
            key: EpisodeKey {
                show_id,
                season_number,
                episode_number,
            },
            fields: BTreeMap::new(),
        }
    }

    pub fn key(&self) -> EpisodeKey {
        self.key
    }

    pub fn show_id(&self) -> u64 {
        self.key.show_id
    }

    /// Number of the season this episode was filed under
    pub fn season_number(&self) -> u32 {
        self.key.season_number
    }

    pub fn episode_number(&self) -> u32 {
        self.key.episode_number
    }

    /// Looks up a field by name
    pub fn get(&self, name: &str) -> Result<&Value, LookupError> {
        self.fields
            .get(name)
            .ok_or_else(|| LookupError::AttributeNotFound(name.to_string()))
    }

    /// Looks up a field and returns it only if it is a string
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    pub(crate) fn set(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    /// Episode title
    pub fn name(&self) -> Option<&str> {
        self.get_str("episodename")
    }

    /// Air date as delivered upstream (`YYYY-MM-DD`)
    pub fn first_aired(&self) -> Option<&str> {
        self.get_str("firstaired")
    }

    pub fn airtime(&self) -> Option<&str> {
        self.get_str("airtime")
    }

    pub fn airstamp(&self) -> Option<&str> {
        self.get_str("airstamp")
    }

    pub fn runtime(&self) -> Option<u64> {
        self.fields.get("runtime").and_then(Value::as_u64)
    }

    /// URL of the episode still, preferring the original resolution
    pub fn image_url(&self) -> Option<&str> {
        let image = self.fields.get("fanart")?;
        match image {
            Value::String(url) => Some(url.as_str()),
            Value::Object(urls) => urls
                .get("original")
                .or_else(|| urls.get("medium"))
                .and_then(Value::as_str),
            _ => None,
        }
    }

    /// Returns this episode if any of its fields contains `term`
    ///
    /// The comparison is a case-insensitive substring match. When `key` is
    /// given, only the field with that name is considered.
    pub fn search(&self, term: &str, key: Option<&str>) -> Option<&Episode> {
        let term = term.to_lowercase();
        let key = key.map(str::to_lowercase);

        let found = self.fields.iter().any(|(name, value)| {
            if let Some(ref key) = key {
                if name.to_lowercase() != *key {
                    return false;
                }
            }
            searchable_text(value).is_some_and(|text| text.contains(&term))
        });

        found.then_some(self)
    }
}

impl PartialEq for Episode {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Episode {}

impl Hash for Episode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for Episode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}x{:02}",
            self.key.season_number, self.key.episode_number
        )?;
        if let Some(name) = self.name() {
            write!(f, " - {}", name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Episode {
        let mut episode = Episode::new(1, 1, 2);
        episode.set("episodename", json!("My Mentor"));
        episode.set("firstaired", json!("2001-10-04"));
        episode.set("episodenumber", json!(2));
        episode.set("summary", json!(null));
        episode
    }

    #[test]
    fn test_get_missing_field() {
        let episode = sample();
        assert_eq!(episode.get("episodename").unwrap(), &json!("My Mentor"));
        assert_eq!(
            episode.get("director"),
            Err(LookupError::AttributeNotFound("director".into()))
        );
    }

    #[test]
    fn test_search_unrestricted_and_restricted() {
        let episode = sample();
        assert!(episode.search("MENTOR", None).is_some());
        assert!(episode.search("2001-10", None).is_some());
        assert!(episode.search("mentor", Some("episodename")).is_some());
        assert!(episode.search("mentor", Some("firstaired")).is_none());
        assert!(episode.search("null", None).is_none());
    }

    #[test]
    fn test_field_lookup_agrees_with_search() {
        let episode = sample();
        let value = episode.get("episodename").unwrap().as_str().unwrap();
        let found = episode.search(value, Some("episodename")).unwrap();
        assert_eq!(found.get("episodename").unwrap(), &json!(value));
    }

    #[test]
    fn test_equality_is_positional() {
        let mut other = Episode::new(1, 1, 2);
        other.set("episodename", json!("Something Else"));
        assert_eq!(sample(), other);
        assert_ne!(sample(), Episode::new(1, 2, 2));
        assert_ne!(sample(), Episode::new(7, 1, 2));
    }

    #[test]
    fn test_display() {
        assert_eq!(sample().to_string(), "01x02 - My Mentor");
        assert_eq!(Episode::new(1, 3, 15).to_string(), "03x15");
    }

    #[test]
    fn test_image_url() {
        let mut episode = sample();
        assert_eq!(episode.image_url(), None);
        episode.set(
            "fanart",
            json!({"medium": "http://img/m.jpg", "original": "http://img/o.jpg"}),
        );
        assert_eq!(episode.image_url(), Some("http://img/o.jpg"));
    }
}
