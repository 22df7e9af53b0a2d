use super::episode::Episode;
use super::lookup::{Key, LookupError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A numbered season holding its episodes keyed by episode number
///
/// The owning show is referenced by id only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Season {
    show_id: u64,
    number: u32,
    episodes: BTreeMap<u32, Episode>,
}

impl Season {
    pub(crate) fn new(show_id: u64, number: u32) -> Self {
        Self {
            show_id,
            number,
            episodes: BTreeMap::new(),
        }
    }

    pub fn show_id(&self) -> u64 {
        self.show_id
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    /// Looks up an episode by its number
    pub fn episode(&self, number: u32) -> Result<&Episode, LookupError> {
        self.episodes
            .get(&number)
            .ok_or_else(|| LookupError::EpisodeNotFound(number.to_string()))
    }

    /// Looks up an entry by number or name
    ///
    /// Seasons carry no scalar attributes, so every named key misses with
    /// [`LookupError::AttributeNotFound`].
    pub fn get<'k>(&self, key: impl Into<Key<'k>>) -> Result<&Episode, LookupError> {
        match key.into() {
            Key::Index(number) => self.episode(number),
            Key::Name(name) => Err(LookupError::AttributeNotFound(name.to_string())),
        }
    }

    /// Episodes in ascending episode number order
    pub fn episodes(&self) -> impl Iterator<Item = &Episode> {
        self.episodes.values()
    }

    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }

    /// Returns every episode of this season matching `term`
    ///
    /// See [`Episode::search`] for the matching rules.
    pub fn search(&self, term: &str, key: Option<&str>) -> Vec<&Episode> {
        self.episodes
            .values()
            .filter_map(|episode| episode.search(term, key))
            .collect()
    }

    /// Returns the episode with this number, creating an empty one if needed
    pub(crate) fn episode_entry(&mut self, number: u32) -> &mut Episode {
        let (show_id, season) = (self.show_id, self.number);
        self.episodes
            .entry(number)
            .or_insert_with(|| Episode::new(show_id, season, number))
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Season {} (containing {} episodes)",
            self.number,
            self.episodes.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Season {
        let mut season = Season::new(1, 3);
        season
            .episode_entry(15)
            .set("episodename", json!("My Tormented Mentor"));
        season
            .episode_entry(1)
            .set("episodename", json!("My Own American Girl"));
        season
    }

    #[test]
    fn test_episode_lookup() {
        let season = sample();
        assert_eq!(season.episode(15).unwrap().episode_number(), 15);
        assert_eq!(season.get("1").unwrap().episode_number(), 1);
        assert_eq!(
            season.episode(99),
            Err(LookupError::EpisodeNotFound("99".into()))
        );
        assert_eq!(
            season.get("network").unwrap_err(),
            LookupError::AttributeNotFound("network".into())
        );
    }

    #[test]
    fn test_episodes_back_reference_season() {
        let season = sample();
        assert!(
            season
                .episodes()
                .all(|episode| episode.season_number() == season.number()
                    && episode.show_id() == season.show_id())
        );
    }

    #[test]
    fn test_search_in_episode_order() {
        let season = sample();
        let found: Vec<u32> = season
            .search("my", Some("episodename"))
            .iter()
            .map(|episode| episode.episode_number())
            .collect();
        assert_eq!(found, vec![1, 15]);
        assert!(season.search("mentor", Some("firstaired")).is_empty());
    }
}
