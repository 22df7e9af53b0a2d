use super::actor::{Actors, Banner};
use super::episode::Episode;
use super::lookup::{Key, LookupError};
use super::season::Season;
use crate::normalize::{FieldWarning, Normalized};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Which optional parts of a show have been fetched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ShowParts {
    pub episodes: bool,
    pub actors: bool,
    pub banners: bool,
}

impl ShowParts {
    /// Scalar fields plus the season/episode tree
    pub fn with_episodes() -> Self {
        Self {
            episodes: true,
            ..Self::default()
        }
    }

    /// Everything the indexer can fetch for a show
    pub fn all() -> Self {
        Self {
            episodes: true,
            actors: true,
            banners: true,
        }
    }

    /// Whether `self` includes every part requested by `other`
    pub fn covers(&self, other: &ShowParts) -> bool {
        (self.episodes || !other.episodes)
            && (self.actors || !other.actors)
            && (self.banners || !other.banners)
    }
}

/// Result of a dual-mode lookup on a [`Show`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShowEntry<'a> {
    Season(&'a Season),
    Field(&'a Value),
}

/// A show with its scalar data and season/episode tree
///
/// Scalar fields (the show-level data) and seasons are stored separately:
/// numeric keys always address seasons, named keys always address fields.
#[derive(Debug, Clone, Serialize)]
pub struct Show {
    id: u64,
    data: BTreeMap<String, Value>,
    seasons: BTreeMap<u32, Season>,
    actors: Actors,
    banners: Vec<Banner>,
    language: Option<String>,
    warnings: Vec<FieldWarning>,
    parts: ShowParts,
}

impl Show {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            data: BTreeMap::new(),
            seasons: BTreeMap::new(),
            actors: Actors::default(),
            banners: Vec::new(),
            language: None,
            warnings: Vec::new(),
            parts: ShowParts::default(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Looks up a season by number or a scalar field by name
    ///
    /// # Examples
    ///
    /// ```
    /// use maze_indexer::{LookupError, Show};
    ///
    /// let show = Show::new(1);
    /// assert_eq!(show.get(3u32).unwrap_err(), LookupError::SeasonNotFound(3));
    /// assert_eq!(
    ///     show.get("seriesname").unwrap_err(),
    ///     LookupError::AttributeNotFound("seriesname".into())
    /// );
    /// ```
    pub fn get<'k>(&self, key: impl Into<Key<'k>>) -> Result<ShowEntry<'_>, LookupError> {
        match key.into() {
            Key::Index(number) => self.season(number).map(ShowEntry::Season),
            Key::Name(name) => self.attr(name).map(ShowEntry::Field),
        }
    }

    pub fn season(&self, number: u32) -> Result<&Season, LookupError> {
        self.seasons
            .get(&number)
            .ok_or(LookupError::SeasonNotFound(number))
    }

    /// Looks up a scalar field by name
    pub fn attr(&self, name: &str) -> Result<&Value, LookupError> {
        self.data
            .get(name)
            .ok_or_else(|| LookupError::AttributeNotFound(name.to_string()))
    }

    /// Shorthand for `show.season(season)?.episode(episode)`
    pub fn episode(&self, season: u32, episode: u32) -> Result<&Episode, LookupError> {
        self.season(season)?.episode(episode)
    }

    /// Seasons in ascending season number order
    pub fn seasons(&self) -> impl Iterator<Item = &Season> {
        self.seasons.values()
    }

    /// Resolves the season an episode of this show was filed under
    pub fn season_of(&self, episode: &Episode) -> Option<&Season> {
        if episode.show_id() != self.id {
            return None;
        }
        self.seasons.get(&episode.season_number())
    }

    /// Searches all episodes of the show, in season then episode order
    ///
    /// See [`Episode::search`] for the matching rules.
    pub fn search(&self, term: &str, key: Option<&str>) -> Vec<&Episode> {
        self.seasons
            .values()
            .flat_map(|season| season.search(term, key))
            .collect()
    }

    /// Returns every episode whose air date matches `date`
    pub fn aired_on(&self, date: impl fmt::Display) -> Result<Vec<&Episode>, LookupError> {
        let date = date.to_string();
        let episodes = self.search(&date, Some("firstaired"));
        if episodes.is_empty() {
            return Err(LookupError::EpisodeNotFound(format!("aired on {}", date)));
        }
        Ok(episodes)
    }

    pub fn data(&self) -> &BTreeMap<String, Value> {
        &self.data
    }

    fn data_str(&self, name: &str) -> Option<&str> {
        self.data.get(name).and_then(Value::as_str)
    }

    fn data_id(&self, name: &str) -> Option<u64> {
        self.data.get(name).and_then(Value::as_u64)
    }

    pub fn name(&self) -> Option<&str> {
        self.data_str("seriesname")
    }

    /// Summary text, which upstream delivers as HTML
    pub fn overview(&self) -> Option<&str> {
        self.data_str("overview")
    }

    /// Premiere date (`YYYY-MM-DD`)
    pub fn first_aired(&self) -> Option<&str> {
        self.data_str("firstaired")
    }

    pub fn genres(&self) -> Vec<&str> {
        match self.data.get("genre") {
            Some(Value::Array(genres)) => genres.iter().filter_map(Value::as_str).collect(),
            Some(Value::String(genre)) => vec![genre.as_str()],
            _ => Vec::new(),
        }
    }

    pub fn network(&self) -> Option<&str> {
        self.data_str("network")
    }

    pub fn airs_time(&self) -> Option<&str> {
        self.data_str("airs_time")
    }

    /// Comma separated list of weekdays the show airs on
    pub fn airs_day_of_week(&self) -> Option<&str> {
        self.data_str("airs_dayofweek")
    }

    pub fn runtime(&self) -> Option<u64> {
        self.data_id("runtime")
    }

    pub fn poster(&self) -> Option<&str> {
        self.data_str("poster")
    }

    pub fn image_medium(&self) -> Option<&str> {
        self.data_str("image_medium")
    }

    pub fn image_original(&self) -> Option<&str> {
        self.data_str("image_original")
    }

    pub fn tvdb_id(&self) -> Option<u64> {
        self.data_id("tvdb_id")
    }

    pub fn tvrage_id(&self) -> Option<u64> {
        self.data_id("tvrage_id")
    }

    pub fn imdb_id(&self) -> Option<&str> {
        self.data_str("imdb_id")
    }

    pub fn actors(&self) -> &Actors {
        &self.actors
    }

    pub fn banners(&self) -> &[Banner] {
        &self.banners
    }

    /// Language the show data was requested in
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Fields that were skipped during normalization, and why
    pub fn warnings(&self) -> &[FieldWarning] {
        &self.warnings
    }

    pub fn parts(&self) -> ShowParts {
        self.parts
    }

    /// Total number of episodes over all seasons
    pub fn episode_count(&self) -> usize {
        self.seasons.values().map(Season::len).sum()
    }

    /// Merges normalized scalar fields, overwriting existing keys
    pub(crate) fn merge_data(&mut self, normalized: Normalized) {
        self.data.extend(normalized.fields);
        self.warnings.extend(normalized.warnings);
    }

    pub(crate) fn set_data(&mut self, name: impl Into<String>, value: Value) {
        self.data.insert(name.into(), value);
    }

    /// Stores the fields of one episode, creating its season as needed
    pub(crate) fn insert_episode(
        &mut self,
        season: u32,
        episode: u32,
        fields: impl IntoIterator<Item = (String, Value)>,
    ) {
        let id = self.id;
        let entry = self
            .seasons
            .entry(season)
            .or_insert_with(|| Season::new(id, season))
            .episode_entry(episode);
        for (name, value) in fields {
            entry.set(name, value);
        }
    }

    pub(crate) fn set_actors(&mut self, actors: Actors) {
        self.actors = actors;
        self.parts.actors = true;
    }

    pub(crate) fn set_banners(&mut self, banners: Vec<Banner>) {
        self.banners = banners;
        self.parts.banners = true;
    }

    pub(crate) fn set_language(&mut self, language: impl Into<String>) {
        self.language = Some(language.into());
    }

    pub(crate) fn push_warning(&mut self, warning: FieldWarning) {
        self.warnings.push(warning);
    }

    pub(crate) fn mark_episodes_loaded(&mut self) {
        self.parts.episodes = true;
    }
}

impl fmt::Display for Show {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Show {} (containing {} seasons)",
            self.name().unwrap_or("instance"),
            self.seasons.len()
        )
    }
}
