//! Schedule and direct lookup endpoints
//!
//! These endpoints do not populate the show tree and bypass the show cache.
//! Their results are normalized like everything else.

use super::{IndexerClient, IndexerError, Request};
use crate::model::ShowSummary;
use crate::normalize::{FieldWarning, episode_fields, show_fields};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// One episode airing on a given day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleEntry {
    /// Canonical episode fields
    pub fields: BTreeMap<String, Value>,
    /// The show the episode belongs to, when upstream included it
    pub show: Option<ShowSummary>,
    pub warnings: Vec<FieldWarning>,
}

impl ScheduleEntry {
    fn from_raw(raw: &Value) -> Self {
        let mut episode = raw.clone();
        let embedded_show = match episode.as_object_mut() {
            Some(object) => object.remove("show").or_else(|| {
                object
                    .remove("_embedded")
                    .and_then(|mut embedded| embedded.get_mut("show").map(Value::take))
            }),
            None => None,
        };

        let normalized = episode_fields(&episode);
        Self {
            fields: normalized.fields,
            show: embedded_show.and_then(|show| ShowSummary::from_normalized(show_fields(&show))),
            warnings: normalized.warnings,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.fields.get("episodename").and_then(Value::as_str)
    }

    pub fn airstamp(&self) -> Option<&str> {
        self.fields.get("airstamp").and_then(Value::as_str)
    }

    pub fn season_number(&self) -> Option<u32> {
        self.fields
            .get("seasonnumber")
            .and_then(crate::normalize::coerce_number)
    }

    pub fn episode_number(&self) -> Option<u32> {
        self.fields
            .get("episodenumber")
            .and_then(crate::normalize::coerce_number)
    }
}

/// Show information with optionally embedded relations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShowInfo {
    pub summary: ShowSummary,
    /// Raw embedded relations, keyed by relation name (e.g. `episodes`)
    pub embedded: BTreeMap<String, Value>,
}

impl IndexerClient {
    /// Finds a show by its TVRage id
    pub fn lookup_tvrage(&self, tvrage_id: u64) -> Result<Option<ShowSummary>, IndexerError> {
        self.lookup("tvrage", tvrage_id)
    }

    /// Finds a show by its TheTVDB id
    pub fn lookup_tvdb(&self, tvdb_id: u64) -> Result<Option<ShowSummary>, IndexerError> {
        self.lookup("thetvdb", tvdb_id)
    }

    fn lookup(&self, source: &str, id: u64) -> Result<Option<ShowSummary>, IndexerError> {
        let request = Request::new("/lookup/shows").query(source, id.to_string());
        let summary = self
            .fetch(request)?
            .and_then(|raw| ShowSummary::from_normalized(show_fields(&raw)));
        debug!(source, id, found = summary.is_some(), "Looked up show by external id");
        Ok(summary)
    }

    /// Episodes airing in `country` (ISO 3166-1 code) on `date`
    pub fn schedule(
        &self,
        country: &str,
        date: NaiveDate,
    ) -> Result<Vec<ScheduleEntry>, IndexerError> {
        let request = Request::new("/schedule")
            .query("country", country)
            .query("date", date.format("%Y-%m-%d").to_string());
        self.schedule_entries(request)
    }

    /// All known future episodes
    ///
    /// The response is several megabytes large; enable the response cache
    /// when calling this repeatedly.
    pub fn full_schedule(&self) -> Result<Vec<ScheduleEntry>, IndexerError> {
        self.schedule_entries(Request::new("/schedule/full"))
    }

    fn schedule_entries(&self, request: Request) -> Result<Vec<ScheduleEntry>, IndexerError> {
        let entries = match self.fetch(request)? {
            Some(Value::Array(items)) => items.iter().map(ScheduleEntry::from_raw).collect(),
            _ => Vec::new(),
        };
        Ok(entries)
    }

    /// Show information without populating the tree or the show cache
    ///
    /// `embed` names a relation upstream should include, such as `episodes`
    /// or `cast`.
    pub fn show_main_info(
        &self,
        id: u64,
        embed: Option<&str>,
    ) -> Result<Option<ShowInfo>, IndexerError> {
        let mut request = Request::new(format!("/shows/{}", id));
        if let Some(relation) = embed {
            request = request.query("embed", relation);
        }

        let Some(raw) = self.fetch(request)? else {
            return Ok(None);
        };

        let embedded = match raw.get("_embedded") {
            Some(Value::Object(relations)) => relations
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            _ => BTreeMap::new(),
        };

        Ok(ShowSummary::from_normalized(show_fields(&raw))
            .map(|summary| ShowInfo { summary, embedded }))
    }
}
