use super::show::kind_of;
use super::{FieldOutcome, Normalized, clean_value, coerce_number};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Upstream episode field names and their canonical counterparts
const EPISODE_FIELD_NAMES: &[(&str, &str)] = &[
    ("id", "id"),
    ("image", "fanart"),
    ("epnum", "absolute_number"),
    ("name", "episodename"),
    ("airdate", "firstaired"),
    ("screencap", "filename"),
    ("number", "episodenumber"),
    ("season", "seasonnumber"),
];

/// Canonical names of the disc-order numbering fields
const DVD_SEASON: &str = "dvd_season";
const DVD_EPISODE: &str = "dvd_episodenumber";

/// Which numbering scheme files episodes into seasons
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpisodeOrder {
    /// Numbering as originally aired
    #[default]
    Broadcast,
    /// Numbering of the physical media release, where available
    Dvd,
}

/// Maps an upstream episode object onto canonical episode fields
///
/// Known fields are renamed, all others pass through under their lower-cased
/// upstream name. String values are cleaned, except for the `filename`
/// screencap path which is kept verbatim.
pub fn episode_fields(raw: &Value) -> Normalized {
    let mut normalized = Normalized::default();

    let Some(object) = raw.as_object() else {
        normalized.apply(
            "episode",
            FieldOutcome::Skipped(format!("expected an object, got {}", kind_of(raw))),
        );
        return normalized;
    };

    for (key, value) in object {
        let name = EPISODE_FIELD_NAMES
            .iter()
            .find(|(from, _)| *from == key.as_str())
            .map_or_else(|| key.to_lowercase(), |(_, to)| to.to_string());
        let value = if name == "filename" {
            value.clone()
        } else {
            clean_value(value.clone())
        };
        normalized.apply(key, FieldOutcome::Mapped(vec![(name, value)]));
    }

    normalized
}

/// Resolves the effective `(season, episode)` pair of a normalized episode
///
/// In [`EpisodeOrder::Dvd`] mode the disc-order pair is used if and only if
/// both of its numbers are present and non-null; otherwise, and always in
/// broadcast mode, the broadcast pair is used. Returns `None` when the chosen
/// pair is incomplete or not numeric.
pub fn resolve_numbering(fields: &BTreeMap<String, Value>, order: EpisodeOrder) -> Option<(u32, u32)> {
    let present = |name: &str| fields.get(name).filter(|value| !value.is_null());

    let (season, episode) = match (order, present(DVD_SEASON), present(DVD_EPISODE)) {
        (EpisodeOrder::Dvd, Some(season), Some(episode)) => (season, episode),
        _ => (present("seasonnumber")?, present("episodenumber")?),
    };

    Some((coerce_number(season)?, coerce_number(episode)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn numbered(dvd_season: Value, dvd_episode: Value) -> BTreeMap<String, Value> {
        episode_fields(&json!({
            "season": 1,
            "number": 20,
            "dvd_season": dvd_season,
            "dvd_episodenumber": dvd_episode
        }))
        .fields
    }

    #[test]
    fn test_renames_fields() {
        let fields = episode_fields(&json!({
            "id": 4952,
            "url": "http://www.tvmaze.com/episodes/4952",
            "name": " Pilot &amp; Part 1 ",
            "season": 1,
            "number": 1,
            "airdate": "2004-09-22",
            "airtime": "21:00",
            "runtime": 60,
            "image": {"medium": "m.jpg", "original": "o.jpg"},
            "screencap": " raw/path.jpg ",
            "epnum": 1,
            "airStamp": "2004-09-23T01:00:00+00:00"
        }))
        .fields;

        assert_eq!(fields["id"], json!(4952));
        assert_eq!(fields["episodename"], json!("Pilot & Part 1"));
        assert_eq!(fields["seasonnumber"], json!(1));
        assert_eq!(fields["episodenumber"], json!(1));
        assert_eq!(fields["firstaired"], json!("2004-09-22"));
        assert_eq!(fields["fanart"], json!({"medium": "m.jpg", "original": "o.jpg"}));
        assert_eq!(fields["filename"], json!(" raw/path.jpg "));
        assert_eq!(fields["absolute_number"], json!(1));
        assert_eq!(fields["airtime"], json!("21:00"));
        assert_eq!(fields["url"], json!("http://www.tvmaze.com/episodes/4952"));
        assert_eq!(fields["airstamp"], json!("2004-09-23T01:00:00+00:00"));
    }

    #[test]
    fn test_dvd_order_preferred_when_complete() {
        let fields = numbered(json!(2), json!(5));
        assert_eq!(resolve_numbering(&fields, EpisodeOrder::Dvd), Some((2, 5)));
        assert_eq!(resolve_numbering(&fields, EpisodeOrder::Broadcast), Some((1, 20)));
    }

    #[test]
    fn test_dvd_order_falls_back_to_broadcast() {
        let fields = numbered(json!(null), json!(null));
        assert_eq!(resolve_numbering(&fields, EpisodeOrder::Dvd), Some((1, 20)));

        let half = numbered(json!(2), json!(null));
        assert_eq!(resolve_numbering(&half, EpisodeOrder::Dvd), Some((1, 20)));
    }

    #[test]
    fn test_float_looking_numbers() {
        let fields = numbered(json!("2.0"), json!("5.0"));
        assert_eq!(resolve_numbering(&fields, EpisodeOrder::Dvd), Some((2, 5)));
    }

    #[test]
    fn test_missing_numbers_do_not_resolve() {
        let fields = episode_fields(&json!({"name": "Special", "season": 1, "number": null})).fields;
        assert_eq!(resolve_numbering(&fields, EpisodeOrder::Broadcast), None);
        assert_eq!(resolve_numbering(&fields, EpisodeOrder::Dvd), None);
    }
}
