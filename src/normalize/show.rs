use super::{FieldOutcome, Normalized, clean_value};
use serde_json::{Map, Value};

/// Upstream show field names and their canonical counterparts
const SHOW_FIELD_NAMES: &[(&str, &str)] = &[
    ("id", "id"),
    ("name", "seriesname"),
    ("summary", "overview"),
    ("premiered", "firstaired"),
    ("genres", "genre"),
    ("image", "fanart"),
    ("url", "show_url"),
];

fn canonical_name(upstream: &str) -> &str {
    SHOW_FIELD_NAMES
        .iter()
        .find(|(from, _)| *from == upstream)
        .map(|(_, to)| *to)
        .unwrap_or(upstream)
}

/// Maps an upstream show object onto canonical show fields
///
/// Plain values and lists are renamed. The nested `schedule`, `network`,
/// `image` and `externals` objects are flattened into dedicated fields;
/// other nested objects and nulls are dropped. A nested object that does not
/// have the expected shape is skipped with a warning.
pub fn show_fields(raw: &Value) -> Normalized {
    let mut normalized = Normalized::default();

    let Some(object) = raw.as_object() else {
        normalized.apply(
            "show",
            FieldOutcome::Skipped(format!("expected an object, got {}", kind_of(raw))),
        );
        return normalized;
    };

    for (key, value) in object {
        let outcome = match value {
            Value::Null => FieldOutcome::Ignored,
            Value::Object(nested) => nested_fields(key, nested),
            plain => FieldOutcome::Mapped(vec![(canonical_name(key).to_string(), plain.clone())]),
        };
        normalized.apply(key, outcome);
    }

    for image_field in ["image_medium", "image_original", "poster"] {
        if let Some(value) = normalized.fields.remove(image_field) {
            normalized
                .fields
                .insert(image_field.to_string(), clean_value(value));
        }
    }

    normalized
}

fn nested_fields(key: &str, nested: &Map<String, Value>) -> FieldOutcome {
    let result = match key {
        "schedule" => schedule_fields(nested),
        "network" => network_fields(nested),
        "image" => image_fields(nested),
        "externals" => external_ids(nested),
        _ => return FieldOutcome::Ignored,
    };
    match result {
        Ok(fields) => FieldOutcome::Mapped(fields),
        Err(reason) => FieldOutcome::Skipped(reason),
    }
}

fn schedule_fields(schedule: &Map<String, Value>) -> Result<Vec<(String, Value)>, String> {
    let time = optional_str(schedule, "time")?;
    let days = match schedule.get("days") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(days)) => days
            .iter()
            .map(|day| {
                day.as_str()
                    .ok_or_else(|| format!("schedule day is {}, not a string", kind_of(day)))
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => return Err(format!("schedule days is {}, not a list", kind_of(other))),
    };

    let day_list = if days.is_empty() {
        Value::Null
    } else {
        Value::String(days.join(", "))
    };

    Ok(vec![
        ("airs_time".to_string(), time.map_or(Value::Null, Value::from)),
        ("airs_dayofweek".to_string(), day_list),
    ])
}

fn network_fields(network: &Map<String, Value>) -> Result<Vec<(String, Value)>, String> {
    let name = optional_str(network, "name")?.ok_or("network has no name")?;
    Ok(vec![("network".to_string(), Value::from(name))])
}

fn image_fields(image: &Map<String, Value>) -> Result<Vec<(String, Value)>, String> {
    let Some(medium) = optional_str(image, "medium")? else {
        return Ok(Vec::new());
    };
    let original = optional_str(image, "original")?.map_or(Value::Null, Value::from);
    Ok(vec![
        ("image_medium".to_string(), Value::from(medium)),
        ("image_original".to_string(), original.clone()),
        ("poster".to_string(), original),
    ])
}

fn external_ids(externals: &Map<String, Value>) -> Result<Vec<(String, Value)>, String> {
    let mut ids = Vec::with_capacity(3);
    for (upstream, canonical) in [
        ("tvrage", "tvrage_id"),
        ("thetvdb", "tvdb_id"),
        ("imdb", "imdb_id"),
    ] {
        let value = externals.get(upstream).cloned().unwrap_or(Value::Null);
        if !(value.is_null() || value.is_u64() || value.is_string()) {
            return Err(format!("external id {} is {}", upstream, kind_of(&value)));
        }
        ids.push((canonical.to_string(), value));
    }
    Ok(ids)
}

fn optional_str<'a>(map: &'a Map<String, Value>, key: &str) -> Result<Option<&'a str>, String> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(other) => Err(format!("{} is {}, not a string", key, kind_of(other))),
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lost() -> Value {
        json!({
            "id": 123,
            "url": "http://www.tvmaze.com/shows/123/lost",
            "name": "Lost",
            "language": "English",
            "genres": ["Drama", "Adventure"],
            "runtime": 60,
            "premiered": "2004-09-22",
            "schedule": {"time": "21:00", "days": ["Tuesday", "Wednesday"]},
            "rating": {"average": 9.1},
            "network": {"id": 3, "name": "ABC", "country": {"code": "US"}},
            "webChannel": null,
            "externals": {"tvrage": 4284, "thetvdb": 73739, "imdb": "tt0411008"},
            "image": {
                "medium": "http://static.tvmaze.com/m.jpg",
                "original": " http://static.tvmaze.com/o.jpg "
            },
            "summary": "<p>Stranded on an island.</p>"
        })
    }

    #[test]
    fn test_renames_plain_fields() {
        let normalized = show_fields(&lost());
        let fields = &normalized.fields;
        assert_eq!(fields["id"], json!(123));
        assert_eq!(fields["seriesname"], json!("Lost"));
        assert_eq!(fields["overview"], json!("<p>Stranded on an island.</p>"));
        assert_eq!(fields["firstaired"], json!("2004-09-22"));
        assert_eq!(fields["genre"], json!(["Drama", "Adventure"]));
        assert_eq!(fields["show_url"], json!("http://www.tvmaze.com/shows/123/lost"));
        assert_eq!(fields["language"], json!("English"));
        assert_eq!(fields["runtime"], json!(60));
        assert!(normalized.warnings.is_empty());
    }

    #[test]
    fn test_flattens_nested_objects() {
        let fields = show_fields(&lost()).fields;
        assert_eq!(fields["airs_time"], json!("21:00"));
        assert_eq!(fields["airs_dayofweek"], json!("Tuesday, Wednesday"));
        assert_eq!(fields["network"], json!("ABC"));
        assert_eq!(fields["image_medium"], json!("http://static.tvmaze.com/m.jpg"));
        assert_eq!(fields["image_original"], json!("http://static.tvmaze.com/o.jpg"));
        assert_eq!(fields["poster"], json!("http://static.tvmaze.com/o.jpg"));
        assert_eq!(fields["tvrage_id"], json!(4284));
        assert_eq!(fields["tvdb_id"], json!(73739));
        assert_eq!(fields["imdb_id"], json!("tt0411008"));
        assert!(!fields.contains_key("rating"));
        assert!(!fields.contains_key("webChannel"));
        assert!(!fields.contains_key("fanart"));
    }

    #[test]
    fn test_empty_schedule_days() {
        let fields = show_fields(&json!({"id": 1, "schedule": {"time": "", "days": []}})).fields;
        assert_eq!(fields["airs_time"], json!(""));
        assert_eq!(fields["airs_dayofweek"], json!(null));
    }

    #[test]
    fn test_image_without_medium_is_ignored() {
        let fields = show_fields(&json!({"id": 1, "image": {"original": "x"}})).fields;
        assert!(!fields.contains_key("image_original"));
        assert!(!fields.contains_key("poster"));
    }

    #[test]
    fn test_malformed_nested_fields_degrade_gracefully() {
        let normalized = show_fields(&json!({
            "id": 1,
            "name": "Broken",
            "schedule": {"time": "20:00", "days": "Monday"},
            "network": {"id": 4},
            "externals": {"thetvdb": [1, 2]}
        }));
        assert_eq!(normalized.fields["seriesname"], json!("Broken"));
        assert!(!normalized.fields.contains_key("airs_time"));
        assert!(!normalized.fields.contains_key("network"));
        assert!(!normalized.fields.contains_key("tvdb_id"));
        let skipped: Vec<&str> = normalized
            .warnings
            .iter()
            .map(|warning| warning.field.as_str())
            .collect();
        assert_eq!(skipped, vec!["externals", "network", "schedule"]);
    }

    #[test]
    fn test_non_object_input() {
        let normalized = show_fields(&json!([1, 2]));
        assert!(normalized.fields.is_empty());
        assert_eq!(normalized.warnings.len(), 1);
        assert_eq!(normalized.warnings[0].field, "show");
    }
}
