use super::clean_value_deep;
use crate::model::Actor;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Normalizes the field names and values of one cast entry
///
/// Field names are lower-cased, fields with an empty name or a null value
/// are dropped, and string values are cleaned.
pub fn cast_fields(raw: &Value) -> BTreeMap<String, Value> {
    let Some(object) = raw.as_object() else {
        return BTreeMap::new();
    };

    object
        .iter()
        .filter(|(key, value)| !key.is_empty() && !value.is_null())
        .map(|(key, value)| (key.to_lowercase(), clean_value_deep(value.clone())))
        .collect()
}

/// Builds an [`Actor`] from one cast entry
///
/// Entries nest the performer under `person` and the played part under
/// `character`; flat entries carrying `name`, `role` and `image` directly are
/// understood as well.
pub fn actor_from_cast(raw: &Value, sort_order: usize) -> Actor {
    let fields = cast_fields(raw);
    let person = fields.get("person").and_then(Value::as_object);
    let character = fields.get("character").and_then(Value::as_object);

    let lookup = |nested: Option<&Map<String, Value>>, key: &str| -> Option<Value> {
        match nested {
            Some(nested) => nested.get(key).cloned(),
            None => fields.get(key).cloned(),
        }
    };

    let image = lookup(person, "image").and_then(|image| match image {
        Value::String(url) => Some(url),
        Value::Object(urls) => urls
            .get("original")
            .or_else(|| urls.get("medium"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    });

    let role = match character {
        Some(character) => character.get("name").and_then(Value::as_str).map(str::to_string),
        None => fields.get("role").and_then(Value::as_str).map(str::to_string),
    };

    Actor {
        id: lookup(person, "id").and_then(|id| id.as_u64()),
        name: lookup(person, "name").and_then(|name| name.as_str().map(str::to_string)),
        role,
        image,
        sort_order,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cast_fields_cleanup() {
        let fields = cast_fields(&json!({
            "Person": {"name": " Zach Braff "},
            "self": false,
            "voice": null,
            "": "nameless"
        }));
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["person"], json!({"name": "Zach Braff"}));
        assert_eq!(fields["self"], json!(false));
    }

    #[test]
    fn test_actor_from_nested_entry() {
        let actor = actor_from_cast(
            &json!({
                "person": {
                    "id": 1,
                    "name": "Zach Braff",
                    "image": {"medium": "m.jpg", "original": "o.jpg"}
                },
                "character": {"id": 9, "name": "J.D. &amp; Narrator"}
            }),
            0,
        );
        assert_eq!(actor.id, Some(1));
        assert_eq!(actor.name.as_deref(), Some("Zach Braff"));
        assert_eq!(actor.role.as_deref(), Some("J.D. & Narrator"));
        assert_eq!(actor.image.as_deref(), Some("o.jpg"));
        assert_eq!(actor.sort_order, 0);
    }

    #[test]
    fn test_actor_from_flat_entry() {
        let actor = actor_from_cast(
            &json!({"ID": 7, "Name": "Sarah Chalke", "Role": "Elliot", "Image": null}),
            3,
        );
        assert_eq!(actor.id, Some(7));
        assert_eq!(actor.name.as_deref(), Some("Sarah Chalke"));
        assert_eq!(actor.role.as_deref(), Some("Elliot"));
        assert_eq!(actor.image, None);
        assert_eq!(actor.sort_order, 3);
    }
}
