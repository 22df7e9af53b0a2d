use super::lookup::LookupError;
use serde::Serialize;
use serde_json::{Value, json};
use std::fmt;

/// A credited cast member of a show
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub id: Option<u64>,
    /// Display name of the person
    pub name: Option<String>,
    /// Character played
    pub role: Option<String>,
    pub image: Option<String>,
    /// Position in the credited order, starting at 0
    pub sort_order: usize,
}

impl Actor {
    /// Looks up a field by its canonical name
    ///
    /// Known names are `id`, `name`, `role`, `image` and `sortorder`. Fields
    /// that are known but empty miss just like unknown ones.
    pub fn get(&self, field: &str) -> Result<Value, LookupError> {
        let value = match field {
            "id" => self.id.map(|id| json!(id)),
            "name" => self.name.as_ref().map(|name| json!(name)),
            "role" => self.role.as_ref().map(|role| json!(role)),
            "image" => self.image.as_ref().map(|image| json!(image)),
            "sortorder" => Some(json!(self.sort_order)),
            _ => None,
        };
        value.ok_or_else(|| LookupError::AttributeNotFound(field.to_string()))
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Actor \"{}\"", self.name.as_deref().unwrap_or("unknown"))
    }
}

/// Cast of a show in credited order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Actors(Vec<Actor>);

impl Actors {
    pub fn iter(&self) -> impl Iterator<Item = &Actor> {
        self.0.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Actor> {
        self.0.get(index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Actor>> for Actors {
    fn from(actors: Vec<Actor>) -> Self {
        Self(actors)
    }
}

impl<'a> IntoIterator for &'a Actors {
    type Item = &'a Actor;
    type IntoIter = std::slice::Iter<'a, Actor>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A piece of show artwork in one resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Banner {
    pub id: Option<u64>,
    /// Artwork type as reported upstream (`poster`, `background`, `banner`, ...)
    pub kind: String,
    /// `WIDTHxHEIGHT` when dimensions are known, otherwise the resolution name
    pub resolution: String,
    pub url: String,
    /// Whether upstream marks this as the main artwork of its type
    pub main: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zach() -> Actor {
        Actor {
            id: Some(43640),
            name: Some("Zach Braff".into()),
            role: Some("J.D.".into()),
            image: None,
            sort_order: 0,
        }
    }

    #[test]
    fn test_actor_fields() {
        let actor = zach();
        assert_eq!(actor.get("name").unwrap(), json!("Zach Braff"));
        assert_eq!(actor.get("sortorder").unwrap(), json!(0));
        assert_eq!(
            actor.get("image"),
            Err(LookupError::AttributeNotFound("image".into()))
        );
        assert_eq!(
            actor.get("birthday"),
            Err(LookupError::AttributeNotFound("birthday".into()))
        );
        assert_eq!(actor.to_string(), "Actor \"Zach Braff\"");
    }

    #[test]
    fn test_actors_keep_order() {
        let second = Actor {
            name: Some("Sarah Chalke".into()),
            sort_order: 1,
            ..zach()
        };
        let actors = Actors::from(vec![zach(), second]);
        let names: Vec<_> = actors.iter().filter_map(|a| a.name.as_deref()).collect();
        assert_eq!(names, vec!["Zach Braff", "Sarah Chalke"]);
    }
}
