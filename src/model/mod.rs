//! Nested metadata model
//!
//! A [`Show`] owns its [`Season`]s, which own their [`Episode`]s. Children
//! refer back to their parents by number only, so ownership always flows
//! downward. Every entity supports lookups by number (child collection) or
//! by name (scalar fields) and reports misses through [`LookupError`].
mod actor;
mod episode;
mod lookup;
mod season;
mod show;
mod summary;

pub use actor::{Actor, Actors, Banner};
pub use episode::{Episode, EpisodeKey};
pub use lookup::{Key, LookupError};
pub use season::Season;
pub use show::{Show, ShowEntry, ShowParts};
pub use summary::ShowSummary;
