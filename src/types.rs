//! Shared types used across modules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Content categories the site knows about, as `(singular, plural)`.
const KNOWN_REALMS: &[(&str, &str)] = &[
    ("article", "articles"),
    ("book", "books"),
    ("video", "videos"),
    ("event", "events"),
    ("place", "places"),
    ("person", "persons"),
    ("community", "communities"),
    ("vacancy", "vacancies"),
    ("reference", "references"),
    ("user", "users"),
];

/// A content category (article, video, event, ...).
///
/// The plural name namespaces on-disk storage: thumbnails for articles live
/// under `img/articles/thumbs/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Realm {
    pub name: String,
    pub name_plural: String,
}

impl Realm {
    pub fn new(name: impl Into<String>, name_plural: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            name_plural: name_plural.into(),
        }
    }

    pub fn article() -> Self {
        Self::new("article", "articles")
    }

    pub fn video() -> Self {
        Self::new("video", "videos")
    }

    pub fn event() -> Self {
        Self::new("event", "events")
    }

    /// Look up a known realm by either its singular or plural name.
    pub fn known(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        KNOWN_REALMS
            .iter()
            .find(|(singular, plural)| *singular == name || *plural == name)
            .map(|(singular, plural)| Self::new(*singular, *plural))
    }
}

impl fmt::Display for Realm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl FromStr for Realm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::known(s).ok_or_else(|| {
            let names: Vec<&str> = KNOWN_REALMS.iter().map(|(n, _)| *n).collect();
            format!("unknown realm '{s}'. Known: {}", names.join(", "))
        })
    }
}
