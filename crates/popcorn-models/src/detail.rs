use serde::{Deserialize, Serialize};

/// Full catalog record for one identifier.
///
/// Text fields are kept as the catalog sends them ("N/A" included); numeric
/// views are parsed on demand.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DetailRecord {
    pub imdb_id: String,
    pub title: String,
    pub year: String,
    pub released: String,
    pub poster: String,
    pub genre: String,
    pub imdb_rating: String,
    pub plot: String,
    pub runtime: String, // e.g. "148 min"
    pub actors: String,
    pub director: String,
}

impl DetailRecord {
    /// Runtime in minutes, taken from the leading token of the free-text runtime
    pub fn runtime_minutes(&self) -> Option<u32> {
        parse_runtime_minutes(&self.runtime)
    }

    /// External rating as a number, `None` when the catalog has none
    pub fn imdb_rating_value(&self) -> Option<f64> {
        self.imdb_rating.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }

    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }
}

/// Parse the numeric portion of a runtime such as "148 min".
pub fn parse_runtime_minutes(runtime: &str) -> Option<u32> {
    runtime.split_whitespace().next()?.parse::<u32>().ok()
}
