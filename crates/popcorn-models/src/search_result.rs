use serde::{Deserialize, Serialize};

/// One row of a catalog search, in the order the catalog returned it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchResult {
    pub imdb_id: String,
    pub title: String,
    pub year: String, // Free text, e.g. "2005" or "2011–2019"
    pub poster: String,
}
