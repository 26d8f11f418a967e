use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::detail::DetailRecord;

/// User rating on a 0-10 scale, 0 meaning "not rated yet"
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
#[serde(transparent)]
pub struct UserRating(u8);

impl UserRating {
    pub const MAX: u8 = 10;
    pub const UNSET: UserRating = UserRating(0);

    /// Values above the maximum are clamped
    pub fn new(value: u8) -> Self {
        Self(value.min(Self::MAX))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_set(self) -> bool {
        self.0 > 0
    }
}

/// A movie the user confirmed as watched, with their rating.
///
/// Entries are built once from a loaded [`DetailRecord`] and never edited.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchedEntry {
    pub imdb_id: String,
    pub title: String,
    pub year: String,
    pub poster: String,
    pub imdb_rating: Option<f64>,
    pub runtime: Option<u32>, // Minutes
    pub user_rating: UserRating,
    pub added_at: DateTime<Utc>,
}

impl WatchedEntry {
    pub fn from_detail(detail: &DetailRecord, user_rating: UserRating) -> Self {
        Self {
            imdb_id: detail.imdb_id.clone(),
            title: detail.title.clone(),
            year: detail.year.clone(),
            poster: detail.poster.clone(),
            imdb_rating: detail.imdb_rating_value(),
            runtime: detail.runtime_minutes(),
            user_rating,
            added_at: Utc::now(),
        }
    }
}
