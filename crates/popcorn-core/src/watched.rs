use popcorn_models::WatchedEntry;
use serde_json::json;

/// The list of movies the user has watched, in the order they were added
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatchedListStore {
    entries: Vec<WatchedEntry>,
}

/// Aggregate view of the watched list
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WatchedSummary {
    pub count: usize,
    pub avg_imdb_rating: f64,
    pub avg_user_rating: f64,
    pub avg_runtime: f64, // Minutes
}

impl WatchedListStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from persisted entries; later duplicates of an id are dropped
    pub fn from_entries(entries: Vec<WatchedEntry>) -> Self {
        let mut store = Self::new();
        for entry in entries {
            store.add(entry);
        }
        store
    }

    pub fn entries(&self) -> &[WatchedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, imdb_id: &str) -> bool {
        self.entries.iter().any(|e| e.imdb_id == imdb_id)
    }

    /// Append an entry. Returns false (and changes nothing) for a known id.
    pub fn add(&mut self, entry: WatchedEntry) -> bool {
        if self.contains(&entry.imdb_id) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Remove the entry with `imdb_id`, keeping the order of the rest
    pub fn remove(&mut self, imdb_id: &str) -> Option<WatchedEntry> {
        let index = self.entries.iter().position(|e| e.imdb_id == imdb_id)?;
        Some(self.entries.remove(index))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn summary(&self) -> WatchedSummary {
        WatchedSummary {
            count: self.entries.len(),
            avg_imdb_rating: average(self.entries.iter().filter_map(|e| e.imdb_rating)),
            avg_user_rating: average(self.entries.iter().map(|e| f64::from(e.user_rating.value()))),
            avg_runtime: average(self.entries.iter().filter_map(|e| e.runtime.map(f64::from))),
        }
    }
}

impl WatchedSummary {
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "count": self.count,
            "avg_imdb_rating": round2(self.avg_imdb_rating),
            "avg_user_rating": round2(self.avg_user_rating),
            "avg_runtime": round2(self.avg_runtime),
        })
    }
}

/// Mean of the known values, 0.0 when there are none
pub fn average(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use popcorn_models::UserRating;

    fn entry(imdb_id: &str, imdb_rating: Option<f64>, runtime: Option<u32>, user_rating: u8) -> WatchedEntry {
        WatchedEntry {
            imdb_id: imdb_id.to_string(),
            title: format!("Movie {}", imdb_id),
            year: "2010".to_string(),
            poster: "N/A".to_string(),
            imdb_rating,
            runtime,
            user_rating: UserRating::new(user_rating),
            added_at: Utc::now(),
        }
    }

    #[test]
    fn test_remove_keeps_order_of_others() {
        let mut store = WatchedListStore::new();
        store.add(entry("tt1", Some(8.0), Some(100), 7));
        store.add(entry("tt2", Some(7.0), Some(90), 6));
        store.add(entry("tt3", Some(9.0), Some(120), 9));

        let removed = store.remove("tt2").unwrap();
        assert_eq!(removed.imdb_id, "tt2");
        let ids: Vec<&str> = store.entries().iter().map(|e| e.imdb_id.as_str()).collect();
        assert_eq!(ids, vec!["tt1", "tt3"]);
    }

    #[test]
    fn test_remove_unknown_id_changes_nothing() {
        let mut store = WatchedListStore::new();
        store.add(entry("tt1", None, None, 5));
        assert!(store.remove("tt9").is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_add_rejects_duplicate_id() {
        let mut store = WatchedListStore::new();
        assert!(store.add(entry("tt1", None, None, 5)));
        assert!(!store.add(entry("tt1", None, None, 2)));
        assert_eq!(store.len(), 1);
        assert_eq!(store.entries()[0].user_rating.value(), 5);
        assert!(store.contains("tt1"));
    }

    #[test]
    fn test_from_entries_drops_duplicates() {
        let store = WatchedListStore::from_entries(vec![
            entry("tt1", None, None, 5),
            entry("tt2", None, None, 6),
            entry("tt1", None, None, 7),
        ]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_summary_averages_known_values() {
        let mut store = WatchedListStore::new();
        store.add(entry("tt1", Some(8.0), Some(100), 7));
        store.add(entry("tt2", Some(7.0), None, 8));
        store.add(entry("tt3", None, Some(140), 9));

        let summary = store.summary();
        assert_eq!(summary.count, 3);
        assert!((summary.avg_imdb_rating - 7.5).abs() < 1e-9);
        assert!((summary.avg_user_rating - 8.0).abs() < 1e-9);
        assert!((summary.avg_runtime - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_summary_is_zero() {
        let summary = WatchedListStore::new().summary();
        assert_eq!(summary, WatchedSummary::default());
    }

    #[test]
    fn test_summary_json_is_rounded() {
        let mut store = WatchedListStore::new();
        store.add(entry("tt1", Some(8.0), Some(100), 7));
        store.add(entry("tt2", Some(7.0), Some(101), 8));
        store.add(entry("tt3", Some(7.0), Some(101), 8));

        let json = store.summary().to_json();
        assert_eq!(json["count"], 3);
        assert_eq!(json["avg_imdb_rating"], 7.33);
        assert_eq!(json["avg_runtime"], 100.67);
    }
}
