pub mod detail;
pub mod search_result;
pub mod watched;

pub use detail::{parse_runtime_minutes, DetailRecord};
pub use search_result::SearchResult;
pub use watched::{UserRating, WatchedEntry};
