pub mod bindings;
pub mod detail;
pub mod fetch;
pub mod search;
pub mod selection;
pub mod watched;
pub mod watched_file;

#[cfg(test)]
mod testing;

pub use bindings::{DisplayLabel, EscapeBinding, Key, KeyBus, TitleBinding};
pub use detail::{ConfirmError, DetailController, DetailState};
pub use fetch::{FetchError, RequestHandle};
pub use search::{SearchController, SearchOutcome, SearchState, MIN_QUERY_LEN};
pub use selection::Selection;
pub use watched::{WatchedListStore, WatchedSummary};
pub use watched_file::WatchedFile;
