//! Human rendering shared by the one-shot commands and the interactive session.

use comfy_table::{Cell, Table};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use popcorn_core::{DetailState, WatchedListStore, WatchedSummary};
use popcorn_models::{DetailRecord, SearchResult};
use serde_json::json;
use std::io::IsTerminal;
use std::time::Duration;

use crate::output::styled_table;

pub fn is_interactive() -> bool {
    std::io::stdout().is_terminal() && std::io::stderr().is_terminal()
}

/// Spinner on stderr, hidden when not attached to a terminal
pub fn spinner(msg: impl Into<String>) -> ProgressBar {
    if !is_interactive() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb.set_message(msg.into());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn results_table(results: &[SearchResult]) -> Table {
    let mut table = styled_table(vec!["#", "Title", "Year", "IMDb ID"]);
    for (i, result) in results.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&result.title),
            Cell::new(&result.year),
            Cell::new(&result.imdb_id),
        ]);
    }
    table
}

pub fn results_json(query: &str, results: &[SearchResult]) -> serde_json::Value {
    json!({
        "query": query,
        "count": results.len(),
        "results": results,
    })
}

/// Detail card for the open movie. `already_watched` replaces the rating line.
pub fn detail_lines(detail: &DetailRecord, user_rating: u8, already_watched: bool) -> Vec<String> {
    let mut lines = vec![
        format!("{} ({})", detail.title.bold(), detail.imdb_id.bright_black()),
        format!("{} - {}", detail.released, detail.runtime),
        detail.genre.clone(),
        format!("⭐️ {} IMDb Rating", detail.imdb_rating),
        String::new(),
    ];

    if already_watched {
        lines.push("You already watched the movie".bright_black().to_string());
    } else if user_rating > 0 {
        lines.push(format!("Your rating: {}/10  (:add to add to watched)", user_rating));
    } else {
        lines.push("Rate it with :rate 1-10".bright_black().to_string());
    }

    lines.push(String::new());
    lines.push(detail.plot.italic().to_string());
    lines.push(format!("Starring {}", detail.actors));
    lines.push(format!("Directed by {}", detail.director));
    lines
}

pub fn detail_json(state: &DetailState, already_watched: bool) -> serde_json::Value {
    json!({
        "selected_id": state.selected_id,
        "detail": state.detail,
        "is_loading": state.is_loading,
        "error": state.error.as_ref().map(|e| e.to_string()),
        "user_rating": state.user_rating.value(),
        "already_watched": already_watched,
    })
}

pub fn watched_table(store: &WatchedListStore) -> Table {
    let mut table = styled_table(vec!["Title", "Year", "IMDb", "You", "Runtime", "IMDb ID"]);
    for entry in store.entries() {
        table.add_row(vec![
            Cell::new(&entry.title),
            Cell::new(&entry.year),
            Cell::new(optional(entry.imdb_rating.map(|r| format!("{:.1}", r)))),
            Cell::new(entry.user_rating.value()),
            Cell::new(optional(entry.runtime.map(|m| format!("{} min", m)))),
            Cell::new(&entry.imdb_id),
        ]);
    }
    table
}

pub fn summary_lines(summary: &WatchedSummary) -> Vec<String> {
    vec![
        "Movies you watched".bold().to_string(),
        format!("#️⃣  {} movies", summary.count),
        format!("⭐️ {:.2}", summary.avg_imdb_rating),
        format!("🌟 {:.2}", summary.avg_user_rating),
        format!("⏳ {:.2} min", summary.avg_runtime),
    ]
}

fn optional(value: Option<String>) -> String {
    value.unwrap_or_else(|| "-".to_string())
}
