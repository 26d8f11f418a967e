//! Line-driven session: plain text searches, `:` commands act on the results.

use super::search::print_search;
use super::show::{print_detail, validate_rating};
use super::title::TerminalTitle;
use super::watched::{print_list, print_summary};
use super::AppContext;
use crate::output::Output;
use color_eyre::Result;
use owo_colors::OwoColorize;
use popcorn_core::search::is_searchable;
use popcorn_core::{
    DetailController, DetailState, DisplayLabel, Key, KeyBus, SearchController, SearchState, Selection,
    WatchedFile, WatchedListStore,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenTarget {
    Index(usize), // 1-based row of the last results
    Id(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Query(String),
    Open(OpenTarget),
    Back,
    Rate(u8),
    Add,
    Watched,
    Remove(String),
    Summary,
    Help,
    Quit,
    Invalid(String),
}

pub fn parse_command(line: &str) -> SessionCommand {
    let Some(rest) = line.trim_start().strip_prefix(':') else {
        return SessionCommand::Query(line.to_string());
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or("");
    let arg = parts.next();

    match (name, arg) {
        ("open" | "o", Some(target)) => match target.parse::<usize>() {
            Ok(index) => SessionCommand::Open(OpenTarget::Index(index)),
            Err(_) => SessionCommand::Open(OpenTarget::Id(target.to_string())),
        },
        ("open" | "o", None) => SessionCommand::Invalid("Usage: :open N|IMDB_ID".to_string()),
        ("back" | "esc", _) => SessionCommand::Back,
        ("rate" | "r", Some(value)) => match value.parse::<u8>() {
            Ok(rating) => SessionCommand::Rate(rating),
            Err(_) => SessionCommand::Invalid(format!("Not a rating: {}", value)),
        },
        ("rate" | "r", None) => SessionCommand::Invalid("Usage: :rate 1-10".to_string()),
        ("add", _) => SessionCommand::Add,
        ("watched" | "w", _) => SessionCommand::Watched,
        ("rm", Some(id)) => SessionCommand::Remove(id.to_string()),
        ("rm", None) => SessionCommand::Invalid("Usage: :rm IMDB_ID".to_string()),
        ("summary", _) => SessionCommand::Summary,
        ("help" | "h" | "?", _) => SessionCommand::Help,
        ("quit" | "q" | "exit", _) => SessionCommand::Quit,
        (other, _) => SessionCommand::Invalid(format!("Unknown command :{} (try :help)", other)),
    }
}

const HELP: &[(&str, &str)] = &[
    ("<text>", "search for movies (3+ characters)"),
    (":open N|ID", "open result N or a movie id; again to close"),
    (":back, :esc", "close the open movie"),
    (":rate N", "rate the open movie 1-10"),
    (":add", "add the open movie to watched"),
    (":watched", "show the watched list"),
    (":rm ID", "remove a movie from watched"),
    (":summary", "watched list averages"),
    (":quit", "leave"),
];

struct Session<'a> {
    output: &'a Output,
    search: SearchController,
    detail: DetailController,
    keys: KeyBus,
    store: WatchedListStore,
    file: WatchedFile,
    // (id, rating) of the last detail card printed
    shown: Option<(String, u8)>,
}

pub async fn run_interactive(output: &Output) -> Result<()> {
    let ctx = AppContext::load()?;
    let catalog = ctx.catalog()?;
    let file = ctx.watched_file();
    let store = file
        .load()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load watched list: {}", e))?;

    let title = Arc::new(TerminalTitle::new());
    title.set_label(ctx.default_title());

    let selection = Selection::new();
    let keys = KeyBus::new();
    let search = SearchController::new(catalog.clone(), selection.clone());
    let detail = DetailController::new(catalog, selection, title, ctx.default_title(), keys.clone());

    let mut search_rx = search.subscribe();
    let mut detail_rx = detail.subscribe();
    let mut session = Session {
        output,
        search,
        detail,
        keys,
        store,
        file,
        shown: None,
    };

    info!(operation = "interactive_start", watched = session.store.len(), "Interactive session started");
    if output.shows_human() {
        println!("{}", "🍿 usePopcorn".bold());
        println!("{}", "Type a movie title to search, :help for commands".bright_black());
    }
    session.prompt()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !session.handle(parse_command(&line))? {
                    break;
                }
                session.prompt()?;
            }
            changed = search_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = search_rx.borrow_and_update().clone();
                session.on_search(&state);
            }
            changed = detail_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = detail_rx.borrow_and_update().clone();
                session.on_detail(&state);
            }
        }
    }

    session.search.shutdown();
    session.detail.shutdown();
    info!(operation = "interactive_end", watched = session.store.len(), "Interactive session ended");
    Ok(())
}

impl Session<'_> {
    fn prompt(&self) -> Result<()> {
        if self.output.shows_human() {
            self.output.prompt(format!("{} ", ">".cyan()))?;
        }
        Ok(())
    }

    /// Returns false when the session should end
    fn handle(&mut self, command: SessionCommand) -> Result<bool> {
        debug!(operation = "session_command", command = ?command, "Handling command");
        match command {
            SessionCommand::Query(query) => {
                self.search.set_query(&query);
            }
            SessionCommand::Open(target) => self.open(target),
            SessionCommand::Back => {
                if !go_back(&self.keys, &self.detail) {
                    self.output.info("Nothing is open");
                }
            }
            SessionCommand::Rate(rating) => {
                if let Err(e) = validate_rating(rating) {
                    self.output.warn(e.to_string());
                } else if self.detail.selection().current().is_none() {
                    self.output.warn("Open a movie first");
                } else if self.detail.already_watched(&self.store) {
                    self.output.info("You already watched the movie");
                } else {
                    self.detail.set_user_rating(rating);
                }
            }
            SessionCommand::Add => self.add()?,
            SessionCommand::Watched => print_list(&self.store, self.output),
            SessionCommand::Remove(imdb_id) => match self.store.remove(&imdb_id) {
                Some(entry) => {
                    self.save()?;
                    self.output.success(format!("Removed \"{}\" from watched", entry.title));
                }
                None => self.output.warn(format!("{} is not in your watched list", imdb_id)),
            },
            SessionCommand::Summary => print_summary(&self.store, self.output),
            SessionCommand::Help => {
                for (usage, what) in HELP {
                    self.output.info(format!("  {:<14} {}", usage, what));
                }
            }
            SessionCommand::Quit => return Ok(false),
            SessionCommand::Invalid(msg) => self.output.warn(msg),
        }
        Ok(true)
    }

    fn open(&self, target: OpenTarget) {
        let imdb_id = match target {
            OpenTarget::Id(id) => id,
            OpenTarget::Index(index) => {
                let results = self.search.state().results;
                match index.checked_sub(1).and_then(|i| results.get(i)) {
                    Some(result) => result.imdb_id.clone(),
                    None => {
                        self.output.warn(format!("No result #{} (have {})", index, results.len()));
                        return;
                    }
                }
            }
        };
        self.detail.selection().toggle(&imdb_id);
    }

    fn add(&mut self) -> Result<()> {
        match self.detail.confirm(&mut self.store) {
            Ok(entry) => {
                self.save()?;
                self.output.success(format!(
                    "Added \"{}\" to watched ({}/10)",
                    entry.title,
                    entry.user_rating.value()
                ));
            }
            Err(e) => self.output.warn(e.to_string()),
        }
        Ok(())
    }

    fn save(&self) -> Result<()> {
        self.file
            .save(&self.store)
            .map_err(|e| color_eyre::eyre::eyre!("Failed to save watched list: {}", e))
    }

    fn on_search(&self, state: &SearchState) {
        if state.is_loading {
            if self.output.shows_human() {
                println!("{}", "Searching...".bright_black());
            }
            return;
        }
        if !is_searchable(&state.query) {
            return;
        }
        print_search(state, self.output);
        if self.output.shows_human() && !state.results.is_empty() {
            println!("{}", ":open N to see a movie".bright_black());
        }
    }

    fn on_detail(&mut self, state: &DetailState) {
        let Some(imdb_id) = state.selected_id.clone() else {
            if self.shown.take().is_some() {
                self.output.info("Closed");
            }
            return;
        };

        if state.is_loading {
            if self.output.shows_human() {
                println!("{}", format!("Loading {}...", imdb_id).bright_black());
            }
            return;
        }

        if let Some(err) = &state.error {
            self.output.error(format!("{} ({})", err, imdb_id));
            return;
        }

        if state.detail.is_none() {
            return;
        }
        let already_watched = self.store.contains(&imdb_id);
        let key = (imdb_id, state.user_rating.value());
        if self.shown.as_ref() == Some(&key) {
            return;
        }
        self.shown = Some(key);
        print_detail(state, already_watched, self.output);
    }
}

/// Escape goes to whoever holds the binding. Until the detail view has
/// bound it for a fresh selection, close the selection directly.
pub fn go_back(keys: &KeyBus, detail: &DetailController) -> bool {
    if keys.press(Key::Escape) > 0 {
        return true;
    }
    if detail.selection().current().is_some() {
        detail.close();
        return true;
    }
    false
}
