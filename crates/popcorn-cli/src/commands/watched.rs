use super::prompts;
use super::render;
use super::AppContext;
use crate::output::{Output, OutputFormat};
use color_eyre::Result;
use popcorn_core::{WatchedFile, WatchedListStore};

pub async fn run_watched(cmd: crate::WatchedCommands, output: &Output) -> Result<()> {
    let ctx = AppContext::load()?;
    let file = ctx.watched_file();
    match cmd {
        crate::WatchedCommands::List => list(&file, output),
        crate::WatchedCommands::Summary => summary(&file, output),
        crate::WatchedCommands::Remove { imdb_id } => remove(&file, &imdb_id, output),
        crate::WatchedCommands::Clear { yes } => clear(&file, yes, output),
    }
}

fn load(file: &WatchedFile) -> Result<WatchedListStore> {
    file.load()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load watched list: {}", e))
}

fn save(file: &WatchedFile, store: &WatchedListStore) -> Result<()> {
    file.save(store)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to save watched list: {}", e))
}

fn list(file: &WatchedFile, output: &Output) -> Result<()> {
    let store = load(file)?;
    print_list(&store, output);
    Ok(())
}

pub fn print_list(store: &WatchedListStore, output: &Output) {
    match output.format() {
        OutputFormat::Human => {
            if output.is_quiet() {
                return;
            }
            if store.is_empty() {
                output.info("Your watched list is empty");
                return;
            }
            println!("{}", render::watched_table(store));
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&serde_json::json!({ "watched": store.entries() }));
        }
    }
}

fn summary(file: &WatchedFile, output: &Output) -> Result<()> {
    let store = load(file)?;
    print_summary(&store, output);
    Ok(())
}

pub fn print_summary(store: &WatchedListStore, output: &Output) {
    let summary = store.summary();
    match output.format() {
        OutputFormat::Human => {
            if output.is_quiet() {
                return;
            }
            for line in render::summary_lines(&summary) {
                println!("{}", line);
            }
        }
        OutputFormat::Json | OutputFormat::JsonPretty => output.json(&summary.to_json()),
    }
}

fn remove(file: &WatchedFile, imdb_id: &str, output: &Output) -> Result<()> {
    let mut store = load(file)?;
    match store.remove(imdb_id) {
        Some(entry) => {
            save(file, &store)?;
            output.success(format!("Removed \"{}\" from watched", entry.title));
        }
        None => output.warn(format!("{} is not in your watched list", imdb_id)),
    }
    Ok(())
}

fn clear(file: &WatchedFile, yes: bool, output: &Output) -> Result<()> {
    let mut store = load(file)?;
    if store.is_empty() {
        output.info("Your watched list is already empty");
        return Ok(());
    }

    if !yes && !prompts::prompt_yes_no(&format!("Remove all {} watched movies?", store.len()), false)? {
        output.info("Nothing removed");
        return Ok(());
    }

    let count = store.len();
    store.clear();
    save(file, &store)?;
    output.success(format!("Cleared {} watched movie(s) from {}", count, file.path().display()));
    Ok(())
}
