use super::render;
use super::title::TerminalTitle;
use super::AppContext;
use crate::output::{Output, OutputFormat};
use color_eyre::Result;
use popcorn_core::{DetailController, DetailState, KeyBus, Selection};
use popcorn_models::UserRating;
use std::sync::Arc;
use tracing::info;

pub async fn run_show(imdb_id: String, rate: Option<u8>, output: &Output) -> Result<()> {
    if let Some(rating) = rate {
        validate_rating(rating)?;
    }

    let ctx = AppContext::load()?;
    let catalog = ctx.catalog()?;
    let source = catalog.source_name().to_string();
    let watched_file = ctx.watched_file();
    let mut store = watched_file
        .load()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load watched list: {}", e))?;

    let selection = Selection::new();
    let controller = DetailController::new(
        catalog,
        selection.clone(),
        Arc::new(TerminalTitle::new()),
        ctx.default_title(),
        KeyBus::new(),
    );
    let mut rx = controller.subscribe();

    selection.select(&imdb_id);
    let pb = render::spinner(format!("Loading {} from {}...", imdb_id, source));
    let state = rx
        .wait_for(|s| is_settled_for(s, &imdb_id))
        .await
        .map_err(|e| color_eyre::eyre::eyre!("Detail view ended unexpectedly: {}", e))?
        .clone();
    pb.finish_and_clear();

    if let Some(err) = &state.error {
        output.error(format!("{} ({})", err, imdb_id));
        return Ok(());
    }

    let Some(rating) = rate else {
        print_detail(&state, controller.already_watched(&store), output);
        return Ok(());
    };

    controller.set_user_rating(rating);
    let entry = controller
        .confirm(&mut store)
        .map_err(|e| color_eyre::eyre::eyre!("Could not add {}: {}", imdb_id, e))?;
    watched_file
        .save(&store)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to save watched list: {}", e))?;

    info!(operation = "show_command", imdb_id = %entry.imdb_id, "Added from show --rate");
    match output.format() {
        OutputFormat::Human => output.success(format!(
            "Added \"{}\" to watched with rating {}/10",
            entry.title,
            entry.user_rating.value()
        )),
        OutputFormat::Json | OutputFormat::JsonPretty => output.json(&serde_json::json!({
            "type": "watched_added",
            "entry": entry,
            "count": store.len(),
        })),
    }
    Ok(())
}

/// Loading finished for `imdb_id`, with either a record or an error
pub fn is_settled_for(state: &DetailState, imdb_id: &str) -> bool {
    state.selected_id.as_deref() == Some(imdb_id)
        && !state.is_loading
        && (state.detail.is_some() || state.error.is_some())
}

pub fn validate_rating(rating: u8) -> Result<()> {
    if rating == 0 || rating > UserRating::MAX {
        return Err(color_eyre::eyre::eyre!(
            "Rating must be between 1 and {}, got {}",
            UserRating::MAX,
            rating
        ));
    }
    Ok(())
}

pub fn print_detail(state: &DetailState, already_watched: bool, output: &Output) {
    match output.format() {
        OutputFormat::Human => {
            if output.is_quiet() {
                return;
            }
            if let Some(detail) = &state.detail {
                println!();
                for line in render::detail_lines(detail, state.user_rating.value(), already_watched) {
                    println!("  {}", line);
                }
                println!();
            }
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&render::detail_json(state, already_watched));
        }
    }
}
