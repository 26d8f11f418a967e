use super::render;
use super::AppContext;
use crate::output::{Output, OutputFormat};
use color_eyre::Result;
use popcorn_core::{SearchController, SearchOutcome, SearchState, Selection, MIN_QUERY_LEN};
use tracing::info;

pub async fn run_search(query: String, output: &Output) -> Result<()> {
    let ctx = AppContext::load()?;
    let catalog = ctx.catalog()?;
    let source = catalog.source_name().to_string();
    let controller = SearchController::new(catalog, Selection::new());
    let mut rx = controller.subscribe();

    if controller.set_query(&query) == SearchOutcome::QueryTooShort {
        output.warn(format!("Type at least {} characters to search", MIN_QUERY_LEN));
        return Ok(());
    }

    info!(operation = "search_command", query = %query, "Searching");
    let pb = render::spinner(format!("Searching {} for \"{}\"...", source, query));
    let state = rx
        .wait_for(|s| !s.is_loading)
        .await
        .map_err(|e| color_eyre::eyre::eyre!("Search ended unexpectedly: {}", e))?
        .clone();
    pb.finish_and_clear();

    print_search(&state, output);
    Ok(())
}

pub fn print_search(state: &SearchState, output: &Output) {
    if let Some(err) = &state.error {
        match output.format() {
            OutputFormat::Human => output.error(err.to_string()),
            OutputFormat::Json | OutputFormat::JsonPretty => output.json(&serde_json::json!({
                "query": state.query,
                "error": err.to_string(),
            })),
        }
        return;
    }

    match output.format() {
        OutputFormat::Human => {
            if output.is_quiet() {
                return;
            }
            println!("Found {} results", state.results.len());
            println!("{}", render::results_table(&state.results));
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&render::results_json(&state.query, &state.results));
        }
    }
}
