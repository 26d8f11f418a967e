use super::prompts;
use crate::output::{styled_table, Output, OutputFormat};
use color_eyre::Result;
use comfy_table::Cell;
use owo_colors::OwoColorize;
use popcorn_config::{Config, PathManager, API_KEY_ENV};
use serde_json::json;
use tracing::info;

pub async fn run_config(cmd: crate::ConfigCommands, output: &Output) -> Result<()> {
    match cmd {
        crate::ConfigCommands::Show { full } => show_config(full, output),
        crate::ConfigCommands::ApiKey { key } => configure_api_key(key, output),
        crate::ConfigCommands::Path => show_paths(output),
    }
}

fn show_config(full: bool, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let config_file = path_manager.config_file();
    let config = Config::load_or_default(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e))?;

    let key_display = if full {
        config.omdb.api_key.clone()
    } else {
        mask_string(&config.omdb.api_key)
    };
    let key_from_env = std::env::var(API_KEY_ENV).map(|v| !v.trim().is_empty()).unwrap_or(false);

    match output.format() {
        OutputFormat::Human => {
            if output.is_quiet() {
                return Ok(());
            }
            if !config_file.exists() {
                output.warn(format!(
                    "No config file at {}, showing defaults",
                    config_file.display()
                ));
            }

            let mut table = styled_table(vec!["Setting", "Value"]);
            table.add_row(vec![Cell::new("Config File"), Cell::new(config_file.display())]);
            table.add_row(vec![
                Cell::new("OMDb API Key"),
                Cell::new(if key_from_env {
                    format!("{} (from {})", key_display, API_KEY_ENV)
                } else {
                    key_display
                }),
            ]);
            table.add_row(vec![Cell::new("Base URL"), Cell::new(&config.omdb.base_url)]);
            table.add_row(vec![
                Cell::new("Request Timeout"),
                Cell::new(format!("{}s", config.omdb.request_timeout_secs)),
            ]);
            table.add_row(vec![Cell::new("Default Title"), Cell::new(&config.ui.default_title)]);
            table.add_row(vec![
                Cell::new("Log To File"),
                Cell::new(if config.ui.log_to_file { "✓".green().to_string() } else { "✗".red().to_string() }),
            ]);
            println!("{}", table);

            if !config.is_api_key_configured() {
                output.warn("No OMDb API key yet. Set one with 'popcorn config api-key'.");
            } else if let Err(e) = config.validate() {
                output.warn(e.to_string());
            }
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({
                "config_file": config_file.display().to_string(),
                "omdb": {
                    "api_key": key_display,
                    "api_key_from_env": key_from_env,
                    "base_url": config.omdb.base_url,
                    "request_timeout_secs": config.omdb.request_timeout_secs,
                },
                "ui": {
                    "default_title": config.ui.default_title,
                    "log_to_file": config.ui.log_to_file,
                },
                "valid": config.validate().is_ok(),
            }));
        }
    }
    Ok(())
}

fn configure_api_key(key: Option<String>, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let config_file = path_manager.config_file();

    // The file as written, without environment overrides
    let mut config = if config_file.exists() {
        Config::load_from_file(&config_file)
            .map_err(|e| color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e))?
    } else {
        Config::default()
    };

    let key = match key {
        Some(key) => key,
        None => prompts::prompt_api_key()?,
    };
    let key = key.trim().to_string();
    if key.is_empty() {
        return Err(color_eyre::eyre::eyre!("API key cannot be empty"));
    }

    config.omdb.api_key = key;
    config
        .save_to_file(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to save config to {}: {}", config_file.display(), e))?;

    info!(operation = "config_api_key", path = %config_file.display(), "Saved OMDb API key");
    output.success(format!("Saved OMDb API key to {}", config_file.display()));
    Ok(())
}

fn show_paths(output: &Output) -> Result<()> {
    let paths = PathManager::default();
    match output.format() {
        OutputFormat::Human => {
            if output.is_quiet() {
                return Ok(());
            }
            let mut table = styled_table(vec!["Path", "Location"]);
            table.add_row(vec![Cell::new("Config File"), Cell::new(paths.config_file().display())]);
            table.add_row(vec![Cell::new("Watched List"), Cell::new(paths.watched_file().display())]);
            table.add_row(vec![Cell::new("Log File"), Cell::new(paths.log_file().display())]);
            println!("{}", table);
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({
                "config_file": paths.config_file().display().to_string(),
                "watched_file": paths.watched_file().display().to_string(),
                "log_file": paths.log_file().display().to_string(),
            }));
        }
    }
    Ok(())
}

fn mask_string(s: &str) -> String {
    if s.is_empty() {
        return "<not set>".to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}
