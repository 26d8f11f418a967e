use color_eyre::Result;
use dialoguer::{Confirm, Password};

/// Prompt for the OMDb key (masked input)
pub fn prompt_api_key() -> Result<String> {
    Password::new()
        .with_prompt("OMDb API key")
        .interact()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read API key: {}", e))
}

pub fn prompt_yes_no(prompt: &str, default: bool) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read confirmation: {}", e))
}
