use popcorn_core::DisplayLabel;
use std::io::{self, IsTerminal, Write};

/// Terminal window title as a display label. A no-op off a terminal.
pub struct TerminalTitle {
    enabled: bool,
}

impl TerminalTitle {
    pub fn new() -> Self {
        Self {
            enabled: io::stdout().is_terminal(),
        }
    }
}

impl Default for TerminalTitle {
    fn default() -> Self {
        Self::new()
    }
}

/// OSC 0 sequence setting the icon name and window title
pub fn title_sequence(label: &str) -> String {
    let clean: String = label.chars().filter(|c| !c.is_control()).collect();
    format!("\x1b]0;{}\x07", clean)
}

impl DisplayLabel for TerminalTitle {
    fn set_label(&self, label: &str) {
        if !self.enabled {
            return;
        }
        let mut stdout = io::stdout();
        if let Err(e) = stdout
            .write_all(title_sequence(label).as_bytes())
            .and_then(|_| stdout.flush())
        {
            tracing::debug!(operation = "set_title", error = %e, "Failed to set terminal title");
        }
    }
}
