//! User-facing progress reporting.
//!
//! Steps report progress through the [`Ui`] trait so the host decides where
//! the lines end up. [`ConsoleUi`] renders them to the terminal and mirrors
//! every line as a `tracing` event.

use std::io::{self, Write};

/// Sink for progress lines, informational messages, and errors.
pub trait Ui: Send + Sync {
    /// Reports the start of a stage (for example `Creating server...`).
    fn say(&self, message: &str);
    /// Reports supplementary detail for the current stage.
    fn message(&self, message: &str);
    /// Reports a failure or a warning that needs user attention.
    fn error(&self, message: &str);
}

/// Terminal [`Ui`] that prefixes every line with the builder name.
#[derive(Clone, Debug)]
pub struct ConsoleUi {
    prefix: String,
}

impl ConsoleUi {
    /// Creates a console UI using `prefix` as the line label.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn render_say(&self, message: &str) -> String {
        format!("==> {}: {message}", self.prefix)
    }

    fn render_message(&self, message: &str) -> String {
        format!("    {}: {message}", self.prefix)
    }

    fn render_error(&self, message: &str) -> String {
        format!("==> {}: {message}", self.prefix)
    }
}

impl Ui for ConsoleUi {
    fn say(&self, message: &str) {
        tracing::info!(ui = %self.prefix, "{message}");
        writeln!(io::stdout(), "{}", self.render_say(message)).ok();
    }

    fn message(&self, message: &str) {
        tracing::debug!(ui = %self.prefix, "{message}");
        writeln!(io::stdout(), "{}", self.render_message(message)).ok();
    }

    fn error(&self, message: &str) {
        tracing::warn!(ui = %self.prefix, "{message}");
        writeln!(io::stderr(), "{}", self.render_error(message)).ok();
    }
}
