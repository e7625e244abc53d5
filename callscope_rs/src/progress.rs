//! Terminal status output.
//!
//! Index builds get an animated status line; everything else is a one-line
//! stderr message under the `[callscope]` prefix.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Animated status line shown while an index build scans a tree.
pub struct StatusLine {
    bar: ProgressBar,
}

impl StatusLine {
    pub fn start(message: &str) -> Self {
        let template = ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        let bar = ProgressBar::new_spinner()
            .with_style(template)
            .with_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    /// Replace the status line with a final summary.
    pub fn done(self, summary: &str) {
        self.bar.finish_and_clear();
        println!("{} {}", style("ok").green(), summary);
    }

    /// Drop the status line without printing anything.
    pub fn discard(self) {
        self.bar.finish_and_clear();
    }
}

pub fn warn(message: &str) {
    eprintln!("{} {}", style("[callscope][warn]").yellow(), message);
}

pub fn fail(message: &str) {
    eprintln!("{} {}", style("[callscope][error]").red(), message);
}
