//! Percent-based stage progress shared by both workflows.

use indicatif::{ProgressBar, ProgressStyle};

/// A 0–100 bar whose message names the current stage
pub struct StageProgress {
    bar: ProgressBar,
}

impl StageProgress {
    pub fn new(title: &'static str, visible: bool) -> Self {
        let bar = if visible {
            ProgressBar::new(100)
        } else {
            ProgressBar::hidden()
        };
        let style = ProgressStyle::default_bar()
            .template("{msg:<40} [{bar:40.red}] {pos:>3}/{len}")
            .map(|s| s.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        bar.set_message(title);
        Self { bar }
    }

    pub fn stage(&self, message: &'static str) {
        log::info!("{message}");
        self.bar.set_message(message);
    }

    pub fn advance(&self, percent: u64) {
        self.bar.inc(percent);
    }

    pub fn finish(&self, message: &'static str) {
        log::info!("{message}");
        self.bar.finish_with_message(message);
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}
