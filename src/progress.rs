// src/progress.rs

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// Two-phase console indicator: a spinner while the listing page loads,
/// then a bar over the listing rows. Drawn on stdout; logs stay on stderr.
pub struct ScrapeProgress {
    bar: ProgressBar,
}

impl ScrapeProgress {
    pub fn new(visible: bool) -> Self {
        let bar = if visible {
            ProgressBar::with_draw_target(None, ProgressDrawTarget::stdout())
        } else {
            ProgressBar::hidden()
        };
        Self { bar }
    }

    pub fn hidden() -> Self {
        Self::new(false)
    }

    /// Phase one: total unknown.
    pub fn waiting(&self, msg: &str) {
        self.bar.set_style(
            ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        self.bar.set_message(msg.to_string());
        self.bar.enable_steady_tick(Duration::from_millis(120));
    }

    /// Phase two: per-row progress.
    pub fn begin(&self, total: usize) {
        self.bar.disable_steady_tick();
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
        self.bar.set_style(
            ProgressStyle::with_template(
                "Progress: |{bar:80}| {percent}% Completed ({pos}/{len}) {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉-"),
        );
    }

    pub fn row_done(&self, country: &str) {
        self.bar.set_message(country.to_string());
        self.bar.inc(1);
    }

    pub fn finish(&self) {
        self.bar.finish_with_message("done");
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_bar_still_counts_rows() {
        let progress = ScrapeProgress::hidden();
        progress.waiting("fetching listing");
        progress.begin(3);
        progress.row_done("India");
        progress.row_done("China");
        assert_eq!(progress.position(), 2);
        progress.finish();
    }

    #[test]
    fn stdout_bar_tracks_rows() {
        let progress = ScrapeProgress::new(true);
        progress.begin(1);
        progress.row_done("India");
        assert_eq!(progress.position(), 1);
        progress.finish();
    }
}
