//! Terminal progress display for generation runs.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// One bar counting lockfile nodes as they are described.
pub struct GenProgress {
    bar: ProgressBar,
}

impl GenProgress {
    /// A bar on stderr for `total` nodes.
    pub fn new(total: u64) -> Self {
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("  {prefix:.bold} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .expect("valid template")
                .progress_chars("##-"),
        );
        bar.set_prefix("packages");
        Self { bar }
    }

    /// A bar that draws nothing, for library callers and tests.
    pub fn hidden() -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::hidden());
        Self { bar }
    }

    /// Record one finished node.
    pub fn tick(&self, msg: &str) {
        self.bar.set_message(msg.to_string());
        self.bar.inc(1);
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Suspend the bar for clean stderr output, then resume.
    pub fn suspend<F: FnOnce()>(&self, f: F) {
        self.bar.suspend(f);
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_bar_counts() {
        let progress = GenProgress::hidden();
        progress.tick("a@1.0.0");
        progress.tick("b@1.0.0");
        assert_eq!(progress.position(), 2);
        progress.finish();
    }
}
