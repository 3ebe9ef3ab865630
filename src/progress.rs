//! Progress indicators for zbxsync.
//!
//! A spinner for single long calls, and [`ConsoleProgress`], which renders
//! reconciliation phases and per-object outcomes as they happen.

use crate::ui;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use reconcile::{Outcome, Phase, ProgressCallback};
use std::time::Duration;
use zabbix::ObjectKind;

/// Start a spinner with a message.
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Stop the spinner and leave a success line.
pub fn finish_success(pb: &ProgressBar, msg: &str) {
    pb.finish_and_clear();
    ui::success(msg);
}

/// Stop the spinner and leave an error line.
pub fn finish_error(pb: &ProgressBar, msg: &str) {
    pb.finish_and_clear();
    ui::error(msg);
}

/// Stop the spinner without a trace.
pub fn finish_clear(pb: &ProgressBar) {
    pb.finish_and_clear();
}

/// Live console rendering of a reconciliation run.
///
/// Unchanged objects are only listed with `-v`. When `enabled` is false
/// (quiet or JSON output) nothing is printed.
pub struct ConsoleProgress {
    enabled: bool,
    verbose: bool,
    spinner: Option<ProgressBar>,
}

impl ConsoleProgress {
    pub fn new(enabled: bool, verbose: bool) -> Self {
        Self {
            enabled,
            verbose,
            spinner: None,
        }
    }

    /// Clear any running spinner.
    pub fn finish(&mut self) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
    }

    fn print(&self, f: impl FnOnce()) {
        match &self.spinner {
            Some(pb) => pb.suspend(f),
            None => f(),
        }
    }

    fn shows(&self, outcome: &Outcome) -> bool {
        self.verbose || !matches!(outcome, Outcome::Skipped { .. })
    }
}

impl ProgressCallback for ConsoleProgress {
    fn on_phase(&mut self, phase: Phase) {
        if !self.enabled {
            return;
        }
        self.finish();
        log::debug!("Phase: {phase}");
        self.spinner = Some(spinner(&format!("{}...", phase.label())));
    }

    fn on_outcome(&mut self, kind: ObjectKind, key: &str, outcome: &Outcome) {
        if !self.enabled || !self.shows(outcome) {
            return;
        }
        self.print(|| ui::outcome(kind.label(), key, outcome));
    }

    fn on_warning(&mut self, message: &str) {
        if !self.enabled {
            return;
        }
        self.print(|| println!("  {} {}", "⚠".yellow(), message));
    }
}

impl Drop for ConsoleProgress {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skipped_hidden_unless_verbose() {
        let skipped = Outcome::Skipped {
            reason: "already exists".into(),
        };
        assert!(!ConsoleProgress::new(true, false).shows(&skipped));
        assert!(ConsoleProgress::new(true, true).shows(&skipped));
        assert!(ConsoleProgress::new(true, false).shows(&Outcome::Created));
    }

    #[test]
    fn test_disabled_never_starts_spinner() {
        let mut progress = ConsoleProgress::new(false, false);
        progress.on_phase(Phase::Hosts);
        progress.on_outcome(ObjectKind::Host, "web1", &Outcome::Created);
        assert!(progress.spinner.is_none());
    }
}
