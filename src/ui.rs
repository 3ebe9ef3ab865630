use colored::Colorize;
use reconcile::{Outcome, RunReport};

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

// ============================================================================
// Outcomes
// ============================================================================

/// Symbol for one object outcome, uncolored.
pub fn outcome_symbol(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::Created => "✓",
        Outcome::Updated => "~",
        Outcome::Replaced => "→",
        Outcome::Skipped { .. } => "○",
        Outcome::Planned { .. } => "ℹ",
        Outcome::Failed { .. } => "✗",
    }
}

/// Short description, e.g. "would create" for a planned create.
pub fn outcome_label(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Created => "created".to_string(),
        Outcome::Updated => "updated".to_string(),
        Outcome::Replaced => "replaced".to_string(),
        Outcome::Skipped { reason } => reason.clone(),
        Outcome::Planned { change } => format!("would {change}"),
        Outcome::Failed { error } => format!("failed: {error}"),
    }
}

/// One line per object: colored symbol, key, dimmed description.
pub fn outcome(kind_label: &str, key: &str, outcome: &Outcome) {
    let symbol = outcome_symbol(outcome);
    let symbol = match outcome {
        Outcome::Created | Outcome::Replaced => symbol.green(),
        Outcome::Updated => symbol.yellow(),
        Outcome::Skipped { .. } => symbol.dimmed(),
        Outcome::Planned { .. } => symbol.blue(),
        Outcome::Failed { .. } => symbol.red(),
    };
    println!(
        "  {symbol} {} {} {}",
        kind_label.dimmed(),
        key,
        format!("({})", outcome_label(outcome)).dimmed()
    );
}

/// Print the end-of-run summary, failures and warnings.
pub fn report(report: &RunReport) {
    if report.dry_run {
        header("Plan");
    } else {
        header("Summary");
    }

    for line in report.summary_lines() {
        println!("  {line}");
    }

    if !report.warnings.is_empty() {
        section("Warnings");
        for warning in &report.warnings {
            warn(warning);
        }
    }

    if report.has_failures() {
        section("Failures");
        for failure in &report.failures {
            error(&format!(
                "{} '{}': {}",
                failure.kind.label(),
                failure.key,
                failure.error
            ));
        }
    }

    println!();
    if report.dry_run {
        info("Dry run: nothing was changed");
    } else if report.has_failures() {
        warn(&format!(
            "Finished with {} failure(s); re-run to retry",
            report.failures.len()
        ));
    } else if report.total_changes() == 0 {
        success("Already up to date");
    } else {
        success(&format!("{} object(s) changed", report.total_changes()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconcile::Change;

    #[test]
    fn test_outcome_symbols() {
        assert_eq!(outcome_symbol(&Outcome::Created), "✓");
        assert_eq!(
            outcome_symbol(&Outcome::Skipped {
                reason: "already exists".into()
            }),
            "○"
        );
        assert_eq!(outcome_symbol(&Outcome::Updated), "~");
        assert_eq!(outcome_symbol(&Outcome::Replaced), "→");
        assert_eq!(
            outcome_symbol(&Outcome::Failed {
                error: "boom".into()
            }),
            "✗"
        );
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(
            outcome_label(&Outcome::Planned {
                change: Change::Replace
            }),
            "would replace"
        );
        assert_eq!(
            outcome_label(&Outcome::Failed {
                error: "Not authorized.".into()
            }),
            "failed: Not authorized."
        );
        assert_eq!(outcome_label(&Outcome::Created), "created");
    }
}
