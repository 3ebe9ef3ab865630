use anyhow::{Context as _, Result, bail};
use colored::Colorize;

use crate::Context;
use crate::config::Config;
use crate::ui;
use reconcile::{AddressReport, Outcome, sync_addresses};

pub fn run(ctx: &Context, config: &Config, dry_run: bool) -> Result<()> {
    if config.hosts.is_empty() {
        bail!("No hosts declared in the configuration");
    }

    let client = super::connect(ctx, config)?;
    let report =
        sync_addresses(&client, &config.hosts, dry_run).context("Address sync aborted")?;

    if !ctx.quiet {
        print_report(&report, dry_run, ctx.verbose > 0);
        return Ok(());
    }
    for change in &report.changes {
        if let Outcome::Failed { error } = &change.outcome {
            ui::error(&format!("{}: {error}", change.hostname));
        }
    }
    Ok(())
}

fn print_report(report: &AddressReport, dry_run: bool, verbose: bool) {
    ui::header(if dry_run {
        "Agent Addresses (dry run)"
    } else {
        "Agent Addresses"
    });

    for change in &report.changes {
        let line = format!("{}: {} → {}", change.hostname, change.from, change.to);
        match &change.outcome {
            Outcome::Updated => ui::success(&line),
            Outcome::Planned { .. } => ui::info(&format!("{line} {}", "(would update)".dimmed())),
            Outcome::Failed { error } => ui::error(&format!("{line}: {error}")),
            _ => ui::dim(&line),
        }
    }

    if verbose {
        for hostname in &report.unchanged {
            ui::dim(&format!("○ {hostname}"));
        }
    }
    for hostname in &report.missing {
        ui::warn(&format!("{hostname}: not on the server (run apply to create it)"));
    }
    for hostname in &report.no_agent_interface {
        ui::warn(&format!("{hostname}: no main agent interface"));
    }
    if !report.undeclared.is_empty() {
        ui::section("Not in configuration");
        for hostname in &report.undeclared {
            ui::dim(hostname);
        }
    }

    println!();
    let changed = if dry_run {
        report.changes.len()
    } else {
        report.updated()
    };
    if report.failed() > 0 {
        ui::warn(&format!(
            "{} updated, {} failed, {} unchanged",
            report.updated(),
            report.failed(),
            report.unchanged.len()
        ));
    } else if changed == 0 {
        ui::success("All agent addresses match");
    } else if dry_run {
        ui::info(&format!("{changed} address(es) would change"));
    } else {
        ui::success(&format!("{changed} address(es) updated"));
    }
}
