use anyhow::{Context as _, Result};

use crate::Context;
use crate::cli::ApplyArgs;
use crate::config::Config;
use crate::progress::ConsoleProgress;
use crate::ui;
use reconcile::{Credentials, Reconciler, RunReport};

pub fn run(ctx: &Context, config: &Config, args: &ApplyArgs) -> Result<()> {
    let desired = config.desired_state(args)?;
    let connection = config.credentials_connection()?;
    let mut client = connection.client()?;
    let credentials = Credentials::new(&connection.username, &connection.password);

    let live = !args.json && !ctx.quiet;
    if live {
        ui::header(if args.dry_run {
            "Planning Zabbix configuration"
        } else {
            "Applying Zabbix configuration"
        });
        ui::kv("Server", &connection.url);
        ui::kv("Host group", &desired.group);
        ui::kv("Hosts", &desired.hosts.len().to_string());
        ui::kv("Web check", &desired.web_check.url);
        println!();
    }

    let mut progress = ConsoleProgress::new(live, ctx.verbose > 0);
    let result = Reconciler::new(&mut client, &desired)
        .dry_run(args.dry_run)
        .run(&credentials, &mut progress);
    progress.finish();

    let report = result.context("Reconciliation aborted")?;
    print_report(ctx, args, &report)
}

fn print_report(ctx: &Context, args: &ApplyArgs, report: &RunReport) -> Result<()> {
    if args.json {
        let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
        println!("{json}");
    } else if ctx.quiet {
        for failure in &report.failures {
            ui::error(&format!(
                "{} '{}': {}",
                failure.kind.label(),
                failure.key,
                failure.error
            ));
        }
    } else {
        ui::report(report);
    }

    if report.has_failures() {
        log::warn!(
            "{} object(s) failed and were skipped; re-run to retry",
            report.failures.len()
        );
    }
    Ok(())
}
