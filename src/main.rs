mod cli;
mod commands;
mod config;
mod paths;
mod progress;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command, ConfigCommand};
use config::Config;
use std::io;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    let result = run(&ctx, cli);
    if let Err(e) = &result {
        commands::explain(e);
    }
    result
}

fn run(ctx: &Context, cli: Cli) -> Result<()> {
    match cli.command {
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "zbxsync", &mut io::stdout());
            Ok(())
        }
        Command::Config(ConfigCommand::Init { force }) => {
            let path = config::resolve_path(cli.server.config.as_deref())?;
            commands::config::run(ctx, ConfigCommand::Init { force }, &Config::default(), &path)
        }
        command => {
            let (mut config, path) = Config::load(cli.server.config.as_deref())?;
            config.merge(&cli.server);

            match command {
                Command::Apply(args) => commands::apply::run(ctx, &config, &args),
                Command::Agents => commands::agents::run(ctx, &config),
                Command::Addresses { dry_run } => commands::addresses::run(ctx, &config, dry_run),
                Command::Probe => commands::probe::run(ctx, &config),
                Command::Config(cmd) => commands::config::run(ctx, cmd, &config, &path),
                // handled before the config is loaded
                Command::Completions { .. } => Ok(()),
            }
        }
    }
}
