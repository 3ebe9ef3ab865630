use anyhow::Result;
use std::path::Path;

use crate::Context;
use crate::cli::ConfigCommand;
use crate::config::{self, Config};
use crate::ui;

pub fn run(ctx: &Context, cmd: ConfigCommand, config: &Config, path: &Path) -> Result<()> {
    match cmd {
        ConfigCommand::Show => show(config, path),
        ConfigCommand::Init { force } => init(ctx, path, force),
    }
}

fn show(config: &Config, path: &Path) -> Result<()> {
    ui::header("Configuration");
    let location = if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not found, using defaults)", path.display())
    };
    ui::kv("File", &location);
    println!();
    print!("{}", config.masked().to_toml()?);
    Ok(())
}

fn init(ctx: &Context, path: &Path, force: bool) -> Result<()> {
    config::write_sample(path, force)?;
    if !ctx.quiet {
        ui::success(&format!("Wrote sample config to {}", path.display()));
        ui::dim("Edit the hosts and server URL, then run: zbxsync apply --dry-run");
    }
    Ok(())
}
