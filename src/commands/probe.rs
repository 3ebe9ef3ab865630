use anyhow::{Context as _, Result};

use crate::Context;
use crate::config::Config;
use crate::progress;
use crate::ui;

/// Call `apiinfo.version` without logging in.
pub fn run(ctx: &Context, config: &Config) -> Result<()> {
    let connection = config.connection()?;
    let client = connection.client()?;

    let pb = (!ctx.quiet).then(|| progress::spinner(&format!("Probing {}...", connection.url)));
    let result = client.api_version();

    match result {
        Ok(version) => {
            match &pb {
                Some(pb) => {
                    progress::finish_success(pb, &format!("Zabbix API {version} is reachable"));
                }
                None => println!("{version}"),
            }
            if ctx.verbose > 0 {
                ui::kv("Endpoint", &connection.url);
                ui::kv("Timeout", &format!("{}s", connection.timeout.as_secs()));
            }
            Ok(())
        }
        Err(e) => {
            if let Some(pb) = &pb {
                progress::finish_error(pb, "No answer from the API");
            }
            Err(e).with_context(|| format!("Probe of {} failed", connection.url))
        }
    }
}
