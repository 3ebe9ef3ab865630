// Reconciliation
pub mod apply;

// Inventory inspection and repair
pub mod addresses;
pub mod agents;
pub mod probe;

// Local configuration
pub mod config;

use crate::Context;
use crate::config::Config;
use crate::progress;
use anyhow::{Context as _, Result};
use colored::Colorize;
use zabbix::Client;

/// Open an authenticated session for commands outside the reconciler.
pub(crate) fn connect(ctx: &Context, config: &Config) -> Result<Client> {
    let connection = config.credentials_connection()?;
    let mut client = connection.client()?;

    let pb = (!ctx.quiet)
        .then(|| progress::spinner(&format!("Logging in to {}...", connection.url)));
    let result = client.login(&connection.username, &connection.password);
    if let Some(pb) = &pb {
        progress::finish_clear(pb);
    }

    result.with_context(|| format!("Could not log in as '{}'", connection.username))?;
    log::info!("Logged in to {} as {}", connection.url, connection.username);
    Ok(client)
}

/// The first API error in the chain, looking inside reconciliation errors.
fn api_error(err: &anyhow::Error) -> Option<&zabbix::Error> {
    err.chain().find_map(|cause| {
        cause.downcast_ref::<zabbix::Error>().or_else(|| {
            cause
                .downcast_ref::<reconcile::Error>()
                .and_then(reconcile::Error::api_error)
        })
    })
}

/// Category advice for the first API error in the chain.
pub fn advice(err: &anyhow::Error) -> Option<&'static str> {
    api_error(err).map(|e| e.category().advice())
}

/// Print advice for a failed command to stderr.
pub fn explain(err: &anyhow::Error) {
    let Some(api) = api_error(err) else {
        return;
    };
    let advice = api.category().advice();
    match api.method() {
        Some(method) => eprintln!("  {} {} {}", "→".dimmed(), advice.dimmed(), format!("({method})").dimmed()),
        None => eprintln!("  {} {}", "→".dimmed(), advice.dimmed()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advice_found_through_context() {
        let err = anyhow::Error::new(zabbix::Error::Authentication(
            "Login name or password is incorrect.".into(),
        ))
        .context("Could not log in as 'Admin'");
        assert_eq!(advice(&err), Some("Verify the username and password"));
    }

    #[test]
    fn test_advice_through_reconcile_error() {
        let inner = zabbix::Error::transport("host.get", "connection refused", None);
        let err = anyhow::Error::new(reconcile::Error::Authentication(inner))
            .context("Reconciliation aborted");
        assert_eq!(advice(&err), Some(zabbix::ErrorCategory::Transport.advice()));
    }

    #[test]
    fn test_failed_method_found_through_reconcile_error() {
        let inner = zabbix::Error::transport("trigger.get", "timed out", None);
        let err = anyhow::Error::new(reconcile::Error::Remote {
            action: "look up",
            kind: zabbix::ObjectKind::Trigger,
            key: "High CPU usage on web1".into(),
            source: inner,
        });
        assert_eq!(api_error(&err).and_then(zabbix::Error::method), Some("trigger.get"));
    }

    #[test]
    fn test_no_advice_for_local_errors() {
        let err = anyhow::anyhow!("No server URL configured");
        assert!(advice(&err).is_none());
    }
}
