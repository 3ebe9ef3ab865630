use anyhow::{Context as _, Result};
use colored::Colorize;

use crate::Context;
use crate::config::Config;
use crate::ui;
use zabbix::Host;

/// Counts shown under the agent list.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct AgentTotals {
    pub total: usize,
    pub enabled: usize,
    pub disabled: usize,
    pub without_agent: usize,
}

impl AgentTotals {
    pub fn of(hosts: &[Host]) -> Self {
        let enabled = hosts.iter().filter(|h| h.is_enabled()).count();
        Self {
            total: hosts.len(),
            enabled,
            disabled: hosts.len() - enabled,
            without_agent: hosts
                .iter()
                .filter(|h| h.agent_interface().is_none())
                .count(),
        }
    }
}

pub fn run(ctx: &Context, config: &Config) -> Result<()> {
    let client = super::connect(ctx, config)?;
    let mut hosts = client.hosts().context("Could not list hosts")?;
    hosts.sort_by(|a, b| a.host.cmp(&b.host));

    ui::header("Zabbix Agents");

    if hosts.is_empty() {
        ui::info("No hosts on the server");
        return Ok(());
    }

    let width = hosts.iter().map(|h| h.host.len()).max().unwrap_or(0);
    for host in &hosts {
        let (symbol, status) = if host.is_enabled() {
            ("✓".green(), format!("{:<8}", "enabled").green())
        } else {
            ("○".dimmed(), format!("{:<8}", "disabled").yellow())
        };
        let address = host.agent_interface().map_or_else(
            || "no agent interface".dimmed().to_string(),
            |i| format!("{}:{}", i.ip, i.port),
        );
        println!("  {symbol} {:<width$}  {status}  {address}", host.host);

        if ctx.verbose > 0 && !host.name.is_empty() && host.name != host.host {
            ui::dim(&format!("  {}", host.name));
        }
    }

    let totals = AgentTotals::of(&hosts);
    ui::section("Totals");
    ui::kv("Hosts", &totals.total.to_string());
    ui::kv("Enabled", &totals.enabled.to_string());
    ui::kv("Disabled", &totals.disabled.to_string());
    if totals.without_agent > 0 {
        ui::kv("Without agent", &totals.without_agent.to_string().yellow().to_string());
    }
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use zabbix::{Client, MockBackend};

    #[test]
    fn test_totals_from_server() {
        let mock = MockBackend::new();
        mock.add_host("web1.internal", "10.0.10.4");
        mock.add_host("web2.internal", "10.0.11.5");
        let mut client = Client::with_backend(Box::new(mock));
        client.login("Admin", "zabbix").unwrap();

        let hosts = client.hosts().unwrap();
        assert_eq!(
            AgentTotals::of(&hosts),
            AgentTotals {
                total: 2,
                enabled: 2,
                disabled: 0,
                without_agent: 0,
            }
        );
    }

    #[test]
    fn test_totals_count_disabled_and_agentless() {
        let hosts: Vec<Host> = serde_json::from_value(json!([
            {"hostid": "1", "host": "a", "status": "1", "interfaces": []},
            {"hostid": "2", "host": "b", "status": "0", "interfaces": [
                {"interfaceid": "5", "ip": "10.0.0.2", "port": "10050", "type": "1", "main": "1"}
            ]}
        ]))
        .unwrap();

        let totals = AgentTotals::of(&hosts);
        assert_eq!(totals.disabled, 1);
        assert_eq!(totals.enabled, 1);
        assert_eq!(totals.without_agent, 1);
    }
}
