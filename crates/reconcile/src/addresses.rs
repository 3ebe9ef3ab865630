//! Agent address synchronisation.
//!
//! Separate from the main run, which never touches the address of an
//! existing host. Compares the main agent interface of every declared host
//! with its declared address and rewrites the interface when they differ.

use crate::error::{Error, Result};
use crate::types::{Change, HostSpec, Outcome};
use serde::Serialize;
use std::collections::HashMap;
use zabbix::{Client, ObjectKind};

/// One interface whose address differed from the declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressChange {
    pub hostname: String,
    pub interfaceid: String,
    pub from: String,
    pub to: String,
    pub outcome: Outcome,
}

/// What [`sync_addresses`] found and did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AddressReport {
    pub changes: Vec<AddressChange>,
    /// Declared hosts whose address already matches.
    pub unchanged: Vec<String>,
    /// Declared hosts absent from the server.
    pub missing: Vec<String>,
    /// Declared hosts without a main agent interface.
    pub no_agent_interface: Vec<String>,
    /// Hosts on the server that are not declared.
    pub undeclared: Vec<String>,
}

impl AddressReport {
    pub fn updated(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| c.outcome == Outcome::Updated)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| !c.outcome.is_success())
            .count()
    }
}

/// Bring agent interface addresses in line with the declared hosts.
///
/// The client must be logged in. Listing hosts is fatal on failure; a failed
/// interface update is recorded and the remaining hosts are still processed.
pub fn sync_addresses(client: &Client, hosts: &[HostSpec], dry_run: bool) -> Result<AddressReport> {
    let remote = client
        .hosts()
        .map_err(|e| Error::remote("list", ObjectKind::Host, "*", e))?;

    let declared: HashMap<&str, &HostSpec> =
        hosts.iter().map(|h| (h.hostname.as_str(), h)).collect();

    let mut report = AddressReport::default();
    for host in &remote {
        if !declared.contains_key(host.host.as_str()) {
            report.undeclared.push(host.host.clone());
        }
    }

    for spec in hosts {
        let Some(host) = remote.iter().find(|h| h.host == spec.hostname) else {
            report.missing.push(spec.hostname.clone());
            continue;
        };
        let Some(interface) = host.agent_interface() else {
            log::warn!("Host '{}' has no main agent interface", spec.hostname);
            report.no_agent_interface.push(spec.hostname.clone());
            continue;
        };

        let wanted = spec.address.to_string();
        if interface.ip == wanted {
            report.unchanged.push(spec.hostname.clone());
            continue;
        }

        let outcome = if dry_run {
            Outcome::Planned {
                change: Change::Update,
            }
        } else {
            match client.update_interface_address(&interface.interfaceid, &wanted) {
                Ok(()) => {
                    log::info!(
                        "Updated agent address of '{}': {} -> {wanted}",
                        spec.hostname,
                        interface.ip
                    );
                    Outcome::Updated
                }
                Err(e) => {
                    log::warn!("Could not update agent address of '{}': {e}", spec.hostname);
                    Outcome::Failed { error: e.to_string() }
                }
            }
        };

        report.changes.push(AddressChange {
            hostname: spec.hostname.clone(),
            interfaceid: interface.interfaceid.clone(),
            from: interface.ip.clone(),
            to: wanted,
            outcome,
        });
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;
    use std::net::Ipv4Addr;
    use zabbix::MockBackend;

    fn specs() -> Vec<HostSpec> {
        vec![
            HostSpec::new("web1", "Web 1", Ipv4Addr::new(10, 0, 10, 4), Role::Web),
            HostSpec::new("db1", "DB", Ipv4Addr::new(10, 0, 0, 9), Role::Generic),
            HostSpec::new("cache1", "Cache", Ipv4Addr::new(10, 0, 0, 7), Role::Generic),
        ]
    }

    fn client(mock: &MockBackend) -> Client {
        let mut client = Client::with_backend(Box::new(mock.clone()));
        client.login("Admin", "zabbix").unwrap();
        client
    }

    fn agent_ip(client: &Client, hostname: &str) -> String {
        client
            .hosts()
            .unwrap()
            .into_iter()
            .find(|h| h.host == hostname)
            .unwrap()
            .agent_interface()
            .unwrap()
            .ip
            .clone()
    }

    #[test]
    fn test_sync_updates_changed_addresses() {
        let mock = MockBackend::new();
        mock.add_host("web1", "172.16.0.4");
        mock.add_host("db1", "10.0.0.9");
        mock.add_host("legacy", "10.9.9.9");
        let client = client(&mock);

        let report = sync_addresses(&client, &specs(), false).unwrap();

        assert_eq!(report.updated(), 1);
        assert_eq!(report.changes[0].hostname, "web1");
        assert_eq!(report.changes[0].from, "172.16.0.4");
        assert_eq!(report.unchanged, vec!["db1"]);
        assert_eq!(report.missing, vec!["cache1"]);
        assert_eq!(report.undeclared, vec!["legacy"]);
        assert_eq!(agent_ip(&client, "web1"), "10.0.10.4");
    }

    #[test]
    fn test_dry_run_changes_nothing() {
        let mock = MockBackend::new();
        mock.add_host("web1", "172.16.0.4");
        let client = client(&mock);

        let report = sync_addresses(&client, &specs(), true).unwrap();

        assert_eq!(
            report.changes[0].outcome,
            Outcome::Planned {
                change: Change::Update
            }
        );
        assert_eq!(mock.call_count("hostinterface.update"), 0);
        assert_eq!(agent_ip(&client, "web1"), "172.16.0.4");
    }

    #[test]
    fn test_failed_update_is_recorded() {
        let mock = MockBackend::new();
        mock.add_host("web1", "172.16.0.4");
        mock.add_host("db1", "172.16.0.9");
        mock.fail_when("hostinterface.update", "10.0.10.4");
        let client = client(&mock);

        let report = sync_addresses(&client, &specs(), false).unwrap();

        assert_eq!(report.failed(), 1);
        assert_eq!(report.updated(), 1);
        assert_eq!(agent_ip(&client, "db1"), "10.0.0.9");
    }
}
