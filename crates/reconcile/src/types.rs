//! Core types for declared monitoring state

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::net::Ipv4Addr;
use std::sync::LazyLock;

/// DNS-style host name: dot-separated labels of letters, digits and inner hyphens.
static HOSTNAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$")
        .expect("hostname pattern is valid")
});

/// What a host does, deciding which optional templates it gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Generic,
    Web,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generic => write!(f, "generic"),
            Self::Web => write!(f, "web"),
        }
    }
}

/// A host that should be monitored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSpec {
    /// Technical host name, the natural key on the server.
    pub hostname: String,
    /// Visible name.
    pub name: String,
    /// Address of the agent interface.
    pub address: Ipv4Addr,
    #[serde(default)]
    pub role: Role,
}

impl HostSpec {
    pub fn new(hostname: impl Into<String>, name: impl Into<String>, address: Ipv4Addr, role: Role) -> Self {
        Self {
            hostname: hostname.into(),
            name: name.into(),
            address,
            role,
        }
    }

    #[must_use]
    pub fn is_web(&self) -> bool {
        self.role == Role::Web
    }
}

/// What to do with a dashboard that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Leave it alone.
    #[default]
    Skip,
    /// Delete it and create it again from the current layout.
    Replace,
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skip => write!(f, "skip"),
            Self::Replace => write!(f, "replace"),
        }
    }
}

/// A mutation that a dry run would have issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Change {
    Create,
    Update,
    Replace,
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Replace => write!(f, "replace"),
        }
    }
}

/// Result of reconciling one object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum Outcome {
    /// Object did not exist and was created
    Created,
    /// Existing object was brought in line
    Updated,
    /// Existing object was deleted and created again
    Replaced,
    /// Object exists and is left as is
    Skipped { reason: String },
    /// Dry run: this change would be made
    Planned { change: Change },
    /// Recoverable failure
    Failed { error: String },
}

impl Outcome {
    pub(crate) fn exists() -> Self {
        Self::Skipped {
            reason: "already exists".to_string(),
        }
    }

    /// Check if the outcome represents success (no failure)
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

/// The periodic HTTP availability check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebCheck {
    /// Scenario name, unique per host.
    pub name: String,
    /// URL the single step requests.
    pub url: String,
    /// Polling interval in Zabbix time syntax.
    pub interval: String,
    /// HTTP status the step must return.
    pub expected_status: u16,
    /// Description of the trigger raised when the check fails.
    pub trigger: String,
}

impl Default for WebCheck {
    fn default() -> Self {
        Self {
            name: "Website Availability".to_string(),
            url: String::new(),
            interval: "60s".to_string(),
            expected_status: 200,
            trigger: "Website is unavailable".to_string(),
        }
    }
}

/// Dashboard names and conflict handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSettings {
    pub on_conflict: ConflictPolicy,
    /// Always created.
    pub overview: String,
    /// Created when at least one host has the web role.
    pub web: String,
    /// Number of hosts that get a CPU graph on the overview.
    pub overview_graph_limit: usize,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            on_conflict: ConflictPolicy::Skip,
            overview: "System Overview".to_string(),
            web: "Web Servers".to_string(),
            overview_graph_limit: 4,
        }
    }
}

/// Everything a run should make true on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredState {
    /// Host group every managed host belongs to.
    pub group: String,
    /// Template linked to every host. Must exist.
    pub base_template: String,
    /// Template linked to web hosts, when it exists.
    pub web_template: Option<String>,
    pub hosts: Vec<HostSpec>,
    pub web_check: WebCheck,
    pub dashboards: DashboardSettings,
}

impl DesiredState {
    /// Reject states a run cannot reconcile.
    pub fn validate(&self) -> Result<()> {
        if self.group.trim().is_empty() {
            return Err(Error::Invalid("host group name is empty".into()));
        }
        if self.base_template.trim().is_empty() {
            return Err(Error::Invalid("base template name is empty".into()));
        }
        if self.hosts.is_empty() {
            return Err(Error::Invalid("no hosts declared".into()));
        }

        let mut seen = HashSet::new();
        for host in &self.hosts {
            if !HOSTNAME.is_match(&host.hostname) || host.hostname.len() > 128 {
                return Err(Error::Invalid(format!(
                    "'{}' is not a valid host name",
                    host.hostname
                )));
            }
            if !seen.insert(host.hostname.as_str()) {
                return Err(Error::Invalid(format!(
                    "host '{}' is declared more than once",
                    host.hostname
                )));
            }
        }

        if self.web_check.url.trim().is_empty() {
            return Err(Error::Invalid("web check URL is empty".into()));
        }
        if self.web_check.name.trim().is_empty() {
            return Err(Error::Invalid("web check name is empty".into()));
        }

        Ok(())
    }

    /// The host carrying the web check: always the first declared host.
    pub fn web_check_host(&self) -> Option<&HostSpec> {
        self.hosts.first()
    }

    pub fn has_web_hosts(&self) -> bool {
        self.hosts.iter().any(HostSpec::is_web)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// One generic host followed by two web hosts.
    pub fn desired_state() -> DesiredState {
        DesiredState {
            group: "G".into(),
            base_template: "Linux".into(),
            web_template: Some("Nginx".into()),
            hosts: vec![
                HostSpec::new("bastion.internal", "Bastion", Ipv4Addr::new(10, 0, 1, 33), Role::Generic),
                HostSpec::new("web1.internal", "Web Server 1", Ipv4Addr::new(10, 0, 10, 4), Role::Web),
                HostSpec::new("web2.internal", "Web Server 2", Ipv4Addr::new(10, 0, 11, 5), Role::Web),
            ],
            web_check: WebCheck {
                url: "http://203.0.113.10/".into(),
                ..WebCheck::default()
            },
            dashboards: DashboardSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::desired_state;
    use super::*;

    #[test]
    fn test_valid_state() {
        assert!(desired_state().validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_host_list() {
        let mut state = desired_state();
        state.hosts.clear();
        assert!(matches!(state.validate(), Err(Error::Invalid(_))));
    }

    #[test]
    fn test_rejects_duplicate_hostnames() {
        let mut state = desired_state();
        let first = state.hosts[0].clone();
        state.hosts.push(first);
        let err = state.validate().unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_rejects_bad_hostnames() {
        for bad in ["", "-web", "web_1", "web..internal", "web 1", "web1."] {
            let mut state = desired_state();
            state.hosts[0].hostname = bad.to_string();
            assert!(state.validate().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_rejects_missing_web_check_url() {
        let mut state = desired_state();
        state.web_check.url = "  ".into();
        assert!(state.validate().is_err());
    }

    #[test]
    fn test_web_check_host_is_first_declared() {
        let state = desired_state();
        assert_eq!(state.web_check_host().unwrap().hostname, "bastion.internal");
        assert!(state.has_web_hosts());
    }

    #[test]
    fn test_host_spec_deserializes() {
        let host: HostSpec = from_json(
            r#"{"hostname": "web1.internal", "name": "Web 1", "address": "10.0.10.4", "role": "web"}"#,
        );
        assert!(host.is_web());
        assert_eq!(host.address, Ipv4Addr::new(10, 0, 10, 4));

        let host: HostSpec =
            from_json(r#"{"hostname": "db1", "name": "DB", "address": "10.0.0.9"}"#);
        assert_eq!(host.role, Role::Generic);
    }

    fn from_json<T: serde::de::DeserializeOwned>(json: &str) -> T {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_outcome_serializes_tagged() {
        let value = serde_json::to_value(Outcome::Planned {
            change: Change::Create,
        })
        .unwrap();
        assert_eq!(value["outcome"], "planned");
        assert_eq!(value["change"], "create");
        assert!(!Outcome::Failed { error: "x".into() }.is_success());
    }
}
