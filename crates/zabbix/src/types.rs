//! Wire types for the Zabbix API.
//!
//! Read-side records mirror what `*.get` returns (Zabbix encodes almost every
//! scalar as a string). Write-side payloads are what `*.create` expects.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Default Zabbix agent port.
pub const AGENT_PORT: &str = "10050";

/// Object kinds this crate knows how to look up, create and delete.
///
/// Each kind maps to an API object name and the field names Zabbix uses
/// for its identifier and its natural key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    HostGroup,
    Template,
    Host,
    Item,
    Trigger,
    WebScenario,
    Dashboard,
}

impl ObjectKind {
    /// API object name, the prefix of every method (`host` in `host.get`).
    #[must_use]
    pub fn api_object(&self) -> &'static str {
        match self {
            Self::HostGroup => "hostgroup",
            Self::Template => "template",
            Self::Host => "host",
            Self::Item => "item",
            Self::Trigger => "trigger",
            Self::WebScenario => "httptest",
            Self::Dashboard => "dashboard",
        }
    }

    /// Full method name for an operation, e.g. `hostgroup.create`.
    #[must_use]
    pub fn method(&self, operation: &str) -> String {
        format!("{}.{}", self.api_object(), operation)
    }

    /// Field carrying the platform-assigned identifier.
    #[must_use]
    pub fn id_field(&self) -> &'static str {
        match self {
            Self::HostGroup => "groupid",
            Self::Template => "templateid",
            Self::Host => "hostid",
            Self::Item => "itemid",
            Self::Trigger => "triggerid",
            Self::WebScenario => "httptestid",
            Self::Dashboard => "dashboardid",
        }
    }

    /// Field carrying the natural key used for existence lookups.
    #[must_use]
    pub fn key_field(&self) -> &'static str {
        match self {
            Self::HostGroup | Self::WebScenario | Self::Dashboard => "name",
            Self::Template | Self::Host => "host",
            Self::Item => "key_",
            Self::Trigger => "description",
        }
    }

    /// Field listing new identifiers in a `create`/`delete` result.
    #[must_use]
    pub fn ids_field(&self) -> String {
        format!("{}s", self.id_field())
    }

    /// Human-readable name.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::HostGroup => "host group",
            Self::Template => "template",
            Self::Host => "host",
            Self::Item => "item",
            Self::Trigger => "trigger",
            Self::WebScenario => "web scenario",
            Self::Dashboard => "dashboard",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Trigger severity, sent to the API as its ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    NotClassified,
    Information,
    Warning,
    Average,
    High,
    Disaster,
}

impl Severity {
    /// Ordinal value used by the API (0-5).
    #[must_use]
    pub fn level(&self) -> u8 {
        match self {
            Self::NotClassified => 0,
            Self::Information => 1,
            Self::Warning => 2,
            Self::Average => 3,
            Self::High => 4,
            Self::Disaster => 5,
        }
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.level())
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotClassified => "Not classified",
            Self::Information => "Information",
            Self::Warning => "Warning",
            Self::Average => "Average",
            Self::High => "High",
            Self::Disaster => "Disaster",
        };
        write!(f, "{name}")
    }
}

// ============================================================================
// Read-side records
// ============================================================================

/// A host as returned by `host.get` with `selectInterfaces`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Host {
    pub hostid: String,
    pub host: String,
    #[serde(default)]
    pub name: String,
    /// "0" = monitored, "1" = unmonitored.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub interfaces: Vec<HostInterface>,
}

impl Host {
    /// Whether the host is enabled for monitoring.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.status == "0"
    }

    /// The main agent interface, if any.
    #[must_use]
    pub fn agent_interface(&self) -> Option<&HostInterface> {
        self.interfaces
            .iter()
            .find(|i| i.is_agent() && i.main == "1")
    }
}

/// One host interface.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HostInterface {
    #[serde(default)]
    pub interfaceid: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub port: String,
    /// "1" agent, "2" SNMP, "3" IPMI, "4" JMX.
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub main: String,
}

impl HostInterface {
    #[must_use]
    pub fn is_agent(&self) -> bool {
        self.kind == "1"
    }
}

// ============================================================================
// Write-side payloads
// ============================================================================

/// Reference to a host group by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRef {
    pub groupid: String,
}

/// Reference to a template by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateRef {
    pub templateid: String,
}

/// Parameters for `host.create`.
#[derive(Debug, Clone, Serialize)]
pub struct NewHost {
    pub host: String,
    pub name: String,
    pub interfaces: Vec<NewInterface>,
    pub groups: Vec<GroupRef>,
    pub templates: Vec<TemplateRef>,
}

/// Interface definition for `host.create`.
#[derive(Debug, Clone, Serialize)]
pub struct NewInterface {
    #[serde(rename = "type")]
    pub kind: u8,
    pub main: u8,
    pub useip: u8,
    pub ip: String,
    pub dns: String,
    pub port: String,
}

impl NewInterface {
    /// Main agent interface reached by IP on the default port.
    #[must_use]
    pub fn agent(ip: impl Into<String>) -> Self {
        Self {
            kind: 1,
            main: 1,
            useip: 1,
            ip: ip.into(),
            dns: String::new(),
            port: AGENT_PORT.to_string(),
        }
    }
}

/// Parameters for `trigger.create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTrigger {
    pub description: String,
    pub expression: String,
    pub priority: Severity,
    pub comments: String,
}

/// Parameters for `httptest.create`.
#[derive(Debug, Clone, Serialize)]
pub struct NewWebScenario {
    pub name: String,
    pub hostid: String,
    pub delay: String,
    pub steps: Vec<WebStep>,
}

/// One step of a web scenario.
#[derive(Debug, Clone, Serialize)]
pub struct WebStep {
    pub no: u32,
    pub name: String,
    pub url: String,
    pub status_codes: String,
}

/// Parameters for `dashboard.create`.
#[derive(Debug, Clone, Serialize)]
pub struct NewDashboard {
    pub name: String,
    pub pages: Vec<DashboardPage>,
}

impl NewDashboard {
    /// Single-page dashboard.
    #[must_use]
    pub fn single_page(name: impl Into<String>, widgets: Vec<Widget>) -> Self {
        Self {
            name: name.into(),
            pages: vec![DashboardPage { widgets }],
        }
    }
}

/// A dashboard page.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardPage {
    pub widgets: Vec<Widget>,
}

/// A dashboard widget with its grid placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Widget {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub fields: Vec<WidgetField>,
}

/// A widget configuration field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WidgetField {
    /// 0 integer, 1 string, 2 host group id, 4 item id.
    #[serde(rename = "type")]
    pub kind: u8,
    pub name: String,
    pub value: String,
}

impl WidgetField {
    #[must_use]
    pub fn integer(name: impl Into<String>, value: i64) -> Self {
        Self {
            kind: 0,
            name: name.into(),
            value: value.to_string(),
        }
    }

    #[must_use]
    pub fn host_group(name: impl Into<String>, groupid: impl Into<String>) -> Self {
        Self {
            kind: 2,
            name: name.into(),
            value: groupid.into(),
        }
    }

    #[must_use]
    pub fn item(name: impl Into<String>, itemid: impl Into<String>) -> Self {
        Self {
            kind: 4,
            name: name.into(),
            value: itemid.into(),
        }
    }
}

/// Extract the first identifier from a `create`/`delete`/`update` result.
pub(crate) fn first_id(result: &Value, field: &str) -> Option<String> {
    let first = result.get(field)?.as_array()?.first()?;
    match first {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_methods() {
        assert_eq!(ObjectKind::WebScenario.method("get"), "httptest.get");
        assert_eq!(ObjectKind::HostGroup.ids_field(), "groupids");
        assert_eq!(ObjectKind::Template.key_field(), "host");
        assert_eq!(ObjectKind::Trigger.key_field(), "description");
        assert_eq!(ObjectKind::Dashboard.to_string(), "dashboard");
    }

    #[test]
    fn test_severity_serializes_as_ordinal() {
        let trigger = NewTrigger {
            description: "High CPU".into(),
            expression: "avg(/h/system.cpu.util,5m)>80".into(),
            priority: Severity::Warning,
            comments: String::new(),
        };
        let value = serde_json::to_value(&trigger).unwrap();
        assert_eq!(value["priority"], json!(2));
        assert_eq!(Severity::High.level(), 4);
    }

    #[test]
    fn test_agent_interface_payload() {
        let value = serde_json::to_value(NewInterface::agent("10.0.0.5")).unwrap();
        assert_eq!(value["type"], json!(1));
        assert_eq!(value["useip"], json!(1));
        assert_eq!(value["port"], json!("10050"));
        assert_eq!(value["dns"], json!(""));
    }

    #[test]
    fn test_host_decodes_string_fields() {
        let host: Host = serde_json::from_value(json!({
            "hostid": "10084",
            "host": "web1.internal",
            "name": "Web 1",
            "status": "0",
            "interfaces": [
                {"interfaceid": "2", "ip": "10.0.0.9", "port": "161", "type": "2", "main": "1"},
                {"interfaceid": "1", "ip": "10.0.0.5", "port": "10050", "type": "1", "main": "1"}
            ]
        }))
        .unwrap();
        assert!(host.is_enabled());
        assert_eq!(host.agent_interface().unwrap().interfaceid, "1");
    }

    #[test]
    fn test_first_id() {
        let result = json!({"hostids": ["10105"]});
        assert_eq!(first_id(&result, "hostids").as_deref(), Some("10105"));
        assert_eq!(first_id(&result, "groupids"), None);
        assert_eq!(first_id(&json!({"hostids": []}), "hostids"), None);
    }
}
