//! In-memory backend for tests.
//!
//! [`MockBackend`] behaves like a small Zabbix server: it keeps objects per
//! API kind, answers `get` with `filter`/`search`/`hostids`, assigns ids on
//! `create`, and rejects duplicate natural keys the way the real server does.
//! Templates can carry item keys; linking a template to a host creates those
//! items on the host.

use crate::backend::{Backend, Request, Response, RpcError};
use crate::error::{Error, Result};
use crate::types::ObjectKind;
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Record = Map<String, Value>;
type Reply = std::result::Result<Value, RpcError>;

const SESSION_TOKEN: &str = "0424bd59b807674191e7d77572075f33";

const ALL_KINDS: [ObjectKind; 7] = [
    ObjectKind::HostGroup,
    ObjectKind::Template,
    ObjectKind::Host,
    ObjectKind::Item,
    ObjectKind::Trigger,
    ObjectKind::WebScenario,
    ObjectKind::Dashboard,
];

/// Mock backend for testing without network access.
///
/// Clones share state, so a test can hand one clone to a
/// [`Client`](crate::Client) and inspect the other afterwards.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<State>>,
}

#[derive(Debug)]
struct State {
    next_id: u64,
    objects: HashMap<&'static str, Vec<Record>>,
    calls: Vec<String>,
    failures: Vec<(String, String)>,
    timeouts: Vec<(String, String)>,
    username: String,
    password: String,
}

impl Default for State {
    fn default() -> Self {
        Self {
            next_id: 10100,
            objects: HashMap::new(),
            calls: Vec::new(),
            failures: Vec::new(),
            timeouts: Vec::new(),
            username: "Admin".to_string(),
            password: "zabbix".to_string(),
        }
    }
}

impl MockBackend {
    /// Create an empty mock accepting `Admin`/`zabbix`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Change the accepted credentials.
    #[must_use]
    pub fn with_credentials(self, username: &str, password: &str) -> Self {
        {
            let mut state = self.lock();
            state.username = username.to_string();
            state.password = password.to_string();
        }
        self
    }

    /// Add a template whose linked hosts receive the given item keys.
    pub fn add_template(&self, name: &str, item_keys: &[&str]) -> String {
        let mut record = Record::new();
        record.insert("host".into(), json!(name));
        record.insert("name".into(), json!(name));
        record.insert("items".into(), json!(item_keys));
        self.lock().insert(ObjectKind::Template, record)
    }

    /// Add a host group.
    pub fn add_host_group(&self, name: &str) -> String {
        let mut record = Record::new();
        record.insert("name".into(), json!(name));
        self.lock().insert(ObjectKind::HostGroup, record)
    }

    /// Add a monitored host with one main agent interface.
    pub fn add_host(&self, hostname: &str, ip: &str) -> String {
        let mut state = self.lock();
        let interfaceid = state.allocate_id();
        let mut record = Record::new();
        record.insert("host".into(), json!(hostname));
        record.insert("name".into(), json!(hostname));
        record.insert("status".into(), json!("0"));
        record.insert("templates".into(), json!([]));
        record.insert(
            "interfaces".into(),
            json!([{
                "interfaceid": interfaceid,
                "ip": ip,
                "port": "10050",
                "type": "1",
                "main": "1"
            }]),
        );
        state.insert(ObjectKind::Host, record)
    }

    /// Add a dashboard.
    pub fn add_dashboard(&self, name: &str) -> String {
        let mut record = Record::new();
        record.insert("name".into(), json!(name));
        record.insert("pages".into(), json!([]));
        self.lock().insert(ObjectKind::Dashboard, record)
    }

    /// Fail calls to `method` whose serialized params contain `needle`.
    pub fn fail_when(&self, method: &str, needle: &str) {
        self.lock()
            .failures
            .push((method.to_string(), needle.to_string()));
    }

    /// Time out calls to `method` whose serialized params contain `needle`.
    ///
    /// The call is recorded but never reaches the server state, so `send`
    /// returns [`Error::Transport`] as a real timeout would.
    pub fn fail_transport_when(&self, method: &str, needle: &str) {
        self.lock()
            .timeouts
            .push((method.to_string(), needle.to_string()));
    }

    /// Every method called so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Number of calls to `method`.
    #[must_use]
    pub fn call_count(&self, method: &str) -> usize {
        self.lock().calls.iter().filter(|m| *m == method).count()
    }

    /// Snapshot of all stored objects of a kind.
    #[must_use]
    pub fn records(&self, kind: ObjectKind) -> Vec<Record> {
        self.lock()
            .objects
            .get(kind.api_object())
            .cloned()
            .unwrap_or_default()
    }

    /// Number of stored objects of a kind.
    #[must_use]
    pub fn count(&self, kind: ObjectKind) -> usize {
        self.records(kind).len()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Backend for MockBackend {
    fn send(&self, request: &Request) -> Result<Response> {
        let mut state = self.lock();
        state.calls.push(request.method.clone());

        if matches_any(&state.timeouts, request) {
            return Err(Error::transport(&request.method, "timed out reading response", None));
        }

        let reply = state.dispatch(request);
        let id = Some(json!(request.id));
        Ok(match reply {
            Ok(result) => Response {
                result: Some(result),
                error: None,
                id,
            },
            Err(error) => Response {
                result: None,
                error: Some(error),
                id,
            },
        })
    }
}

impl State {
    fn dispatch(&mut self, request: &Request) -> Reply {
        let method = request.method.as_str();
        let params = &request.params;

        if matches_any(&self.failures, request) {
            return Err(rpc_error(
                -32500,
                "Application error.",
                format!("Injected failure for {method}."),
            ));
        }

        match method {
            "apiinfo.version" => return Ok(json!("7.0.0")),
            "user.login" => return self.login(params),
            _ => {}
        }

        if !request.is_authenticated() {
            return Err(rpc_error(-32602, "Invalid params.", "Not authorized."));
        }

        if method == "hostinterface.update" {
            return self.update_interface(params);
        }

        let (object, operation) = method.split_once('.').ok_or_else(|| not_found(method))?;
        let kind = ALL_KINDS
            .into_iter()
            .find(|k| k.api_object() == object)
            .ok_or_else(|| not_found(method))?;

        match operation {
            "get" => Ok(self.select(kind, params)),
            "create" => self.create(kind, params),
            "update" if kind == ObjectKind::Host => self.update_host(params),
            "delete" => self.delete(kind, params),
            _ => Err(not_found(method)),
        }
    }

    fn login(&self, params: &Value) -> Reply {
        let username = str_field(params, "username").or_else(|| str_field(params, "user"));
        let password = str_field(params, "password");
        if username == Some(self.username.as_str()) && password == Some(self.password.as_str()) {
            Ok(json!(SESSION_TOKEN))
        } else {
            Err(rpc_error(
                -32602,
                "Invalid params.",
                "Incorrect user name or password or account is temporarily blocked.",
            ))
        }
    }

    fn allocate_id(&mut self) -> String {
        let id = self.next_id;
        self.next_id += 1;
        id.to_string()
    }

    fn insert(&mut self, kind: ObjectKind, mut record: Record) -> String {
        let id = self.allocate_id();
        record.insert(kind.id_field().into(), json!(id));
        self.objects
            .entry(kind.api_object())
            .or_default()
            .push(record);
        id
    }

    fn all(&self, kind: ObjectKind) -> &[Record] {
        self.objects
            .get(kind.api_object())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn find(&self, kind: ObjectKind, field: &str, value: &str) -> Option<&Record> {
        self.all(kind)
            .iter()
            .find(|r| r.get(field).and_then(Value::as_str) == Some(value))
    }

    fn select(&self, kind: ObjectKind, params: &Value) -> Value {
        let filter = params.get("filter").and_then(Value::as_object);
        let search = params.get("search").and_then(Value::as_object);
        let scope = params.get("hostids").map(string_set);

        let matches: Vec<Value> = self
            .all(kind)
            .iter()
            .filter(|record| {
                filter.is_none_or(|f| {
                    f.iter().all(|(field, wanted)| {
                        let have = record.get(field).and_then(Value::as_str).unwrap_or_default();
                        string_set(wanted).iter().any(|w| w == have)
                    })
                })
            })
            .filter(|record| {
                search.is_none_or(|s| {
                    s.iter().all(|(field, needle)| {
                        let have = record.get(field).and_then(Value::as_str).unwrap_or_default();
                        have.contains(needle.as_str().unwrap_or_default())
                    })
                })
            })
            .filter(|record| {
                scope.as_ref().is_none_or(|ids| {
                    let have = record.get("hostid").and_then(Value::as_str).unwrap_or_default();
                    ids.iter().any(|id| id == have)
                })
            })
            .cloned()
            .map(Value::Object)
            .collect();

        Value::Array(matches)
    }

    fn create(&mut self, kind: ObjectKind, params: &Value) -> Reply {
        let Some(mut record) = params.as_object().cloned() else {
            return Err(invalid("Invalid parameter \"/\": an array or object is expected."));
        };

        match kind {
            ObjectKind::HostGroup | ObjectKind::Dashboard => {
                let name = str_field(params, "name").unwrap_or_default();
                if name.is_empty() {
                    return Err(invalid("Invalid parameter \"/1/name\": cannot be empty."));
                }
                if self.find(kind, "name", name).is_some() {
                    return Err(invalid(format!("{} \"{name}\" already exists.", capitalize(kind.label()))));
                }
            }
            ObjectKind::Host => return self.create_host(record),
            ObjectKind::Trigger => {
                let description = str_field(params, "description").unwrap_or_default().to_string();
                let expression = str_field(params, "expression").unwrap_or_default();
                let Some(hostname) = expression_host(expression) else {
                    return Err(invalid(format!("Invalid parameter \"/1/expression\": incorrect trigger expression \"{expression}\".")));
                };
                let Some(hostid) = self
                    .find(ObjectKind::Host, "host", hostname)
                    .and_then(|h| h.get("hostid").and_then(Value::as_str))
                    .map(str::to_string)
                else {
                    return Err(invalid(format!("Incorrect trigger expression. Host \"{hostname}\" does not exist.")));
                };
                let duplicate = self.all(kind).iter().any(|t| {
                    t.get("hostid").and_then(Value::as_str) == Some(hostid.as_str())
                        && t.get("description").and_then(Value::as_str) == Some(description.as_str())
                });
                if duplicate {
                    return Err(invalid(format!("Trigger \"{description}\" already exists on \"{hostname}\".")));
                }
                record.insert("hostid".into(), json!(hostid));
            }
            ObjectKind::WebScenario => {
                let hostid = str_field(params, "hostid").unwrap_or_default();
                let name = str_field(params, "name").unwrap_or_default();
                if self.find(ObjectKind::Host, "hostid", hostid).is_none() {
                    return Err(invalid("No permissions to referred object or it does not exist!"));
                }
                let duplicate = self.all(kind).iter().any(|w| {
                    w.get("hostid").and_then(Value::as_str) == Some(hostid)
                        && w.get("name").and_then(Value::as_str) == Some(name)
                });
                if duplicate {
                    return Err(invalid(format!("Web scenario \"{name}\" already exists.")));
                }
            }
            ObjectKind::Template | ObjectKind::Item => {}
        }

        let id = self.insert(kind, record);
        Ok(json!({ kind.ids_field(): [id] }))
    }

    fn create_host(&mut self, mut record: Record) -> Reply {
        let hostname = record
            .get("host")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if hostname.is_empty() {
            return Err(invalid("Invalid parameter \"/1/host\": cannot be empty."));
        }
        if self.find(ObjectKind::Host, "host", &hostname).is_some() {
            return Err(invalid(format!("Host with the same name \"{hostname}\" already exists.")));
        }

        let template_ids = ref_ids(record.get("templates"), "templateid");
        if let Some(missing) = template_ids
            .iter()
            .find(|id| self.find(ObjectKind::Template, "templateid", id).is_none())
        {
            return Err(invalid(format!("Template with ID \"{missing}\" is not available.")));
        }

        let mut interfaces = Vec::new();
        for interface in record
            .get("interfaces")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
        {
            interfaces.push(json!({
                "interfaceid": self.allocate_id(),
                "ip": str_field(&interface, "ip").unwrap_or_default(),
                "port": scalar_string(interface.get("port")),
                "type": scalar_string(interface.get("type")),
                "main": scalar_string(interface.get("main")),
            }));
        }
        record.insert("interfaces".into(), Value::Array(interfaces));
        record.insert("status".into(), json!("0"));
        if !record.contains_key("name") {
            record.insert("name".into(), json!(hostname));
        }

        let hostid = self.insert(ObjectKind::Host, record);
        self.link_items(&hostid, &template_ids);
        Ok(json!({ "hostids": [hostid] }))
    }

    fn update_host(&mut self, params: &Value) -> Reply {
        let hostid = str_field(params, "hostid").unwrap_or_default().to_string();
        let template_ids = ref_ids(params.get("templates"), "templateid");

        let Some(host) = self
            .objects
            .get_mut(ObjectKind::Host.api_object())
            .and_then(|hosts| {
                hosts
                    .iter_mut()
                    .find(|h| h.get("hostid").and_then(Value::as_str) == Some(hostid.as_str()))
            })
        else {
            return Err(invalid("No permissions to referred object or it does not exist!"));
        };

        if let Some(templates) = params.get("templates") {
            host.insert("templates".into(), templates.clone());
        }

        self.link_items(&hostid, &template_ids);
        Ok(json!({ "hostids": [hostid] }))
    }

    fn update_interface(&mut self, params: &Value) -> Reply {
        let interfaceid = str_field(params, "interfaceid").unwrap_or_default().to_string();
        let ip = str_field(params, "ip").unwrap_or_default().to_string();

        let hosts = self
            .objects
            .entry(ObjectKind::Host.api_object())
            .or_default();
        for host in hosts.iter_mut() {
            if let Some(interfaces) = host.get_mut("interfaces").and_then(Value::as_array_mut) {
                for interface in interfaces.iter_mut() {
                    if str_field(interface, "interfaceid") == Some(interfaceid.as_str()) {
                        interface["ip"] = json!(ip);
                        return Ok(json!({ "interfaceids": [interfaceid] }));
                    }
                }
            }
        }
        Err(invalid("No permissions to referred object or it does not exist!"))
    }

    fn delete(&mut self, kind: ObjectKind, params: &Value) -> Reply {
        let ids = string_set(params);
        let field = kind.id_field();
        let records = self.objects.entry(kind.api_object()).or_default();

        let all_known = ids.iter().all(|id| {
            records
                .iter()
                .any(|r| r.get(field).and_then(Value::as_str) == Some(id.as_str()))
        });
        if ids.is_empty() || !all_known {
            return Err(invalid("No permissions to referred object or it does not exist!"));
        }

        records.retain(|r| {
            let id = r.get(field).and_then(Value::as_str).unwrap_or_default();
            !ids.iter().any(|wanted| wanted == id)
        });
        Ok(json!({ kind.ids_field(): ids }))
    }

    /// Create the items of each template on a host, skipping keys it has.
    fn link_items(&mut self, hostid: &str, template_ids: &[String]) {
        let keys: Vec<String> = template_ids
            .iter()
            .filter_map(|tid| self.find(ObjectKind::Template, "templateid", tid))
            .flat_map(|t| string_set(t.get("items").unwrap_or(&Value::Null)))
            .collect();

        for key in keys {
            let exists = self.all(ObjectKind::Item).iter().any(|i| {
                i.get("hostid").and_then(Value::as_str) == Some(hostid)
                    && i.get("key_").and_then(Value::as_str) == Some(key.as_str())
            });
            if exists {
                continue;
            }
            let mut item = Record::new();
            item.insert("hostid".into(), json!(hostid));
            item.insert("name".into(), json!(key));
            item.insert("key_".into(), json!(key));
            self.insert(ObjectKind::Item, item);
        }
    }
}

/// Host name referenced by an expression such as `avg(/web1/system.cpu.util,5m)>80`.
fn expression_host(expression: &str) -> Option<&str> {
    let start = expression.find("(/")? + 2;
    let rest = &expression[start..];
    let end = rest.find('/')?;
    Some(&rest[..end]).filter(|h| !h.is_empty())
}

fn str_field<'a>(value: &'a Value, field: &str) -> Option<&'a str> {
    value.get(field).and_then(Value::as_str)
}

fn scalar_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// A string or an array of strings, as accepted by `filter` and `hostids`.
fn string_set(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(|v| scalar_string(Some(v))).collect(),
        Value::Null => Vec::new(),
        other => vec![scalar_string(Some(other))],
    }
}

fn ref_ids(value: Option<&Value>, field: &str) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|refs| refs.iter().map(|r| scalar_string(r.get(field))).collect())
        .unwrap_or_default()
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn rpc_error(code: i64, message: &str, data: impl Into<String>) -> RpcError {
    RpcError {
        code,
        message: message.to_string(),
        data: data.into(),
    }
}

/// Whether any `(method, needle)` pair applies to the request.
fn matches_any(rules: &[(String, String)], request: &Request) -> bool {
    let serialized = request.params.to_string();
    rules
        .iter()
        .any(|(m, needle)| *m == request.method && serialized.contains(needle.as_str()))
}

fn invalid(data: impl Into<String>) -> RpcError {
    rpc_error(-32602, "Invalid params.", data)
}

fn not_found(method: &str) -> RpcError {
    rpc_error(-32601, "Method not found.", format!("Incorrect method \"{method}\"."))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: &str, params: Value) -> Request {
        Request {
            jsonrpc: "2.0",
            method: method.to_string(),
            params,
            id: 1,
            auth: Some(SESSION_TOKEN.to_string()),
            bearer: None,
        }
    }

    fn result(mock: &MockBackend, method: &str, params: Value) -> Value {
        let response = mock.send(&request(method, params)).unwrap();
        assert!(response.error.is_none(), "{method} failed: {:?}", response.error);
        response.result.unwrap()
    }

    #[test]
    fn test_expression_host() {
        assert_eq!(expression_host("avg(/web1/system.cpu.util,5m)>80"), Some("web1"));
        assert_eq!(expression_host("last(/db.internal/vfs.fs.size[/,pfree])<15"), Some("db.internal"));
        assert_eq!(expression_host("1=1"), None);
        assert_eq!(expression_host("last(//key)"), None);
    }

    #[test]
    fn test_host_create_links_template_items() {
        let mock = MockBackend::new();
        let tid = mock.add_template("Linux", &["system.cpu.util", "vfs.fs.size[/,pfree]"]);
        let gid = mock.add_host_group("G");

        let created = result(
            &mock,
            "host.create",
            json!({
                "host": "web1",
                "name": "Web 1",
                "interfaces": [{"type": 1, "main": 1, "useip": 1, "ip": "10.0.0.1", "dns": "", "port": "10050"}],
                "groups": [{"groupid": gid}],
                "templates": [{"templateid": tid}]
            }),
        );
        let hostid = created["hostids"][0].as_str().unwrap().to_string();

        let items = result(&mock, "item.get", json!({"hostids": hostid, "search": {"key_": "system.cpu"}}));
        assert_eq!(items.as_array().unwrap().len(), 1);
        assert_eq!(mock.count(ObjectKind::Item), 2);

        let hosts = result(&mock, "host.get", json!({"filter": {"host": "web1"}}));
        assert_eq!(hosts[0]["interfaces"][0]["type"], json!("1"));
    }

    #[test]
    fn test_duplicate_host_group_rejected() {
        let mock = MockBackend::new();
        mock.add_host_group("G");
        let response = mock
            .send(&request("hostgroup.create", json!({"name": "G"})))
            .unwrap();
        assert!(response.error.unwrap().data.contains("already exists"));
    }

    #[test]
    fn test_unauthenticated_call_rejected() {
        let mock = MockBackend::new();
        let mut req = request("host.get", json!({}));
        req.auth = None;
        assert!(mock.send(&req).unwrap().error.is_some());
    }

    #[test]
    fn test_fail_when_matches_params() {
        let mock = MockBackend::new();
        mock.fail_when("hostgroup.create", "Broken");
        let ok = mock.send(&request("hostgroup.create", json!({"name": "Fine"}))).unwrap();
        let failed = mock.send(&request("hostgroup.create", json!({"name": "Broken"}))).unwrap();
        assert!(ok.error.is_none());
        assert_eq!(failed.error.unwrap().code, -32500);
    }

    #[test]
    fn test_fail_transport_when_returns_transport_error() {
        let mock = MockBackend::new();
        mock.fail_transport_when("trigger.get", "High CPU usage on web1");

        let err = mock
            .send(&request("trigger.get", json!({"filter": {"description": "High CPU usage on web1"}})))
            .unwrap_err();
        match err {
            Error::Transport { method, status, .. } => {
                assert_eq!(method, "trigger.get");
                assert_eq!(status, None);
            }
            other => panic!("Expected Error::Transport, got {other:?}"),
        }

        let ok = mock
            .send(&request("trigger.get", json!({"filter": {"description": "Low disk space on web1"}})))
            .unwrap();
        assert!(ok.error.is_none());
        assert_eq!(mock.call_count("trigger.get"), 2);
    }

    #[test]
    fn test_delete_removes_records() {
        let mock = MockBackend::new();
        let id = mock.add_dashboard("Overview");
        result(&mock, "dashboard.delete", json!([id]));
        assert_eq!(mock.count(ObjectKind::Dashboard), 0);
    }

    #[test]
    fn test_calls_are_recorded() {
        let mock = MockBackend::new();
        result(&mock, "hostgroup.get", json!({"filter": {"name": "G"}}));
        result(&mock, "template.get", json!({"filter": {"host": "Linux"}}));
        assert_eq!(mock.calls(), vec!["hostgroup.get", "template.get"]);
        assert_eq!(mock.call_count("template.get"), 1);
    }
}
