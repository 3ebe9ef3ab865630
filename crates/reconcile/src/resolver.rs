//! Existence lookups by natural key.
//!
//! Every create in a run is preceded by one [`ExistenceResolver::find`] on
//! the object's natural key. The lookup is a filtered `<kind>.get` asking only
//! for the identifier and the key field.

use serde_json::{Map, Value, json};
use zabbix::{Client, Error, ObjectKind, Result};

/// Read-only lookup of existing objects.
pub struct ExistenceResolver<'a> {
    client: &'a Client,
}

impl<'a> ExistenceResolver<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Identifier of the object of `kind` whose natural key is `key`.
    ///
    /// `scope` restricts the lookup to one host, for kinds whose key is only
    /// unique per host (triggers, web scenarios, items). When several objects
    /// match, the first one returned by the server wins. Keys are always
    /// compared exactly: `system.cpu.util` must not bind
    /// `system.cpu.util[,guest]`.
    pub fn find(&self, kind: ObjectKind, key: &str, scope: Option<&str>) -> Result<Option<String>> {
        let params = lookup_params(kind, key, scope);
        let records = self.client.get(kind, params)?;

        let method = kind.method("get");
        let mut ids = Vec::with_capacity(records.len());
        for record in &records {
            match record.get(kind.id_field()).and_then(Value::as_str) {
                Some(id) => ids.push(id.to_string()),
                None => {
                    return Err(Error::decode(
                        &method,
                        format!("{kind} record without {}", kind.id_field()),
                    ));
                }
            }
        }

        if ids.len() > 1 {
            log::debug!(
                "{} {kind} objects match '{key}', using {}",
                ids.len(),
                ids[0]
            );
        }

        Ok(ids.into_iter().next())
    }
}

/// Build the `<kind>.get` parameters for one lookup.
fn lookup_params(kind: ObjectKind, key: &str, scope: Option<&str>) -> Value {
    let mut params = Map::new();
    params.insert(
        "output".into(),
        json!([kind.id_field(), kind.key_field()]),
    );

    params.insert("filter".into(), json!({ kind.key_field(): key }));

    if let Some(hostid) = scope {
        params.insert("hostids".into(), json!(hostid));
    }

    Value::Object(params)
}
