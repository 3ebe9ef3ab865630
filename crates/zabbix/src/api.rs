//! Typed helpers over [`Client::call`].

use crate::error::{Error, Result};
use crate::types::{Host, ObjectKind, first_id};
use crate::Client;
use serde::Serialize;
use serde_json::{Value, json};

impl Client {
    /// `<kind>.get` returning the raw records.
    pub fn get(&self, kind: ObjectKind, params: Value) -> Result<Vec<Value>> {
        self.call(&kind.method("get"), params)
    }

    /// `<kind>.create` returning the new identifier.
    pub fn create<P: Serialize>(&self, kind: ObjectKind, params: &P) -> Result<String> {
        let method = kind.method("create");
        let params = serde_json::to_value(params).map_err(|e| Error::decode(&method, e.to_string()))?;
        let result = self.call_value(&method, params)?;
        first_id(&result, &kind.ids_field())
            .ok_or_else(|| Error::decode(&method, format!("result has no {}", kind.ids_field())))
    }

    /// `<kind>.delete` for the given identifiers.
    pub fn delete(&self, kind: ObjectKind, ids: &[String]) -> Result<()> {
        self.call_value(&kind.method("delete"), json!(ids))?;
        Ok(())
    }

    /// Replace the templates linked to a host.
    ///
    /// Templates not listed are unlinked; their items stay on the host.
    pub fn update_host_templates(&self, hostid: &str, template_ids: &[String]) -> Result<()> {
        let templates: Vec<Value> = template_ids
            .iter()
            .map(|id| json!({ "templateid": id }))
            .collect();
        self.call_value(
            "host.update",
            json!({ "hostid": hostid, "templates": templates }),
        )?;
        Ok(())
    }

    /// All hosts with their interfaces.
    pub fn hosts(&self) -> Result<Vec<Host>> {
        self.call(
            "host.get",
            json!({
                "output": ["hostid", "host", "name", "status"],
                "selectInterfaces": ["interfaceid", "ip", "port", "type", "main"]
            }),
        )
    }

    /// Change the address of one interface.
    pub fn update_interface_address(&self, interfaceid: &str, ip: &str) -> Result<()> {
        self.call_value(
            "hostinterface.update",
            json!({ "interfaceid": interfaceid, "ip": ip }),
        )?;
        Ok(())
    }
}
