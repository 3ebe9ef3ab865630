//! # zabbix
//!
//! Minimal typed client for the Zabbix JSON-RPC API.
//!
//! This crate provides:
//! - A session-holding [`Client`] that authenticates once and attaches the
//!   token to every later call
//! - Typed creation payloads and read records for the objects a monitoring
//!   setup touches (host groups, templates, hosts, items, triggers, web
//!   scenarios, dashboards)
//! - A pluggable [`Backend`] with an HTTP implementation and an in-memory
//!   [`MockBackend`] for tests
//!
//! ## Example
//!
//! ```no_run
//! use std::time::Duration;
//! use zabbix::{Client, ObjectKind};
//! use serde_json::json;
//!
//! let mut client = Client::new("http://zabbix.local", Duration::from_secs(10))
//!     .expect("valid URL");
//! client.login("Admin", "zabbix").expect("login failed");
//!
//! let groups = client
//!     .get(ObjectKind::HostGroup, json!({"output": ["groupid", "name"]}))
//!     .expect("host groups");
//! println!("{} host groups", groups.len());
//! ```
//!
//! There are no retries. A call either returns the decoded `result` or fails
//! with an [`Error`] naming the method.

#![warn(clippy::all)]

mod api;
pub mod backend;
pub mod error;
pub mod types;

pub use backend::{Backend, MockBackend, Request, Response, RpcError};
pub use error::{Error, ErrorCategory, Result};
pub use types::{
    AGENT_PORT, DashboardPage, GroupRef, Host, HostInterface, NewDashboard, NewHost,
    NewInterface, NewTrigger, NewWebScenario, ObjectKind, Severity, TemplateRef, WebStep,
    Widget, WidgetField,
};

use backend::http::HttpBackend;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Methods that are never sent with a session token.
const ANONYMOUS_METHODS: [&str; 2] = ["user.login", "apiinfo.version"];

/// Where the session token travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// In the `auth` member of the request body.
    #[default]
    Field,
    /// In an `Authorization: Bearer` header (Zabbix 7.2 and later).
    Bearer,
}

/// Session-holding client for the Zabbix API.
///
/// The token obtained by [`Client::login`] is reused for the life of the
/// client. It is never refreshed; an expired session surfaces as an ordinary
/// [`Error::Api`].
pub struct Client {
    backend: Box<dyn Backend>,
    auth_mode: AuthMode,
    session: Option<String>,
    next_id: AtomicU64,
}

impl Client {
    /// Create a client for a frontend URL using the HTTP backend.
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self::with_backend(Box::new(HttpBackend::new(url, timeout)?)))
    }

    /// Create a client with a custom backend (useful for testing).
    #[must_use]
    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        Self {
            backend,
            auth_mode: AuthMode::default(),
            session: None,
            next_id: AtomicU64::new(1),
        }
    }

    /// Choose how the session token is attached.
    #[must_use]
    pub fn with_auth_mode(mut self, auth_mode: AuthMode) -> Self {
        self.auth_mode = auth_mode;
        self
    }

    /// Whether [`Client::login`] has succeeded.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Authenticate and keep the session token.
    pub fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let params = json!({ "username": username, "password": password });
        let token = match self.call_value("user.login", params) {
            Ok(value) => value,
            Err(Error::Api { message, data, .. }) => {
                return Err(Error::Authentication(format!("{message} {data}").trim().to_string()));
            }
            Err(e) => return Err(e),
        };

        match token {
            Value::String(token) if !token.is_empty() => {
                log::debug!("Authenticated as {username}");
                self.session = Some(token);
                Ok(())
            }
            other => Err(Error::Authentication(format!(
                "user.login returned no session token: {other}"
            ))),
        }
    }

    /// Server API version. Does not require a session.
    pub fn api_version(&self) -> Result<String> {
        self.call("apiinfo.version", json!([]))
    }

    // =========================================================================
    // Raw calls
    // =========================================================================

    /// Call a method and decode its `result`.
    pub fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let value = self.call_value(method, params)?;
        serde_json::from_value(value).map_err(|e| Error::decode(method, e.to_string()))
    }

    /// Call a method and return its raw `result`.
    pub fn call_value(&self, method: &str, params: Value) -> Result<Value> {
        let anonymous = ANONYMOUS_METHODS.contains(&method);
        let token = if anonymous {
            None
        } else {
            Some(self.session.clone().ok_or_else(|| Error::NotAuthenticated {
                method: method.to_string(),
            })?)
        };

        let (auth, bearer) = match self.auth_mode {
            AuthMode::Field => (token, None),
            AuthMode::Bearer => (None, token),
        };

        let request = Request {
            jsonrpc: "2.0",
            method: method.to_string(),
            params,
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            auth,
            bearer,
        };

        log::debug!("-> {method} (id {})", request.id);
        if !anonymous {
            log::trace!("   params: {}", request.params);
        }

        let response = self.backend.send(&request)?;

        if let Some(error) = response.error {
            log::debug!("<- {method}: error {} {}", error.code, error.data);
            return Err(Error::Api {
                method: method.to_string(),
                code: error.code,
                message: error.message,
                data: error.data,
            });
        }

        let result = response
            .result
            .ok_or_else(|| Error::decode(method, "response has neither result nor error"))?;
        log::trace!("<- {method}: {result}");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logged_in(mock: &MockBackend) -> Client {
        let mut client = Client::with_backend(Box::new(mock.clone()));
        client.login("Admin", "zabbix").unwrap();
        client
    }

    #[test]
    fn test_login_stores_session() {
        let mock = MockBackend::new();
        let client = logged_in(&mock);
        assert!(client.is_authenticated());
        assert_eq!(mock.calls(), vec!["user.login"]);
    }

    #[test]
    fn test_login_rejected() {
        let mock = MockBackend::new().with_credentials("Admin", "s3cret");
        let mut client = Client::with_backend(Box::new(mock));

        let err = client.login("Admin", "zabbix").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Authentication);
        assert!(err.to_string().contains("Incorrect user name"));
        assert!(!client.is_authenticated());
    }

    #[test]
    fn test_call_before_login_is_refused_locally() {
        let mock = MockBackend::new();
        let client = Client::with_backend(Box::new(mock.clone()));

        let err = client.call_value("host.get", json!({})).unwrap_err();
        assert!(matches!(err, Error::NotAuthenticated { .. }));
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_api_version_needs_no_session() {
        let mock = MockBackend::new();
        let client = Client::with_backend(Box::new(mock));
        assert_eq!(client.api_version().unwrap(), "7.0.0");
    }

    #[test]
    fn test_api_error_is_mapped() {
        let mock = MockBackend::new();
        mock.add_host_group("Linux servers");
        let client = logged_in(&mock);

        let err = client
            .call_value("hostgroup.create", json!({"name": "Linux servers"}))
            .unwrap_err();
        match err {
            Error::Api { method, code, data, .. } => {
                assert_eq!(method, "hostgroup.create");
                assert_eq!(code, -32602);
                assert!(data.contains("already exists"));
            }
            other => panic!("Expected Error::Api, got {other:?}"),
        }
    }

    #[test]
    fn test_bearer_mode_still_authenticates() {
        let mock = MockBackend::new();
        let mut client =
            Client::with_backend(Box::new(mock.clone())).with_auth_mode(AuthMode::Bearer);
        client.login("Admin", "zabbix").unwrap();

        let groups: Vec<Value> = client.call("hostgroup.get", json!({})).unwrap();
        assert!(groups.is_empty());
    }

    #[test]
    fn test_decode_mismatch_fails_closed() {
        let mock = MockBackend::new();
        let client = logged_in(&mock);

        let err = client
            .call::<String>("hostgroup.get", json!({}))
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Decode);
    }
}
