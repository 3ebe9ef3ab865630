//! Transport backends for the JSON-RPC client.
//!
//! This module provides the [`Backend`] trait, the seam between the typed
//! [`Client`](crate::Client) and the wire. [`http::HttpBackend`] talks to a
//! real server; [`MockBackend`] keeps an in-memory inventory for tests.
//!
//! # Testing
//!
//! ```
//! use zabbix::{Client, MockBackend};
//!
//! let mock = MockBackend::new();
//! mock.add_template("Linux by Zabbix agent", &["system.cpu.util"]);
//!
//! let mut client = Client::with_backend(Box::new(mock.clone()));
//! client.login("Admin", "zabbix").unwrap();
//! assert_eq!(mock.call_count("user.login"), 1);
//! ```

pub mod http;
pub mod mock;

pub use mock::MockBackend;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A JSON-RPC 2.0 request envelope.
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    pub jsonrpc: &'static str,
    pub method: String,
    pub params: Value,
    pub id: u64,
    /// Session token sent in the body (pre-7.2 servers).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
    /// Session token sent as an `Authorization: Bearer` header.
    #[serde(skip)]
    pub bearer: Option<String>,
}

impl Request {
    /// Whether the request carries a session token in either position.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.auth.is_some() || self.bearer.is_some()
    }
}

/// A JSON-RPC 2.0 response envelope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcError>,
    #[serde(default)]
    pub id: Option<Value>,
}

/// The `error` member of a failed response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RpcError {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: String,
}

/// Backend trait for delivering requests.
///
/// Implementations must surface connection problems, timeouts and non-2xx
/// statuses as [`Error::Transport`](crate::Error::Transport) and undecodable
/// bodies as [`Error::Decode`](crate::Error::Decode). Application errors are
/// returned inside the [`Response`].
pub trait Backend: Send + Sync {
    /// Send one request and return the decoded envelope.
    fn send(&self, request: &Request) -> Result<Response>;
}
