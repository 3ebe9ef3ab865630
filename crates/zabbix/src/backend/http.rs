//! HTTP backend.
//!
//! Posts JSON-RPC envelopes to `<server>/api_jsonrpc.php` with a blocking
//! ureq agent. Every call is bounded by one global timeout; there are no
//! retries.

use crate::backend::{Backend, Request, Response};
use crate::error::{Error, Result};
use std::time::Duration;

/// Path of the JSON-RPC endpoint below the frontend root.
const ENDPOINT: &str = "api_jsonrpc.php";

/// Default per-call timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP backend.
pub struct HttpBackend {
    /// HTTP agent for requests.
    agent: ureq::Agent,
    /// Full endpoint URL.
    endpoint: String,
}

impl HttpBackend {
    /// Create a backend for a frontend root URL such as `http://zabbix.local`.
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let endpoint = endpoint_url(url)?;
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Ok(Self { agent, endpoint })
    }

    /// Get the endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Backend for HttpBackend {
    fn send(&self, request: &Request) -> Result<Response> {
        let mut builder = self.agent.post(&self.endpoint);
        if let Some(token) = &request.bearer {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }

        let mut response = builder
            .send_json(request)
            .map_err(|e| Error::from_ureq(&request.method, e))?;

        response
            .body_mut()
            .read_json::<Response>()
            .map_err(|e| Error::from_ureq(&request.method, e))
    }
}

/// Build the JSON-RPC endpoint from a frontend URL.
///
/// The `api_jsonrpc.php` suffix is appended unless already present.
pub fn endpoint_url(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::InvalidUrl("empty URL".to_string()));
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(Error::InvalidUrl(format!(
            "{trimmed} (expected an http:// or https:// URL)"
        )));
    }

    if trimmed.ends_with(ENDPOINT) {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{trimmed}/{ENDPOINT}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_appends_suffix() {
        assert_eq!(
            endpoint_url("http://zabbix.local").unwrap(),
            "http://zabbix.local/api_jsonrpc.php"
        );
        assert_eq!(
            endpoint_url("https://mon.example.com/zabbix/").unwrap(),
            "https://mon.example.com/zabbix/api_jsonrpc.php"
        );
    }

    #[test]
    fn test_endpoint_keeps_existing_suffix() {
        assert_eq!(
            endpoint_url("http://10.0.0.1/api_jsonrpc.php").unwrap(),
            "http://10.0.0.1/api_jsonrpc.php"
        );
    }

    #[test]
    fn test_endpoint_rejects_bad_urls() {
        assert!(endpoint_url("").is_err());
        assert!(endpoint_url("   ").is_err());
        assert!(endpoint_url("zabbix.local").is_err());
    }

    #[test]
    fn test_backend_keeps_endpoint() {
        let backend = HttpBackend::new("http://zabbix.local/", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(backend.endpoint(), "http://zabbix.local/api_jsonrpc.php");
    }
}
