//! Error types for Zabbix API calls.
//!
//! Every failure is tagged with the remote method that produced it so callers
//! can log enough context to retry the operation by hand.

use std::fmt;

/// Result type alias for Zabbix API operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad categories of API failures, used for user-facing feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Connection refused, timeout, or a non-2xx HTTP status.
    Transport,
    /// The server answered with a JSON-RPC error object.
    Application,
    /// Login was rejected or returned no session.
    Authentication,
    /// The response did not have the expected shape.
    Decode,
    /// The client was used incorrectly (no session, bad URL).
    Usage,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Transport => "Could not reach the Zabbix API",
            Self::Application => "The Zabbix API rejected the request",
            Self::Authentication => "Authentication failed",
            Self::Decode => "Unexpected response from the Zabbix API",
            Self::Usage => "Invalid client usage",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Transport => "Check the server URL, network path and that the frontend is up",
            Self::Application => "Inspect the error data; the object may be invalid or duplicated",
            Self::Authentication => "Verify the username and password",
            Self::Decode => "Check that the URL points at api_jsonrpc.php of a supported version",
            Self::Usage => "Log in before issuing authenticated calls",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while talking to the Zabbix API.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP-level failure: connection, timeout or non-2xx status.
    #[error("{method}: HTTP request failed: {message}")]
    Transport {
        /// Remote method being called.
        method: String,
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },

    /// The decoded response carried an `error` object.
    #[error("{method}: API error {code}: {message} {data}")]
    Api {
        /// Remote method being called.
        method: String,
        /// JSON-RPC error code.
        code: i64,
        /// Short error message.
        message: String,
        /// Detailed error data.
        data: String,
    },

    /// The response body or result did not match the expected shape.
    #[error("{method}: unexpected response: {message}")]
    Decode {
        /// Remote method being called.
        method: String,
        /// What was wrong with the payload.
        message: String,
    },

    /// Login failed.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// An authenticated method was called without a session.
    #[error("{method}: not authenticated, call login first")]
    NotAuthenticated {
        /// Remote method being called.
        method: String,
    },

    /// The server URL could not be used.
    #[error("invalid server URL: {0}")]
    InvalidUrl(String),
}

impl Error {
    /// Create a transport error.
    pub fn transport(method: impl Into<String>, message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Transport {
            method: method.into(),
            message: message.into(),
            status,
        }
    }

    /// Create a decode error.
    pub fn decode(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            method: method.into(),
            message: message.into(),
        }
    }

    /// Wrap a ureq failure for the given method.
    pub fn from_ureq(method: &str, err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::transport(method, format!("HTTP {code}"), Some(code)),
            ureq::Error::Json(e) => Self::decode(method, e.to_string()),
            other => Self::transport(method, other.to_string(), None),
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Transport { .. } => ErrorCategory::Transport,
            Error::Api { .. } => ErrorCategory::Application,
            Error::Decode { .. } => ErrorCategory::Decode,
            Error::Authentication(_) => ErrorCategory::Authentication,
            Error::NotAuthenticated { .. } | Error::InvalidUrl(_) => ErrorCategory::Usage,
        }
    }

    /// The remote method this error relates to, if any.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        match self {
            Error::Transport { method, .. }
            | Error::Api { method, .. }
            | Error::Decode { method, .. }
            | Error::NotAuthenticated { method } => Some(method),
            Error::Authentication(_) | Error::InvalidUrl(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(
            Error::transport("host.get", "timed out", None).category(),
            ErrorCategory::Transport
        );
        assert_eq!(
            Error::decode("host.get", "missing hostid").category(),
            ErrorCategory::Decode
        );
        assert_eq!(
            Error::Authentication("bad password".into()).category(),
            ErrorCategory::Authentication
        );
        assert_eq!(
            Error::NotAuthenticated {
                method: "host.get".into()
            }
            .category(),
            ErrorCategory::Usage
        );
    }

    #[test]
    fn test_api_error_display_includes_method_and_data() {
        let err = Error::Api {
            method: "trigger.create".into(),
            code: -32602,
            message: "Invalid params.".into(),
            data: "Trigger already exists.".into(),
        };
        let display = err.to_string();
        assert!(display.contains("trigger.create"));
        assert!(display.contains("-32602"));
        assert!(display.contains("Trigger already exists."));
        assert_eq!(err.method(), Some("trigger.create"));
    }

    #[test]
    fn test_category_text_not_empty() {
        for category in [
            ErrorCategory::Transport,
            ErrorCategory::Application,
            ErrorCategory::Authentication,
            ErrorCategory::Decode,
            ErrorCategory::Usage,
        ] {
            assert!(!category.description().is_empty());
            assert!(!category.advice().is_empty());
        }
    }

    #[test]
    fn test_status_code_is_kept() {
        let err = Error::from_ureq("user.login", ureq::Error::StatusCode(502));
        match err {
            Error::Transport { status, .. } => assert_eq!(status, Some(502)),
            other => panic!("Expected Error::Transport, got {other:?}"),
        }
    }
}
