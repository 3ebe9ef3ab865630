//! Error types for reconciliation runs.

use zabbix::ObjectKind;

/// Result type alias for reconciliation.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal reconciliation errors.
///
/// Anything returned as an `Error` aborts the run. Recoverable failures
/// (trigger creation) are recorded in the [`RunReport`](crate::RunReport)
/// instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Login was rejected or the server could not be reached for it.
    #[error("could not log in to the Zabbix API")]
    Authentication(#[source] zabbix::Error),

    /// A mandatory object the run depends on does not exist.
    #[error("required {kind} '{key}' does not exist")]
    PreconditionMissing {
        /// Object kind.
        kind: ObjectKind,
        /// Natural key that was looked up.
        key: String,
    },

    /// A remote call failed in a phase where failures are fatal.
    #[error("failed to {action} {kind} '{key}'")]
    Remote {
        /// What was being attempted ("look up", "create", ...).
        action: &'static str,
        /// Object kind.
        kind: ObjectKind,
        /// Natural key of the object.
        key: String,
        /// Underlying API error.
        #[source]
        source: zabbix::Error,
    },

    /// The desired state is unusable.
    #[error("invalid desired state: {0}")]
    Invalid(String),
}

impl Error {
    pub(crate) fn remote(
        action: &'static str,
        kind: ObjectKind,
        key: impl Into<String>,
        source: zabbix::Error,
    ) -> Self {
        Self::Remote {
            action,
            kind,
            key: key.into(),
            source,
        }
    }

    /// The API error behind this failure, if any.
    #[must_use]
    pub fn api_error(&self) -> Option<&zabbix::Error> {
        match self {
            Error::Authentication(source) | Error::Remote { source, .. } => Some(source),
            Error::PreconditionMissing { .. } | Error::Invalid(_) => None,
        }
    }
}
