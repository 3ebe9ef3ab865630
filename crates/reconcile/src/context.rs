//! Progress reporting hooks
//!
//! The engine never prints. Callers that want live feedback implement
//! [`ProgressCallback`]; everything else uses [`NoProgress`].

use crate::types::Outcome;
use serde::Serialize;
use std::fmt;
use zabbix::ObjectKind;

/// Steps of a reconciliation run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Authenticate,
    Templates,
    HostGroup,
    Hosts,
    WebScenario,
    Triggers,
    Dashboards,
}

impl Phase {
    /// Human-readable name
    pub fn label(&self) -> &'static str {
        match self {
            Self::Authenticate => "Authenticating",
            Self::Templates => "Resolving templates",
            Self::HostGroup => "Host group",
            Self::Hosts => "Hosts",
            Self::WebScenario => "Web scenario",
            Self::Triggers => "Triggers",
            Self::Dashboards => "Dashboards",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Progress callback for reconciliation runs
///
/// Implement this trait to receive progress updates during a run.
pub trait ProgressCallback {
    /// Called when a new phase starts
    fn on_phase(&mut self, phase: Phase);

    /// Called once per object after its outcome is known
    fn on_outcome(&mut self, kind: ObjectKind, key: &str, outcome: &Outcome);

    /// Called when a non-fatal problem is recorded
    fn on_warning(&mut self, message: &str);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_phase(&mut self, _phase: Phase) {}
    fn on_outcome(&mut self, _kind: ObjectKind, _key: &str, _outcome: &Outcome) {}
    fn on_warning(&mut self, _message: &str) {}
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Records every callback for assertions.
    #[derive(Default)]
    pub struct Recorder {
        pub phases: Vec<Phase>,
        pub outcomes: Vec<(ObjectKind, String, Outcome)>,
        pub warnings: Vec<String>,
    }

    impl ProgressCallback for Recorder {
        fn on_phase(&mut self, phase: Phase) {
            self.phases.push(phase);
        }

        fn on_outcome(&mut self, kind: ObjectKind, key: &str, outcome: &Outcome) {
            self.outcomes.push((kind, key.to_string(), outcome.clone()));
        }

        fn on_warning(&mut self, message: &str) {
            self.warnings.push(message.to_string());
        }
    }
}
