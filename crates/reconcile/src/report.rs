//! Run report: per-kind counters, failures and warnings.

use crate::types::Outcome;
use serde::Serialize;
use zabbix::ObjectKind;

/// Outcome counts for one object kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    pub created: usize,
    pub updated: usize,
    pub replaced: usize,
    pub skipped: usize,
    pub planned: usize,
    pub failed: usize,
}

impl Counters {
    /// Add an outcome to the counters
    pub fn add(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Created => self.created += 1,
            Outcome::Updated => self.updated += 1,
            Outcome::Replaced => self.replaced += 1,
            Outcome::Skipped { .. } => self.skipped += 1,
            Outcome::Planned { .. } => self.planned += 1,
            Outcome::Failed { .. } => self.failed += 1,
        }
    }

    /// Total number of objects counted
    pub fn total(&self) -> usize {
        self.created + self.updated + self.replaced + self.skipped + self.planned + self.failed
    }

    /// Non-zero counts as "3 created, 1 skipped".
    fn describe(&self) -> String {
        [
            (self.created, "created"),
            (self.updated, "updated"),
            (self.replaced, "replaced"),
            (self.skipped, "unchanged"),
            (self.planned, "planned"),
            (self.failed, "failed"),
        ]
        .iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, label)| format!("{n} {label}"))
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// A recovered failure, with enough context to retry by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub kind: ObjectKind,
    pub key: String,
    pub error: String,
}

/// Everything a run did, printed once at the end.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub dry_run: bool,
    pub host_groups: Counters,
    pub hosts: Counters,
    pub web_scenarios: Counters,
    pub triggers: Counters,
    pub dashboards: Counters,
    pub failures: Vec<Failure>,
    pub warnings: Vec<String>,
}

impl RunReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    /// Record the outcome for one object.
    ///
    /// Kinds that are only looked up (templates, items) are not counted.
    pub fn record(&mut self, kind: ObjectKind, key: &str, outcome: &Outcome) {
        if let Outcome::Failed { error } = outcome {
            self.failures.push(Failure {
                kind,
                key: key.to_string(),
                error: error.clone(),
            });
        }
        if let Some(counters) = self.counters_mut(kind) {
            counters.add(outcome);
        }
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    fn counters_mut(&mut self, kind: ObjectKind) -> Option<&mut Counters> {
        match kind {
            ObjectKind::HostGroup => Some(&mut self.host_groups),
            ObjectKind::Host => Some(&mut self.hosts),
            ObjectKind::WebScenario => Some(&mut self.web_scenarios),
            ObjectKind::Trigger => Some(&mut self.triggers),
            ObjectKind::Dashboard => Some(&mut self.dashboards),
            ObjectKind::Template | ObjectKind::Item => None,
        }
    }

    fn sections(&self) -> [(&'static str, &Counters); 5] {
        [
            ("Host groups", &self.host_groups),
            ("Hosts", &self.hosts),
            ("Web scenarios", &self.web_scenarios),
            ("Triggers", &self.triggers),
            ("Dashboards", &self.dashboards),
        ]
    }

    /// Objects created, updated or replaced
    pub fn total_changes(&self) -> usize {
        self.sections()
            .iter()
            .map(|(_, c)| c.created + c.updated + c.replaced)
            .sum()
    }

    pub fn total_created(&self) -> usize {
        self.sections().iter().map(|(_, c)| c.created).sum()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Summary in fixed order: one line per kind, then warnings and failures.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .sections()
            .iter()
            .filter(|(_, c)| c.total() > 0)
            .map(|(label, c)| format!("{label}: {}", c.describe()))
            .collect();

        if lines.is_empty() {
            lines.push("Nothing to reconcile".to_string());
        }
        if !self.warnings.is_empty() {
            lines.push(format!("Warnings: {}", self.warnings.len()));
        }
        if !self.failures.is_empty() {
            lines.push(format!("Failures: {}", self.failures.len()));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Change;

    #[test]
    fn test_record_counts_by_kind() {
        let mut report = RunReport::new(false);
        report.record(ObjectKind::Host, "web1", &Outcome::Created);
        report.record(ObjectKind::Host, "web2", &Outcome::Updated);
        report.record(ObjectKind::Trigger, "t", &Outcome::exists());
        report.record(ObjectKind::Template, "Linux", &Outcome::exists());

        assert_eq!(report.hosts.created, 1);
        assert_eq!(report.hosts.updated, 1);
        assert_eq!(report.triggers.skipped, 1);
        assert_eq!(report.total_changes(), 2);
        assert_eq!(report.total_created(), 1);
        let counted: usize = report.sections().iter().map(|(_, c)| c.total()).sum();
        assert_eq!(counted, 3);
    }

    #[test]
    fn test_failures_are_listed() {
        let mut report = RunReport::new(false);
        report.record(
            ObjectKind::Trigger,
            "High CPU usage on web1",
            &Outcome::Failed {
                error: "boom".into(),
            },
        );
        assert!(report.has_failures());
        assert_eq!(report.failures[0].key, "High CPU usage on web1");
        assert_eq!(report.triggers.failed, 1);
    }

    #[test]
    fn test_summary_order() {
        let mut report = RunReport::new(true);
        report.record(
            ObjectKind::Dashboard,
            "D",
            &Outcome::Planned {
                change: Change::Create,
            },
        );
        report.record(ObjectKind::HostGroup, "G", &Outcome::Created);
        report.warn("template 'Nginx' not found");

        assert_eq!(
            report.summary_lines(),
            vec![
                "Host groups: 1 created",
                "Dashboards: 1 planned",
                "Warnings: 1",
            ]
        );
    }

    #[test]
    fn test_empty_summary() {
        assert_eq!(
            RunReport::default().summary_lines(),
            vec!["Nothing to reconcile"]
        );
    }

    #[test]
    fn test_serializes() {
        let mut report = RunReport::new(false);
        report.record(ObjectKind::Host, "web1", &Outcome::Created);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["hosts"]["created"], 1);
        assert_eq!(value["dry_run"], false);
    }
}
