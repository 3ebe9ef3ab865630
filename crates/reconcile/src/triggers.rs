//! Fixed trigger set generated per host.
//!
//! Expressions embed the technical host name and are passed to the server
//! verbatim; their syntax is not checked here.

use crate::types::WebCheck;
use zabbix::{NewTrigger, Severity};

/// Average CPU utilization (percent) that raises a warning.
pub const CPU_THRESHOLD: u32 = 80;
/// Averaging window for the CPU trigger.
pub const CPU_WINDOW: &str = "5m";
/// Free space on `/` (percent) below which the disk trigger fires.
pub const DISK_FREE_MIN: u32 = 15;

/// CPU and disk triggers for one host.
pub fn host_triggers(hostname: &str) -> Vec<NewTrigger> {
    vec![
        NewTrigger {
            description: format!("High CPU usage on {hostname}"),
            expression: format!("avg(/{hostname}/system.cpu.util,{CPU_WINDOW})>{CPU_THRESHOLD}"),
            priority: Severity::Warning,
            comments: format!("CPU utilization above {CPU_THRESHOLD}% for {CPU_WINDOW}"),
        },
        NewTrigger {
            description: format!("Low disk space on {hostname}"),
            expression: format!("last(/{hostname}/vfs.fs.size[/,pfree])<{DISK_FREE_MIN}"),
            priority: Severity::Average,
            comments: format!("Less than {DISK_FREE_MIN}% free space on /"),
        },
    ]
}

/// Trigger raised when the web check on `hostname` fails.
///
/// Like the CPU and disk triggers, the description names the host.
pub fn availability_trigger(hostname: &str, check: &WebCheck) -> NewTrigger {
    NewTrigger {
        description: format!("{} on {hostname}", check.trigger),
        expression: format!("last(/{hostname}/web.test.fail[{}])>0", check.name),
        priority: Severity::High,
        comments: format!("Web scenario '{}' failed against {}", check.name, check.url),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_triggers() {
        let triggers = host_triggers("web1.internal");
        assert_eq!(triggers.len(), 2);

        assert_eq!(triggers[0].description, "High CPU usage on web1.internal");
        assert_eq!(
            triggers[0].expression,
            "avg(/web1.internal/system.cpu.util,5m)>80"
        );
        assert_eq!(triggers[0].priority, Severity::Warning);

        assert_eq!(triggers[1].description, "Low disk space on web1.internal");
        assert_eq!(
            triggers[1].expression,
            "last(/web1.internal/vfs.fs.size[/,pfree])<15"
        );
        assert_eq!(triggers[1].priority, Severity::Average);
    }

    #[test]
    fn test_availability_trigger() {
        let check = WebCheck {
            url: "http://203.0.113.10/".into(),
            ..WebCheck::default()
        };
        let trigger = availability_trigger("bastion.internal", &check);
        assert_eq!(trigger.description, "Website is unavailable on bastion.internal");
        assert_eq!(
            trigger.expression,
            "last(/bastion.internal/web.test.fail[Website Availability])>0"
        );
        assert_eq!(trigger.priority, Severity::High);
    }

    #[test]
    fn test_descriptions_unique_per_host() {
        let triggers = host_triggers("db1");
        assert_ne!(triggers[0].description, triggers[1].description);
    }
}
