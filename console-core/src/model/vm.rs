//! ``src/model/vm.rs``
//! ============================================================================
//! # VM Records
//!
//! A discovered virtual machine and its migration-relevant attributes, in the
//! shape the discovery agent reports them. `status` is taken as supplied by
//! the agent and is never recomputed from `issues`.

use std::fmt;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Stable, never-reused identifier of a VM record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VmId(CompactString);

impl VmId {
    pub fn new(id: impl Into<CompactString>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for VmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for VmId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Migration readiness as assessed by the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VmStatus {
    Migratable,
    MigratableWithWarnings,
    NotMigratable,
}

impl VmStatus {
    pub const ALL: [Self; 3] = [
        Self::Migratable,
        Self::MigratableWithWarnings,
        Self::NotMigratable,
    ];

    /// Wire value, also used as the string sort key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Migratable => "migratable",
            Self::MigratableWithWarnings => "migratable-with-warnings",
            Self::NotMigratable => "not-migratable",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Migratable => "Migratable",
            Self::MigratableWithWarnings => "With warnings",
            Self::NotMigratable => "Not migratable",
        }
    }

    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.label() == label)
    }
}

impl fmt::Display for VmStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a migration concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    Warning,
    Error,
}

/// A migration concern attached to a VM, independent of its status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmIssue {
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmRecord {
    pub id: VmId,
    pub name: String,
    pub status: VmStatus,
    pub datacenter: String,
    pub cluster: String,
    #[serde(rename = "diskSizeGB")]
    pub disk_size_gb: f64,
    #[serde(rename = "memorySizeGB")]
    pub memory_size_gb: f64,
    pub cpu_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    pub power_state: String,
    #[serde(default)]
    pub issues: Vec<VmIssue>,
}

impl VmRecord {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.kind == IssueKind::Error)
    }

    #[must_use]
    pub fn has_warnings(&self) -> bool {
        self.issues.iter().any(|i| i.kind == IssueKind::Warning)
    }

    /// Issue messages joined for a single table cell.
    #[must_use]
    pub fn issue_summary(&self) -> String {
        if self.issues.is_empty() {
            return "—".to_string();
        }

        self.issues
            .iter()
            .map(|issue| issue.message.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Domain check applied when a batch enters the inventory.
    pub(crate) fn check_sizes(&self) -> Result<(), &'static str> {
        if !self.disk_size_gb.is_finite() || self.disk_size_gb < 0.0 {
            return Err("diskSizeGB must be a non-negative number");
        }
        if !self.memory_size_gb.is_finite() || self.memory_size_gb < 0.0 {
            return Err("memorySizeGB must be a non-negative number");
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_agent_payload() {
        let json = r#"{
            "id": "vm-1003",
            "name": "app-server-01",
            "status": "not-migratable",
            "datacenter": "DC-West",
            "cluster": "Development-Cluster",
            "diskSizeGB": 120,
            "memorySizeGB": 32,
            "cpuCount": 4,
            "os": "Windows Server 2012",
            "powerState": "poweredOn",
            "issues": [{ "type": "error", "message": "VM OS not migrate-able" }]
        }"#;

        let vm: VmRecord = serde_json::from_str(json).unwrap();
        assert_eq!(vm.id.as_str(), "vm-1003");
        assert_eq!(vm.status, VmStatus::NotMigratable);
        assert_eq!(vm.disk_size_gb, 120.0);
        assert!(vm.has_errors());
        assert!(!vm.has_warnings());
    }

    #[test]
    fn status_is_not_derived_from_issues() {
        let mut vm = fixtures::vm("vm-1", "a", VmStatus::Migratable, 1.0);
        vm.issues.push(VmIssue {
            kind: IssueKind::Error,
            message: "unsupported OS".into(),
        });
        assert_eq!(vm.status, VmStatus::Migratable);
    }

    #[test]
    fn issue_summary_joins_messages() {
        let mut vm = fixtures::vm("vm-1", "a", VmStatus::Migratable, 1.0);
        assert_eq!(vm.issue_summary(), "—");

        vm.issues = vec![
            VmIssue {
                kind: IssueKind::Warning,
                message: "powered off".into(),
            },
            VmIssue {
                kind: IssueKind::Warning,
                message: "old tools".into(),
            },
        ];
        assert_eq!(vm.issue_summary(), "powered off, old tools");
    }

    #[test]
    fn labels_round_trip() {
        for status in VmStatus::ALL {
            assert_eq!(VmStatus::from_label(status.label()), Some(status));
        }
        assert_eq!(VmStatus::from_label("Unknown"), None);
    }

    #[test]
    fn negative_sizes_fail_domain_check() {
        let vm = fixtures::vm("vm-1", "a", VmStatus::Migratable, -1.0);
        assert!(vm.check_sizes().is_err());
    }
}
