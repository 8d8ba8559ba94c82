use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::capacity::{AlertSeverity, Period};
use crate::models::task::TaskPriority;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OverloadRisk {
    Low,
    Medium,
    High,
    Critical,
}

impl OverloadRisk {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverloadRisk::Low => "low",
            OverloadRisk::Medium => "medium",
            OverloadRisk::High => "high",
            OverloadRisk::Critical => "critical",
        }
    }

    pub fn is_overloaded(&self) -> bool {
        matches!(self, OverloadRisk::High | OverloadRisk::Critical)
    }
}

impl fmt::Display for OverloadRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for OverloadRisk {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "low" => Ok(OverloadRisk::Low),
            "medium" => Ok(OverloadRisk::Medium),
            "high" => Ok(OverloadRisk::High),
            "critical" => Ok(OverloadRisk::Critical),
            other => Err(format!("unsupported overload risk: {other}")),
        }
    }
}

/// Capacity alerts as re-emitted by the workload calculator: the upstream
/// alert type collapses to overload/underload.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadAlertKind {
    Overload,
    Underload,
}

impl WorkloadAlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadAlertKind::Overload => "overload",
            WorkloadAlertKind::Underload => "underload",
        }
    }
}

impl fmt::Display for WorkloadAlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadAlert {
    pub kind: WorkloadAlertKind,
    pub severity: AlertSeverity,
    pub message: String,
}

/// Per-project breakdown of raw vs. allocation-scaled hours.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AllocationDetail {
    pub raw_hours: f64,
    pub allocated_hours: f64,
    pub percentage: f64,
}

/// Risk-annotated workload forecast for one user over one period. Built
/// fresh per call and never mutated after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadCalculation {
    pub user_id: String,
    pub period: Period,
    pub theoretical_hours: f64,
    pub available_hours: f64,
    pub planned_hours: f64,
    pub confirmed_hours: f64,
    pub remaining_hours: f64,
    pub overload_hours: f64,
    pub overload_risk: OverloadRisk,
    pub utilization_rate: f64,
    pub efficiency_score: f64,
    pub burnout_risk: f64,
    pub task_breakdown: BTreeMap<TaskPriority, f64>,
    pub project_distribution: BTreeMap<String, f64>,
    /// Keyed by the ISO-week Monday (`YYYY-MM-DD`) of the task due date.
    pub weekly_distribution: BTreeMap<String, f64>,
    pub allocation_details: BTreeMap<String, AllocationDetail>,
    pub alerts: Vec<WorkloadAlert>,
    pub conflicts: Vec<String>,
    pub suggestions: Vec<String>,
}

/// One user the team batch could not compute, with the reason kept visible
/// instead of silently dropping the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamWorkloadFailure {
    pub user_id: String,
    pub reason: String,
}

/// Result of a team-wide workload batch: per-user successes joined by user
/// id, per-user failures recorded alongside.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TeamWorkloadReport {
    pub results: BTreeMap<String, WorkloadCalculation>,
    pub failures: Vec<TeamWorkloadFailure>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TeamOverloadReport {
    pub overloaded_users: Vec<String>,
    pub critical_users: Vec<String>,
    pub suggestions: Vec<String>,
    pub total_risk_score: f64,
}
