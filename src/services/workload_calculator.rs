use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::error::AppResult;
use crate::models::capacity::{Capacity, Period};
use crate::models::task::{AssignedTask, ProjectAllocation, TaskPriority, TaskStatus};
use crate::models::workload::{
    AllocationDetail, OverloadRisk, TeamOverloadReport, TeamWorkloadFailure, TeamWorkloadReport,
    WorkloadAlert, WorkloadAlertKind, WorkloadCalculation,
};
use crate::providers::{AllocationStore, CapacityProvider, TaskStore};
use crate::services::capacity_utils::{
    days_to_hours, ensure_period, iso_week_key, HOURS_PER_STORY_POINT,
};

/// Risk band upper bounds over the overload ratio (planned / available).
pub const LOW_RISK_MAX_RATIO: f64 = 0.8;
pub const MEDIUM_RISK_MAX_RATIO: f64 = 1.0;
pub const HIGH_RISK_MAX_RATIO: f64 = 1.3;

/// Utilization percentage where the burnout ramp starts.
pub const BURNOUT_RAMP_START: f64 = 85.0;
/// Burnout risk at exactly nominal capacity (utilization 100).
pub const BURNOUT_AT_NOMINAL: f64 = 30.0;

/// Share of available hours above which P0 work counts as over-concentrated.
pub const P0_CONCENTRATION_RATIO: f64 = 0.5;
/// Distinct-project count above which consolidation is suggested.
pub const PROJECT_SPREAD_LIMIT: usize = 5;
/// Confirmed-to-planned ratio under which momentum is flagged.
pub const CONFIRMED_MOMENTUM_RATIO: f64 = 0.3;

/// Team risk accumulation weights, one per risk band.
pub const RISK_WEIGHT_LOW: f64 = 1.0;
pub const RISK_WEIGHT_MEDIUM: f64 = 3.0;
pub const RISK_WEIGHT_HIGH: f64 = 7.0;
pub const RISK_WEIGHT_CRITICAL: f64 = 10.0;

/// Priority weights in the efficiency score numerator (P3 weighs zero).
pub const EFFICIENCY_WEIGHT_P0: f64 = 4.0;
pub const EFFICIENCY_WEIGHT_P1: f64 = 3.0;
pub const EFFICIENCY_WEIGHT_P2: f64 = 2.0;

/// Total partition of the overload ratio into risk bands; every boundary
/// value belongs to the band below it.
pub fn classify_overload_ratio(ratio: f64) -> OverloadRisk {
    if ratio <= LOW_RISK_MAX_RATIO {
        OverloadRisk::Low
    } else if ratio <= MEDIUM_RISK_MAX_RATIO {
        OverloadRisk::Medium
    } else if ratio <= HIGH_RISK_MAX_RATIO {
        OverloadRisk::High
    } else {
        OverloadRisk::Critical
    }
}

/// Burnout risk over the uncapped utilization percentage: flat zero up to
/// 85, a ramp to 30 at nominal capacity, then a steeper ramp capped at 100.
pub fn burnout_risk_for(utilization: f64) -> f64 {
    if utilization <= BURNOUT_RAMP_START {
        0.0
    } else if utilization <= 100.0 {
        ((utilization - BURNOUT_RAMP_START) / (100.0 - BURNOUT_RAMP_START)) * BURNOUT_AT_NOMINAL
    } else {
        (((utilization - 100.0) / 50.0) * 100.0).min(100.0)
    }
}

pub fn risk_weight(risk: OverloadRisk) -> f64 {
    match risk {
        OverloadRisk::Low => RISK_WEIGHT_LOW,
        OverloadRisk::Medium => RISK_WEIGHT_MEDIUM,
        OverloadRisk::High => RISK_WEIGHT_HIGH,
        OverloadRisk::Critical => RISK_WEIGHT_CRITICAL,
    }
}

/// Per-person workload forecaster: combines a capacity snapshot with
/// assigned tasks and project allocations into a risk-annotated result.
#[derive(Clone)]
pub struct WorkloadCalculator {
    capacity_provider: Arc<dyn CapacityProvider>,
    task_store: Arc<dyn TaskStore>,
    allocation_store: Arc<dyn AllocationStore>,
}

impl WorkloadCalculator {
    pub fn new(
        capacity_provider: Arc<dyn CapacityProvider>,
        task_store: Arc<dyn TaskStore>,
        allocation_store: Arc<dyn AllocationStore>,
    ) -> Self {
        Self {
            capacity_provider,
            task_store,
            allocation_store,
        }
    }

    /// Pure core of the engine: all inputs already fetched.
    pub fn calculate_workload(
        &self,
        user_id: &str,
        period: &Period,
        capacity: &Capacity,
        tasks: &[AssignedTask],
        allocations: &BTreeMap<String, f64>,
    ) -> AppResult<WorkloadCalculation> {
        ensure_period(period)?;

        let theoretical_hours = days_to_hours(capacity.theoretical_days);
        let available_hours = days_to_hours(capacity.available_days);

        let mut planned_hours = 0.0;
        let mut confirmed_hours = 0.0;
        let mut task_breakdown: BTreeMap<TaskPriority, f64> = BTreeMap::new();
        let mut project_distribution: BTreeMap<String, f64> = BTreeMap::new();
        let mut weekly_distribution: BTreeMap<String, f64> = BTreeMap::new();
        let mut allocation_details: BTreeMap<String, AllocationDetail> = BTreeMap::new();

        for task in tasks {
            let raw_hours = task
                .estimated_hours
                .or_else(|| task.story_points.map(|points| points * HOURS_PER_STORY_POINT))
                .unwrap_or(0.0);
            let percentage = task
                .project_id
                .as_ref()
                .and_then(|project_id| allocations.get(project_id).copied())
                .unwrap_or(ProjectAllocation::DEFAULT_PERCENTAGE);
            let adjusted_hours = raw_hours * percentage / 100.0;

            planned_hours += adjusted_hours;
            if task.status == TaskStatus::InProgress {
                confirmed_hours += adjusted_hours;
            }

            *task_breakdown.entry(task.priority).or_insert(0.0) += adjusted_hours;

            if let Some(project_id) = &task.project_id {
                *project_distribution.entry(project_id.clone()).or_insert(0.0) += adjusted_hours;
                let detail = allocation_details
                    .entry(project_id.clone())
                    .or_insert(AllocationDetail {
                        raw_hours: 0.0,
                        allocated_hours: 0.0,
                        percentage,
                    });
                detail.raw_hours += raw_hours;
                detail.allocated_hours += adjusted_hours;
            }

            if let Some(due_date) = task.due_date {
                *weekly_distribution.entry(iso_week_key(due_date)).or_insert(0.0) +=
                    adjusted_hours;
            }
        }

        // 可用工时为 0 时视为完全超载，避免除零
        let overload_ratio = if available_hours > 0.0 {
            planned_hours / available_hours
        } else if planned_hours > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };
        let overload_risk = classify_overload_ratio(overload_ratio);

        let raw_utilization = if available_hours > 0.0 {
            100.0 * planned_hours / available_hours
        } else if planned_hours > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };
        let utilization_rate = raw_utilization.min(100.0);
        let burnout_risk = burnout_risk_for(raw_utilization);

        let p0_hours = task_breakdown.get(&TaskPriority::P0).copied().unwrap_or(0.0);
        let p1_hours = task_breakdown.get(&TaskPriority::P1).copied().unwrap_or(0.0);
        let p2_hours = task_breakdown.get(&TaskPriority::P2).copied().unwrap_or(0.0);
        let p3_hours = task_breakdown.get(&TaskPriority::P3).copied().unwrap_or(0.0);

        let efficiency_score = if planned_hours > 0.0 {
            100.0
                * (EFFICIENCY_WEIGHT_P0 * p0_hours
                    + EFFICIENCY_WEIGHT_P1 * p1_hours
                    + EFFICIENCY_WEIGHT_P2 * p2_hours)
                / (EFFICIENCY_WEIGHT_P0 * planned_hours)
        } else {
            0.0
        };

        let mut conflicts = Vec::new();
        let mut suggestions = Vec::new();

        match overload_risk {
            OverloadRisk::Low => {}
            OverloadRisk::Medium => {
                suggestions.push("工作负载接近上限，建议持续关注".to_string());
            }
            OverloadRisk::High => {
                conflicts.push(overload_conflict_message(raw_utilization, planned_hours));
                suggestions
                    .push("建议重新分配任务或与相关方协商调整截止日期".to_string());
            }
            OverloadRisk::Critical => {
                conflicts.push(overload_conflict_message(raw_utilization, planned_hours));
                conflicts.push("持续超载存在倦怠风险".to_string());
                suggestions.push("建议立即重新分配工作量".to_string());
            }
        }

        if capacity.leave_days > 0.0 && planned_hours > 0.0 {
            conflicts.push(format!(
                "周期内包含 {} 天休假，与已规划任务存在重叠",
                capacity.leave_days
            ));
        }
        if p0_hours > available_hours * P0_CONCENTRATION_RATIO {
            conflicts.push("关键任务过于集中：P0 任务占用超过一半可用容量".to_string());
        }

        if overload_risk.is_overloaded() {
            let excess_hours = (planned_hours - available_hours).max(0.0).ceil();
            suggestions.push(format!("建议重新分配约 {excess_hours} 小时的工作量"));
            if p3_hours > 0.0 {
                suggestions.push(format!(
                    "建议优先转移 {p3_hours:.1} 小时的 P3 低优先级任务"
                ));
            }
        }
        if project_distribution.len() > PROJECT_SPREAD_LIMIT {
            suggestions.push(format!(
                "当前分散在 {} 个项目，建议整合到更少的项目",
                project_distribution.len()
            ));
        }
        if capacity.leave_days > 0.0 {
            suggestions.push(format!(
                "周期内有 {} 天休假，建议在规划中提前考虑",
                capacity.leave_days
            ));
        }
        if confirmed_hours < CONFIRMED_MOMENTUM_RATIO * planned_hours {
            suggestions.push("已启动任务占比偏低，建议尽快启动更多任务以保持节奏".to_string());
        }

        let alerts = capacity
            .alerts
            .iter()
            .map(|alert| WorkloadAlert {
                kind: if alert.alert_type.eq_ignore_ascii_case("OVERALLOCATION") {
                    WorkloadAlertKind::Overload
                } else {
                    WorkloadAlertKind::Underload
                },
                severity: alert.severity,
                message: alert.message.clone(),
            })
            .collect();

        info!(
            target: "app::workload",
            user_id,
            planned_hours,
            available_hours,
            risk = %overload_risk,
            "workload calculated"
        );

        Ok(WorkloadCalculation {
            user_id: user_id.to_string(),
            period: *period,
            theoretical_hours,
            available_hours,
            planned_hours,
            confirmed_hours,
            remaining_hours: (available_hours - planned_hours).max(0.0),
            overload_hours: (planned_hours - available_hours).max(0.0),
            overload_risk,
            utilization_rate,
            efficiency_score,
            burnout_risk,
            task_breakdown,
            project_distribution,
            weekly_distribution,
            allocation_details,
            alerts,
            conflicts,
            suggestions,
        })
    }

    /// Fetch the collaborator inputs for one user, then delegate to the
    /// pure core. Unknown users surface the provider's `NotFound`.
    pub async fn calculate_user_workload(
        &self,
        user_id: &str,
        period: &Period,
    ) -> AppResult<WorkloadCalculation> {
        ensure_period(period)?;
        let capacity = self.capacity_provider.get_capacity(user_id, period).await?;
        let tasks = self.task_store.get_assigned_tasks(user_id, period).await?;

        let mut project_ids: Vec<String> = tasks
            .iter()
            .filter_map(|task| task.project_id.clone())
            .collect();
        project_ids.sort();
        project_ids.dedup();

        let allocations = self
            .allocation_store
            .get_allocations(user_id, &project_ids)
            .await?;

        self.calculate_workload(user_id, period, &capacity, &tasks, &allocations)
    }

    /// Fan out one independent calculation per user. A failing user is
    /// recorded, not fatal to the batch.
    pub async fn calculate_team_workload(
        &self,
        user_ids: &[String],
        period: &Period,
    ) -> TeamWorkloadReport {
        let mut join_set = JoinSet::new();
        for user_id in user_ids {
            let service = self.clone();
            let user_id = user_id.clone();
            let period = *period;
            join_set.spawn(async move {
                let outcome = service.calculate_user_workload(&user_id, &period).await;
                (user_id, outcome)
            });
        }

        let mut report = TeamWorkloadReport::default();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((user_id, Ok(calculation))) => {
                    report.results.insert(user_id, calculation);
                }
                Ok((user_id, Err(error))) => {
                    warn!(
                        target: "app::workload",
                        %user_id,
                        error = %error,
                        "skipping user in team workload batch"
                    );
                    report.failures.push(TeamWorkloadFailure {
                        user_id,
                        reason: error.to_string(),
                    });
                }
                Err(join_error) => {
                    warn!(
                        target: "app::workload",
                        error = %join_error,
                        "team workload task aborted"
                    );
                    report.failures.push(TeamWorkloadFailure {
                        user_id: String::new(),
                        reason: join_error.to_string(),
                    });
                }
            }
        }
        report.failures.sort_by(|a, b| a.user_id.cmp(&b.user_id));

        info!(
            target: "app::workload",
            users = user_ids.len(),
            succeeded = report.results.len(),
            failed = report.failures.len(),
            "team workload batch finished"
        );
        report
    }

    /// Partition the team into overloaded/critical users and accumulate a
    /// weighted risk total.
    pub async fn detect_team_overloads(
        &self,
        user_ids: &[String],
        period: &Period,
    ) -> TeamOverloadReport {
        let team = self.calculate_team_workload(user_ids, period).await;

        let mut report = TeamOverloadReport::default();
        for (user_id, calculation) in &team.results {
            report.total_risk_score += risk_weight(calculation.overload_risk);
            if calculation.overload_risk.is_overloaded() {
                report.overloaded_users.push(user_id.clone());
                for suggestion in &calculation.suggestions {
                    if !report.suggestions.contains(suggestion) {
                        report.suggestions.push(suggestion.clone());
                    }
                }
            }
            if calculation.overload_risk == OverloadRisk::Critical {
                report.critical_users.push(user_id.clone());
            }
        }
        report
    }
}

fn overload_conflict_message(raw_utilization: f64, planned_hours: f64) -> String {
    if raw_utilization.is_finite() {
        format!("检测到超载：已使用 {raw_utilization:.0}% 的容量")
    } else {
        format!("检测到超载：可用工时为 0，但已规划 {planned_hours:.1} 小时任务")
    }
}
