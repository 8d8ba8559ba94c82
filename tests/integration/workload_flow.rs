use std::sync::Arc;

use chrono::NaiveDate;
use teamcap::error::AppError;
use teamcap::models::capacity::{Capacity, Period};
use teamcap::models::task::{AssignedTask, ProjectAllocation, TaskPriority, TaskStatus};
use teamcap::models::workload::OverloadRisk;
use teamcap::providers::memory::InMemoryDirectory;
use teamcap::services::workload_calculator::WorkloadCalculator;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

fn period() -> Period {
    Period::new(date(2025, 6, 2), date(2025, 6, 13)).unwrap()
}

fn capacity(user_id: &str, available_days: f64, leave_days: f64) -> Capacity {
    Capacity {
        user_id: user_id.to_string(),
        theoretical_days: available_days + leave_days,
        available_days,
        leave_days,
        alerts: Vec::new(),
    }
}

fn task(
    id: &str,
    project_id: &str,
    hours: f64,
    status: TaskStatus,
    due: Option<NaiveDate>,
) -> AssignedTask {
    AssignedTask {
        id: id.to_string(),
        project_id: Some(project_id.to_string()),
        status,
        priority: TaskPriority::P2,
        due_date: due,
        estimated_hours: Some(hours),
        story_points: None,
    }
}

fn seeded_directory() -> Arc<InMemoryDirectory> {
    let directory = Arc::new(InMemoryDirectory::new());

    // alice：轻负载，50% 分配到 proj-a
    directory.insert_capacity(capacity("alice", 10.0, 0.0));
    directory.insert_tasks(
        "alice",
        vec![
            task(
                "a-1",
                "proj-a",
                40.0,
                TaskStatus::InProgress,
                Some(date(2025, 6, 5)),
            ),
            // done 任务不参与工作量
            task(
                "a-2",
                "proj-a",
                30.0,
                TaskStatus::Done,
                Some(date(2025, 6, 6)),
            ),
            // 周期外任务不参与工作量
            task(
                "a-3",
                "proj-a",
                30.0,
                TaskStatus::Todo,
                Some(date(2025, 7, 20)),
            ),
        ],
    );
    directory.insert_allocations(
        "alice",
        vec![ProjectAllocation {
            project_id: "proj-a".to_string(),
            user_id: "alice".to_string(),
            allocation_percentage: 50.0,
        }],
    );

    // bob：严重超载
    directory.insert_capacity(capacity("bob", 10.0, 0.0));
    directory.insert_tasks(
        "bob",
        vec![task(
            "b-1",
            "proj-b",
            100.0,
            TaskStatus::Todo,
            Some(date(2025, 6, 10)),
        )],
    );
    directory.insert_allocations("bob", Vec::new());

    directory
}

fn calculator(directory: Arc<InMemoryDirectory>) -> WorkloadCalculator {
    WorkloadCalculator::new(directory.clone(), directory.clone(), directory)
}

#[tokio::test]
async fn single_user_flow_applies_filters_and_allocations() {
    let service = calculator(seeded_directory());

    let calc = service
        .calculate_user_workload("alice", &period())
        .await
        .unwrap();

    // 只剩 a-1，按 50% 分配：40h → 20h
    assert_eq!(calc.planned_hours, 20.0);
    assert_eq!(calc.confirmed_hours, 20.0);
    assert_eq!(calc.available_hours, 70.0);
    assert_eq!(calc.overload_risk, OverloadRisk::Low);
    let detail = calc.allocation_details.get("proj-a").unwrap();
    assert_eq!(detail.raw_hours, 40.0);
    assert_eq!(detail.allocated_hours, 20.0);
    assert_eq!(detail.percentage, 50.0);
}

#[tokio::test]
async fn unknown_user_surfaces_not_found() {
    let service = calculator(seeded_directory());
    let result = service.calculate_user_workload("ghost", &period()).await;
    assert!(matches!(result, Err(AppError::NotFound)));
}

#[tokio::test]
async fn team_batch_tolerates_per_user_failures() {
    let service = calculator(seeded_directory());
    let user_ids = vec![
        "alice".to_string(),
        "ghost".to_string(),
        "bob".to_string(),
    ];

    let report = service.calculate_team_workload(&user_ids, &period()).await;

    assert_eq!(report.results.len(), 2);
    assert!(report.results.contains_key("alice"));
    assert!(report.results.contains_key("bob"));
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].user_id, "ghost");
    assert!(!report.failures[0].reason.is_empty());
}

#[tokio::test]
async fn overload_detection_partitions_and_scores_the_team() {
    let service = calculator(seeded_directory());
    let user_ids = vec!["alice".to_string(), "bob".to_string()];

    let report = service.detect_team_overloads(&user_ids, &period()).await;

    // bob: 100h / 70h → ratio ≈ 1.43 → critical; alice → low
    assert_eq!(report.overloaded_users, vec!["bob".to_string()]);
    assert_eq!(report.critical_users, vec!["bob".to_string()]);
    assert_eq!(report.total_risk_score, 1.0 + 10.0);
    assert!(!report.suggestions.is_empty());

    // 去重：同一条建议只出现一次
    let mut deduped = report.suggestions.clone();
    deduped.dedup();
    assert_eq!(deduped.len(), report.suggestions.len());
}

#[tokio::test]
async fn leave_days_flow_into_conflicts_and_suggestions() {
    let directory = Arc::new(InMemoryDirectory::new());
    directory.insert_capacity(capacity("carol", 8.0, 2.0));
    directory.insert_tasks(
        "carol",
        vec![task(
            "c-1",
            "proj-c",
            20.0,
            TaskStatus::Todo,
            Some(date(2025, 6, 4)),
        )],
    );
    directory.insert_allocations("carol", Vec::new());
    let service = calculator(directory);

    let calc = service
        .calculate_user_workload("carol", &period())
        .await
        .unwrap();
    assert!(calc.conflicts.iter().any(|c| c.contains("休假")));
    assert!(calc.suggestions.iter().any(|s| s.contains("休假")));
}

#[tokio::test]
async fn inverted_period_is_rejected_before_any_fetch() {
    let service = calculator(seeded_directory());
    let inverted = Period {
        start: date(2025, 6, 13),
        end: date(2025, 6, 2),
    };
    let result = service.calculate_user_workload("alice", &inverted).await;
    assert!(matches!(result, Err(AppError::Validation { .. })));
}
