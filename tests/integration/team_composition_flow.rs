use std::sync::Arc;

use teamcap::models::team::{
    CandidateMember, CandidateSkill, CompositionStrategy, RequirementImportance, SkillCategory,
    SkillLevel, SkillRequirement,
};
use teamcap::providers::memory::InMemoryDirectory;
use teamcap::services::team_composition::TeamCompositionOptimizer;

fn skill(name: &str, level: SkillLevel, category: SkillCategory) -> CandidateSkill {
    CandidateSkill {
        name: name.to_string(),
        level,
        years_experience: 4.0,
        category,
    }
}

fn candidate(
    user_id: &str,
    skills: Vec<CandidateSkill>,
    overall_score: f64,
    workload_percent: f64,
) -> CandidateMember {
    CandidateMember {
        user_id: user_id.to_string(),
        display_name: format!("成员 {user_id}"),
        skills,
        overall_score,
        workload_percent,
        availability_percent: 100.0 - workload_percent,
        collaboration_score: 65.0,
    }
}

fn requirement(
    skill_name: &str,
    level: SkillLevel,
    quantity: u32,
    importance: RequirementImportance,
) -> SkillRequirement {
    SkillRequirement {
        skill: skill_name.to_string(),
        level,
        quantity,
        importance,
        category: SkillCategory::Technical,
    }
}

fn roster() -> Vec<CandidateMember> {
    vec![
        candidate(
            "dev-react",
            vec![
                skill("React", SkillLevel::Expert, SkillCategory::Technical),
                skill("TypeScript", SkillLevel::Advanced, SkillCategory::Technical),
            ],
            4.2,
            30.0,
        ),
        candidate(
            "dev-go",
            vec![skill("Go", SkillLevel::Advanced, SkillCategory::Technical)],
            3.5,
            50.0,
        ),
        candidate(
            "lead",
            vec![
                skill("Go", SkillLevel::Intermediate, SkillCategory::Technical),
                skill("Coaching", SkillLevel::Advanced, SkillCategory::Management),
            ],
            3.8,
            70.0,
        ),
        candidate(
            "junior",
            vec![skill("React", SkillLevel::Beginner, SkillCategory::Technical)],
            1.4,
            20.0,
        ),
    ]
}

fn requirements() -> Vec<SkillRequirement> {
    vec![
        requirement("React", SkillLevel::Advanced, 2, RequirementImportance::Critical),
        requirement("Go", SkillLevel::Intermediate, 1, RequirementImportance::High),
    ]
}

async fn optimizer_with(roster: Vec<CandidateMember>) -> TeamCompositionOptimizer {
    let directory = Arc::new(InMemoryDirectory::new());
    directory.insert_candidates(roster);
    TeamCompositionOptimizer::new(directory)
}

#[tokio::test]
async fn propose_teams_runs_all_strategies_and_ranks_them() {
    let optimizer = optimizer_with(roster()).await;

    let compositions = optimizer.propose_teams(&requirements(), 3).await.unwrap();

    assert_eq!(compositions.len(), CompositionStrategy::ALL.len());
    for (idx, composition) in compositions.iter().enumerate() {
        assert_eq!(composition.rank, idx + 1);
        assert!(!composition.members.is_empty());
        assert!(composition.members.len() <= 3);
        let expected = 0.4 * composition.coverage_score
            + 0.3 * composition.balance_score
            + 0.3 * composition.collaboration_score;
        assert!((composition.overall_score - expected).abs() < 1e-9);
    }
    for pair in compositions.windows(2) {
        assert!(pair[0].overall_score + f64::EPSILON >= pair[1].overall_score);
    }
}

#[tokio::test]
async fn insufficient_react_coverage_is_flagged_on_every_composition() {
    // 池中只有一名达到 advanced 的 React 候选人，但要求 2 人
    let optimizer = optimizer_with(roster()).await;

    let compositions = optimizer.propose_teams(&requirements(), 4).await.unwrap();
    assert!(!compositions.is_empty());
    for composition in &compositions {
        assert!(composition
            .conflict_warnings
            .iter()
            .any(|warning| warning.contains("React")));
    }
}

#[tokio::test]
async fn repeated_calls_yield_identical_selections() {
    let optimizer = optimizer_with(roster()).await;
    let reqs = requirements();

    let first = optimizer.propose_teams(&reqs, 3).await.unwrap();
    let second = optimizer.propose_teams(&reqs, 3).await.unwrap();

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.strategy, b.strategy);
        assert_eq!(
            a.members.iter().map(|m| &m.user_id).collect::<Vec<_>>(),
            b.members.iter().map(|m| &m.user_id).collect::<Vec<_>>()
        );
        assert_eq!(a.overall_score, b.overall_score);
        assert_eq!(a.conflict_warnings, b.conflict_warnings);
    }
}

#[tokio::test]
async fn empty_pool_yields_no_compositions() {
    let optimizer = optimizer_with(Vec::new()).await;
    let compositions = optimizer.propose_teams(&requirements(), 3).await.unwrap();
    assert!(compositions.is_empty());
}

#[tokio::test]
async fn mentoring_and_category_recommendations_surface() {
    let optimizer = optimizer_with(roster()).await;

    let compositions = optimizer.propose_teams(&requirements(), 4).await.unwrap();
    // 全量团队同时包含资深与初级成员，且没有语言类技能
    let full_team = compositions
        .iter()
        .find(|composition| composition.members.len() == 4)
        .expect("a strategy should select the whole roster");
    assert!(full_team
        .recommendations
        .iter()
        .any(|r| r.contains("导师结对")));
    assert!(full_team
        .recommendations
        .iter()
        .any(|r| r.contains("语言")));
}
