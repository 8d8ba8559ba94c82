use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::team::{
    CandidateMember, CompositionStrategy, RequirementImportance, SkillCategory, SkillRequirement,
    TeamComposition,
};
use crate::providers::CandidatePool;

/// Weights of the overall composition score; fixed by design.
pub const OVERALL_COVERAGE_WEIGHT: f64 = 0.4;
pub const OVERALL_BALANCE_WEIGHT: f64 = 0.3;
pub const OVERALL_COLLABORATION_WEIGHT: f64 = 0.3;

/// Sentinel below which no candidate is ever picked.
pub const SELECTION_FLOOR: f64 = -1.0;

/// Coverage-first multipliers: filling a gap beats doubling up.
pub const COVERAGE_GAP_MULTIPLIER: f64 = 2.0;
pub const COVERAGE_DUPLICATE_MULTIPLIER: f64 = 0.5;

pub const EXPERIENCE_MULTIPLIER: f64 = 10.0;
pub const BALANCE_IDLE_WEIGHT: f64 = 0.5;

/// Applied to every candidate regardless of strategy.
pub const DIVERSITY_BONUS_PER_SKILL: f64 = 0.5;
pub const WORKLOAD_PENALTY_RATE: f64 = 0.2;

/// Variance scaling of the experience spread in the balance score.
pub const EXPERIENCE_VARIANCE_SCALE: f64 = 10.0;

pub const HIGH_WORKLOAD_THRESHOLD: f64 = 80.0;
pub const JUNIOR_SCORE_MAX: f64 = 2.0;
pub const SENIOR_SCORE_MIN: f64 = 3.0;

/// Team composition optimizer: runs one greedy construction per strategy
/// over the candidate pool and ranks the resulting proposals.
#[derive(Clone)]
pub struct TeamCompositionOptimizer {
    candidate_pool: Arc<dyn CandidatePool>,
}

impl TeamCompositionOptimizer {
    pub fn new(candidate_pool: Arc<dyn CandidatePool>) -> Self {
        Self { candidate_pool }
    }

    /// Fetch the roster from the pool collaborator, then delegate to the
    /// pure construction.
    pub async fn propose_teams(
        &self,
        requirements: &[SkillRequirement],
        max_team_size: usize,
    ) -> AppResult<Vec<TeamComposition>> {
        let pool = self.candidate_pool.list().await?;
        Ok(self.generate_compositions(requirements, &pool, max_team_size))
    }

    /// One composition per strategy (strategies that never beat the
    /// selection floor are omitted), sorted by overall score descending
    /// with ranks reassigned. Empty requirements or pool yield no
    /// compositions.
    pub fn generate_compositions(
        &self,
        requirements: &[SkillRequirement],
        candidate_pool: &[CandidateMember],
        max_team_size: usize,
    ) -> Vec<TeamComposition> {
        if requirements.is_empty() || candidate_pool.is_empty() || max_team_size == 0 {
            return Vec::new();
        }

        let mut compositions: Vec<TeamComposition> = CompositionStrategy::ALL
            .iter()
            .filter_map(|strategy| {
                self.build_composition(requirements, candidate_pool, max_team_size, *strategy)
            })
            .collect();

        compositions.sort_by(|a, b| {
            b.overall_score
                .partial_cmp(&a.overall_score)
                .unwrap_or(Ordering::Equal)
        });
        for (idx, composition) in compositions.iter_mut().enumerate() {
            composition.rank = idx + 1;
        }

        info!(
            target: "app::team",
            requirements = requirements.len(),
            pool = candidate_pool.len(),
            compositions = compositions.len(),
            "team compositions generated"
        );
        compositions
    }

    fn build_composition(
        &self,
        requirements: &[SkillRequirement],
        candidate_pool: &[CandidateMember],
        max_team_size: usize,
        strategy: CompositionStrategy,
    ) -> Option<TeamComposition> {
        let mut pool: Vec<CandidateMember> = candidate_pool.to_vec();
        let mut selected: Vec<CandidateMember> = Vec::new();

        while selected.len() < max_team_size && !pool.is_empty() {
            let mut best_index: Option<usize> = None;
            let mut best_score = SELECTION_FLOOR;

            // 平分时保留先遇到的候选人，保证结果确定
            for (index, candidate) in pool.iter().enumerate() {
                let score = score_candidate(candidate, requirements, &selected, strategy);
                if score > best_score {
                    best_score = score;
                    best_index = Some(index);
                }
            }

            match best_index {
                Some(index) => selected.push(pool.remove(index)),
                None => break,
            }
        }

        if selected.is_empty() {
            return None;
        }

        let coverage_score = coverage_score(requirements, &selected);
        let balance_score = balance_score(&selected);
        let collaboration_score = mean(selected.iter().map(|m| m.collaboration_score));
        let overall_score = OVERALL_COVERAGE_WEIGHT * coverage_score
            + OVERALL_BALANCE_WEIGHT * balance_score
            + OVERALL_COLLABORATION_WEIGHT * collaboration_score;

        let conflict_warnings = conflict_warnings(requirements, &selected);
        let recommendations = recommendations(&selected);

        Some(TeamComposition {
            id: Uuid::new_v4().to_string(),
            strategy,
            label: strategy.label(),
            rank: 0,
            members: selected,
            requirements: requirements.to_vec(),
            coverage_score,
            balance_score,
            collaboration_score,
            overall_score,
            conflict_warnings,
            recommendations,
        })
    }
}

/// Strategy-dependent candidate score against the current partial team,
/// plus the strategy-independent diversity bonus and workload penalty.
pub fn score_candidate(
    candidate: &CandidateMember,
    requirements: &[SkillRequirement],
    selected: &[CandidateMember],
    strategy: CompositionStrategy,
) -> f64 {
    let mut score = match strategy {
        CompositionStrategy::CoverageFirst => {
            let mut sum = 0.0;
            for requirement in requirements {
                if candidate.covers(requirement) {
                    let already_covered = selected.iter().any(|member| member.covers(requirement));
                    let multiplier = if already_covered {
                        COVERAGE_DUPLICATE_MULTIPLIER
                    } else {
                        COVERAGE_GAP_MULTIPLIER
                    };
                    sum += requirement.importance.ordinal() * multiplier;
                }
            }
            sum
        }
        CompositionStrategy::ExperienceFirst => candidate.overall_score * EXPERIENCE_MULTIPLIER,
        CompositionStrategy::AvailabilityFirst => candidate.availability_percent,
        CompositionStrategy::BalanceFirst => {
            candidate.collaboration_score
                + (100.0 - candidate.workload_percent) * BALANCE_IDLE_WEIGHT
        }
    };

    let distinct_skills: BTreeSet<&str> = candidate
        .skills
        .iter()
        .map(|skill| skill.name.as_str())
        .collect();
    score += distinct_skills.len() as f64 * DIVERSITY_BONUS_PER_SKILL;
    score -= candidate.workload_percent * WORKLOAD_PENALTY_RATE;
    score
}

fn covering_member_count(requirement: &SkillRequirement, members: &[CandidateMember]) -> usize {
    members
        .iter()
        .filter(|member| member.covers(requirement))
        .count()
}

/// Importance-weighted mean of requirement fulfilment, each requirement
/// capped at its quantity.
pub fn coverage_score(requirements: &[SkillRequirement], members: &[CandidateMember]) -> f64 {
    if requirements.is_empty() {
        return 0.0;
    }
    let total: f64 = requirements
        .iter()
        .map(|requirement| {
            let covering = covering_member_count(requirement, members) as f64;
            let fulfilment = (covering / requirement.quantity.max(1) as f64).min(1.0);
            requirement.importance.coverage_weight() * fulfilment
        })
        .sum();
    100.0 * total / requirements.len() as f64
}

/// Inverse-variance balance over workload and experience spreads.
pub fn balance_score(members: &[CandidateMember]) -> f64 {
    let workload_variance = variance(members.iter().map(|m| m.workload_percent));
    let experience_variance = variance(members.iter().map(|m| m.overall_score));
    let workload_balance = (100.0 - workload_variance).max(0.0);
    let experience_balance = (100.0 - experience_variance * EXPERIENCE_VARIANCE_SCALE).max(0.0);
    (workload_balance + experience_balance) / 2.0
}

fn conflict_warnings(requirements: &[SkillRequirement], members: &[CandidateMember]) -> Vec<String> {
    let mut warnings = Vec::new();

    let high_workload_members = members
        .iter()
        .filter(|member| member.workload_percent > HIGH_WORKLOAD_THRESHOLD)
        .count();
    if high_workload_members > 0 {
        warnings.push(format!(
            "{high_workload_members} 名成员当前负载超过 {HIGH_WORKLOAD_THRESHOLD:.0}%"
        ));
    }

    for requirement in requirements {
        if requirement.importance != RequirementImportance::Critical {
            continue;
        }
        let covering = covering_member_count(requirement, members);
        if (covering as u32) < requirement.quantity {
            warnings.push(format!(
                "关键技能 {} 覆盖不足：{}/{} 人满足要求",
                requirement.skill, covering, requirement.quantity
            ));
        }
    }
    warnings
}

fn recommendations(members: &[CandidateMember]) -> Vec<String> {
    let mut recommendations = Vec::new();

    let present_categories: BTreeSet<SkillCategory> = members
        .iter()
        .flat_map(|member| member.skills.iter().map(|skill| skill.category))
        .collect();
    for category in SkillCategory::ALL {
        if !present_categories.contains(&category) {
            recommendations.push(format!(
                "团队尚无{}类技能，建议补充相应成员",
                category.label()
            ));
        }
    }

    let junior_count = members
        .iter()
        .filter(|member| member.overall_score < JUNIOR_SCORE_MAX)
        .count();
    let senior_count = members
        .iter()
        .filter(|member| member.overall_score > SENIOR_SCORE_MIN)
        .count();
    if junior_count > 0 && senior_count > 0 {
        recommendations.push(format!(
            "团队包含 {senior_count} 名资深成员与 {junior_count} 名初级成员，建议建立导师结对"
        ));
    }
    recommendations
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let collected: Vec<f64> = values.collect();
    if collected.is_empty() {
        return 0.0;
    }
    collected.iter().sum::<f64>() / collected.len() as f64
}

fn variance(values: impl Iterator<Item = f64>) -> f64 {
    let collected: Vec<f64> = values.collect();
    if collected.is_empty() {
        return 0.0;
    }
    let mean = collected.iter().sum::<f64>() / collected.len() as f64;
    collected
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / collected.len() as f64
}
