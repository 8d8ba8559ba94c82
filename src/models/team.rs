use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl SkillLevel {
    /// Ordinal used for level comparisons in requirement coverage.
    pub fn value(&self) -> u8 {
        match self {
            SkillLevel::Beginner => 1,
            SkillLevel::Intermediate => 2,
            SkillLevel::Advanced => 3,
            SkillLevel::Expert => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SkillLevel::Beginner => "beginner",
            SkillLevel::Intermediate => "intermediate",
            SkillLevel::Advanced => "advanced",
            SkillLevel::Expert => "expert",
        }
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SkillLevel {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "beginner" => Ok(SkillLevel::Beginner),
            "intermediate" => Ok(SkillLevel::Intermediate),
            "advanced" => Ok(SkillLevel::Advanced),
            "expert" => Ok(SkillLevel::Expert),
            other => Err(format!("unsupported skill level: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RequirementImportance {
    Critical,
    High,
    Medium,
    Low,
}

impl RequirementImportance {
    /// Ordinal weight used in per-candidate scoring.
    pub fn ordinal(&self) -> f64 {
        match self {
            RequirementImportance::Critical => 4.0,
            RequirementImportance::High => 3.0,
            RequirementImportance::Medium => 2.0,
            RequirementImportance::Low => 1.0,
        }
    }

    /// Normalized weight used in team coverage scoring.
    pub fn coverage_weight(&self) -> f64 {
        match self {
            RequirementImportance::Critical => 1.0,
            RequirementImportance::High => 0.8,
            RequirementImportance::Medium => 0.6,
            RequirementImportance::Low => 0.4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementImportance::Critical => "critical",
            RequirementImportance::High => "high",
            RequirementImportance::Medium => "medium",
            RequirementImportance::Low => "low",
        }
    }
}

impl fmt::Display for RequirementImportance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SkillCategory {
    Technical,
    Management,
    Soft,
    Language,
}

impl SkillCategory {
    pub const ALL: [SkillCategory; 4] = [
        SkillCategory::Technical,
        SkillCategory::Management,
        SkillCategory::Soft,
        SkillCategory::Language,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SkillCategory::Technical => "技术",
            SkillCategory::Management => "管理",
            SkillCategory::Soft => "软技能",
            SkillCategory::Language => "语言",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SkillCategory::Technical => "technical",
            SkillCategory::Management => "management",
            SkillCategory::Soft => "soft",
            SkillCategory::Language => "language",
        }
    }
}

impl fmt::Display for SkillCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One weighted skill the target team must cover.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SkillRequirement {
    pub skill: String,
    pub level: SkillLevel,
    pub quantity: u32,
    pub importance: RequirementImportance,
    pub category: SkillCategory,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CandidateSkill {
    pub name: String,
    pub level: SkillLevel,
    pub years_experience: f64,
    #[serde(default = "CandidateSkill::default_category")]
    pub category: SkillCategory,
}

impl CandidateSkill {
    fn default_category() -> SkillCategory {
        SkillCategory::Technical
    }
}

/// A person offered to the optimizer, with externally supplied workload,
/// availability and collaboration metrics (all 0-100).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CandidateMember {
    pub user_id: String,
    pub display_name: String,
    pub skills: Vec<CandidateSkill>,
    pub overall_score: f64,
    pub workload_percent: f64,
    pub availability_percent: f64,
    pub collaboration_score: f64,
}

impl CandidateMember {
    /// The candidate's matching skill for a requirement, if any.
    pub fn skill_named(&self, name: &str) -> Option<&CandidateSkill> {
        self.skills.iter().find(|skill| skill.name == name)
    }

    /// Whether this candidate satisfies the requirement's level bar.
    pub fn covers(&self, requirement: &SkillRequirement) -> bool {
        self.skill_named(&requirement.skill)
            .map(|skill| skill.level.value() >= requirement.level.value())
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CompositionStrategy {
    CoverageFirst,
    BalanceFirst,
    ExperienceFirst,
    AvailabilityFirst,
}

impl CompositionStrategy {
    pub const ALL: [CompositionStrategy; 4] = [
        CompositionStrategy::CoverageFirst,
        CompositionStrategy::BalanceFirst,
        CompositionStrategy::ExperienceFirst,
        CompositionStrategy::AvailabilityFirst,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CompositionStrategy::CoverageFirst => "coverage_first",
            CompositionStrategy::BalanceFirst => "balance_first",
            CompositionStrategy::ExperienceFirst => "experience_first",
            CompositionStrategy::AvailabilityFirst => "availability_first",
        }
    }

    pub fn label(&self) -> String {
        match self {
            CompositionStrategy::CoverageFirst => "技能覆盖优先".to_string(),
            CompositionStrategy::BalanceFirst => "负载均衡优先".to_string(),
            CompositionStrategy::ExperienceFirst => "经验优先".to_string(),
            CompositionStrategy::AvailabilityFirst => "可用性优先".to_string(),
        }
    }
}

impl fmt::Display for CompositionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ranked staffing proposal. Several are generated (one per strategy)
/// and sorted by overall score; none is mutated after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamComposition {
    pub id: String,
    pub strategy: CompositionStrategy,
    pub label: String,
    pub rank: usize,
    pub members: Vec<CandidateMember>,
    pub requirements: Vec<SkillRequirement>,
    pub coverage_score: f64,
    pub balance_score: f64,
    pub collaboration_score: f64,
    pub overall_score: f64,
    pub conflict_warnings: Vec<String>,
    pub recommendations: Vec<String>,
}
