use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::rules::{PlatformAction, Transition, VisaCategory, VisaCode, VisaState, WorkRights};

/// Highest completed education level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Education {
    HighSchool,
    Bachelor,
    Master,
    Doctorate,
}

impl Education {
    pub const fn as_str(self) -> &'static str {
        match self {
            Education::HighSchool => "HIGH_SCHOOL",
            Education::Bachelor => "BACHELOR",
            Education::Master => "MASTER",
            Education::Doctorate => "DOCTORATE",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match normalize_token(raw).as_str() {
            "HIGH_SCHOOL" => Some(Self::HighSchool),
            "BACHELOR" => Some(Self::Bachelor),
            "MASTER" => Some(Self::Master),
            "DOCTORATE" => Some(Self::Doctorate),
            _ => None,
        }
    }
}

/// Declared immigration goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Goal {
    PermanentResidence,
    Citizenship,
    Work,
    Study,
}

impl Goal {
    pub const fn as_str(self) -> &'static str {
        match self {
            Goal::PermanentResidence => "PERMANENT_RESIDENCE",
            Goal::Citizenship => "CITIZENSHIP",
            Goal::Work => "WORK",
            Goal::Study => "STUDY",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match normalize_token(raw).as_str() {
            "PERMANENT_RESIDENCE" => Some(Self::PermanentResidence),
            "CITIZENSHIP" => Some(Self::Citizenship),
            "WORK" => Some(Self::Work),
            "STUDY" => Some(Self::Study),
            _ => None,
        }
    }

    pub const fn target_category(self) -> VisaCategory {
        match self {
            Goal::PermanentResidence => VisaCategory::PermanentResidence,
            Goal::Citizenship => VisaCategory::Citizenship,
            Goal::Work => VisaCategory::Work,
            Goal::Study => VisaCategory::Study,
        }
    }
}

/// Applicant optimization preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Speed,
    Cost,
    Stability,
    Income,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Speed,
        Priority::Cost,
        Priority::Stability,
        Priority::Income,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Priority::Speed => "SPEED",
            Priority::Cost => "COST",
            Priority::Stability => "STABILITY",
            Priority::Income => "INCOME",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match normalize_token(raw).as_str() {
            "SPEED" => Some(Self::Speed),
            "COST" => Some(Self::Cost),
            "STABILITY" => Some(Self::Stability),
            "INCOME" => Some(Self::Income),
            _ => None,
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Priority::Speed => 0,
            Priority::Cost => 1,
            Priority::Stability => 2,
            Priority::Income => 3,
        }
    }
}

/// Dominant trait of a pathway, used to pick the additive priority weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathwayCharacteristic {
    Fast,
    Affordable,
    HighEarning,
    Stable,
    Balanced,
}

impl PathwayCharacteristic {
    pub const ALL: [PathwayCharacteristic; 5] = [
        PathwayCharacteristic::Fast,
        PathwayCharacteristic::Affordable,
        PathwayCharacteristic::HighEarning,
        PathwayCharacteristic::Stable,
        PathwayCharacteristic::Balanced,
    ];

    pub(crate) const fn index(self) -> usize {
        match self {
            PathwayCharacteristic::Fast => 0,
            PathwayCharacteristic::Affordable => 1,
            PathwayCharacteristic::HighEarning => 2,
            PathwayCharacteristic::Stable => 3,
            PathwayCharacteristic::Balanced => 4,
        }
    }
}

fn normalize_token(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|ch| match ch {
            '-' | ' ' => '_',
            other => other.to_ascii_uppercase(),
        })
        .collect()
}

/// Raw profile as submitted by a client, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSubmission {
    pub nationality: String,
    pub age: i64,
    pub education: String,
    pub annual_fund: i64,
    pub goal: String,
    pub priority: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

/// Validated, normalized applicant attributes. Never persisted by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicantProfile {
    /// ISO 3166-1 alpha-2 code, uppercase.
    pub nationality: String,
    pub age: u8,
    pub education: Education,
    /// Available funds per year in KRW.
    pub annual_fund: u64,
    pub goal: Goal,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

/// Stable identifier of a ranked pathway within a diagnosis.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathwayId(pub String);

impl PathwayId {
    pub fn for_chain(diagnosis_id: &str, chain: &[VisaState]) -> Self {
        let slug = chain
            .iter()
            .map(|state| state.code.slug())
            .collect::<Vec<_>>()
            .join("_");
        Self(format!("{diagnosis_id}.{slug}"))
    }
}

impl fmt::Display for PathwayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One dated step of a pathway with the work rights that apply at that stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub month_from_start: u32,
    pub visa_status: VisaCode,
    pub visa_name: String,
    pub requirements: Vec<String>,
    pub work_rights: WorkRights,
    pub can_work_part_time: bool,
    pub weekly_hours: u8,
    pub estimated_monthly_income: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_action: Option<PlatformAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projected_date: Option<NaiveDate>,
}

/// Named factors of the pathway score, exposed verbatim for the formula display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub base: f64,
    pub age_multiplier: f64,
    pub nationality_multiplier: f64,
    pub fund_multiplier: f64,
    pub education_multiplier: f64,
    pub priority_weight: f64,
    pub characteristic: PathwayCharacteristic,
}

impl ScoreBreakdown {
    pub fn multiplied_base(&self) -> f64 {
        self.base
            * self.age_multiplier
            * self.nationality_multiplier
            * self.fund_multiplier
            * self.education_multiplier
    }

    pub fn final_score(&self) -> i64 {
        (self.multiplied_base() + self.priority_weight).round() as i64
    }

    /// Human readable rendering of the formula with every factor.
    pub fn formula(&self) -> String {
        format!(
            "round({:.1} x {:.2} x {:.2} x {:.2} x {:.2} {} {:.1}) = {}",
            self.base,
            self.age_multiplier,
            self.nationality_multiplier,
            self.fund_multiplier,
            self.education_multiplier,
            if self.priority_weight < 0.0 { "-" } else { "+" },
            self.priority_weight.abs(),
            self.final_score()
        )
    }
}

/// Coarse feasibility bucket derived from the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FeasibilityLabel {
    Low,
    Medium,
    High,
}

impl FeasibilityLabel {
    pub const HIGH_THRESHOLD: i64 = 80;
    pub const MEDIUM_THRESHOLD: i64 = 50;

    pub fn from_score(score: i64) -> Self {
        if score >= Self::HIGH_THRESHOLD {
            FeasibilityLabel::High
        } else if score >= Self::MEDIUM_THRESHOLD {
            FeasibilityLabel::Medium
        } else {
            FeasibilityLabel::Low
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            FeasibilityLabel::High => "High",
            FeasibilityLabel::Medium => "Medium",
            FeasibilityLabel::Low => "Low",
        }
    }
}

/// Ranked candidate visa chain with its score and timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pathway {
    pub id: PathwayId,
    pub visa_chain: Vec<VisaState>,
    pub transitions: Vec<Transition>,
    pub estimated_months: u32,
    pub estimated_cost_krw: u64,
    pub score_breakdown: ScoreBreakdown,
    pub final_score: i64,
    pub feasibility_label: FeasibilityLabel,
    /// False for best-effort chains that stop at the nearest reachable intermediate status.
    pub goal_reached: bool,
    pub milestones: Vec<Milestone>,
}

impl Pathway {
    pub fn chain_label(&self) -> String {
        self.visa_chain
            .iter()
            .map(|state| state.code.as_str())
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

/// Counters describing how the generator explored the rule graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchReport {
    pub explored_chains: usize,
    pub dropped_branches: usize,
    pub goal_reached: bool,
}

/// Output of one diagnosis: profile echo, ranked pathways, and the rule version used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisResult {
    pub diagnosis_id: String,
    pub input_summary: ApplicantProfile,
    pub pathways: Vec<Pathway>,
    pub rule_table_version: String,
    pub search: SearchReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breakdown(priority_weight: f64) -> ScoreBreakdown {
        ScoreBreakdown {
            base: 50.0,
            age_multiplier: 1.2,
            nationality_multiplier: 1.1,
            fund_multiplier: 1.2,
            education_multiplier: 1.0,
            priority_weight,
            characteristic: PathwayCharacteristic::Fast,
        }
    }

    #[test]
    fn final_score_rounds_weighted_product() {
        assert_eq!(breakdown(10.0).final_score(), 89);
        assert_eq!(breakdown(-3.0).final_score(), 76);
    }

    #[test]
    fn formula_lists_every_factor() {
        let formula = breakdown(-3.0).formula();
        assert!(formula.starts_with("round(50.0 x 1.20 x 1.10 x 1.20 x 1.00 - 3.0)"));
        assert!(formula.ends_with("= 76"));
    }

    #[test]
    fn labels_follow_fixed_bands() {
        assert_eq!(FeasibilityLabel::from_score(80), FeasibilityLabel::High);
        assert_eq!(FeasibilityLabel::from_score(79), FeasibilityLabel::Medium);
        assert_eq!(FeasibilityLabel::from_score(50), FeasibilityLabel::Medium);
        assert_eq!(FeasibilityLabel::from_score(49), FeasibilityLabel::Low);
        assert_eq!(FeasibilityLabel::from_score(-5), FeasibilityLabel::Low);
    }

    #[test]
    fn enum_tokens_are_case_and_separator_insensitive() {
        assert_eq!(Education::parse(" bachelor "), Some(Education::Bachelor));
        assert_eq!(Education::parse("high-school"), Some(Education::HighSchool));
        assert_eq!(Goal::parse("permanent residence"), Some(Goal::PermanentResidence));
        assert_eq!(Priority::parse("PHD"), None);
    }
}
