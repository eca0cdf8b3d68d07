//! Versioned visa knowledge base: visa states, legal transitions, and prerequisite predicates.
//!
//! A [`RuleSnapshot`] is built once from a [`RuleBookDocument`] and never mutated afterwards.
//! Hot reloads publish a brand new snapshot through [`RuleTableStore`].

mod catalog;
mod store;
mod table;

pub use store::RuleTableStore;
pub use table::{RuleBookDocument, RuleBookError, RuleLookupError, RuleSnapshot, VisaRuleTable};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::workflows::diagnosis::domain::{ApplicantProfile, Education, Goal};

/// Weekly hours assumed for a status with unrestricted work rights.
pub const FULL_TIME_WEEKLY_HOURS: u8 = 40;

/// Visa status code as printed on a residence card (e.g. `E-7`, `F-2-7`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisaCode(pub String);

impl VisaCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercase, URL-safe rendering used inside pathway identifiers.
    pub fn slug(&self) -> String {
        self.0
            .trim()
            .chars()
            .map(|ch| {
                if ch.is_ascii_alphanumeric() {
                    ch.to_ascii_lowercase()
                } else {
                    '-'
                }
            })
            .collect()
    }
}

impl fmt::Display for VisaCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Broad class of a visa status, used for goal matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisaCategory {
    LanguageStudy,
    Study,
    JobSeeking,
    Work,
    Investment,
    Residence,
    PermanentResidence,
    Citizenship,
}

impl VisaCategory {
    pub fn satisfies(self, goal: Goal) -> bool {
        match goal {
            Goal::PermanentResidence => self == VisaCategory::PermanentResidence,
            Goal::Citizenship => self == VisaCategory::Citizenship,
            Goal::Work => matches!(self, VisaCategory::Work | VisaCategory::Investment),
            Goal::Study => self == VisaCategory::Study,
        }
    }

    /// Position on the settlement ladder, from first entry towards naturalization.
    pub const fn progress(self) -> u8 {
        match self {
            VisaCategory::LanguageStudy => 1,
            VisaCategory::Study => 2,
            VisaCategory::JobSeeking => 3,
            VisaCategory::Work | VisaCategory::Investment => 4,
            VisaCategory::Residence => 5,
            VisaCategory::PermanentResidence => 6,
            VisaCategory::Citizenship => 7,
        }
    }

    /// Ladder distance between this category and the one a goal requires.
    pub fn distance_to(self, goal: Goal) -> u8 {
        self.progress().abs_diff(goal.target_category().progress())
    }
}

/// Legal work rights attached to a visa status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkRights {
    None,
    PartTime { weekly_hours_cap: u8 },
    Full,
}

impl WorkRights {
    pub fn permits_work(self) -> bool {
        !matches!(self, WorkRights::None)
    }

    pub fn weekly_hours(self) -> u8 {
        match self {
            WorkRights::None => 0,
            WorkRights::PartTime { weekly_hours_cap } => weekly_hours_cap,
            WorkRights::Full => FULL_TIME_WEEKLY_HOURS,
        }
    }
}

/// Pointer to a follow-up workflow offered by the platform at a given step.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlatformAction {
    pub workflow: String,
    pub label: String,
}

/// Predicate that must hold before an applicant may enter a visa state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Prerequisite {
    MinEducation { level: Education },
    AgeRange { min: u8, max: u8 },
    MinAnnualFund { krw: u64 },
    NationalityIn { codes: Vec<String> },
    /// One of the listed statuses must have been held earlier in the chain.
    PriorStatus { any_of: Vec<VisaCode> },
    AnyOf { options: Vec<Prerequisite> },
}

impl Prerequisite {
    pub fn is_met(&self, profile: &ApplicantProfile, history: &[VisaCode]) -> bool {
        match self {
            Prerequisite::MinEducation { level } => profile.education >= *level,
            Prerequisite::AgeRange { min, max } => (*min..=*max).contains(&profile.age),
            Prerequisite::MinAnnualFund { krw } => profile.annual_fund >= *krw,
            Prerequisite::NationalityIn { codes } => codes
                .iter()
                .any(|code| code.eq_ignore_ascii_case(&profile.nationality)),
            Prerequisite::PriorStatus { any_of } => {
                history.iter().any(|held| any_of.contains(held))
            }
            Prerequisite::AnyOf { options } => options
                .iter()
                .any(|option| option.is_met(profile, history)),
        }
    }
}

/// A single visa status with its work rights and entry conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisaState {
    pub code: VisaCode,
    pub name: String,
    pub category: VisaCategory,
    pub work_rights: WorkRights,
    pub processing_months: u32,
    pub fee_krw: u64,
    /// Whether the status can be applied for directly from abroad.
    #[serde(default)]
    pub entry_point: bool,
    #[serde(default)]
    pub prerequisites: Vec<Prerequisite>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_action: Option<PlatformAction>,
}

impl VisaState {
    pub fn admits(&self, profile: &ApplicantProfile, history: &[VisaCode]) -> bool {
        self.prerequisites
            .iter()
            .all(|prerequisite| prerequisite.is_met(profile, history))
    }

    /// Highest proof-of-funds amount demanded directly by this status.
    pub fn required_fund(&self) -> Option<u64> {
        self.prerequisites
            .iter()
            .filter_map(|prerequisite| match prerequisite {
                Prerequisite::MinAnnualFund { krw } => Some(*krw),
                _ => None,
            })
            .max()
    }
}

/// Legal move from one status to another with its minimum stay and cost.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transition {
    pub from: VisaCode,
    pub to: VisaCode,
    pub min_stay_months: u32,
    pub cost_krw: u64,
}
