//! Weighted multi-factor pathway scoring.
//!
//! `final = round(base x age x nationality x fund x education + priority_weight)`. Every factor is
//! a table lookup against the active [`ScoringModel`], so identical inputs always reproduce the
//! same breakdown.

mod config;
mod factors;

pub use config::{
    AgeBand, CharacteristicThresholds, EducationTable, FundStep, FundTable, GoalBase,
    PriorityWeightEntry, PriorityWeightTable, ScoringModel, ScoringTableError, ScoringTables,
};
pub use factors::{FUND_MULTIPLIER_CEILING, FUND_MULTIPLIER_FLOOR};

pub(crate) use config::{MAX_APPLICANT_AGE, MIN_APPLICANT_AGE};

use super::domain::{ApplicantProfile, ScoreBreakdown};
use super::error::InternalConsistencyError;
use super::milestones::ExpandedCandidate;

/// Compute the named score factors of an expanded pathway for a profile.
pub fn score_pathway(
    candidate: &ExpandedCandidate,
    profile: &ApplicantProfile,
    model: &ScoringModel,
) -> Result<ScoreBreakdown, InternalConsistencyError> {
    let tables = model.tables();

    let age_multiplier = model
        .age_multiplier_for(profile.age)
        .ok_or(InternalConsistencyError::AgeOutsideBands(profile.age))?;
    let nationality_multiplier = factors::nationality_multiplier(tables, &profile.nationality);
    let required = factors::required_fund(&candidate.chain.states, &tables.fund);
    let fund_multiplier = factors::fund_multiplier(&tables.fund, profile.annual_fund, required);
    let education_multiplier = tables.education.for_level(profile.education);
    let characteristic = factors::classify(candidate, &tables.characteristics);
    let priority_weight = model
        .priority_weights()
        .weight(characteristic, profile.priority);

    let breakdown = ScoreBreakdown {
        base: tables.goal_base.for_goal(profile.goal),
        age_multiplier,
        nationality_multiplier,
        fund_multiplier,
        education_multiplier,
        priority_weight,
        characteristic,
    };

    for (factor, value) in [
        ("base", breakdown.base),
        ("age_multiplier", breakdown.age_multiplier),
        ("nationality_multiplier", breakdown.nationality_multiplier),
        ("fund_multiplier", breakdown.fund_multiplier),
        ("education_multiplier", breakdown.education_multiplier),
    ] {
        if !(value.is_finite() && value > 0.0) {
            return Err(InternalConsistencyError::NonPositiveFactor { factor });
        }
    }
    if !breakdown.priority_weight.is_finite() {
        return Err(InternalConsistencyError::NonPositiveFactor {
            factor: "priority_weight",
        });
    }

    Ok(breakdown)
}
