use super::super::domain::PathwayCharacteristic;
use super::super::milestones::ExpandedCandidate;
use super::config::{CharacteristicThresholds, FundTable, ScoringTables};
use crate::rules::{VisaCategory, VisaState};

pub const FUND_MULTIPLIER_FLOOR: f64 = 0.5;
pub const FUND_MULTIPLIER_CEILING: f64 = 1.5;

pub(crate) fn nationality_multiplier(tables: &ScoringTables, nationality: &str) -> f64 {
    tables
        .nationality_multipliers
        .iter()
        .find(|(code, _)| code.eq_ignore_ascii_case(nationality))
        .map(|(_, multiplier)| *multiplier)
        .unwrap_or(tables.default_nationality_multiplier)
}

/// Proof-of-funds bar of a chain: the strictest status minimum, or the table reference.
pub(crate) fn required_fund(chain: &[VisaState], fund: &FundTable) -> u64 {
    chain
        .iter()
        .filter_map(VisaState::required_fund)
        .max()
        .unwrap_or(fund.reference_krw)
        .max(1)
}

pub(crate) fn fund_multiplier(fund: &FundTable, annual_fund: u64, required_krw: u64) -> f64 {
    let ratio = annual_fund as f64 / required_krw.max(1) as f64;
    let stepped = fund
        .steps
        .iter()
        .take_while(|step| step.min_ratio <= ratio)
        .last()
        .map(|step| step.multiplier)
        .unwrap_or(FUND_MULTIPLIER_FLOOR);

    stepped.clamp(FUND_MULTIPLIER_FLOOR, FUND_MULTIPLIER_CEILING)
}

/// Pick the single trait the pathway is best known for; earlier checks win.
pub(crate) fn classify(
    candidate: &ExpandedCandidate,
    thresholds: &CharacteristicThresholds,
) -> PathwayCharacteristic {
    let chain = &candidate.chain;
    if chain.estimated_months <= thresholds.fast_months {
        return PathwayCharacteristic::Fast;
    }
    if chain.estimated_cost_krw <= thresholds.affordable_cost_krw {
        return PathwayCharacteristic::Affordable;
    }

    let peak_income = candidate
        .milestones
        .iter()
        .map(|milestone| milestone.estimated_monthly_income)
        .max()
        .unwrap_or(0);
    if peak_income >= thresholds.high_income_monthly_krw {
        return PathwayCharacteristic::HighEarning;
    }

    let settles = chain.states.last().map(|state| {
        matches!(
            state.category,
            VisaCategory::PermanentResidence | VisaCategory::Citizenship
        )
    });
    if settles == Some(true) {
        return PathwayCharacteristic::Stable;
    }

    PathwayCharacteristic::Balanced
}
