use chrono::Months;

use super::domain::{ApplicantProfile, Milestone};
use super::error::InternalConsistencyError;
use super::generator::CandidateChain;
use super::scoring::ScoringModel;

/// Candidate chain with its dated milestones attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedCandidate {
    pub chain: CandidateChain,
    pub milestones: Vec<Milestone>,
}

/// Convert a chain into dated milestones with per-step work eligibility.
///
/// A status is reached once its predecessor's minimum stay and its own processing time have
/// elapsed, so the last milestone lands exactly on the chain's estimated duration.
pub fn expand(
    chain: CandidateChain,
    profile: &ApplicantProfile,
    model: &ScoringModel,
) -> Result<ExpandedCandidate, InternalConsistencyError> {
    if chain.states.is_empty() {
        return Err(InternalConsistencyError::EmptyChain);
    }
    if chain.transitions.len() + 1 != chain.states.len() {
        return Err(InternalConsistencyError::MalformedChain {
            states: chain.states.len(),
            transitions: chain.transitions.len(),
        });
    }

    let wage_reference = model.tables().wage_reference_krw.for_level(profile.education);
    let mut milestones = Vec::with_capacity(chain.states.len());
    let mut month = 0u32;

    for (index, state) in chain.states.iter().enumerate() {
        let stay = if index == 0 {
            0
        } else {
            chain.transitions[index - 1].min_stay_months
        };
        month = month
            .saturating_add(stay)
            .saturating_add(state.processing_months);

        let can_work_part_time = state.work_rights.permits_work();
        let weekly_hours = if can_work_part_time {
            state.work_rights.weekly_hours()
        } else {
            0
        };
        let estimated_monthly_income = if can_work_part_time {
            (f64::from(weekly_hours) * wage_reference).round() as u64
        } else {
            0
        };
        let projected_date = profile
            .start_date
            .and_then(|start| start.checked_add_months(Months::new(month)));

        milestones.push(Milestone {
            month_from_start: month,
            visa_status: state.code.clone(),
            visa_name: state.name.clone(),
            requirements: state.requirements.clone(),
            work_rights: state.work_rights,
            can_work_part_time,
            weekly_hours,
            estimated_monthly_income,
            platform_action: state.platform_action.clone(),
            projected_date,
        });
    }

    verify_milestones(&milestones, chain.estimated_months)?;

    Ok(ExpandedCandidate { chain, milestones })
}

/// Reject timelines that break ordering or work-eligibility invariants.
pub(crate) fn verify_milestones(
    milestones: &[Milestone],
    estimated_months: u32,
) -> Result<(), InternalConsistencyError> {
    for (index, pair) in milestones.windows(2).enumerate() {
        if pair[1].month_from_start < pair[0].month_from_start {
            return Err(InternalConsistencyError::NonMonotonicMilestones { index: index + 1 });
        }
    }

    if let Some(last) = milestones.last() {
        if last.month_from_start > estimated_months {
            return Err(InternalConsistencyError::MilestoneBeyondEstimate {
                month: last.month_from_start,
                estimated: estimated_months,
            });
        }
    }

    for milestone in milestones {
        let idle_worker = milestone.can_work_part_time && milestone.weekly_hours == 0;
        let unlawful_income =
            !milestone.can_work_part_time && milestone.estimated_monthly_income > 0;
        if idle_worker || unlawful_income {
            return Err(InternalConsistencyError::WorkEligibilityMismatch {
                code: milestone.visa_status.clone(),
            });
        }
    }

    Ok(())
}
