use std::cmp::Ordering;

use super::domain::{FeasibilityLabel, Pathway, PathwayId, ScoreBreakdown};
use super::milestones::ExpandedCandidate;

/// Highest label a best-effort chain that stops short of the goal can receive.
pub const BEST_EFFORT_CEILING: FeasibilityLabel = FeasibilityLabel::Medium;

/// Expanded candidate paired with its score factors, ready to be ranked.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub expanded: ExpandedCandidate,
    pub breakdown: ScoreBreakdown,
}

/// Sort by score, then by shorter duration, then by lower cost; keep the top `top_n`.
pub fn rank(candidates: Vec<ScoredCandidate>, top_n: usize, diagnosis_id: &str) -> Vec<Pathway> {
    let mut pathways: Vec<Pathway> = candidates
        .into_iter()
        .map(|candidate| into_pathway(candidate, diagnosis_id))
        .collect();

    pathways.sort_by(compare_pathways);
    pathways.truncate(top_n);
    pathways
}

fn into_pathway(candidate: ScoredCandidate, diagnosis_id: &str) -> Pathway {
    let ScoredCandidate {
        expanded,
        breakdown,
    } = candidate;
    let chain = expanded.chain;

    let final_score = breakdown.final_score();
    let mut feasibility_label = FeasibilityLabel::from_score(final_score);
    if !chain.goal_reached {
        feasibility_label = feasibility_label.min(BEST_EFFORT_CEILING);
    }

    Pathway {
        id: PathwayId::for_chain(diagnosis_id, &chain.states),
        visa_chain: chain.states,
        transitions: chain.transitions,
        estimated_months: chain.estimated_months,
        estimated_cost_krw: chain.estimated_cost_krw,
        score_breakdown: breakdown,
        final_score,
        feasibility_label,
        goal_reached: chain.goal_reached,
        milestones: expanded.milestones,
    }
}

fn compare_pathways(left: &Pathway, right: &Pathway) -> Ordering {
    right
        .final_score
        .cmp(&left.final_score)
        .then_with(|| left.estimated_months.cmp(&right.estimated_months))
        .then_with(|| left.estimated_cost_krw.cmp(&right.estimated_cost_krw))
        .then_with(|| left.id.cmp(&right.id))
}
