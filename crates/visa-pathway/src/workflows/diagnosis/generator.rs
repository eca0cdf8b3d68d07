//! Bounded search over the visa transition graph.
//!
//! The search deepens one chain length at a time. Each layer is a breadth-first expansion of
//! the previous layer's open chains, so the depth bound and the cycle check are explicit.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::domain::{ApplicantProfile, SearchReport};
use super::error::InternalConsistencyError;
use crate::rules::{Transition, VisaCode, VisaRuleTable, VisaState};

/// Guard against rule tables with an unexpectedly large branching factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBudget {
    pub max_expansions: usize,
    pub timeout: Duration,
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self {
            max_expansions: 10_000,
            timeout: Duration::from_millis(250),
        }
    }
}

/// Candidate visa chain with provisional duration and cost estimates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateChain {
    pub states: Vec<VisaState>,
    pub transitions: Vec<Transition>,
    pub estimated_months: u32,
    pub estimated_cost_krw: u64,
    pub goal_reached: bool,
}

impl CandidateChain {
    pub fn codes(&self) -> Vec<&VisaCode> {
        self.states.iter().map(|state| &state.code).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedCandidates {
    pub candidates: Vec<CandidateChain>,
    pub report: SearchReport,
}

#[derive(Clone)]
struct OpenChain<'a> {
    states: Vec<&'a VisaState>,
    transitions: Vec<&'a Transition>,
}

impl<'a> OpenChain<'a> {
    fn start(state: &'a VisaState) -> Self {
        Self {
            states: vec![state],
            transitions: Vec::new(),
        }
    }

    fn terminal(&self) -> &'a VisaState {
        self.states[self.states.len() - 1]
    }

    fn history(&self) -> Vec<VisaCode> {
        self.states.iter().map(|state| state.code.clone()).collect()
    }

    fn visits(&self, code: &VisaCode) -> bool {
        self.states.iter().any(|state| &state.code == code)
    }

    fn extend(&self, transition: &'a Transition, next: &'a VisaState) -> Self {
        let mut extended = self.clone();
        extended.transitions.push(transition);
        extended.states.push(next);
        extended
    }

    fn into_candidate(self, goal_reached: bool) -> CandidateChain {
        let estimated_months = self
            .states
            .iter()
            .map(|state| state.processing_months)
            .chain(self.transitions.iter().map(|edge| edge.min_stay_months))
            .fold(0u32, u32::saturating_add);
        let estimated_cost_krw = self
            .states
            .iter()
            .map(|state| state.fee_krw)
            .chain(self.transitions.iter().map(|edge| edge.cost_krw))
            .fold(0u64, u64::saturating_add);

        CandidateChain {
            states: self.states.into_iter().cloned().collect(),
            transitions: self.transitions.into_iter().cloned().collect(),
            estimated_months,
            estimated_cost_krw,
            goal_reached,
        }
    }
}

struct BudgetTracker {
    budget: SearchBudget,
    started: Instant,
    expansions: usize,
}

impl BudgetTracker {
    fn new(budget: SearchBudget) -> Self {
        Self {
            budget,
            started: Instant::now(),
            expansions: 0,
        }
    }

    fn charge(&mut self) -> Result<(), InternalConsistencyError> {
        self.expansions += 1;
        if self.expansions > self.budget.max_expansions
            || self.started.elapsed() > self.budget.timeout
        {
            return Err(InternalConsistencyError::SearchBudgetExceeded {
                expansions: self.expansions,
            });
        }
        Ok(())
    }
}

/// Enumerate every admissible chain of at most `max_chain_length` states that ends at the goal.
///
/// When no chain reaches the goal, the chains ending closest to it on the settlement ladder
/// are returned instead with `goal_reached = false`.
pub fn generate(
    table: &VisaRuleTable,
    profile: &ApplicantProfile,
    max_chain_length: usize,
    budget: SearchBudget,
) -> Result<GeneratedCandidates, InternalConsistencyError> {
    let mut tracker = BudgetTracker::new(budget);
    let mut report = SearchReport::default();
    let mut reached: Vec<OpenChain<'_>> = Vec::new();
    let mut intermediates: Vec<OpenChain<'_>> = Vec::new();

    let mut frontier: Vec<OpenChain<'_>> = table
        .entry_states()
        .filter(|state| state.admits(profile, &[]))
        .map(OpenChain::start)
        .collect();

    for depth in 1..=max_chain_length {
        if frontier.is_empty() {
            break;
        }

        let mut next_layer = Vec::new();
        for chain in frontier.drain(..) {
            report.explored_chains += 1;
            let terminal = chain.terminal();

            if terminal.category.satisfies(profile.goal) {
                reached.push(chain);
                continue;
            }
            if depth == max_chain_length {
                intermediates.push(chain);
                continue;
            }

            let transitions = match table.transitions_from(&terminal.code) {
                Ok(transitions) => transitions,
                Err(error) => {
                    warn!(%error, "dropping branch with unknown origin");
                    report.dropped_branches += 1;
                    intermediates.push(chain);
                    continue;
                }
            };

            let history = chain.history();
            for transition in transitions {
                tracker.charge()?;

                let next = match table.get_visa_state(&transition.to) {
                    Ok(state) => state,
                    Err(error) => {
                        warn!(from = %transition.from, %error, "dropping branch");
                        report.dropped_branches += 1;
                        continue;
                    }
                };
                if chain.visits(&next.code) || !next.admits(profile, &history) {
                    continue;
                }
                next_layer.push(chain.extend(transition, next));
            }

            intermediates.push(chain);
        }

        frontier = next_layer;
    }

    report.goal_reached = !reached.is_empty();
    let candidates: Vec<CandidateChain> = if report.goal_reached {
        reached
            .into_iter()
            .map(|chain| chain.into_candidate(true))
            .collect()
    } else {
        nearest_to_goal(intermediates, profile)
            .into_iter()
            .map(|chain| chain.into_candidate(false))
            .collect()
    };

    debug!(
        candidates = candidates.len(),
        explored = report.explored_chains,
        dropped = report.dropped_branches,
        expansions = tracker.expansions,
        "pathway search finished"
    );

    Ok(GeneratedCandidates { candidates, report })
}

fn nearest_to_goal<'a>(
    chains: Vec<OpenChain<'a>>,
    profile: &ApplicantProfile,
) -> Vec<OpenChain<'a>> {
    let best = chains
        .iter()
        .map(|chain| chain.terminal().category.distance_to(profile.goal))
        .min();

    match best {
        Some(best) => chains
            .into_iter()
            .filter(|chain| chain.terminal().category.distance_to(profile.goal) == best)
            .collect(),
        None => Vec::new(),
    }
}
