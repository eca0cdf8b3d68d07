use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{Transition, VisaCode, VisaState, WorkRights};
use crate::workflows::diagnosis::scoring::{ScoringModel, ScoringTableError, ScoringTables};

/// Raised when a visa code is referenced but absent from the rule table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown visa code '{code}'")]
pub struct RuleLookupError {
    pub code: VisaCode,
}

/// Serialized rule book as authored by immigration specialists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleBookDocument {
    pub version: String,
    pub states: Vec<VisaState>,
    pub transitions: Vec<Transition>,
    pub scoring: ScoringTables,
}

impl RuleBookDocument {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, RuleBookError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, RuleBookError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }
}

/// Failures raised while loading or validating a rule book.
#[derive(Debug, thiserror::Error)]
pub enum RuleBookError {
    #[error("failed to read rule book: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid rule book JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("rule book version must not be empty")]
    EmptyVersion,
    #[error("visa code '{0}' is defined more than once")]
    DuplicateState(VisaCode),
    #[error("transition '{from}' -> '{to}' is defined more than once")]
    DuplicateTransition { from: VisaCode, to: VisaCode },
    #[error("rule book defines no entry-point visa states")]
    NoEntryStates,
    #[error("visa '{0}' grants part-time work with a zero hour cap")]
    ZeroHourCap(VisaCode),
    #[error(transparent)]
    Scoring(#[from] ScoringTableError),
}

/// Read-only adjacency structure over visa states.
#[derive(Debug, Clone)]
pub struct VisaRuleTable {
    states: BTreeMap<VisaCode, VisaState>,
    transitions: BTreeMap<VisaCode, Vec<Transition>>,
    entry_points: Vec<VisaCode>,
    dangling_transitions: usize,
}

impl VisaRuleTable {
    pub fn new(states: Vec<VisaState>, transitions: Vec<Transition>) -> Result<Self, RuleBookError> {
        let mut by_code = BTreeMap::new();
        for state in states {
            if let WorkRights::PartTime { weekly_hours_cap: 0 } = state.work_rights {
                return Err(RuleBookError::ZeroHourCap(state.code));
            }
            if by_code.contains_key(&state.code) {
                return Err(RuleBookError::DuplicateState(state.code));
            }
            by_code.insert(state.code.clone(), state);
        }

        let entry_points: Vec<VisaCode> = by_code
            .values()
            .filter(|state| state.entry_point)
            .map(|state| state.code.clone())
            .collect();
        if entry_points.is_empty() {
            return Err(RuleBookError::NoEntryStates);
        }

        let mut dangling_transitions = 0;
        let mut adjacency: BTreeMap<VisaCode, Vec<Transition>> = BTreeMap::new();
        let mut seen_edges = BTreeSet::new();
        for transition in transitions {
            // Pathway ids are derived from the visa codes alone, so each edge must be unique.
            if !seen_edges.insert((transition.from.clone(), transition.to.clone())) {
                return Err(RuleBookError::DuplicateTransition {
                    from: transition.from,
                    to: transition.to,
                });
            }
            let known = [&transition.from, &transition.to]
                .iter()
                .all(|code| by_code.contains_key(*code));
            if !known {
                dangling_transitions += 1;
                warn!(
                    from = %transition.from,
                    to = %transition.to,
                    "transition references an unknown visa code"
                );
            }
            adjacency
                .entry(transition.from.clone())
                .or_default()
                .push(transition);
        }
        for edges in adjacency.values_mut() {
            edges.sort_by(|left, right| left.to.cmp(&right.to));
        }

        Ok(Self {
            states: by_code,
            transitions: adjacency,
            entry_points,
            dangling_transitions,
        })
    }

    pub fn get_visa_state(&self, code: &VisaCode) -> Result<&VisaState, RuleLookupError> {
        self.states.get(code).ok_or_else(|| RuleLookupError {
            code: code.clone(),
        })
    }

    /// Outgoing transitions of a known state; targets are resolved lazily by the caller.
    pub fn transitions_from(&self, code: &VisaCode) -> Result<&[Transition], RuleLookupError> {
        if !self.states.contains_key(code) {
            return Err(RuleLookupError { code: code.clone() });
        }
        Ok(self
            .transitions
            .get(code)
            .map(Vec::as_slice)
            .unwrap_or_default())
    }

    pub fn entry_states(&self) -> impl Iterator<Item = &VisaState> {
        self.entry_points
            .iter()
            .filter_map(|code| self.states.get(code))
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.values().map(Vec::len).sum()
    }

    pub fn dangling_transitions(&self) -> usize {
        self.dangling_transitions
    }
}

/// Immutable, versioned bundle of the rule table and the scoring model.
#[derive(Debug, Clone)]
pub struct RuleSnapshot {
    version: String,
    table: VisaRuleTable,
    scoring: ScoringModel,
}

impl RuleSnapshot {
    pub fn from_document(document: RuleBookDocument) -> Result<Self, RuleBookError> {
        let version = document.version.trim().to_string();
        if version.is_empty() {
            return Err(RuleBookError::EmptyVersion);
        }

        let table = VisaRuleTable::new(document.states, document.transitions)?;
        let scoring = ScoringModel::try_from_tables(document.scoring)?;

        Ok(Self {
            version,
            table,
            scoring,
        })
    }

    /// Snapshot built from the bundled standard catalog.
    pub fn standard() -> Result<Self, RuleBookError> {
        Self::from_document(RuleBookDocument::standard())
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn table(&self) -> &VisaRuleTable {
        &self.table
    }

    pub fn scoring(&self) -> &ScoringModel {
        &self.scoring
    }
}
