use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tracing::{error, info, warn};

use super::domain::{ApplicantProfile, DiagnosisResult, Pathway, PathwayId, ProfileSubmission};
use super::error::DiagnosisError;
use super::generator::{generate, SearchBudget};
use super::milestones::expand;
use super::ranker::{rank, ScoredCandidate};
use super::repository::DiagnosisRepository;
use super::scoring::score_pathway;
use super::validation::normalize_profile;
use crate::rules::{RuleSnapshot, RuleTableStore};

/// Search bounds applied to every diagnosis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub max_chain_length: usize,
    pub top_n: usize,
    pub max_expansions: usize,
    pub search_timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        let budget = SearchBudget::default();
        Self {
            max_chain_length: 5,
            top_n: 5,
            max_expansions: budget.max_expansions,
            search_timeout: budget.timeout,
        }
    }
}

impl EngineSettings {
    pub fn budget(&self) -> SearchBudget {
        SearchBudget {
            max_expansions: self.max_expansions,
            timeout: self.search_timeout,
        }
    }
}

/// Deterministic identifier of a (profile, rule version) pair, stable across builds.
pub fn diagnosis_fingerprint(profile: &ApplicantProfile, rule_table_version: &str) -> String {
    let start_date = profile
        .start_date
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    let canonical = format!(
        "{}|{}|{}|{}|{}|{}|{}|{}",
        profile.nationality,
        profile.age,
        profile.education.as_str(),
        profile.annual_fund,
        profile.goal.as_str(),
        profile.priority.as_str(),
        start_date,
        rule_table_version,
    );

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let digest = hasher.finalize();
    let short: String = digest[..8].iter().map(|byte| format!("{byte:02x}")).collect();
    format!("dx-{short}")
}

/// Run generator, expander, scorer, and ranker for one validated profile.
///
/// Pure with respect to `(profile, snapshot)`: no I/O, no shared mutable state.
pub fn diagnose(
    profile: ApplicantProfile,
    snapshot: &RuleSnapshot,
    settings: &EngineSettings,
) -> Result<DiagnosisResult, DiagnosisError> {
    let diagnosis_id = diagnosis_fingerprint(&profile, snapshot.version());
    let generated = generate(
        snapshot.table(),
        &profile,
        settings.max_chain_length,
        settings.budget(),
    )?;

    let mut scored = Vec::with_capacity(generated.candidates.len());
    for chain in generated.candidates {
        let expanded = expand(chain, &profile, snapshot.scoring())?;
        let breakdown = score_pathway(&expanded, &profile, snapshot.scoring())?;
        scored.push(ScoredCandidate {
            expanded,
            breakdown,
        });
    }

    let pathways = rank(scored, settings.top_n, &diagnosis_id);

    Ok(DiagnosisResult {
        diagnosis_id,
        input_summary: profile,
        pathways,
        rule_table_version: snapshot.version().to_string(),
        search: generated.report,
    })
}

/// Service composing profile validation, the shared rule store, and result storage.
pub struct DiagnosisService<R> {
    rules: Arc<RuleTableStore>,
    repository: Arc<R>,
    settings: EngineSettings,
}

impl<R> DiagnosisService<R>
where
    R: DiagnosisRepository + 'static,
{
    pub fn new(rules: Arc<RuleTableStore>, repository: Arc<R>, settings: EngineSettings) -> Self {
        Self {
            rules,
            repository,
            settings,
        }
    }

    /// Validate and diagnose a submitted profile against the current rule snapshot.
    pub fn submit(
        &self,
        submission: ProfileSubmission,
    ) -> Result<DiagnosisResult, DiagnosisError> {
        let profile = normalize_profile(submission)?;
        let snapshot = self.rules.snapshot().ok_or(DiagnosisError::ServiceNotReady)?;

        let result = match diagnose(profile, &snapshot, &self.settings) {
            Ok(result) => result,
            Err(DiagnosisError::Internal(failure)) => {
                error!(%failure, version = snapshot.version(), "diagnosis aborted");
                return Err(DiagnosisError::Internal(failure));
            }
            Err(other) => return Err(other),
        };

        info!(
            diagnosis_id = %result.diagnosis_id,
            version = %result.rule_table_version,
            pathways = result.pathways.len(),
            dropped_branches = result.search.dropped_branches,
            "diagnosis completed"
        );

        if let Err(failure) = self.repository.store(&result) {
            warn!(%failure, diagnosis_id = %result.diagnosis_id, "diagnosis result not stored");
        }

        Ok(result)
    }

    /// Look up a pathway from a previously stored diagnosis.
    pub fn pathway_detail(&self, id: &PathwayId) -> Result<Pathway, DiagnosisError> {
        self.repository
            .find_pathway(id)?
            .ok_or_else(|| DiagnosisError::NotFound(id.clone()))
    }

    pub fn rules(&self) -> &Arc<RuleTableStore> {
        &self.rules
    }
}
