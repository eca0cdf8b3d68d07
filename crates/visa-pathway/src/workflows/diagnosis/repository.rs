use serde::Serialize;

use super::domain::{DiagnosisResult, FeasibilityLabel, Pathway, PathwayId};

/// External store that keeps diagnosis results for later pathway lookups.
pub trait DiagnosisRepository: Send + Sync {
    fn store(&self, result: &DiagnosisResult) -> Result<(), RepositoryError>;
    fn find_pathway(&self, id: &PathwayId) -> Result<Option<Pathway>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Condensed, presentation-friendly view of a diagnosis.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosisSummaryView {
    pub diagnosis_id: String,
    pub rule_table_version: String,
    pub pathway_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_pathway: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_score: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_feasibility: Option<FeasibilityLabel>,
}

impl DiagnosisResult {
    pub fn summary_view(&self) -> DiagnosisSummaryView {
        let top = self.pathways.first();
        DiagnosisSummaryView {
            diagnosis_id: self.diagnosis_id.clone(),
            rule_table_version: self.rule_table_version.clone(),
            pathway_count: self.pathways.len(),
            top_pathway: top.map(Pathway::chain_label),
            top_score: top.map(|pathway| pathway.final_score),
            top_feasibility: top.map(|pathway| pathway.feasibility_label),
        }
    }

    pub fn pathway(&self, id: &PathwayId) -> Option<&Pathway> {
        self.pathways.iter().find(|pathway| &pathway.id == id)
    }
}
