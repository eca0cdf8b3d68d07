//! Pathway diagnosis: profile validation, chain generation, milestone expansion, scoring, and
//! ranking.
//!
//! Control flow for one submission is validate -> generate -> expand -> score -> rank. Every
//! stage is a pure function of the profile and the rule snapshot the request started with.

pub mod batch;
pub mod domain;
mod error;
pub mod generator;
pub mod milestones;
pub mod ranker;
pub mod repository;
pub mod router;
pub mod scoring;
mod session;
mod validation;

#[cfg(test)]
mod tests;

pub use batch::{read_submissions, read_submissions_from_path, BatchImportError};
pub use domain::{
    ApplicantProfile, DiagnosisResult, Education, FeasibilityLabel, Goal, Milestone, Pathway,
    PathwayCharacteristic, PathwayId, Priority, ProfileSubmission, ScoreBreakdown, SearchReport,
};
pub use error::{DiagnosisError, InternalConsistencyError, ValidationError};
pub use generator::{CandidateChain, SearchBudget};
pub use repository::{DiagnosisRepository, DiagnosisSummaryView, RepositoryError};
pub use router::diagnosis_router;
pub use session::{diagnose, diagnosis_fingerprint, DiagnosisService, EngineSettings};
pub use validation::normalize_profile;
