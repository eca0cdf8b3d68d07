use super::domain::PathwayId;
use super::repository::RepositoryError;
use crate::rules::VisaCode;

/// Malformed profile field; the caller may fix the field and resubmit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub(crate) fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Invariant violation inside the engine. Signals a bug or a misconfigured rule book.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InternalConsistencyError {
    #[error("candidate chain is empty")]
    EmptyChain,
    #[error("chain has {states} states but {transitions} transitions")]
    MalformedChain { states: usize, transitions: usize },
    #[error("milestone {index} starts before its predecessor")]
    NonMonotonicMilestones { index: usize },
    #[error("milestone at month {month} exceeds estimated duration of {estimated} months")]
    MilestoneBeyondEstimate { month: u32, estimated: u32 },
    #[error("milestone for {code} has inconsistent work eligibility")]
    WorkEligibilityMismatch { code: VisaCode },
    #[error("score factor {factor} is not strictly positive and finite")]
    NonPositiveFactor { factor: &'static str },
    #[error("no age band covers age {0}")]
    AgeOutsideBands(u8),
    #[error("pathway search exceeded its budget after {expansions} expansions")]
    SearchBudgetExceeded { expansions: usize },
}

/// Failure of a diagnosis request. Callers render an empty pathway list with [`Self::reason_code`].
#[derive(Debug, thiserror::Error)]
pub enum DiagnosisError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("visa rule table is not loaded yet; retry shortly")]
    ServiceNotReady,
    #[error("diagnosis failed due to an internal error")]
    Internal(#[from] InternalConsistencyError),
    #[error("pathway '{0}' not found")]
    NotFound(PathwayId),
    #[error("diagnosis store unavailable")]
    Repository(#[from] RepositoryError),
}

impl DiagnosisError {
    pub const fn reason_code(&self) -> &'static str {
        match self {
            DiagnosisError::Validation(_) => "validation_error",
            DiagnosisError::ServiceNotReady => "service_not_ready",
            DiagnosisError::Internal(_) => "internal_error",
            DiagnosisError::NotFound(_) => "not_found",
            DiagnosisError::Repository(_) => "repository_unavailable",
        }
    }

    pub fn field(&self) -> Option<&'static str> {
        match self {
            DiagnosisError::Validation(error) => Some(error.field),
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, DiagnosisError::ServiceNotReady)
    }
}
