use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::rules::{
    RuleBookDocument, RuleSnapshot, RuleTableStore, Transition, VisaCategory, VisaCode,
    VisaState, WorkRights,
};
use crate::workflows::diagnosis::domain::{
    ApplicantProfile, DiagnosisResult, Education, Goal, Pathway, PathwayId, Priority,
    ProfileSubmission,
};
use crate::workflows::diagnosis::generator::{generate, CandidateChain, SearchBudget};
use crate::workflows::diagnosis::repository::{DiagnosisRepository, RepositoryError};
use crate::workflows::diagnosis::session::{DiagnosisService, EngineSettings};

pub(super) fn profile() -> ApplicantProfile {
    ApplicantProfile {
        nationality: "VN".to_string(),
        age: 25,
        education: Education::Bachelor,
        annual_fund: 30_000_000,
        goal: Goal::PermanentResidence,
        priority: Priority::Speed,
        start_date: None,
    }
}

pub(super) fn submission() -> ProfileSubmission {
    ProfileSubmission {
        nationality: "vn".to_string(),
        age: 25,
        education: "BACHELOR".to_string(),
        annual_fund: 30_000_000,
        goal: "PERMANENT_RESIDENCE".to_string(),
        priority: "SPEED".to_string(),
        start_date: None,
    }
}

pub(super) fn snapshot() -> RuleSnapshot {
    RuleSnapshot::standard().expect("standard catalog validates")
}

pub(super) fn codes(items: &[&str]) -> Vec<VisaCode> {
    items.iter().map(|item| VisaCode::new(*item)).collect()
}

pub(super) fn chain_codes(chain: &CandidateChain) -> Vec<VisaCode> {
    chain.states.iter().map(|state| state.code.clone()).collect()
}

/// Run the generator against the standard catalog and pick one chain by its codes.
pub(super) fn standard_chain(profile: &ApplicantProfile, wanted: &[&str]) -> CandidateChain {
    let snapshot = snapshot();
    let generated = generate(snapshot.table(), profile, 5, SearchBudget::default())
        .expect("search completes");
    let wanted = codes(wanted);
    generated
        .candidates
        .into_iter()
        .find(|chain| chain_codes(chain) == wanted)
        .unwrap_or_else(|| panic!("chain {wanted:?} not generated"))
}

pub(super) fn state(
    code: &str,
    category: VisaCategory,
    work_rights: WorkRights,
    entry_point: bool,
) -> VisaState {
    VisaState {
        code: VisaCode::new(code),
        name: format!("{code} status"),
        category,
        work_rights,
        processing_months: 1,
        fee_krw: 10_000,
        entry_point,
        prerequisites: Vec::new(),
        requirements: Vec::new(),
        platform_action: None,
    }
}

pub(super) fn transition(from: &str, to: &str, min_stay_months: u32) -> Transition {
    Transition {
        from: VisaCode::new(from),
        to: VisaCode::new(to),
        min_stay_months,
        cost_krw: 100_000,
    }
}

/// Rule book with custom states and transitions but the standard scoring tables.
pub(super) fn document_with(states: Vec<VisaState>, transitions: Vec<Transition>) -> RuleBookDocument {
    RuleBookDocument {
        version: "test-graph".to_string(),
        states,
        transitions,
        scoring: RuleBookDocument::standard().scoring,
    }
}

pub(super) fn standard_with_extra_edge(from: &str, to: &str) -> RuleSnapshot {
    let mut document = RuleBookDocument::standard();
    document.version = format!("standard+{from}->{to}");
    document.transitions.push(transition(from, to, 6));
    RuleSnapshot::from_document(document).expect("dangling edges are accepted at load")
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pathways: Arc<Mutex<HashMap<PathwayId, Pathway>>>,
    stored: Arc<Mutex<Vec<String>>>,
}

impl MemoryRepository {
    pub(super) fn stored_diagnoses(&self) -> Vec<String> {
        self.stored.lock().expect("repository mutex poisoned").clone()
    }
}

impl DiagnosisRepository for MemoryRepository {
    fn store(&self, result: &DiagnosisResult) -> Result<(), RepositoryError> {
        let mut pathways = self.pathways.lock().expect("repository mutex poisoned");
        for pathway in &result.pathways {
            pathways.insert(pathway.id.clone(), pathway.clone());
        }
        self.stored
            .lock()
            .expect("repository mutex poisoned")
            .push(result.diagnosis_id.clone());
        Ok(())
    }

    fn find_pathway(&self, id: &PathwayId) -> Result<Option<Pathway>, RepositoryError> {
        Ok(self
            .pathways
            .lock()
            .expect("repository mutex poisoned")
            .get(id)
            .cloned())
    }
}

pub(super) struct UnavailableRepository;

impl DiagnosisRepository for UnavailableRepository {
    fn store(&self, _result: &DiagnosisResult) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn find_pathway(&self, _id: &PathwayId) -> Result<Option<Pathway>, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }
}

pub(super) fn build_service() -> (Arc<DiagnosisService<MemoryRepository>>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    let store = Arc::new(RuleTableStore::with_snapshot(snapshot()));
    let service = DiagnosisService::new(store, repository.clone(), EngineSettings::default());
    (Arc::new(service), repository)
}

pub(super) fn unready_service() -> Arc<DiagnosisService<MemoryRepository>> {
    Arc::new(DiagnosisService::new(
        Arc::new(RuleTableStore::empty()),
        Arc::new(MemoryRepository::default()),
        EngineSettings::default(),
    ))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
