use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};
use visa_pathway::rules::{RuleBookDocument, RuleBookError, RuleSnapshot, RuleTableStore};
use visa_pathway::workflows::diagnosis::{
    DiagnosisRepository, DiagnosisResult, Pathway, PathwayId, RepositoryError,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) rules: Arc<RuleTableStore>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

const DEFAULT_CACHED_DIAGNOSES: usize = 1024;

/// Keeps the pathways of recent diagnoses so detail lookups can be served without recomputing.
/// Holds at most `capacity` diagnoses; the oldest diagnosis is evicted first.
#[derive(Clone)]
pub(crate) struct InMemoryDiagnosisRepository {
    inner: Arc<Mutex<PathwayCache>>,
}

#[derive(Default)]
struct PathwayCache {
    capacity: usize,
    pathways: HashMap<PathwayId, Pathway>,
    diagnoses: VecDeque<(String, Vec<PathwayId>)>,
}

impl InMemoryDiagnosisRepository {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(PathwayCache {
                capacity: capacity.max(1),
                ..PathwayCache::default()
            })),
        }
    }

    fn poisoned() -> RepositoryError {
        RepositoryError::Unavailable("pathway cache lock poisoned".to_string())
    }
}

impl Default for InMemoryDiagnosisRepository {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHED_DIAGNOSES)
    }
}

impl PathwayCache {
    fn insert(&mut self, result: &DiagnosisResult) {
        let ids: Vec<PathwayId> = result.pathways.iter().map(|p| p.id.clone()).collect();
        for pathway in &result.pathways {
            self.pathways.insert(pathway.id.clone(), pathway.clone());
        }

        // Repeat submissions share an id; refresh in place.
        if let Some(entry) = self
            .diagnoses
            .iter_mut()
            .find(|(diagnosis_id, _)| diagnosis_id == &result.diagnosis_id)
        {
            entry.1 = ids;
            return;
        }

        self.diagnoses.push_back((result.diagnosis_id.clone(), ids));
        while self.diagnoses.len() > self.capacity {
            if let Some((evicted, ids)) = self.diagnoses.pop_front() {
                for id in &ids {
                    self.pathways.remove(id);
                }
                debug!(diagnosis_id = %evicted, "evicted cached diagnosis");
            }
        }
    }
}

impl DiagnosisRepository for InMemoryDiagnosisRepository {
    fn store(&self, result: &DiagnosisResult) -> Result<(), RepositoryError> {
        let mut guard = self.inner.lock().map_err(|_| Self::poisoned())?;
        guard.insert(result);
        Ok(())
    }

    fn find_pathway(&self, id: &PathwayId) -> Result<Option<Pathway>, RepositoryError> {
        let guard = self.inner.lock().map_err(|_| Self::poisoned())?;
        Ok(guard.pathways.get(id).cloned())
    }
}

/// Load the rule book from `path`, falling back to the bundled catalog.
pub(crate) fn load_rule_snapshot(path: Option<&Path>) -> Result<RuleSnapshot, RuleBookError> {
    let source = path
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "built-in".to_string());
    let snapshot = match path {
        Some(path) => RuleSnapshot::from_document(RuleBookDocument::from_path(path)?)?,
        None => RuleSnapshot::standard()?,
    };

    info!(
        version = snapshot.version(),
        states = snapshot.table().state_count(),
        transitions = snapshot.table().transition_count(),
        dangling = snapshot.table().dangling_transitions(),
        %source,
        "rule book loaded"
    );

    Ok(snapshot)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use visa_pathway::workflows::diagnosis::{DiagnosisService, EngineSettings, ProfileSubmission};

    #[test]
    fn repository_serves_stored_pathways() {
        let repository = Arc::new(InMemoryDiagnosisRepository::default());
        let service = DiagnosisService::new(
            Arc::new(RuleTableStore::with_snapshot(
                load_rule_snapshot(None).expect("standard catalog"),
            )),
            repository.clone(),
            EngineSettings::default(),
        );

        let result = service
            .submit(ProfileSubmission {
                nationality: "PH".to_string(),
                age: 29,
                education: "MASTER".to_string(),
                annual_fund: 25_000_000,
                goal: "PERMANENT_RESIDENCE".to_string(),
                priority: "STABILITY".to_string(),
                start_date: None,
            })
            .expect("diagnosis succeeds");

        for pathway in &result.pathways {
            let stored = repository
                .find_pathway(&pathway.id)
                .expect("repository available");
            assert_eq!(stored.as_ref(), Some(pathway));
        }
    }

    fn submission(age: i64) -> ProfileSubmission {
        ProfileSubmission {
            nationality: "VN".to_string(),
            age,
            education: "BACHELOR".to_string(),
            annual_fund: 30_000_000,
            goal: "PERMANENT_RESIDENCE".to_string(),
            priority: "SPEED".to_string(),
            start_date: None,
        }
    }

    #[test]
    fn repository_evicts_oldest_diagnosis_at_capacity() {
        let repository = Arc::new(InMemoryDiagnosisRepository::with_capacity(2));
        let service = DiagnosisService::new(
            Arc::new(RuleTableStore::with_snapshot(
                load_rule_snapshot(None).expect("standard catalog"),
            )),
            repository.clone(),
            EngineSettings::default(),
        );

        let first = service.submit(submission(25)).expect("first diagnosis");
        let second = service.submit(submission(30)).expect("second diagnosis");
        // Resubmitting an existing profile must not push anything out.
        service.submit(submission(25)).expect("repeat diagnosis");
        let first_id = &first.pathways[0].id;
        assert!(repository.find_pathway(first_id).expect("available").is_some());

        let third = service.submit(submission(40)).expect("third diagnosis");

        assert!(repository.find_pathway(first_id).expect("available").is_none());
        for pathway in second.pathways.iter().chain(third.pathways.iter()) {
            assert!(repository
                .find_pathway(&pathway.id)
                .expect("available")
                .is_some());
        }
        let guard = repository.inner.lock().expect("lock");
        assert_eq!(guard.diagnoses.len(), 2);
        assert_eq!(
            guard.pathways.len(),
            second.pathways.len() + third.pathways.len()
        );
    }

    #[test]
    fn missing_rule_book_file_is_an_io_error() {
        let error = load_rule_snapshot(Some(Path::new("/nonexistent/rules.json")))
            .expect_err("file missing");
        assert!(matches!(error, RuleBookError::Io(_)));
    }

    #[test]
    fn parse_date_reports_expected_format() {
        assert_eq!(
            parse_date(" 2026-03-01 "),
            Ok(NaiveDate::from_ymd_opt(2026, 3, 1).expect("valid date"))
        );
        let error = parse_date("03/01/2026").expect_err("format rejected");
        assert!(error.contains("YYYY-MM-DD"));
    }
}
