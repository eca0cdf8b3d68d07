use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::json;
use tracing::warn;

use super::domain::{PathwayId, ProfileSubmission};
use super::error::DiagnosisError;
use super::repository::DiagnosisRepository;
use super::session::DiagnosisService;
use crate::rules::{RuleBookDocument, RuleSnapshot};

/// Router builder exposing diagnosis, pathway detail, and rule management endpoints.
pub fn diagnosis_router<R>(service: Arc<DiagnosisService<R>>) -> Router
where
    R: DiagnosisRepository + 'static,
{
    Router::new()
        .route("/api/v1/diagnosis", post(submit_handler::<R>))
        .route("/api/v1/pathways/:pathway_id", get(pathway_handler::<R>))
        .route(
            "/api/v1/rules",
            get(rules_status_handler::<R>).put(publish_rules_handler::<R>),
        )
        .with_state(service)
}

#[derive(Debug, Clone, Serialize)]
pub struct RuleTableStatusView {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub states: usize,
    pub transitions: usize,
    pub dangling_transitions: usize,
}

pub(crate) fn failure_response(error: &DiagnosisError) -> Response {
    let status = match error {
        DiagnosisError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DiagnosisError::ServiceNotReady | DiagnosisError::Repository(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        DiagnosisError::NotFound(_) => StatusCode::NOT_FOUND,
        DiagnosisError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({
        "status": "failed",
        "reason": error.reason_code(),
        "field": error.field(),
        "message": error.to_string(),
        "retryable": error.is_retryable(),
        "pathways": [],
    });
    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn submit_handler<R>(
    State(service): State<Arc<DiagnosisService<R>>>,
    axum::Json(submission): axum::Json<ProfileSubmission>,
) -> Response
where
    R: DiagnosisRepository + 'static,
{
    let outcome = tokio::task::spawn_blocking(move || service.submit(submission)).await;

    match outcome {
        Ok(Ok(result)) => (StatusCode::OK, axum::Json(result)).into_response(),
        Ok(Err(error)) => failure_response(&error),
        Err(join_error) => {
            warn!(%join_error, "diagnosis task did not complete");
            let payload = json!({
                "status": "failed",
                "reason": "internal_error",
                "field": serde_json::Value::Null,
                "message": "diagnosis failed due to an internal error",
                "retryable": false,
                "pathways": [],
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn pathway_handler<R>(
    State(service): State<Arc<DiagnosisService<R>>>,
    Path(pathway_id): Path<String>,
) -> Response
where
    R: DiagnosisRepository + 'static,
{
    match service.pathway_detail(&PathwayId(pathway_id)) {
        Ok(pathway) => (StatusCode::OK, axum::Json(pathway)).into_response(),
        Err(error) => failure_response(&error),
    }
}

pub(crate) async fn rules_status_handler<R>(
    State(service): State<Arc<DiagnosisService<R>>>,
) -> Response
where
    R: DiagnosisRepository + 'static,
{
    let view = match service.rules().snapshot() {
        Some(snapshot) => RuleTableStatusView {
            ready: true,
            version: Some(snapshot.version().to_string()),
            states: snapshot.table().state_count(),
            transitions: snapshot.table().transition_count(),
            dangling_transitions: snapshot.table().dangling_transitions(),
        },
        None => RuleTableStatusView {
            ready: false,
            version: None,
            states: 0,
            transitions: 0,
            dangling_transitions: 0,
        },
    };
    let status = if view.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, axum::Json(view)).into_response()
}

pub(crate) async fn publish_rules_handler<R>(
    State(service): State<Arc<DiagnosisService<R>>>,
    axum::Json(document): axum::Json<RuleBookDocument>,
) -> Response
where
    R: DiagnosisRepository + 'static,
{
    match RuleSnapshot::from_document(document) {
        Ok(snapshot) => {
            let version = snapshot.version().to_string();
            let previous = service.rules().publish(snapshot);
            let payload = json!({
                "version": version,
                "previous_version": previous,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
    }
}
