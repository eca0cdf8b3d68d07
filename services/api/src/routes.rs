use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use visa_pathway::workflows::diagnosis::{
    diagnosis_router, DiagnosisRepository, DiagnosisService,
};

pub(crate) fn with_diagnosis_routes<R>(service: Arc<DiagnosisService<R>>) -> axum::Router
where
    R: DiagnosisRepository + 'static,
{
    diagnosis_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    match state.rules.version() {
        Some(version) => (
            StatusCode::OK,
            Json(json!({ "status": "ready", "rule_table_version": version })),
        ),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "initializing" })),
        ),
    }
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{load_rule_snapshot, InMemoryDiagnosisRepository};
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use tower::ServiceExt;
    use visa_pathway::rules::RuleTableStore;
    use visa_pathway::workflows::diagnosis::EngineSettings;

    fn app(rules: Arc<RuleTableStore>) -> axum::Router {
        let state = AppState {
            rules: rules.clone(),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        let service = Arc::new(DiagnosisService::new(
            rules,
            Arc::new(InMemoryDiagnosisRepository::default()),
            EngineSettings::default(),
        ));
        with_diagnosis_routes(service).layer(Extension(state))
    }

    async fn get(router: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(Request::get(uri).body(Body::empty()).expect("request"))
            .await
            .expect("route handled");
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        (status, serde_json::from_slice(&body).expect("json payload"))
    }

    #[tokio::test]
    async fn health_is_always_ok() {
        let (status, body) = get(app(Arc::new(RuleTableStore::empty())), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn readiness_waits_for_rule_snapshot() {
        let rules = Arc::new(RuleTableStore::empty());

        let (status, body) = get(app(rules.clone()), "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "initializing");

        rules.publish(load_rule_snapshot(None).expect("standard catalog"));
        let (status, body) = get(app(rules), "/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rule_table_version"], "kr-2025.1");
    }

    #[tokio::test]
    async fn diagnosis_routes_are_mounted() {
        let rules = Arc::new(RuleTableStore::with_snapshot(
            load_rule_snapshot(None).expect("standard catalog"),
        ));

        let (status, body) = get(app(rules), "/api/v1/rules").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["version"], "kr-2025.1");
    }
}
