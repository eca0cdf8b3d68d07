use crate::cli::ServeArgs;
use crate::infra::{load_rule_snapshot, AppState, InMemoryDiagnosisRepository};
use crate::routes::with_diagnosis_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::Arc;
use tracing::info;
use visa_pathway::config::AppConfig;
use visa_pathway::error::AppError;
use visa_pathway::rules::RuleTableStore;
use visa_pathway::telemetry;
use visa_pathway::workflows::diagnosis::DiagnosisService;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(rules) = args.rules.take() {
        config.engine.rules_path = Some(rules);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let rules = Arc::new(RuleTableStore::empty());
    let app_state = AppState {
        rules: rules.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryDiagnosisRepository::default());
    let diagnosis_service = Arc::new(DiagnosisService::new(
        rules.clone(),
        repository,
        config.engine.settings(),
    ));

    let app = with_diagnosis_routes(diagnosis_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    rules.publish(load_rule_snapshot(config.engine.rules_path.as_deref())?);

    info!(
        ?config.environment,
        %addr,
        max_chain_length = config.engine.max_chain_length,
        top_n = config.engine.top_n,
        "visa pathway engine ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
