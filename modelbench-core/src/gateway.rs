//! HTTP surface over [`ModelService`].
//!
//! Every route accepts GET and POST with its parameters in the query string.
//! Errors are returned as `{"detail": "<message>"}`.

use crate::benchmark::BenchmarkReport;
use crate::error::ModelbenchError;
use crate::metadata::{
    ClassifierMetadata, METRIC_ACCURACY, METRIC_F1_SCORE, METRIC_PRECISION, METRIC_RECALL,
};
use crate::service::ModelService;
use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub type SharedService = Arc<ModelService>;

/// Display names for the experiment metrics, in output order.
pub const METRIC_LABELS: [(&str, &str); 4] = [
    (METRIC_ACCURACY, "Accuracy"),
    (METRIC_PRECISION, "Precision"),
    (METRIC_RECALL, "Recall"),
    (METRIC_F1_SCORE, "F1 Score"),
];

pub const NO_MODELS_MESSAGE: &str = "No models available";
pub const REPORT_MESSAGE: &str = "Report generated successfully";

/// The four experiment metrics of `metadata`, keyed by display name and
/// formatted to two decimals.
pub fn metrics_summary(metadata: &ClassifierMetadata) -> Result<Map<String, Value>, ModelbenchError> {
    METRIC_LABELS
        .iter()
        .map(|(key, label)| {
            let score = metadata
                .metric(key)
                .ok_or_else(|| ModelbenchError::metric_not_found(*key, &metadata.id))?;
            Ok((label.to_string(), Value::String(format!("{score:.2}"))))
        })
        .collect()
}

/// `{"message", "best_model"}` body for a benchmark report.
pub fn report_summary(report: &BenchmarkReport) -> Value {
    match report.best() {
        Some(best) => json!({ "message": REPORT_MESSAGE, "best_model": best }),
        None => json!({ "message": NO_MODELS_MESSAGE, "best_model": null }),
    }
}

/// HTTP status for a core error.
pub fn status_for(err: &ModelbenchError) -> StatusCode {
    match err {
        ModelbenchError::NotFound(_) => StatusCode::NOT_FOUND,
        ModelbenchError::MalformedRecord(_)
        | ModelbenchError::InvalidModelId(_)
        | ModelbenchError::InvalidMetric(_)
        | ModelbenchError::MetricNotFound { .. } => StatusCode::BAD_REQUEST,
        ModelbenchError::DataSource(_) | ModelbenchError::Http(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Error response carrying a status and a verbatim message.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl From<ModelbenchError> for ApiError {
    fn from(err: ModelbenchError) -> Self {
        if err.is_client_error() {
            tracing::debug!(error = %err, "Request rejected");
        } else {
            tracing::warn!(error = %err, "Request failed");
        }
        Self {
            status: status_for(&err),
            detail: err.to_string(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

type ApiResult = Result<Json<Value>, ApiError>;

#[derive(Debug, Deserialize)]
struct PredictParams {
    query: String,
    model_id: String,
}

#[derive(Debug, Deserialize)]
struct RunParams {
    input_url: String,
    target_column: String,
    model_id: String,
}

#[derive(Debug, Deserialize)]
struct ReportParams {
    metric: String,
}

/// Build the router with `/models/`, `/predict/`, `/run/`, `/report/` and `/health`.
pub fn router(service: SharedService) -> Router {
    Router::new()
        .route("/models/", get(models_handler).post(models_handler))
        .route("/predict/", get(predict_handler).post(predict_handler))
        .route("/run/", get(run_handler).post(run_handler))
        .route("/report/", get(report_handler).post(report_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

async fn models_handler(State(service): State<SharedService>) -> ApiResult {
    let ids = service.list_models_ids()?;
    Ok(Json(json!(ids)))
}

async fn predict_handler(
    State(service): State<SharedService>,
    params: Result<Query<PredictParams>, QueryRejection>,
) -> ApiResult {
    let Query(params) = params?;
    let record = match serde_json::from_str::<Value>(&params.query) {
        Ok(Value::Object(record)) => record,
        Ok(_) => {
            return Err(ModelbenchError::malformed_record("query must be a JSON object").into());
        }
        Err(e) => {
            return Err(
                ModelbenchError::malformed_record(format!("query is not valid JSON: {e}")).into(),
            );
        }
    };
    let prediction = service.predict(&params.model_id, &record)?;
    Ok(Json(json!({ "prediction": prediction.value })))
}

async fn run_handler(
    State(service): State<SharedService>,
    params: Result<Query<RunParams>, QueryRejection>,
) -> ApiResult {
    let Query(params) = params?;
    let metadata = service
        .run_experiment(&params.input_url, &params.target_column, &params.model_id)
        .await?;
    Ok(Json(Value::Object(metrics_summary(&metadata)?)))
}

async fn report_handler(
    State(service): State<SharedService>,
    params: Result<Query<ReportParams>, QueryRejection>,
) -> ApiResult {
    let Query(params) = params?;
    let report = service.report_benchmark(&params.metric)?;
    Ok(Json(report_summary(&report)))
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Serve `service` on `host:port` until the process is stopped.
pub async fn run(service: SharedService, host: &str, port: u16) -> std::io::Result<()> {
    let app = router(service);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "HTTP server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
