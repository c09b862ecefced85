//! HTTP API for cost estimation, health checks and Prometheus metrics

use anyhow::Context;
use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use estimator_lib::{
    health::{components, ComponentStatus, HealthRegistry},
    CompanyAnalysis, CompanySummary, CostEngine, EstimatorError, PredictionSource, ProjectInput,
    RiskArea, ScenarioSet,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<CostEngine>,
    pub health_registry: HealthRegistry,
    pub service_name: String,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        engine: Arc<CostEngine>,
        health_registry: HealthRegistry,
        service_name: impl Into<String>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            engine,
            health_registry,
            service_name: service_name.into(),
            max_upload_bytes,
        }
    }
}

/// Error returned by API handlers
#[derive(Debug)]
pub enum ApiError {
    Estimator(EstimatorError),
    Internal(String),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl From<EstimatorError> for ApiError {
    fn from(err: EstimatorError) -> Self {
        ApiError::Estimator(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Estimator(err @ EstimatorError::MissingFields(_)) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            ApiError::Estimator(err @ EstimatorError::UnknownCompany(_)) => {
                (StatusCode::NOT_FOUND, err.to_string())
            }
            ApiError::Estimator(err) if err.is_dataset_error() => {
                (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
            }
            ApiError::Estimator(err) => {
                error!(error = %err, "Estimation failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Estimation failed".to_string())
            }
            ApiError::Internal(detail) => {
                error!(error = %detail, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// Run CPU-bound or lock-taking engine work off the async runtime
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))
}

/// Request body shared by prediction and scenario endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct EstimateRequest {
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(flatten)]
    pub project: ProjectInput,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionSummary {
    pub predicted_cost: f64,
    pub base_cost: f64,
    pub risk_adjustment: f64,
    pub contingency_percent: f64,
    pub high_risk_areas: Vec<RiskArea>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub success: bool,
    pub company_used: Option<String>,
    pub prediction: PredictionSummary,
    pub company_insights: Vec<String>,
    pub recommendations: Vec<String>,
    pub source: PredictionSource,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScenarioResponse {
    pub success: bool,
    pub scenario_analysis: ScenarioSet,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub company_name: String,
    pub projects_loaded: usize,
    pub train_score: f64,
    pub test_score: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompaniesResponse {
    pub success: bool,
    pub companies: BTreeMap<String, CompanySummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompanyDetailResponse {
    pub success: bool,
    pub company_name: String,
    pub analysis: CompanyAnalysis,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub status: ComponentStatus,
    pub service: String,
    pub message: String,
    pub loaded_companies: Vec<String>,
}

/// Service summary with the companies that have a trained model
async fn health(State(state): State<Arc<AppState>>) -> Result<Json<ServiceHealth>, ApiError> {
    let status = state.health_registry.health().await.status;
    let engine = state.engine.clone();
    let loaded_companies = blocking(move || engine.loaded_companies()).await?;
    Ok(Json(ServiceHealth {
        status,
        service: state.service_name.clone(),
        message: "Service is running correctly".to_string(),
        loaded_companies,
    }))
}

/// Component health - 200 while operational, 503 otherwise
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;
    let status_code = if health.status.is_operational() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status_code, Json(health))
}

async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;
    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        return ApiError::Internal(e.to_string()).into_response();
    }
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

async fn predict(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EstimateRequest>,
) -> Result<Json<PredictResponse>, ApiError> {
    let engine = state.engine.clone();
    let EstimateRequest {
        company_name,
        project,
    } = request;
    let company = company_name.clone();
    let result = blocking(move || engine.predict(company.as_deref(), &project)).await??;

    Ok(Json(PredictResponse {
        success: true,
        company_used: company_name,
        prediction: PredictionSummary {
            predicted_cost: result.predicted_cost,
            base_cost: result.base_cost,
            risk_adjustment: result.risk_adjustment,
            contingency_percent: result.contingency_percent,
            high_risk_areas: result.high_risk_areas,
        },
        company_insights: result.insights,
        recommendations: result.recommendations,
        source: result.source,
    }))
}

async fn scenarios(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EstimateRequest>,
) -> Result<Json<ScenarioResponse>, ApiError> {
    let engine = state.engine.clone();
    let set = blocking(move || {
        engine.simulate_scenarios(request.company_name.as_deref(), &request.project)
    })
    .await?;

    Ok(Json(ScenarioResponse {
        success: true,
        scenario_analysis: set,
    }))
}

/// Replace a company's history with the uploaded CSV table
async fn upload_dataset(
    State(state): State<Arc<AppState>>,
    Path(company): Path<String>,
    body: String,
) -> Result<Json<UploadResponse>, ApiError> {
    let engine = state.engine.clone();
    let name = company.clone();
    let outcome = match blocking(move || engine.ingest_csv(&name, &body)).await {
        Ok(outcome) => outcome,
        Err(ApiError::Internal(detail)) => {
            state
                .health_registry
                .set_unhealthy(components::TRAINER, format!("Training task failed: {}", detail))
                .await;
            return Err(ApiError::Internal(detail));
        }
        Err(err) => return Err(err),
    };

    match outcome {
        Ok(report) => {
            state.health_registry.record_training_outcome(None).await;
            info!(company = %company, projects = report.projects_loaded, "Dataset uploaded");
            Ok(Json(UploadResponse {
                success: true,
                message: format!("Company data loaded successfully for {}", company),
                company_name: company,
                projects_loaded: report.projects_loaded,
                train_score: report.train_score,
                test_score: report.test_score,
            }))
        }
        Err(err) => {
            state
                .health_registry
                .record_training_outcome(Some(&err.to_string()))
                .await;
            Err(err.into())
        }
    }
}

async fn list_companies(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CompaniesResponse>, ApiError> {
    let engine = state.engine.clone();
    let companies = blocking(move || engine.list_companies()).await?;
    Ok(Json(CompaniesResponse {
        success: true,
        companies,
    }))
}

async fn company_detail(
    State(state): State<Arc<AppState>>,
    Path(company): Path<String>,
) -> Result<Json<CompanyDetailResponse>, ApiError> {
    let engine = state.engine.clone();
    let name = company.clone();
    let analysis = blocking(move || engine.company_analysis(&name)).await??;
    Ok(Json(CompanyDetailResponse {
        success: true,
        company_name: company,
        analysis,
    }))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.max_upload_bytes;
    Router::new()
        .route("/health", get(health))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/predict", post(predict))
        .route("/api/scenarios", post(scenarios))
        .route("/api/companies", get(list_companies))
        .route("/api/companies/:company", get(company_detail))
        .route(
            "/api/companies/:company/dataset",
            post(upload_dataset).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .with_state(state)
}

/// Start the API server
pub async fn serve(addr: String, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Register the components tracked by the health endpoints
pub async fn register_components(health_registry: &HealthRegistry) {
    health_registry.register(components::ENGINE).await;
    health_registry.register(components::TRAINER).await;
}
