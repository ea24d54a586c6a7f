//! API routes for pcdocd

use crate::server::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use pcdoc_common::{
    Category, Contribution, ContributionError, ContributionKind, ContributionRequest,
    DiagnosisResult, Origin, Strategy, Symptom,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{error, info};

type AppStateArc = Arc<AppState>;

/// JSON error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
}

/// Handler error mapped onto an HTTP status
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: message.into(),
                code: code.to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<ContributionError> for ApiError {
    fn from(err: ContributionError) -> Self {
        match &err {
            ContributionError::Invalid(v) => {
                ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, v.code(), err.to_string())
            }
            ContributionError::Persistence(_) => {
                error!("  Contribution not stored: {}", err);
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "persistence", err.to_string())
            }
        }
    }
}

// ============================================================================
// Health Routes
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub symptoms: usize,
    pub rules: usize,
    pub clues: usize,
    pub contributions: usize,
}

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/health", get(health))
}

async fn health(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    let repository = state.engine.repository();
    let merged = repository.merged();
    let user = repository.user_snapshot();

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        symptoms: merged.symptoms.len(),
        rules: merged.rules.len(),
        clues: merged.clues.len(),
        contributions: user.symptoms.len() + user.rules.len(),
    })
}

// ============================================================================
// Knowledge Routes
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct CategoriesResponse {
    pub categories: Vec<Category>,
}

#[derive(Debug, Deserialize)]
pub struct SymptomQuery {
    pub category: Option<String>,
}

/// Symptom as shown to a client, with the contribution tag applied
#[derive(Debug, Serialize, Deserialize)]
pub struct SymptomView {
    pub id: String,
    pub label: String,
    pub display_label: String,
    pub category: Category,
    pub origin: Origin,
}

impl From<Symptom> for SymptomView {
    fn from(s: Symptom) -> Self {
        Self {
            display_label: s.display_label(),
            id: s.id,
            label: s.label,
            category: s.category,
            origin: s.origin,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SymptomsResponse {
    pub symptoms: Vec<SymptomView>,
}

pub fn knowledge_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/v1/categories", get(list_categories))
        .route("/v1/symptoms", get(list_symptoms))
}

async fn list_categories(State(state): State<AppStateArc>) -> Json<CategoriesResponse> {
    Json(CategoriesResponse {
        categories: state.engine.list_categories(),
    })
}

async fn list_symptoms(
    State(state): State<AppStateArc>,
    Query(query): Query<SymptomQuery>,
) -> Result<Json<SymptomsResponse>, ApiError> {
    let category = match query.category.as_deref() {
        Some(raw) => Some(
            raw.parse::<Category>()
                .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e.code(), e.to_string()))?,
        ),
        None => None,
    };

    let symptoms = state
        .engine
        .list_symptoms(category)
        .into_iter()
        .map(SymptomView::from)
        .collect();

    Ok(Json(SymptomsResponse { symptoms }))
}

// ============================================================================
// Diagnosis Routes
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct DiagnoseRequest {
    pub symptoms: BTreeSet<String>,
    /// Configured default when absent
    #[serde(default)]
    pub strategy: Option<Strategy>,
}

pub fn diagnosis_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/diagnose", post(diagnose))
}

async fn diagnose(
    State(state): State<AppStateArc>,
    Json(req): Json<DiagnoseRequest>,
) -> Json<DiagnosisResult> {
    let strategy = req.strategy.unwrap_or_else(|| state.engine.default_strategy());
    let result = state.engine.evaluate(&req.symptoms, strategy);

    info!(
        "  Diagnosis ({}): {} symptoms -> conclusive={}",
        strategy,
        req.symptoms.len(),
        result.conclusive
    );
    Json(result)
}

// ============================================================================
// Contribution Routes
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ContributionResponse {
    pub kind: ContributionKind,
    pub contributed_at: DateTime<Utc>,
    /// Id of the new symptom, for symptom contributions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symptom_id: Option<String>,
}

pub fn contribution_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/contributions", post(submit_contribution))
}

async fn submit_contribution(
    State(state): State<AppStateArc>,
    Json(req): Json<ContributionRequest>,
) -> Result<(StatusCode, Json<ContributionResponse>), ApiError> {
    let kind = req.kind();
    let record = state.engine.submit_contribution(req)?;

    let symptom_id = match &record.item {
        Contribution::Symptom { symptom } => Some(symptom.id.clone()),
        Contribution::Rule { .. } => None,
    };

    Ok((
        StatusCode::CREATED,
        Json(ContributionResponse {
            kind,
            contributed_at: record.contributed_at,
            symptom_id,
        }),
    ))
}
