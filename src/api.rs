/// HTTP API калькулятора стоимости

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::context::ModelContext;
use crate::error::CostError;
use crate::form::SliderLimits;
use crate::types::{
    DiagnosticsOutput, ErrorBody, FeatureVector, PredictRequest, PredictionResult, ProjectInput,
};

#[derive(Clone)]
pub struct AppState {
    pub context: Arc<ModelContext>,
    pub default_currency: String,
}

impl AppState {
    pub fn new(context: ModelContext, default_currency: impl Into<String>) -> Self {
        Self {
            context: Arc::new(context),
            default_currency: default_currency.into(),
        }
    }
}

/// Ошибка запроса: приложение продолжает работать, пользователь видит сообщение
pub struct ApiError(CostError);

impl From<CostError> for ApiError {
    fn from(err: CostError) -> Self {
        ApiError(err)
    }
}

/// Тело запроса не разобралось или не совпало с формой ввода
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::warn!("Rejected request body: {}", rejection.body_text());
        ApiError(CostError::Schema(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            CostError::Artifact(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNPROCESSABLE_ENTITY,
        };
        let body = ErrorBody {
            error: self.0.kind().to_string(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/form", get(form))
        .route("/api/form/remaining", post(remaining))
        .route("/api/featurize", post(featurize))
        .route("/api/predict", post(predict))
        .route("/api/diagnostics", get(diagnostics))
        .layer(cors)
        .with_state(state)
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Transit Cost Estimator API (Rust)",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "model": state.context.model_family(),
        "loaded_at": state.context.loaded_at(),
    }))
}

async fn form(State(state): State<AppState>) -> Json<serde_json::Value> {
    let currencies: Vec<&str> = state.context.currencies().codes().collect();
    Json(serde_json::json!({
        "form": state.context.form(),
        "currencies": currencies,
        "default_currency": state.default_currency,
    }))
}

/// Границы ползунков участков для текущего состояния формы
async fn remaining(
    State(state): State<AppState>,
    payload: Result<Json<ProjectInput>, JsonRejection>,
) -> Result<Json<SliderLimits>, ApiError> {
    let Json(input) = payload?;
    let limits = state.context.form().slider_limits(&input)?;
    Ok(Json(limits))
}

async fn featurize(
    State(state): State<AppState>,
    payload: Result<Json<ProjectInput>, JsonRejection>,
) -> Result<Json<FeatureVector>, ApiError> {
    let Json(input) = payload?;
    tracing::info!("Featurize request: {} km, {} categories", input.length, input.categories.len());

    let vector = state.context.featurize(&input)?;
    Ok(Json(vector))
}

async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictionResult>, ApiError> {
    let Json(request) = payload?;
    let currency = request
        .currency
        .unwrap_or_else(|| state.default_currency.clone());
    tracing::info!("Predict request: {} km, currency {}", request.input.length, currency);

    match state.context.predict(&request.input, &currency) {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            tracing::warn!("Prediction failed: {}", e);
            Err(e.into())
        }
    }
}

async fn diagnostics(State(state): State<AppState>) -> Json<DiagnosticsOutput> {
    Json(state.context.diagnostics())
}
