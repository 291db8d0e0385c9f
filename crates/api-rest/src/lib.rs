//! # API REST
//!
//! Web surface for Illness Intel.
//!
//! Handles:
//! - the HTML form (`/`, `/predict`, `/clear`) and report downloads (`/reports/:id`)
//! - the JSON API (`/api/predict`, `/api/model`, `/health`)
//! - OpenAPI/Swagger documentation and CORS
//!
//! Uses `api-shared` for response types and `illness-core` for everything else. Handlers only
//! read the shared [`AppState`]; nothing here mutates the trained model.

#![warn(rust_2018_idioms)]

mod html;

use axum::{
    extract::{Form, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::{
    ClassMetricsRes, ErrorRes, ForestParamsRes, HealthRes, HealthService, ModelSummaryRes,
    PredictReq, PredictionRes,
};
use illness_core::constants::REPORT_DOWNLOAD_FILENAME;
use illness_core::{
    InferenceContext, PredictError, Prediction, Predictor, ReportExporter, ReportId,
    TrainingSummary,
};

pub use html::escape_html;

/// Application state shared across handlers.
///
/// Holds the trained inference context and the report exporter. Both are immutable after
/// startup, so cloning the state only bumps reference counts.
#[derive(Clone)]
pub struct AppState {
    context: Arc<InferenceContext>,
    exporter: Arc<ReportExporter>,
}

impl AppState {
    pub fn new(context: Arc<InferenceContext>, exporter: Arc<ReportExporter>) -> Self {
        Self { context, exporter }
    }

    fn predict(&self, symptoms: &str) -> Result<Prediction, PredictError> {
        Predictor::new(&*self.context, &*self.exporter).predict(symptoms)
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(health, api_predict, api_model, download_report),
    components(schemas(
        HealthRes,
        PredictReq,
        PredictionRes,
        ErrorRes,
        ModelSummaryRes,
        ForestParamsRes,
        ClassMetricsRes,
    ))
)]
pub struct ApiDoc;

/// Builds the router with every route, Swagger UI and permissive CORS.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/predict", post(predict_form))
        .route("/clear", get(clear))
        .route("/reports/:id", get(download_report))
        .route("/api/predict", post(api_predict))
        .route("/api/model", get(api_model))
        .route("/health", get(health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct SymptomsForm {
    #[serde(default)]
    symptoms: String,
}

fn report_url(id: &ReportId) -> String {
    format!("/reports/{id}")
}

/// Validation failures are the caller's fault; anything else is ours.
fn status_for(err: &PredictError) -> StatusCode {
    if err.is_validation() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn unrecognised_of(err: &PredictError) -> Vec<String> {
    match err {
        PredictError::NoRecognisedSymptoms { unrecognised } => unrecognised.clone(),
        _ => Vec::new(),
    }
}

fn log_failure(err: &PredictError) {
    if err.is_validation() {
        tracing::debug!("rejected submission: {}", err);
    } else {
        tracing::error!("prediction failed: {:?}", err);
    }
}

/// Serves the empty symptom form.
#[axum::debug_handler]
async fn index() -> Html<String> {
    Html(html::render_page("", &html::Outcome::Empty))
}

/// Handles a form submission and re-renders the page with the result.
///
/// Validation failures render inline with `422 Unprocessable Entity`.
#[axum::debug_handler]
async fn predict_form(
    State(state): State<AppState>,
    Form(form): Form<SymptomsForm>,
) -> (StatusCode, Html<String>) {
    match state.predict(&form.symptoms) {
        Ok(prediction) => {
            let outcome = html::Outcome::Prediction {
                diagnosis: &prediction.diagnosis,
                report_url: report_url(&prediction.report.id),
            };
            (
                StatusCode::OK,
                Html(html::render_page(&form.symptoms, &outcome)),
            )
        }
        Err(e) => {
            log_failure(&e);
            let message = if e.is_validation() {
                e.to_string()
            } else {
                "Something went wrong while making the prediction.".to_string()
            };
            let unrecognised = unrecognised_of(&e);
            let outcome = html::Outcome::Error {
                message,
                unrecognised: &unrecognised,
            };
            (
                status_for(&e),
                Html(html::render_page(&form.symptoms, &outcome)),
            )
        }
    }
}

/// Resets the form.
#[axum::debug_handler]
async fn clear() -> Redirect {
    Redirect::to("/")
}

#[utoipa::path(
    get,
    path = "/reports/{id}",
    params(("id" = String, Path, description = "Report id, 32 lowercase hex characters")),
    responses(
        (status = 200, description = "PDF report as application/octet-stream"),
        (status = 400, description = "Id is not in canonical form"),
        (status = 404, description = "No such report"),
        (status = 500, description = "Internal server error")
    )
)]
/// Download a previously generated report.
///
/// # Errors
/// Returns `400 Bad Request` for a non-canonical id, `404 Not Found` if no report has that id,
/// and `500 Internal Server Error` if the file cannot be read.
#[axum::debug_handler]
async fn download_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, (StatusCode, &'static str)> {
    let id = ReportId::parse(&id).map_err(|e| {
        tracing::debug!("rejected report id: {}", e);
        (StatusCode::BAD_REQUEST, "Invalid report id")
    })?;

    match state.exporter.open(&id) {
        Ok(Some(bytes)) => Ok((
            [
                (header::CONTENT_TYPE, "application/octet-stream".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{REPORT_DOWNLOAD_FILENAME}\""),
                ),
            ],
            bytes,
        )
            .into_response()),
        Ok(None) => Err((StatusCode::NOT_FOUND, "Report not found")),
        Err(e) => {
            tracing::error!("Read report error: {:?}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Internal error"))
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/predict",
    request_body = PredictReq,
    responses(
        (status = 200, description = "Prediction and report link", body = PredictionRes),
        (status = 422, description = "No recognised symptoms or input too long", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Predict a disease from a comma-separated symptom list.
///
/// A report is written for every successful prediction and can be fetched from `report_url`.
///
/// # Errors
/// Returns `422 Unprocessable Entity` when the input is too long or contains no recognised
/// symptom, and `500 Internal Server Error` if the report cannot be written.
#[axum::debug_handler]
async fn api_predict(
    State(state): State<AppState>,
    Json(req): Json<PredictReq>,
) -> Result<Json<PredictionRes>, (StatusCode, Json<ErrorRes>)> {
    match state.predict(&req.symptoms) {
        Ok(Prediction { diagnosis, report }) => Ok(Json(PredictionRes {
            symptoms: diagnosis.symptoms,
            disease: diagnosis.disease,
            confidence: diagnosis.confidence,
            description: diagnosis.description,
            precaution: diagnosis.precaution,
            recognised: diagnosis.recognised,
            unrecognised: diagnosis.unrecognised,
            report_url: report_url(&report.id),
            report_id: report.id.to_string(),
        })),
        Err(e) => {
            log_failure(&e);
            let error = if e.is_validation() {
                e.to_string()
            } else {
                "Internal error".to_string()
            };
            Err((
                status_for(&e),
                Json(ErrorRes {
                    error,
                    unrecognised: unrecognised_of(&e),
                }),
            ))
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/model",
    responses(
        (status = 200, description = "Training summary", body = ModelSummaryRes),
        (status = 404, description = "Model was not trained by this process", body = ErrorRes)
    )
)]
/// Describe the model trained at startup.
#[axum::debug_handler]
async fn api_model(
    State(state): State<AppState>,
) -> Result<Json<ModelSummaryRes>, (StatusCode, Json<ErrorRes>)> {
    match state.context.summary() {
        Some(summary) => Ok(Json(model_summary_res(summary))),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorRes {
                error: "no training summary available".into(),
                unrecognised: Vec::new(),
            }),
        )),
    }
}

fn model_summary_res(summary: &TrainingSummary) -> ModelSummaryRes {
    let params = summary.best_params;
    ModelSummaryRes {
        best_params: ForestParamsRes {
            n_estimators: params.n_estimators,
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
            min_samples_leaf: params.min_samples_leaf,
            bootstrap: params.bootstrap,
        },
        cv_accuracy: summary.cv_accuracy,
        candidates_evaluated: summary.candidates_evaluated,
        test_accuracy: summary.test_report.accuracy,
        macro_f1: summary.test_report.macro_f1,
        classes: summary
            .test_report
            .classes
            .iter()
            .map(|c| ClassMetricsRes {
                disease: c.name.clone(),
                precision: c.precision,
                recall: c.recall,
                f1: c.f1,
                support: c.support,
            })
            .collect(),
        n_train: summary.n_train,
        n_test: summary.n_test,
        vocabulary_size: summary.vocabulary_size,
        n_classes: summary.n_classes,
        trained_at: summary.trained_at.to_rfc3339(),
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint.
///
/// Only reachable once training has finished, since the server starts listening afterwards.
#[axum::debug_handler]
async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}
