use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use common::{
    ErrorResponse, HealthResponse, JobCreateRequest, JobCreateResponse, JobResponse, JobStats,
    JobsListResponse,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::error::JobError;
use crate::state::AppState;

pub const AVAILABLE_ENDPOINTS: [&str; 5] = [
    "POST /jobs",
    "GET /jobs",
    "GET /jobs/:id",
    "GET /stats",
    "GET /health",
];

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health).fallback(not_found))
        .route("/jobs", get(list_jobs).post(create_job).fallback(not_found))
        .route("/jobs/:id", get(get_job).fallback(not_found))
        .route("/stats", get(get_stats).fallback(not_found))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/* ---------------- errores HTTP ---------------- */

#[derive(Debug)]
pub enum ApiError {
    BadRequest(ErrorResponse),
    NotFound(String),
    Internal {
        error: &'static str,
        source: JobError,
    },
}

impl ApiError {
    fn internal(error: &'static str) -> impl FnOnce(JobError) -> ApiError {
        move |source| ApiError::Internal { error, source }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(body) => (StatusCode::BAD_REQUEST, Json(body)).into_response(),
            ApiError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, Json(ErrorResponse::new(msg))).into_response()
            }
            ApiError::Internal { error, source } => {
                error!(error = %source, "{}", error);
                let body = ErrorResponse {
                    details: Some(source.to_string()),
                    ..ErrorResponse::new(error)
                };
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

/* ---------------- handlers HTTP ---------------- */

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        uptime: state.started_at.elapsed().as_secs_f64(),
    })
}

// Crea un job y lanza su proceso; responde sin esperar el resultado
async fn create_job(
    State(state): State<AppState>,
    payload: Result<Json<JobCreateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<JobCreateResponse>), ApiError> {
    let Json(req) = payload.map_err(|rejection| {
        ApiError::BadRequest(ErrorResponse {
            details: Some(rejection.body_text()),
            ..ErrorResponse::new("Invalid request body")
        })
    })?;

    let job_name = match req.job_name {
        Some(name) if !name.is_empty() => name,
        _ => return Err(ApiError::BadRequest(ErrorResponse::new("jobName is required"))),
    };
    let arguments = req.arguments.unwrap_or_default();

    let job_id = state
        .manager
        .start_job(job_name.clone(), arguments.clone())
        .map_err(ApiError::internal("Failed to start job"))?;

    info!(job_id = %job_id, "job aceptado");

    Ok((
        StatusCode::CREATED,
        Json(JobCreateResponse {
            message: "Job started successfully".to_string(),
            job_id,
            job_name,
            arguments,
        }),
    ))
}

async fn list_jobs(State(state): State<AppState>) -> Result<Json<JobsListResponse>, ApiError> {
    let jobs: Vec<JobResponse> = state
        .manager
        .list_jobs()
        .map_err(ApiError::internal("Failed to retrieve jobs"))?
        .iter()
        .map(|job| job.to_response())
        .collect();

    Ok(Json(JobsListResponse {
        total_jobs: jobs.len(),
        jobs,
    }))
}

async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobResponse>, ApiError> {
    match state
        .manager
        .get_job(&id)
        .map_err(ApiError::internal("Failed to retrieve job"))?
    {
        Some(job) => Ok(Json(job.to_response())),
        None => Err(ApiError::NotFound(format!("Job not found: {}", id))),
    }
}

async fn get_stats(State(state): State<AppState>) -> Result<Json<JobStats>, ApiError> {
    let stats = state
        .manager
        .stats()
        .map_err(ApiError::internal("Failed to retrieve statistics"))?;
    Ok(Json(stats))
}

async fn not_found() -> (StatusCode, Json<ErrorResponse>) {
    let body = ErrorResponse {
        available_endpoints: Some(AVAILABLE_ENDPOINTS.iter().map(|s| s.to_string()).collect()),
        ..ErrorResponse::new("Endpoint not found")
    };
    (StatusCode::NOT_FOUND, Json(body))
}
