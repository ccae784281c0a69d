//! HTTP API.
//!
//! `GET /api/v1/health` is open. The review routes under `/api/v1/reviews`
//! require a `password` header matching the configured shared secret.

use anyhow::{Context, Result};
use axum::extract::{Json, Query, Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use ring::constant_time;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use crate::environment::Config;
use crate::export::reviews_to_csv;
use crate::report::{FullReport, ReviewAnalysisService, ReviewRequest, DEFAULT_LIMIT_REVIEWS};
use crate::TARGET_WEB_REQUEST;

const PASSWORD_HEADER: &str = "password";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    BadRequest(String),
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(err) => {
                error!(target: TARGET_WEB_REQUEST, "Request failed: {:#}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

#[derive(Clone)]
pub struct AppState {
    service: ReviewAnalysisService,
    password: Option<Arc<str>>,
}

impl AppState {
    pub fn new(service: ReviewAnalysisService, password: Option<String>) -> Self {
        Self {
            service,
            password: password.map(Arc::from),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnalyzeParams {
    #[serde(default = "default_limit_reviews")]
    limit_reviews: usize,
}

fn default_limit_reviews() -> usize {
    DEFAULT_LIMIT_REVIEWS
}

pub fn router(state: AppState) -> Router {
    let reviews = Router::new()
        .route("/analyze", post(analyze_reviews))
        .route("/download", post(download_reviews))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_password,
        ));

    Router::new()
        .route("/api/v1/health", get(health))
        .nest("/api/v1/reviews", reviews)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Runs the API server until it is shut down.
pub async fn serve(config: &Config) -> Result<()> {
    let service = ReviewAnalysisService::from_config(config)?;
    if config.password.is_none() {
        warn!(target: TARGET_WEB_REQUEST, "PASSWORD is not set, review endpoints will reject every request");
    }
    let app = router(AppState::new(service, config.password.clone()));

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(target: TARGET_WEB_REQUEST, "Server running on http://{}", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .context("Server error")
}

async fn require_password(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let supplied = request
        .headers()
        .get(PASSWORD_HEADER)
        .and_then(|value| value.to_str().ok());

    let authorized = match (state.password.as_deref(), supplied) {
        (Some(expected), Some(supplied)) => passwords_match(expected, supplied),
        _ => false,
    };

    if !authorized {
        warn!(target: TARGET_WEB_REQUEST, "Rejected request to {} with missing or wrong password", request.uri().path());
        return Err(ApiError::Unauthorized);
    }
    Ok(next.run(request).await)
}

/// Compares in time independent of where the inputs first differ.
fn passwords_match(expected: &str, supplied: &str) -> bool {
    constant_time::verify_slices_are_equal(expected.as_bytes(), supplied.as_bytes()).is_ok()
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

fn validate(request: &ReviewRequest) -> Result<(), ApiError> {
    if request.app_name.trim().is_empty() {
        return Err(ApiError::BadRequest("app_name must not be empty".to_string()));
    }
    Ok(())
}

async fn analyze_reviews(
    State(state): State<AppState>,
    Query(params): Query<AnalyzeParams>,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<FullReport>, ApiError> {
    validate(&request)?;
    info!(target: TARGET_WEB_REQUEST, "Analyzing reviews for '{}' ({})", request.app_name, request.country);

    state
        .service
        .build_report(&request, params.limit_reviews)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("No reviews found or app not found"))
}

async fn download_reviews(
    State(state): State<AppState>,
    Json(request): Json<ReviewRequest>,
) -> Result<Response, ApiError> {
    validate(&request)?;
    info!(target: TARGET_WEB_REQUEST, "Exporting reviews for '{}' ({})", request.app_name, request.country);

    let reviews = state.service.fetch_reviews(&request).await;
    if reviews.is_empty() {
        return Err(ApiError::NotFound("No reviews found"));
    }

    let disposition = format!(
        "attachment; filename={}_reviews.csv",
        header_safe_name(&request.app_name)
    );
    let disposition = HeaderValue::from_str(&disposition).context("Invalid Content-Disposition")?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/csv")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        reviews_to_csv(&reviews),
    )
        .into_response())
}

/// Replaces characters that cannot appear in an unquoted header filename.
fn header_safe_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c == ' ' || (c.is_ascii_graphic() && !matches!(c, '"' | ';' | '\\' | '/')) {
                c
            } else {
                '_'
            }
        })
        .collect()
}
