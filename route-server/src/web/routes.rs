//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get},
};
use tracing::warn;

use crate::resolver::{RouteError, StatsSnapshot};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/route", get(resolve_route))
        .route("/cache", delete(clear_cache))
        .route("/stats", get(stats))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Resolve a route between two points.
async fn resolve_route(
    State(state): State<AppState>,
    Query(req): Query<RouteRequest>,
) -> Result<Json<RouteResponse>, AppError> {
    let route = state
        .resolver
        .resolve_route(req.origin(), req.destination())
        .await?;

    Ok(Json(RouteResponse::from_route(route)))
}

/// Empty every cache tier.
async fn clear_cache(State(state): State<AppState>) -> StatusCode {
    state.resolver.clear_cache().await;
    StatusCode::NO_CONTENT
}

/// Cache and provider counters.
async fn stats(State(state): State<AppState>) -> Json<StatsSnapshot> {
    Json(state.resolver.stats())
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    BadGateway { message: String },
    /// The work was abandoned before it finished; the client may retry.
    Unavailable { message: String },
}

impl From<RouteError> for AppError {
    fn from(e: RouteError) -> Self {
        match e {
            RouteError::InvalidInput { .. } => AppError::BadRequest {
                message: e.to_string(),
            },
            RouteError::RoutingFailed(_) => AppError::BadGateway {
                message: e.to_string(),
            },
            RouteError::Cancelled => AppError::Unavailable {
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::BadGateway { message } => (StatusCode::BAD_GATEWAY, message),
            AppError::Unavailable { message } => (StatusCode::SERVICE_UNAVAILABLE, message),
        };

        warn!(%status, %message, "request failed");

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
