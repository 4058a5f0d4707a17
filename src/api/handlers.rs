//! HTTP request handlers

use super::types::{ErrorResponse, HealthResponse, MessageRequest, MessageResponse};
use super::AppState;
use crate::db::UserId;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json,
};
use tower_http::trace::TraceLayer;

/// Create the API router
pub fn create_router(state: AppState) -> axum::Router {
    axum::Router::new()
        // Inbound messages from platform adapters
        .route("/api/messages", post(send_message))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================
// Message Handler
// ============================================================

/// Record the sender and the message, then ask the router for a reply.
///
/// A storage failure answers 500 and the adapter sends nothing.
async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let user_id = req.user_id.trim();
    if user_id.is_empty() {
        return Err(AppError::BadRequest("user_id must not be empty".to_string()));
    }
    let text = req.text.trim();
    if text.is_empty() {
        return Err(AppError::BadRequest("text must not be empty".to_string()));
    }
    let user = UserId::from(user_id);

    state
        .db
        .record_user(&user, req.first_name.as_deref(), req.last_name.as_deref())
        .map_err(|e| AppError::Internal(e.to_string()))?;
    state
        .db
        .record_message(&user, text)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let reply = state.router.get_answer(&user, text).await.map_err(|e| {
        tracing::error!(user = %user, error = %e, "Turn failed, sending no reply");
        AppError::Internal(e.to_string())
    })?;

    Ok(Json(MessageResponse::new(reply)))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        platform: state.db.platform().to_string(),
    })
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
