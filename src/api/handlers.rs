//! HTTP request handlers

use super::session::SessionHandle;
use super::types::{
    ChatRequest, ChatResponse, ErrorResponse, HealthResponse, ProgressResponse, SetStepRequest,
    StepResponse, SummaryResponse,
};
use super::AppState;
use crate::runtime::TurnError;
use crate::state_machine::{SessionState, TransitionError};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Coaching turns
        .route("/chat", post(chat))
        // Navigation and lifecycle
        .route("/set_step", post(set_step))
        .route("/reset", post(reset))
        // Read-only views
        .route("/progress", get(get_progress))
        .route("/get_summary", get(get_summary))
        .route("/api/health", get(health))
        .with_state(state)
}

// ============================================================
// Chat
// ============================================================

async fn chat(
    State(state): State<AppState>,
    session: SessionHandle,
    Json(req): Json<ChatRequest>,
) -> (SessionHandle, Response) {
    if req.user_input.trim().is_empty() {
        let error = AppError::BadRequest("user_input is required".to_string());
        return (session, error.into_response());
    }

    match state.coach.process_turn(&session.id, &req.user_input).await {
        Ok(outcome) => (session, Json(ChatResponse::from(outcome)).into_response()),
        Err(e) => {
            tracing::error!(
                session_id = %session.id,
                error = %e,
                "Chat turn failed"
            );
            let status = if e.is_service_unavailable() {
                StatusCode::SERVICE_UNAVAILABLE
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            let progress = state
                .coach
                .progress(&session.id)
                .await
                .unwrap_or_else(|_| SessionState::default().progress());
            let body = ChatResponse::failure(e.user_message(), e.diagnostic(), progress);
            (session, (status, Json(body)).into_response())
        }
    }
}

// ============================================================
// Navigation and Lifecycle
// ============================================================

async fn set_step(
    State(state): State<AppState>,
    session: SessionHandle,
    Json(req): Json<SetStepRequest>,
) -> (SessionHandle, Result<Json<StepResponse>, AppError>) {
    let result = state
        .coach
        .set_stage(&session.id, req.step)
        .await
        .map(|info| Json(StepResponse::success(info)))
        .map_err(AppError::from);
    (session, result)
}

async fn reset(
    State(state): State<AppState>,
    session: SessionHandle,
) -> (SessionHandle, Result<Json<StepResponse>, AppError>) {
    let result = state
        .coach
        .reset(&session.id)
        .await
        .map(|progress| Json(StepResponse::success(progress.stage_info)))
        .map_err(AppError::from);
    (session, result)
}

// ============================================================
// Read-only Views
// ============================================================

async fn get_progress(
    State(state): State<AppState>,
    session: SessionHandle,
) -> (SessionHandle, Result<Json<ProgressResponse>, AppError>) {
    let result = state
        .coach
        .progress(&session.id)
        .await
        .map(|progress| Json(ProgressResponse::from(progress)))
        .map_err(AppError::from);
    (session, result)
}

async fn get_summary(
    State(state): State<AppState>,
    session: SessionHandle,
) -> (SessionHandle, Result<Json<SummaryResponse>, AppError>) {
    let result = state
        .coach
        .summary(&session.id)
        .await
        .map(|email_content| Json(SummaryResponse { email_content }))
        .map_err(AppError::from);
    (session, result)
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        model_configured: state.model.is_some(),
        model: state.model.clone(),
    })
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    Forbidden(String),
    Unavailable(String),
    Internal(String),
}

impl From<TurnError> for AppError {
    fn from(error: TurnError) -> Self {
        match error {
            TurnError::Navigation(TransitionError::StageNotPermitted { .. }) => {
                AppError::Forbidden("Step not completed yet".to_string())
            }
            TurnError::Navigation(e) => AppError::BadRequest(e.to_string()),
            e if e.is_service_unavailable() => AppError::Unavailable(e.user_message().to_string()),
            e => {
                tracing::error!(error = %e, "Request failed");
                AppError::Internal(e.user_message().to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
