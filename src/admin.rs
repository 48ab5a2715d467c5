//! 诊断接口：管理后台查看里程碑表与各会话的阶段状态
//!
//! GET  /api/health
//! GET  /api/phases
//! POST /api/sessions
//! GET  /api/sessions/:id
//! GET  /api/sessions/:id/status
//! POST /api/sessions/:id/reset

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::core::IntakeError;
use crate::intake::{ConversationSummary, SessionRegistry};
use crate::phase::{PhaseMilestone, PhaseStatus};

type ApiResult<T> = Result<T, (StatusCode, String)>;

#[derive(Serialize)]
struct CreatedSession {
    session_id: String,
}

pub fn router(registry: Arc<SessionRegistry>) -> Router {
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/phases", get(api_phases))
        .route("/api/sessions", post(api_session_create))
        .route("/api/sessions/:id", get(api_session_summary))
        .route("/api/sessions/:id/status", get(api_session_status))
        .route("/api/sessions/:id/reset", post(api_session_reset))
        .with_state(registry)
}

fn error_response(err: IntakeError) -> (StatusCode, String) {
    let code = match err {
        IntakeError::UnknownSession(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (code, err.to_string())
}

async fn api_phases(State(registry): State<Arc<SessionRegistry>>) -> Json<Vec<PhaseMilestone>> {
    Json(registry.table().all().to_vec())
}

async fn api_session_create(
    State(registry): State<Arc<SessionRegistry>>,
) -> (StatusCode, Json<CreatedSession>) {
    let session_id = registry.create().await;
    (StatusCode::CREATED, Json(CreatedSession { session_id }))
}

async fn api_session_summary(
    State(registry): State<Arc<SessionRegistry>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ConversationSummary>> {
    registry.summary(&id).await.map(Json).map_err(error_response)
}

async fn api_session_status(
    State(registry): State<Arc<SessionRegistry>>,
    Path(id): Path<String>,
) -> ApiResult<Json<PhaseStatus>> {
    registry.status(&id).await.map(Json).map_err(error_response)
}

async fn api_session_reset(
    State(registry): State<Arc<SessionRegistry>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    registry.reset(&id).await.map_err(error_response)?;
    tracing::info!(session = %id, "session reset via admin");
    Ok(StatusCode::NO_CONTENT)
}
