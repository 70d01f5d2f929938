// handler/admin.rs
//
// Escrow reconciliation endpoints. These sit behind the admin gate and exist
// for the cases the normal review flow cannot reach: inspecting a stuck
// escrow and releasing it out of band.
use std::sync::Arc;

use axum::{
    extract::Path,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::{dtos::engagementdtos::ApiResponse, error::HttpError, AppState};

pub fn admin_routes() -> Router {
    Router::new()
        .route("/milestones/:id/escrow", get(escrow_status))
        .route("/milestones/:id/escrow/release", post(force_release))
}

async fn escrow_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(milestone_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let snapshot = app_state
        .milestone_service
        .escrow_status(milestone_id)
        .await?;

    Ok(Json(ApiResponse::success("Escrow status retrieved", snapshot)))
}

async fn force_release(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(milestone_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let milestone = app_state
        .milestone_service
        .force_release(milestone_id)
        .await?;

    Ok(Json(ApiResponse::success(
        "Escrow released, milestone completed",
        milestone,
    )))
}
