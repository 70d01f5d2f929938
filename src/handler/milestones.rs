// handler/milestones.rs
use std::sync::Arc;

use axum::{
    extract::Path,
    response::IntoResponse,
    routing::{post, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::engagementdtos::{
        ApiResponse, CreateMilestoneDto, RejectMilestoneDto, SubmitMilestoneDto,
    },
    error::HttpError,
    models::usermodel::AuthUser,
    AppState,
};

/// Milestone routes scoped under a job.
pub fn job_milestone_routes() -> Router {
    Router::new().route("/:id/milestones", post(create_milestone).get(list_milestones))
}

/// Milestone routes addressed by milestone id.
pub fn milestone_routes() -> Router {
    Router::new()
        .route("/:id/submit", put(submit_milestone))
        .route("/:id/approve", put(approve_milestone))
        .route("/:id/reject", put(reject_milestone))
}

async fn create_milestone(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(job_id): Path<Uuid>,
    Json(body): Json<CreateMilestoneDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let result = app_state
        .milestone_service
        .create(job_id, user.id, body)
        .await?;

    let message = if result.escrow_degraded {
        "Milestone created, escrow could not be opened"
    } else {
        "Milestone created"
    };

    Ok(Json(ApiResponse::success(message, result)))
}

async fn list_milestones(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let milestones = app_state
        .milestone_service
        .list_for_job(job_id, &user)
        .await?;

    Ok(Json(ApiResponse::success("Milestones retrieved", milestones)))
}

async fn submit_milestone(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(milestone_id): Path<Uuid>,
    Json(body): Json<SubmitMilestoneDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let milestone = app_state
        .milestone_service
        .submit(milestone_id, user.id, body)
        .await?;

    Ok(Json(ApiResponse::success("Milestone submitted", milestone)))
}

async fn approve_milestone(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(milestone_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let milestone = app_state
        .milestone_service
        .approve(milestone_id, user.id)
        .await?;

    Ok(Json(ApiResponse::success("Milestone approved", milestone)))
}

async fn reject_milestone(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(milestone_id): Path<Uuid>,
    Json(body): Json<RejectMilestoneDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let milestone = app_state
        .milestone_service
        .reject(milestone_id, user.id, body)
        .await?;

    Ok(Json(ApiResponse::success(
        "Milestone sent back for revision",
        milestone,
    )))
}
