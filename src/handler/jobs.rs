// handler/jobs.rs
use std::sync::Arc;

use axum::{
    extract::Path,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::engagementdtos::{ApiResponse, AssignBidDto, CreateJobDto, UpdateJobStatusDto},
    error::HttpError,
    models::usermodel::AuthUser,
    AppState,
};

pub fn job_routes() -> Router {
    Router::new()
        .route("/", post(create_job))
        .route("/:id", get(get_job))
        .route("/:id/assign", put(assign_bid))
        .route("/:id/status", put(update_job_status))
}

async fn create_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateJobDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let job = app_state.job_service.create_job(user.id, body).await?;

    Ok(Json(ApiResponse::success("Job created", job)))
}

async fn get_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state.job_service.get_job(job_id).await?;

    Ok(Json(ApiResponse::success("Job retrieved", job)))
}

/// Accept a single bid; every sibling pending bid is rejected in the same
/// operation and the job becomes assigned.
async fn assign_bid(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(job_id): Path<Uuid>,
    Json(body): Json<AssignBidDto>,
) -> Result<impl IntoResponse, HttpError> {
    let result = app_state
        .job_service
        .assign(job_id, body.bid_id, user.id)
        .await?;

    Ok(Json(ApiResponse::success("Bid accepted, job assigned", result)))
}

async fn update_job_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(job_id): Path<Uuid>,
    Json(body): Json<UpdateJobStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state
        .job_service
        .update_status(job_id, body.target, &user)
        .await?;

    Ok(Json(ApiResponse::success("Job status updated", job)))
}
