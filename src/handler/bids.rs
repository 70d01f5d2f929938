// handler/bids.rs
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
    dtos::engagementdtos::{ApiResponse, SubmitBidDto},
    error::HttpError,
    models::usermodel::AuthUser,
    AppState,
};

/// Bid routes scoped under a job.
pub fn job_bid_routes() -> Router {
    Router::new().route("/:id/bids", post(submit_bid).get(list_bids))
}

/// Bid routes addressed by bid id.
pub fn bid_routes() -> Router {
    Router::new().route("/:id/withdraw", put(withdraw_bid))
}

async fn submit_bid(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(job_id): Path<Uuid>,
    Json(body): Json<SubmitBidDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let bid = app_state.bid_service.submit(job_id, user.id, body).await?;

    Ok(Json(ApiResponse::success("Bid submitted", bid)))
}

async fn list_bids(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let bids = app_state.bid_service.list_for_job(job_id, &user).await?;

    Ok(Json(ApiResponse::success("Bids retrieved", bids)))
}

async fn withdraw_bid(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(bid_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let bid = app_state.bid_service.withdraw(bid_id, user.id).await?;

    Ok(Json(ApiResponse::success("Bid withdrawn", bid)))
}
