// handler/notifications.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::{
    dtos::engagementdtos::{ApiResponse, PaginationParams},
    error::HttpError,
    models::usermodel::AuthUser,
    AppState,
};

pub fn notification_routes() -> Router {
    Router::new()
        .route("/", get(list_notifications))
        .route("/unread-count", get(unread_count))
        .route("/:id/read", put(mark_read))
}

async fn list_notifications(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, HttpError> {
    let page = pagination.page.unwrap_or(1);
    let limit = pagination.limit.unwrap_or(20);

    let notifications = app_state
        .notification_service
        .list(user.id, page, limit)
        .await?;

    Ok(Json(ApiResponse::success(
        "Notifications retrieved",
        notifications,
    )))
}

async fn unread_count(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, HttpError> {
    let count = app_state.notification_service.unread_count(user.id).await?;

    Ok(Json(ApiResponse::success(
        "Unread count retrieved",
        serde_json::json!({ "unread_count": count }),
    )))
}

async fn mark_read(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(notification_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let notification = app_state
        .notification_service
        .mark_read(notification_id, &user)
        .await?;

    Ok(Json(ApiResponse::success(
        "Notification marked as read",
        notification,
    )))
}
