use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    db::db::StoreError,
    error::HttpError,
    models::engagementmodel::JobStatus,
    service::escrow::EscrowError,
};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Job {0} not found")]
    JobNotFound(Uuid),

    #[error("Bid {0} not found")]
    BidNotFound(Uuid),

    #[error("Milestone {0} not found")]
    MilestoneNotFound(Uuid),

    #[error("Notification {0} not found")]
    NotificationNotFound(Uuid),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("User {0} is not allowed to perform this action")]
    Forbidden(Uuid),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid job transition from {from:?} to {to:?}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    /// The escrow collaborator failed or timed out. Local state is
    /// preserved; the operation can be retried.
    #[error("Escrow collaborator error: {0}")]
    EscrowUnavailable(#[from] EscrowError),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<StoreError> for ServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Duplicate => {
                ServiceError::Conflict("a pending bid already exists for this provider".to_string())
            }
            StoreError::Sqlx(e) => ServiceError::Database(e),
        }
    }
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::JobNotFound(_)
            | ServiceError::BidNotFound(_)
            | ServiceError::MilestoneNotFound(_)
            | ServiceError::NotificationNotFound(_) => StatusCode::NOT_FOUND,

            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,

            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,

            ServiceError::Conflict(_) | ServiceError::InvalidTransition { .. } => {
                StatusCode::CONFLICT
            }

            ServiceError::EscrowUnavailable(_) => StatusCode::BAD_GATEWAY,

            ServiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        let status = error.status_code();
        HttpError::new(error.to_string(), status)
    }
}
