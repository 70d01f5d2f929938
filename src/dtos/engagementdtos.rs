use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::engagementmodel::JobStatus;

// Job DTOs
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateJobDto {
    #[validate(length(min = 1, max = 100, message = "Title must be between 1 and 100 characters"))]
    pub title: String,

    #[validate(length(
        min = 10,
        max = 2000,
        message = "Description must be between 10 and 2000 characters"
    ))]
    pub description: String,

    #[validate(range(min = 1.0, message = "Budget must be positive"))]
    pub budget: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AssignBidDto {
    pub bid_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateJobStatusDto {
    pub target: JobStatus,
}

// Bid DTOs
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SubmitBidDto {
    #[validate(range(min = 1.0, message = "Amount must be positive"))]
    pub amount: f64,

    #[validate(length(
        min = 10,
        max = 2000,
        message = "Proposal must be between 10 and 2000 characters"
    ))]
    pub proposal: String,
}

// Milestone DTOs
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateMilestoneDto {
    #[validate(range(min = 1.0, message = "Amount must be positive"))]
    pub amount: f64,

    pub due_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub use_escrow: bool,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SubmitMilestoneDto {
    #[validate(length(max = 500, message = "File reference too long"))]
    pub file_ref: Option<String>,

    #[validate(length(max = 2000, message = "Notes too long"))]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RejectMilestoneDto {
    #[validate(length(
        min = 5,
        max = 1000,
        message = "Reason must be between 5 and 1000 characters"
    ))]
    pub reason: String,
}

// Notification DTOs
#[derive(Debug, Deserialize)]
pub struct PaginationParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

// Response wrappers
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: &str, data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: message.to_string(),
            data: Some(data),
        }
    }
}
