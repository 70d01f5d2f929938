// db/milestonedb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::BigDecimal;
use uuid::Uuid;

use super::db::{DBClient, StoreError};
use crate::models::engagementmodel::{Milestone, MilestoneStatus};

#[async_trait]
pub trait MilestoneExt {
    async fn insert_milestone(
        &self,
        job_id: Uuid,
        amount: BigDecimal,
        due_date: Option<DateTime<Utc>>,
        use_escrow: bool,
        escrow_ref: Option<String>,
    ) -> Result<Milestone, StoreError>;

    async fn get_milestone(&self, milestone_id: Uuid) -> Result<Option<Milestone>, StoreError>;

    async fn list_milestones(&self, job_id: Uuid) -> Result<Vec<Milestone>, StoreError>;

    /// Conditional {pending,in_progress}→submitted, recording the delivery.
    async fn mark_submitted(
        &self,
        milestone_id: Uuid,
        submission_file: Option<String>,
        submission_notes: Option<String>,
    ) -> Result<Option<Milestone>, StoreError>;

    async fn update_milestone_status_from(
        &self,
        milestone_id: Uuid,
        from: MilestoneStatus,
        to: MilestoneStatus,
    ) -> Result<Option<Milestone>, StoreError>;

    /// Conditional submitted→rejected with the owner's reason recorded.
    async fn mark_rejected(
        &self,
        milestone_id: Uuid,
        reason: String,
    ) -> Result<Option<Milestone>, StoreError>;

    /// Conditional approved→completed. The release transaction reference is
    /// recorded in the same write so a completed escrow-backed milestone
    /// always carries its escrow_tx_ref.
    async fn complete_milestone(
        &self,
        milestone_id: Uuid,
        escrow_tx_ref: Option<String>,
    ) -> Result<Option<Milestone>, StoreError>;

    /// Administrative completion from any non-terminal state.
    async fn force_complete_milestone(
        &self,
        milestone_id: Uuid,
        escrow_tx_ref: Option<String>,
    ) -> Result<Option<Milestone>, StoreError>;

    /// Move every non-terminal, non-approved milestone of a cancelled job to
    /// voided, returning the affected rows.
    async fn void_milestones(&self, job_id: Uuid) -> Result<Vec<Milestone>, StoreError>;
}

const MILESTONE_COLUMNS: &str = r#"
    id, job_id, amount, due_date, status, use_escrow,
    escrow_ref, escrow_tx_ref, submission_file, submission_notes,
    rejection_reason, created_at, updated_at
"#;

#[async_trait]
impl MilestoneExt for DBClient {
    async fn insert_milestone(
        &self,
        job_id: Uuid,
        amount: BigDecimal,
        due_date: Option<DateTime<Utc>>,
        use_escrow: bool,
        escrow_ref: Option<String>,
    ) -> Result<Milestone, StoreError> {
        let milestone = sqlx::query_as::<_, Milestone>(&format!(
            r#"
            INSERT INTO milestones (job_id, amount, due_date, use_escrow, escrow_ref)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {MILESTONE_COLUMNS}
            "#
        ))
        .bind(job_id)
        .bind(amount)
        .bind(due_date)
        .bind(use_escrow)
        .bind(escrow_ref)
        .fetch_one(&self.pool)
        .await?;

        Ok(milestone)
    }

    async fn get_milestone(&self, milestone_id: Uuid) -> Result<Option<Milestone>, StoreError> {
        let milestone = sqlx::query_as::<_, Milestone>(&format!(
            r#"
            SELECT {MILESTONE_COLUMNS}
            FROM milestones
            WHERE id = $1
            "#
        ))
        .bind(milestone_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(milestone)
    }

    async fn list_milestones(&self, job_id: Uuid) -> Result<Vec<Milestone>, StoreError> {
        let milestones = sqlx::query_as::<_, Milestone>(&format!(
            r#"
            SELECT {MILESTONE_COLUMNS}
            FROM milestones
            WHERE job_id = $1
            ORDER BY created_at ASC
            "#
        ))
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(milestones)
    }

    async fn mark_submitted(
        &self,
        milestone_id: Uuid,
        submission_file: Option<String>,
        submission_notes: Option<String>,
    ) -> Result<Option<Milestone>, StoreError> {
        let milestone = sqlx::query_as::<_, Milestone>(&format!(
            r#"
            UPDATE milestones
            SET status = 'submitted',
                submission_file = $2,
                submission_notes = $3,
                updated_at = NOW()
            WHERE id = $1 AND status IN ('pending', 'in_progress')
            RETURNING {MILESTONE_COLUMNS}
            "#
        ))
        .bind(milestone_id)
        .bind(submission_file)
        .bind(submission_notes)
        .fetch_optional(&self.pool)
        .await?;

        Ok(milestone)
    }

    async fn update_milestone_status_from(
        &self,
        milestone_id: Uuid,
        from: MilestoneStatus,
        to: MilestoneStatus,
    ) -> Result<Option<Milestone>, StoreError> {
        let milestone = sqlx::query_as::<_, Milestone>(&format!(
            r#"
            UPDATE milestones
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {MILESTONE_COLUMNS}
            "#
        ))
        .bind(milestone_id)
        .bind(from)
        .bind(to)
        .fetch_optional(&self.pool)
        .await?;

        Ok(milestone)
    }

    async fn mark_rejected(
        &self,
        milestone_id: Uuid,
        reason: String,
    ) -> Result<Option<Milestone>, StoreError> {
        let milestone = sqlx::query_as::<_, Milestone>(&format!(
            r#"
            UPDATE milestones
            SET status = 'rejected', rejection_reason = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'submitted'
            RETURNING {MILESTONE_COLUMNS}
            "#
        ))
        .bind(milestone_id)
        .bind(reason)
        .fetch_optional(&self.pool)
        .await?;

        Ok(milestone)
    }

    async fn complete_milestone(
        &self,
        milestone_id: Uuid,
        escrow_tx_ref: Option<String>,
    ) -> Result<Option<Milestone>, StoreError> {
        let milestone = sqlx::query_as::<_, Milestone>(&format!(
            r#"
            UPDATE milestones
            SET status = 'completed', escrow_tx_ref = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'approved'
            RETURNING {MILESTONE_COLUMNS}
            "#
        ))
        .bind(milestone_id)
        .bind(escrow_tx_ref)
        .fetch_optional(&self.pool)
        .await?;

        Ok(milestone)
    }

    async fn force_complete_milestone(
        &self,
        milestone_id: Uuid,
        escrow_tx_ref: Option<String>,
    ) -> Result<Option<Milestone>, StoreError> {
        let milestone = sqlx::query_as::<_, Milestone>(&format!(
            r#"
            UPDATE milestones
            SET status = 'completed', escrow_tx_ref = $2, updated_at = NOW()
            WHERE id = $1 AND status NOT IN ('completed', 'voided')
            RETURNING {MILESTONE_COLUMNS}
            "#
        ))
        .bind(milestone_id)
        .bind(escrow_tx_ref)
        .fetch_optional(&self.pool)
        .await?;

        Ok(milestone)
    }

    async fn void_milestones(&self, job_id: Uuid) -> Result<Vec<Milestone>, StoreError> {
        let milestones = sqlx::query_as::<_, Milestone>(&format!(
            r#"
            UPDATE milestones
            SET status = 'voided', updated_at = NOW()
            WHERE job_id = $1 AND status IN ('pending', 'in_progress', 'submitted', 'rejected')
            RETURNING {MILESTONE_COLUMNS}
            "#
        ))
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(milestones)
    }
}
