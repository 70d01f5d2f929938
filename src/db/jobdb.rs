// db/jobdb.rs
use async_trait::async_trait;
use sqlx::types::BigDecimal;
use uuid::Uuid;

use super::db::{DBClient, StoreError};
use crate::models::engagementmodel::{Job, JobStatus};

#[async_trait]
pub trait JobExt {
    async fn insert_job(
        &self,
        owner_id: Uuid,
        title: String,
        description: String,
        budget: BigDecimal,
    ) -> Result<Job, StoreError>;

    async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>, StoreError>;

    /// The single serialization point of the assignment workflow: an
    /// open→assigned conditional update. Returns None when the job was no
    /// longer open, in which case nothing has been mutated.
    async fn claim_assignment(
        &self,
        job_id: Uuid,
        provider_id: Uuid,
    ) -> Result<Option<Job>, StoreError>;

    /// Compensation for a lost bid-withdraw race: assigned→open, clearing
    /// the provider again.
    async fn release_assignment(&self, job_id: Uuid) -> Result<Option<Job>, StoreError>;

    /// Conditional status transition; None means the expected current
    /// status no longer held.
    async fn update_status_from(
        &self,
        job_id: Uuid,
        from: JobStatus,
        to: JobStatus,
    ) -> Result<Option<Job>, StoreError>;
}

const JOB_COLUMNS: &str = r#"
    id, owner_id, title, description, budget,
    status, assigned_provider_id, created_at, updated_at
"#;

#[async_trait]
impl JobExt for DBClient {
    async fn insert_job(
        &self,
        owner_id: Uuid,
        title: String,
        description: String,
        budget: BigDecimal,
    ) -> Result<Job, StoreError> {
        let job = sqlx::query_as::<_, Job>(&format!(
            r#"
            INSERT INTO jobs (owner_id, title, description, budget)
            VALUES ($1, $2, $3, $4)
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(title)
        .bind(description)
        .bind(budget)
        .fetch_one(&self.pool)
        .await?;

        Ok(job)
    }

    async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>, StoreError> {
        let job = sqlx::query_as::<_, Job>(&format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM jobs
            WHERE id = $1
            "#
        ))
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(job)
    }

    async fn claim_assignment(
        &self,
        job_id: Uuid,
        provider_id: Uuid,
    ) -> Result<Option<Job>, StoreError> {
        let job = sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE jobs
            SET status = 'assigned', assigned_provider_id = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'open'
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(job_id)
        .bind(provider_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(job)
    }

    async fn release_assignment(&self, job_id: Uuid) -> Result<Option<Job>, StoreError> {
        let job = sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE jobs
            SET status = 'open', assigned_provider_id = NULL, updated_at = NOW()
            WHERE id = $1 AND status = 'assigned'
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(job)
    }

    async fn update_status_from(
        &self,
        job_id: Uuid,
        from: JobStatus,
        to: JobStatus,
    ) -> Result<Option<Job>, StoreError> {
        let job = sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE jobs
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(job_id)
        .bind(from)
        .bind(to)
        .fetch_optional(&self.pool)
        .await?;

        Ok(job)
    }
}
