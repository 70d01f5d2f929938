// db/biddb.rs
use async_trait::async_trait;
use sqlx::types::BigDecimal;
use uuid::Uuid;

use super::db::{DBClient, StoreError};
use crate::models::engagementmodel::Bid;

#[async_trait]
pub trait BidExt {
    /// Insert a pending bid. The partial unique index on
    /// (job_id, provider_id) WHERE status = 'pending' turns a duplicate
    /// submission into StoreError::Duplicate.
    async fn insert_bid(
        &self,
        job_id: Uuid,
        provider_id: Uuid,
        amount: BigDecimal,
        proposal: String,
    ) -> Result<Bid, StoreError>;

    async fn get_bid(&self, bid_id: Uuid) -> Result<Option<Bid>, StoreError>;

    /// Conditional pending→accepted; None when the bid is no longer pending.
    async fn accept_bid(&self, bid_id: Uuid) -> Result<Option<Bid>, StoreError>;

    /// Conditional pending→withdrawn.
    async fn withdraw_bid(&self, bid_id: Uuid) -> Result<Option<Bid>, StoreError>;

    /// Reject every still-pending bid on the job except the given one,
    /// returning the bids that were rejected.
    async fn reject_pending_bids(
        &self,
        job_id: Uuid,
        except: Option<Uuid>,
    ) -> Result<Vec<Bid>, StoreError>;

    async fn list_bids_for_job(&self, job_id: Uuid) -> Result<Vec<Bid>, StoreError>;
}

const BID_COLUMNS: &str = r#"
    id, job_id, provider_id, amount, proposal, status, created_at, updated_at
"#;

#[async_trait]
impl BidExt for DBClient {
    async fn insert_bid(
        &self,
        job_id: Uuid,
        provider_id: Uuid,
        amount: BigDecimal,
        proposal: String,
    ) -> Result<Bid, StoreError> {
        let bid = sqlx::query_as::<_, Bid>(&format!(
            r#"
            INSERT INTO bids (job_id, provider_id, amount, proposal)
            VALUES ($1, $2, $3, $4)
            RETURNING {BID_COLUMNS}
            "#
        ))
        .bind(job_id)
        .bind(provider_id)
        .bind(amount)
        .bind(proposal)
        .fetch_one(&self.pool)
        .await?;

        Ok(bid)
    }

    async fn get_bid(&self, bid_id: Uuid) -> Result<Option<Bid>, StoreError> {
        let bid = sqlx::query_as::<_, Bid>(&format!(
            r#"
            SELECT {BID_COLUMNS}
            FROM bids
            WHERE id = $1
            "#
        ))
        .bind(bid_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(bid)
    }

    async fn accept_bid(&self, bid_id: Uuid) -> Result<Option<Bid>, StoreError> {
        let bid = sqlx::query_as::<_, Bid>(&format!(
            r#"
            UPDATE bids
            SET status = 'accepted', updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {BID_COLUMNS}
            "#
        ))
        .bind(bid_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(bid)
    }

    async fn withdraw_bid(&self, bid_id: Uuid) -> Result<Option<Bid>, StoreError> {
        let bid = sqlx::query_as::<_, Bid>(&format!(
            r#"
            UPDATE bids
            SET status = 'withdrawn', updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {BID_COLUMNS}
            "#
        ))
        .bind(bid_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(bid)
    }

    async fn reject_pending_bids(
        &self,
        job_id: Uuid,
        except: Option<Uuid>,
    ) -> Result<Vec<Bid>, StoreError> {
        let bids = sqlx::query_as::<_, Bid>(&format!(
            r#"
            UPDATE bids
            SET status = 'rejected', updated_at = NOW()
            WHERE job_id = $1 AND status = 'pending' AND ($2::UUID IS NULL OR id <> $2)
            RETURNING {BID_COLUMNS}
            "#
        ))
        .bind(job_id)
        .bind(except)
        .fetch_all(&self.pool)
        .await?;

        Ok(bids)
    }

    async fn list_bids_for_job(&self, job_id: Uuid) -> Result<Vec<Bid>, StoreError> {
        let bids = sqlx::query_as::<_, Bid>(&format!(
            r#"
            SELECT {BID_COLUMNS}
            FROM bids
            WHERE job_id = $1
            ORDER BY created_at ASC
            "#
        ))
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bids)
    }
}
