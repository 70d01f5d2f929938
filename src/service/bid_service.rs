// service/bid_service.rs
use std::sync::Arc;

use sqlx::types::BigDecimal;
use uuid::Uuid;

use crate::{
    db::{biddb::BidExt, jobdb::JobExt},
    dtos::engagementdtos::SubmitBidDto,
    models::engagementmodel::{Bid, JobStatus},
    models::usermodel::{AuthUser, UserRole},
    service::{
        error::ServiceError,
        events::{emit, DomainEvent, EventSender},
    },
};

#[derive(Debug)]
pub struct BidService<S> {
    store: Arc<S>,
    events: EventSender,
}

impl<S> BidService<S>
where
    S: JobExt + BidExt + Send + Sync,
{
    pub fn new(store: Arc<S>, events: EventSender) -> Self {
        Self { store, events }
    }

    /// Submit a proposal against an open job. Duplicate pending bids from
    /// the same provider are refused by the storage-level uniqueness
    /// constraint, not just by this precheck.
    pub async fn submit(
        &self,
        job_id: Uuid,
        provider_id: Uuid,
        data: SubmitBidDto,
    ) -> Result<Bid, ServiceError> {
        let job = self
            .store
            .get_job(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))?;

        if job.status != JobStatus::Open {
            return Err(ServiceError::Validation(
                "job is not open for bidding".to_string(),
            ));
        }

        if job.owner_id == provider_id {
            return Err(ServiceError::Validation(
                "cannot bid on your own job".to_string(),
            ));
        }

        let amount = BigDecimal::try_from(data.amount)
            .map_err(|_| ServiceError::Validation("Amount is not a valid amount".to_string()))?;

        let bid = self
            .store
            .insert_bid(job_id, provider_id, amount, data.proposal)
            .await?;

        emit(
            &self.events,
            DomainEvent::BidReceived {
                bid: bid.clone(),
                owner_id: job.owner_id,
            },
        );

        Ok(bid)
    }

    /// A provider may take back their own bid while it is still pending.
    pub async fn withdraw(&self, bid_id: Uuid, provider_id: Uuid) -> Result<Bid, ServiceError> {
        let bid = self
            .store
            .get_bid(bid_id)
            .await?
            .ok_or(ServiceError::BidNotFound(bid_id))?;

        if bid.provider_id != provider_id {
            return Err(ServiceError::Forbidden(provider_id));
        }

        self.store
            .withdraw_bid(bid_id)
            .await?
            .ok_or_else(|| ServiceError::Conflict("bid is no longer pending".to_string()))
    }

    /// The job owner (or an admin) sees every bid; a provider sees their own.
    pub async fn list_for_job(
        &self,
        job_id: Uuid,
        caller: &AuthUser,
    ) -> Result<Vec<Bid>, ServiceError> {
        let job = self
            .store
            .get_job(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))?;

        let bids = self.store.list_bids_for_job(job_id).await?;

        if job.owner_id == caller.id || caller.role == UserRole::Admin {
            return Ok(bids);
        }

        Ok(bids
            .into_iter()
            .filter(|bid| bid.provider_id == caller.id)
            .collect())
    }
}
