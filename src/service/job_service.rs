// service/job_service.rs
use std::sync::Arc;

use serde::Serialize;
use sqlx::types::BigDecimal;
use uuid::Uuid;

use crate::{
    db::{biddb::BidExt, jobdb::JobExt, milestonedb::MilestoneExt},
    dtos::engagementdtos::CreateJobDto,
    models::engagementmodel::{Job, JobStatus},
    models::usermodel::{AuthUser, UserRole},
    service::{
        error::ServiceError,
        events::{emit, DomainEvent, EventSender},
    },
};

#[derive(Debug)]
pub struct JobService<S> {
    store: Arc<S>,
    events: EventSender,
}

#[derive(Debug, Serialize)]
pub struct AssignmentResult {
    pub job: Job,
    pub rejected_bid_ids: Vec<Uuid>,
}

impl<S> JobService<S>
where
    S: JobExt + BidExt + MilestoneExt + Send + Sync,
{
    pub fn new(store: Arc<S>, events: EventSender) -> Self {
        Self { store, events }
    }

    pub async fn create_job(
        &self,
        owner_id: Uuid,
        data: CreateJobDto,
    ) -> Result<Job, ServiceError> {
        let budget = BigDecimal::try_from(data.budget)
            .map_err(|_| ServiceError::Validation("Budget is not a valid amount".to_string()))?;

        let job = self
            .store
            .insert_job(owner_id, data.title, data.description, budget)
            .await?;

        Ok(job)
    }

    pub async fn get_job(&self, job_id: Uuid) -> Result<Job, ServiceError> {
        self.store
            .get_job(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))
    }

    /// Accept one bid, reject the rest, and move the job to assigned.
    ///
    /// Validation happens before any write. The open→assigned conditional
    /// update is the single serialization point: of any number of concurrent
    /// assign calls on the same job, exactly one claims it; the rest see
    /// Conflict having mutated nothing.
    pub async fn assign(
        &self,
        job_id: Uuid,
        bid_id: Uuid,
        caller_id: Uuid,
    ) -> Result<AssignmentResult, ServiceError> {
        let job = self
            .store
            .get_job(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))?;

        if job.owner_id != caller_id {
            return Err(ServiceError::Forbidden(caller_id));
        }

        if job.status != JobStatus::Open {
            return Err(ServiceError::Conflict("job is no longer open".to_string()));
        }

        let bid = self
            .store
            .get_bid(bid_id)
            .await?
            .ok_or(ServiceError::BidNotFound(bid_id))?;

        if bid.job_id != job_id {
            return Err(ServiceError::BidNotFound(bid_id));
        }

        if bid.status != crate::models::engagementmodel::BidStatus::Pending {
            return Err(ServiceError::Conflict("bid is no longer pending".to_string()));
        }

        // Guard first, mutate after.
        let job = self
            .store
            .claim_assignment(job_id, bid.provider_id)
            .await?
            .ok_or_else(|| ServiceError::Conflict("job is no longer open".to_string()))?;

        let accepted = self.store.accept_bid(bid_id).await?;
        let accepted = match accepted {
            Some(bid) => bid,
            None => {
                // The provider withdrew between our precheck and the claim.
                // Put the job back and report the conflict.
                self.store.release_assignment(job_id).await?;
                return Err(ServiceError::Conflict("bid is no longer pending".to_string()));
            }
        };

        let rejected = self.store.reject_pending_bids(job_id, Some(bid_id)).await?;
        let rejected_bid_ids = rejected.iter().map(|b| b.id).collect();

        emit(&self.events, DomainEvent::BidAccepted { bid: accepted });
        for bid in rejected {
            emit(&self.events, DomainEvent::BidRejected { bid });
        }

        Ok(AssignmentResult {
            job,
            rejected_bid_ids,
        })
    }

    /// Apply one of the allowed job status transitions. Any pair outside the
    /// table fails with InvalidTransition; a concurrent status change turns
    /// into Conflict at the conditional update.
    pub async fn update_status(
        &self,
        job_id: Uuid,
        target: JobStatus,
        caller: &AuthUser,
    ) -> Result<Job, ServiceError> {
        let job = self
            .store
            .get_job(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))?;

        let from = job.status;

        match (from, target) {
            (JobStatus::Assigned, JobStatus::UnderReview) => {
                if job.assigned_provider_id != Some(caller.id) {
                    return Err(ServiceError::Forbidden(caller.id));
                }
            }
            (JobStatus::UnderReview, JobStatus::Completed)
            | (JobStatus::UnderReview, JobStatus::Assigned) => {
                if job.owner_id != caller.id {
                    return Err(ServiceError::Forbidden(caller.id));
                }
            }
            (JobStatus::Open, JobStatus::Cancelled)
            | (JobStatus::Assigned, JobStatus::Cancelled)
            | (JobStatus::UnderReview, JobStatus::Cancelled) => {
                if job.owner_id != caller.id && caller.role != UserRole::Admin {
                    return Err(ServiceError::Forbidden(caller.id));
                }
            }
            (from, to) => return Err(ServiceError::InvalidTransition { from, to }),
        }

        if target == JobStatus::Completed {
            self.check_escrow_settled(job_id).await?;
        }

        let updated = self
            .store
            .update_status_from(job_id, from, target)
            .await?
            .ok_or_else(|| {
                ServiceError::Conflict("job status changed concurrently".to_string())
            })?;

        match target {
            JobStatus::UnderReview => {
                emit(&self.events, DomainEvent::WorkSubmitted { job: updated.clone() });
            }
            JobStatus::Assigned => {
                emit(
                    &self.events,
                    DomainEvent::RevisionRequested { job: updated.clone() },
                );
            }
            JobStatus::Completed => {
                emit(&self.events, DomainEvent::JobCompleted { job: updated.clone() });
            }
            JobStatus::Cancelled => {
                self.settle_cancellation(&updated).await?;
            }
            JobStatus::Open => {}
        }

        Ok(updated)
    }

    /// Job-level completion must not outrun the escrow ledger: every
    /// escrow-backed milestone has to be settled (completed or voided) first.
    async fn check_escrow_settled(&self, job_id: Uuid) -> Result<(), ServiceError> {
        let milestones = self.store.list_milestones(job_id).await?;
        let outstanding = milestones
            .iter()
            .any(|m| m.use_escrow && !m.status.is_terminal());

        if outstanding {
            return Err(ServiceError::Conflict(
                "job has escrow-backed milestones that are not settled".to_string(),
            ));
        }

        Ok(())
    }

    /// A cancelled job leaves nothing stranded: open milestones are voided
    /// and still-pending bids rejected, each with a notification event.
    async fn settle_cancellation(&self, job: &Job) -> Result<(), ServiceError> {
        let voided = self.store.void_milestones(job.id).await?;
        if let Some(provider_id) = job.assigned_provider_id {
            for milestone in voided {
                emit(
                    &self.events,
                    DomainEvent::MilestoneVoided {
                        milestone,
                        provider_id,
                    },
                );
            }
        }

        let rejected = self.store.reject_pending_bids(job.id, None).await?;
        for bid in rejected {
            emit(&self.events, DomainEvent::BidRejected { bid });
        }

        emit(&self.events, DomainEvent::JobCancelled { job: job.clone() });

        Ok(())
    }
}
