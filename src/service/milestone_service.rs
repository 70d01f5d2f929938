// service/milestone_service.rs
use std::sync::Arc;

use serde::Serialize;
use sqlx::types::BigDecimal;
use uuid::Uuid;

use crate::{
    db::{jobdb::JobExt, milestonedb::MilestoneExt},
    dtos::engagementdtos::{CreateMilestoneDto, RejectMilestoneDto, SubmitMilestoneDto},
    models::engagementmodel::{Job, JobStatus, Milestone, MilestoneStatus},
    models::usermodel::{AuthUser, UserRole},
    service::{
        error::ServiceError,
        escrow::{EscrowGateway, EscrowStatusSnapshot},
        events::{emit, DomainEvent, EventSender},
    },
};

#[derive(Debug)]
pub struct MilestoneService<S, G> {
    store: Arc<S>,
    gateway: Arc<G>,
    events: EventSender,
}

#[derive(Debug, Serialize)]
pub struct MilestoneCreateResult {
    pub milestone: Milestone,
    /// True when escrow was requested but could not be opened; the
    /// milestone exists without it.
    pub escrow_degraded: bool,
}

impl<S, G> MilestoneService<S, G>
where
    S: JobExt + MilestoneExt + Send + Sync,
    G: EscrowGateway,
{
    pub fn new(store: Arc<S>, gateway: Arc<G>, events: EventSender) -> Self {
        Self {
            store,
            gateway,
            events,
        }
    }

    /// Create a payment checkpoint for an assigned job. When escrow is
    /// requested, the collaborator is called synchronously; if it fails, the
    /// milestone is still created with use_escrow=false and the owner gets a
    /// warning. Payment orchestration is never a hard dependency of
    /// bookkeeping.
    pub async fn create(
        &self,
        job_id: Uuid,
        caller_id: Uuid,
        data: CreateMilestoneDto,
    ) -> Result<MilestoneCreateResult, ServiceError> {
        let job = self.fetch_job(job_id).await?;

        if job.owner_id != caller_id {
            return Err(ServiceError::Forbidden(caller_id));
        }

        if !matches!(job.status, JobStatus::Assigned | JobStatus::UnderReview) {
            return Err(ServiceError::Conflict(
                "milestones require an assigned job".to_string(),
            ));
        }

        let provider_id = job.assigned_provider_id.ok_or_else(|| {
            ServiceError::Conflict("job has no assigned provider".to_string())
        })?;

        let amount = BigDecimal::try_from(data.amount)
            .map_err(|_| ServiceError::Validation("Amount is not a valid amount".to_string()))?;

        let mut use_escrow = data.use_escrow;
        let mut escrow_ref = None;
        let mut degraded_reason = None;

        if data.use_escrow {
            match self
                .gateway
                .create_escrow(job.owner_id, provider_id, data.amount)
                .await
            {
                Ok(created) => {
                    tracing::info!(
                        "escrow {} opened for job {} (tx {})",
                        created.escrow_id,
                        job.id,
                        created.tx_hash
                    );
                    escrow_ref = Some(created.escrow_id);
                }
                Err(e) => {
                    tracing::warn!("escrow open failed for job {}: {}", job.id, e);
                    use_escrow = false;
                    degraded_reason = Some(e.to_string());
                }
            }
        }

        let milestone = self
            .store
            .insert_milestone(job.id, amount, data.due_date, use_escrow, escrow_ref)
            .await?;

        if let Some(reason) = &degraded_reason {
            emit(
                &self.events,
                DomainEvent::EscrowWarning {
                    owner_id: job.owner_id,
                    related_ref: milestone.id,
                    detail: format!("milestone created without escrow: {}", reason),
                },
            );
        }

        Ok(MilestoneCreateResult {
            milestone,
            escrow_degraded: degraded_reason.is_some(),
        })
    }

    /// Provider delivers work against the milestone.
    pub async fn submit(
        &self,
        milestone_id: Uuid,
        caller_id: Uuid,
        data: SubmitMilestoneDto,
    ) -> Result<Milestone, ServiceError> {
        let milestone = self.fetch_milestone(milestone_id).await?;
        let job = self.fetch_job(milestone.job_id).await?;

        if job.assigned_provider_id != Some(caller_id) {
            return Err(ServiceError::Forbidden(caller_id));
        }

        if job.status.is_terminal() {
            return Err(ServiceError::Conflict("job is closed".to_string()));
        }

        let submitted = self
            .store
            .mark_submitted(milestone_id, data.file_ref, data.notes)
            .await?
            .ok_or_else(|| {
                ServiceError::Conflict("milestone is not awaiting work".to_string())
            })?;

        emit(
            &self.events,
            DomainEvent::MilestoneSubmitted {
                milestone: submitted.clone(),
                owner_id: job.owner_id,
            },
        );

        Ok(submitted)
    }

    /// Approve delivered work and, for escrow-backed milestones, release the
    /// held funds. Approval and release are separate, separately-failing
    /// steps: a failed release leaves the milestone approved and retryable,
    /// and the milestone is never reported completed without a confirmed
    /// release transaction.
    ///
    /// Idempotent: approving an already-completed milestone returns it
    /// unchanged and performs no second release call.
    pub async fn approve(
        &self,
        milestone_id: Uuid,
        caller_id: Uuid,
    ) -> Result<Milestone, ServiceError> {
        let milestone = self.fetch_milestone(milestone_id).await?;
        let job = self.fetch_job(milestone.job_id).await?;

        if job.owner_id != caller_id {
            return Err(ServiceError::Forbidden(caller_id));
        }

        let provider_id = job.assigned_provider_id.ok_or_else(|| {
            ServiceError::Conflict("job has no assigned provider".to_string())
        })?;

        match milestone.status {
            MilestoneStatus::Completed => Ok(milestone),
            MilestoneStatus::Submitted => {
                if job.status.is_terminal() {
                    return Err(ServiceError::Conflict("job is closed".to_string()));
                }

                let approved = self
                    .store
                    .update_milestone_status_from(
                        milestone_id,
                        MilestoneStatus::Submitted,
                        MilestoneStatus::Approved,
                    )
                    .await?
                    .ok_or_else(|| {
                        ServiceError::Conflict("milestone is not awaiting approval".to_string())
                    })?;

                emit(
                    &self.events,
                    DomainEvent::MilestoneApproved {
                        milestone: approved.clone(),
                        provider_id,
                    },
                );

                self.settle(approved, job.owner_id, provider_id).await
            }
            // A previous release attempt failed; re-enter at the release
            // step.
            MilestoneStatus::Approved => self.settle(milestone, job.owner_id, provider_id).await,
            _ => Err(ServiceError::Conflict(
                "milestone is not awaiting approval".to_string(),
            )),
        }
    }

    /// Owner sends delivered work back for revision.
    pub async fn reject(
        &self,
        milestone_id: Uuid,
        caller_id: Uuid,
        data: RejectMilestoneDto,
    ) -> Result<Milestone, ServiceError> {
        let milestone = self.fetch_milestone(milestone_id).await?;
        let job = self.fetch_job(milestone.job_id).await?;

        if job.owner_id != caller_id {
            return Err(ServiceError::Forbidden(caller_id));
        }

        if job.status.is_terminal() {
            return Err(ServiceError::Conflict("job is closed".to_string()));
        }

        let provider_id = job.assigned_provider_id.ok_or_else(|| {
            ServiceError::Conflict("job has no assigned provider".to_string())
        })?;

        let rejected = self
            .store
            .mark_rejected(milestone_id, data.reason)
            .await?
            .ok_or_else(|| {
                ServiceError::Conflict("milestone is not awaiting approval".to_string())
            })?;

        emit(
            &self.events,
            DomainEvent::MilestoneRejected {
                milestone: rejected.clone(),
                provider_id,
            },
        );

        // Hand the milestone straight back to the provider for rework.
        let in_progress = self
            .store
            .update_milestone_status_from(
                milestone_id,
                MilestoneStatus::Rejected,
                MilestoneStatus::InProgress,
            )
            .await?
            .unwrap_or(rejected);

        Ok(in_progress)
    }

    pub async fn list_for_job(
        &self,
        job_id: Uuid,
        caller: &AuthUser,
    ) -> Result<Vec<Milestone>, ServiceError> {
        let job = self.fetch_job(job_id).await?;

        let allowed = job.owner_id == caller.id
            || job.assigned_provider_id == Some(caller.id)
            || caller.role == UserRole::Admin;
        if !allowed {
            return Err(ServiceError::Forbidden(caller.id));
        }

        Ok(self.store.list_milestones(job_id).await?)
    }

    /// Administrative: fetch the collaborator's view of a milestone's escrow.
    pub async fn escrow_status(
        &self,
        milestone_id: Uuid,
    ) -> Result<EscrowStatusSnapshot, ServiceError> {
        let milestone = self.fetch_milestone(milestone_id).await?;

        let escrow_ref = milestone.escrow_ref.as_deref().ok_or_else(|| {
            ServiceError::Validation("milestone has no escrow".to_string())
        })?;

        Ok(self.gateway.get_status(escrow_ref).await?)
    }

    /// Administrative: release a milestone's escrow out of band and complete
    /// it, regardless of the review flow.
    pub async fn force_release(&self, milestone_id: Uuid) -> Result<Milestone, ServiceError> {
        let milestone = self.fetch_milestone(milestone_id).await?;
        let job = self.fetch_job(milestone.job_id).await?;

        if milestone.status == MilestoneStatus::Completed {
            return Ok(milestone);
        }

        // Local guards run before the collaborator is touched: once funds
        // are released there is no completion state a voided milestone
        // could absorb.
        if milestone.status == MilestoneStatus::Voided {
            return Err(ServiceError::Conflict(
                "milestone was voided; its escrow cannot be released here".to_string(),
            ));
        }

        let escrow_ref = milestone.escrow_ref.as_deref().ok_or_else(|| {
            ServiceError::Validation("milestone has no escrow".to_string())
        })?;

        let release = self.gateway.release(escrow_ref).await?;

        let completed = self
            .store
            .force_complete_milestone(milestone_id, Some(release.tx_hash))
            .await?
            .ok_or_else(|| ServiceError::Conflict("milestone is already settled".to_string()))?;

        if let Some(provider_id) = job.assigned_provider_id {
            emit(
                &self.events,
                DomainEvent::MilestoneCompleted {
                    milestone: completed.clone(),
                    provider_id,
                },
            );
        }

        Ok(completed)
    }

    /// Release escrow (when present) and complete an approved milestone.
    /// On release failure the milestone stays approved; the caller gets an
    /// error that distinguishes "retry later" from "no longer possible".
    async fn settle(
        &self,
        milestone: Milestone,
        owner_id: Uuid,
        provider_id: Uuid,
    ) -> Result<Milestone, ServiceError> {
        let tx_ref = match milestone.escrow_ref.as_deref() {
            Some(escrow_ref) => match self.gateway.release(escrow_ref).await {
                Ok(release) => Some(release.tx_hash),
                Err(e) => {
                    tracing::warn!(
                        "escrow release failed for milestone {}: {}",
                        milestone.id,
                        e
                    );
                    emit(
                        &self.events,
                        DomainEvent::EscrowWarning {
                            owner_id,
                            related_ref: milestone.id,
                            detail: format!("escrow release failed: {}", e),
                        },
                    );
                    return Err(ServiceError::EscrowUnavailable(e));
                }
            },
            None => None,
        };

        let completed = self
            .store
            .complete_milestone(milestone.id, tx_ref)
            .await?
            .ok_or_else(|| {
                ServiceError::Conflict("milestone changed concurrently".to_string())
            })?;

        emit(
            &self.events,
            DomainEvent::MilestoneCompleted {
                milestone: completed.clone(),
                provider_id,
            },
        );

        Ok(completed)
    }

    async fn fetch_job(&self, job_id: Uuid) -> Result<Job, ServiceError> {
        self.store
            .get_job(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))
    }

    async fn fetch_milestone(&self, milestone_id: Uuid) -> Result<Milestone, ServiceError> {
        self.store
            .get_milestone(milestone_id)
            .await?
            .ok_or(ServiceError::MilestoneNotFound(milestone_id))
    }
}
