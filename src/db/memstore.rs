// db/memstore.rs
//
// In-memory implementation of the store traits, used by the service tests.
// Every conditional update runs under one mutex, mirroring the atomicity of
// the SQL conditional updates it stands in for.
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::BigDecimal;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::biddb::BidExt;
use super::db::StoreError;
use super::jobdb::JobExt;
use super::milestonedb::MilestoneExt;
use super::notificationdb::NotificationExt;
use crate::models::engagementmodel::{
    Bid, BidStatus, Job, JobStatus, Milestone, MilestoneStatus, Notification, NotificationKind,
};

#[derive(Debug, Default)]
struct Inner {
    jobs: HashMap<Uuid, Job>,
    bids: HashMap<Uuid, Bid>,
    milestones: HashMap<Uuid, Milestone>,
    notifications: HashMap<Uuid, Notification>,
}

#[derive(Debug, Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobExt for MemStore {
    async fn insert_job(
        &self,
        owner_id: Uuid,
        title: String,
        description: String,
        budget: BigDecimal,
    ) -> Result<Job, StoreError> {
        let mut inner = self.inner.lock().await;
        let now = Utc::now();
        let job = Job {
            id: Uuid::new_v4(),
            owner_id,
            title,
            description,
            budget,
            status: JobStatus::Open,
            assigned_provider_id: None,
            created_at: now,
            updated_at: now,
        };
        inner.jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.jobs.get(&job_id).cloned())
    }

    async fn claim_assignment(
        &self,
        job_id: Uuid,
        provider_id: Uuid,
    ) -> Result<Option<Job>, StoreError> {
        let mut inner = self.inner.lock().await;
        match inner.jobs.get_mut(&job_id) {
            Some(job) if job.status == JobStatus::Open => {
                job.status = JobStatus::Assigned;
                job.assigned_provider_id = Some(provider_id);
                job.updated_at = Utc::now();
                Ok(Some(job.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn release_assignment(&self, job_id: Uuid) -> Result<Option<Job>, StoreError> {
        let mut inner = self.inner.lock().await;
        match inner.jobs.get_mut(&job_id) {
            Some(job) if job.status == JobStatus::Assigned => {
                job.status = JobStatus::Open;
                job.assigned_provider_id = None;
                job.updated_at = Utc::now();
                Ok(Some(job.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn update_status_from(
        &self,
        job_id: Uuid,
        from: JobStatus,
        to: JobStatus,
    ) -> Result<Option<Job>, StoreError> {
        let mut inner = self.inner.lock().await;
        match inner.jobs.get_mut(&job_id) {
            Some(job) if job.status == from => {
                job.status = to;
                job.updated_at = Utc::now();
                Ok(Some(job.clone()))
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl BidExt for MemStore {
    async fn insert_bid(
        &self,
        job_id: Uuid,
        provider_id: Uuid,
        amount: BigDecimal,
        proposal: String,
    ) -> Result<Bid, StoreError> {
        let mut inner = self.inner.lock().await;

        let duplicate = inner.bids.values().any(|bid| {
            bid.job_id == job_id
                && bid.provider_id == provider_id
                && bid.status == BidStatus::Pending
        });
        if duplicate {
            return Err(StoreError::Duplicate);
        }

        let now = Utc::now();
        let bid = Bid {
            id: Uuid::new_v4(),
            job_id,
            provider_id,
            amount,
            proposal,
            status: BidStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        inner.bids.insert(bid.id, bid.clone());
        Ok(bid)
    }

    async fn get_bid(&self, bid_id: Uuid) -> Result<Option<Bid>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.bids.get(&bid_id).cloned())
    }

    async fn accept_bid(&self, bid_id: Uuid) -> Result<Option<Bid>, StoreError> {
        let mut inner = self.inner.lock().await;
        match inner.bids.get_mut(&bid_id) {
            Some(bid) if bid.status == BidStatus::Pending => {
                bid.status = BidStatus::Accepted;
                bid.updated_at = Utc::now();
                Ok(Some(bid.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn withdraw_bid(&self, bid_id: Uuid) -> Result<Option<Bid>, StoreError> {
        let mut inner = self.inner.lock().await;
        match inner.bids.get_mut(&bid_id) {
            Some(bid) if bid.status == BidStatus::Pending => {
                bid.status = BidStatus::Withdrawn;
                bid.updated_at = Utc::now();
                Ok(Some(bid.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn reject_pending_bids(
        &self,
        job_id: Uuid,
        except: Option<Uuid>,
    ) -> Result<Vec<Bid>, StoreError> {
        let mut inner = self.inner.lock().await;
        let mut rejected = Vec::new();
        for bid in inner.bids.values_mut() {
            if bid.job_id == job_id
                && bid.status == BidStatus::Pending
                && Some(bid.id) != except
            {
                bid.status = BidStatus::Rejected;
                bid.updated_at = Utc::now();
                rejected.push(bid.clone());
            }
        }
        Ok(rejected)
    }

    async fn list_bids_for_job(&self, job_id: Uuid) -> Result<Vec<Bid>, StoreError> {
        let inner = self.inner.lock().await;
        let mut bids: Vec<Bid> = inner
            .bids
            .values()
            .filter(|bid| bid.job_id == job_id)
            .cloned()
            .collect();
        bids.sort_by_key(|bid| bid.created_at);
        Ok(bids)
    }
}

#[async_trait]
impl MilestoneExt for MemStore {
    async fn insert_milestone(
        &self,
        job_id: Uuid,
        amount: BigDecimal,
        due_date: Option<DateTime<Utc>>,
        use_escrow: bool,
        escrow_ref: Option<String>,
    ) -> Result<Milestone, StoreError> {
        let mut inner = self.inner.lock().await;
        let now = Utc::now();
        let milestone = Milestone {
            id: Uuid::new_v4(),
            job_id,
            amount,
            due_date,
            status: MilestoneStatus::Pending,
            use_escrow,
            escrow_ref,
            escrow_tx_ref: None,
            submission_file: None,
            submission_notes: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };
        inner.milestones.insert(milestone.id, milestone.clone());
        Ok(milestone)
    }

    async fn get_milestone(&self, milestone_id: Uuid) -> Result<Option<Milestone>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.milestones.get(&milestone_id).cloned())
    }

    async fn list_milestones(&self, job_id: Uuid) -> Result<Vec<Milestone>, StoreError> {
        let inner = self.inner.lock().await;
        let mut milestones: Vec<Milestone> = inner
            .milestones
            .values()
            .filter(|milestone| milestone.job_id == job_id)
            .cloned()
            .collect();
        milestones.sort_by_key(|milestone| milestone.created_at);
        Ok(milestones)
    }

    async fn mark_submitted(
        &self,
        milestone_id: Uuid,
        submission_file: Option<String>,
        submission_notes: Option<String>,
    ) -> Result<Option<Milestone>, StoreError> {
        let mut inner = self.inner.lock().await;
        match inner.milestones.get_mut(&milestone_id) {
            Some(milestone)
                if matches!(
                    milestone.status,
                    MilestoneStatus::Pending | MilestoneStatus::InProgress
                ) =>
            {
                milestone.status = MilestoneStatus::Submitted;
                milestone.submission_file = submission_file;
                milestone.submission_notes = submission_notes;
                milestone.updated_at = Utc::now();
                Ok(Some(milestone.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn update_milestone_status_from(
        &self,
        milestone_id: Uuid,
        from: MilestoneStatus,
        to: MilestoneStatus,
    ) -> Result<Option<Milestone>, StoreError> {
        let mut inner = self.inner.lock().await;
        match inner.milestones.get_mut(&milestone_id) {
            Some(milestone) if milestone.status == from => {
                milestone.status = to;
                milestone.updated_at = Utc::now();
                Ok(Some(milestone.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn mark_rejected(
        &self,
        milestone_id: Uuid,
        reason: String,
    ) -> Result<Option<Milestone>, StoreError> {
        let mut inner = self.inner.lock().await;
        match inner.milestones.get_mut(&milestone_id) {
            Some(milestone) if milestone.status == MilestoneStatus::Submitted => {
                milestone.status = MilestoneStatus::Rejected;
                milestone.rejection_reason = Some(reason);
                milestone.updated_at = Utc::now();
                Ok(Some(milestone.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn complete_milestone(
        &self,
        milestone_id: Uuid,
        escrow_tx_ref: Option<String>,
    ) -> Result<Option<Milestone>, StoreError> {
        let mut inner = self.inner.lock().await;
        match inner.milestones.get_mut(&milestone_id) {
            Some(milestone) if milestone.status == MilestoneStatus::Approved => {
                milestone.status = MilestoneStatus::Completed;
                milestone.escrow_tx_ref = escrow_tx_ref;
                milestone.updated_at = Utc::now();
                Ok(Some(milestone.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn force_complete_milestone(
        &self,
        milestone_id: Uuid,
        escrow_tx_ref: Option<String>,
    ) -> Result<Option<Milestone>, StoreError> {
        let mut inner = self.inner.lock().await;
        match inner.milestones.get_mut(&milestone_id) {
            Some(milestone) if !milestone.status.is_terminal() => {
                milestone.status = MilestoneStatus::Completed;
                milestone.escrow_tx_ref = escrow_tx_ref;
                milestone.updated_at = Utc::now();
                Ok(Some(milestone.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn void_milestones(&self, job_id: Uuid) -> Result<Vec<Milestone>, StoreError> {
        let mut inner = self.inner.lock().await;
        let mut voided = Vec::new();
        for milestone in inner.milestones.values_mut() {
            if milestone.job_id == job_id
                && matches!(
                    milestone.status,
                    MilestoneStatus::Pending
                        | MilestoneStatus::InProgress
                        | MilestoneStatus::Submitted
                        | MilestoneStatus::Rejected
                )
            {
                milestone.status = MilestoneStatus::Voided;
                milestone.updated_at = Utc::now();
                voided.push(milestone.clone());
            }
        }
        Ok(voided)
    }
}

#[async_trait]
impl NotificationExt for MemStore {
    async fn insert_notification(
        &self,
        recipient_id: Uuid,
        kind: NotificationKind,
        related_ref: Uuid,
        body: String,
        data: Option<serde_json::Value>,
    ) -> Result<Notification, StoreError> {
        let mut inner = self.inner.lock().await;
        let notification = Notification {
            id: Uuid::new_v4(),
            recipient_id,
            kind,
            related_ref,
            body,
            data,
            read: false,
            created_at: Utc::now(),
        };
        inner
            .notifications
            .insert(notification.id, notification.clone());
        Ok(notification)
    }

    async fn get_notification(
        &self,
        notification_id: Uuid,
    ) -> Result<Option<Notification>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.notifications.get(&notification_id).cloned())
    }

    async fn list_notifications(
        &self,
        recipient_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, StoreError> {
        let inner = self.inner.lock().await;
        let mut notifications: Vec<Notification> = inner
            .notifications
            .values()
            .filter(|notification| notification.recipient_id == recipient_id)
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notifications
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn unread_count(&self, recipient_id: Uuid) -> Result<i64, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .notifications
            .values()
            .filter(|notification| notification.recipient_id == recipient_id && !notification.read)
            .count() as i64)
    }

    async fn mark_notification_read(
        &self,
        notification_id: Uuid,
    ) -> Result<Option<Notification>, StoreError> {
        let mut inner = self.inner.lock().await;
        match inner.notifications.get_mut(&notification_id) {
            Some(notification) => {
                notification.read = true;
                Ok(Some(notification.clone()))
            }
            None => Ok(None),
        }
    }
}
