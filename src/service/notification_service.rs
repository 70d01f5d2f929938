// service/notification_service.rs
use std::sync::Arc;

use num_traits::ToPrimitive;
use serde_json::json;
use uuid::Uuid;

use crate::{
    db::notificationdb::NotificationExt,
    models::engagementmodel::{Notification, NotificationKind},
    models::usermodel::AuthUser,
    service::{
        error::ServiceError,
        events::{DomainEvent, EventReceiver},
    },
};

/// Turns domain events into per-recipient notification rows. Delivery is
/// at-least-once and decoupled from the mutations that produced the events;
/// a failed insert is logged and the event is dropped.
#[derive(Debug)]
pub struct NotificationService<S> {
    store: Arc<S>,
}

impl<S> NotificationService<S>
where
    S: NotificationExt + Send + Sync + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Consumer loop; runs on its own task for the life of the process.
    pub async fn run(self: Arc<Self>, mut events: EventReceiver) {
        while let Some(event) = events.recv().await {
            self.dispatch(event).await;
        }
        tracing::info!("notification event channel closed, consumer stopping");
    }

    /// Fan a single event out to its recipients.
    pub async fn dispatch(&self, event: DomainEvent) {
        for (recipient_id, kind, related_ref, body, data) in route(&event) {
            if let Err(e) = self
                .store
                .insert_notification(recipient_id, kind, related_ref, body, data)
                .await
            {
                tracing::error!(
                    "failed to persist notification for {}: {}",
                    recipient_id,
                    e
                );
            }
        }
    }

    pub async fn list(
        &self,
        recipient_id: Uuid,
        page: u32,
        limit: u32,
    ) -> Result<Vec<Notification>, ServiceError> {
        let limit = limit.clamp(1, 100) as i64;
        let offset = (page.max(1) as i64 - 1) * limit;

        Ok(self
            .store
            .list_notifications(recipient_id, limit, offset)
            .await?)
    }

    pub async fn unread_count(&self, recipient_id: Uuid) -> Result<i64, ServiceError> {
        Ok(self.store.unread_count(recipient_id).await?)
    }

    /// Only the recipient may mark their notification read.
    pub async fn mark_read(
        &self,
        notification_id: Uuid,
        caller: &AuthUser,
    ) -> Result<Notification, ServiceError> {
        let notification = self
            .store
            .get_notification(notification_id)
            .await?
            .ok_or(ServiceError::NotificationNotFound(notification_id))?;

        if notification.recipient_id != caller.id {
            return Err(ServiceError::Forbidden(caller.id));
        }

        self.store
            .mark_notification_read(notification_id)
            .await?
            .ok_or(ServiceError::NotificationNotFound(notification_id))
    }
}

type Routed = (
    Uuid,
    NotificationKind,
    Uuid,
    String,
    Option<serde_json::Value>,
);

/// Recipient routing table. One event can address several users.
fn route(event: &DomainEvent) -> Vec<Routed> {
    match event {
        DomainEvent::BidReceived { bid, owner_id } => vec![(
            *owner_id,
            NotificationKind::BidReceived,
            bid.id,
            "A new bid was placed on your job".to_string(),
            Some(json!({
                "job_id": bid.job_id,
                "amount": bid.amount.to_f64(),
            })),
        )],
        DomainEvent::BidAccepted { bid } => vec![(
            bid.provider_id,
            NotificationKind::BidAccepted,
            bid.id,
            "Your bid was accepted, the job is yours".to_string(),
            Some(json!({ "job_id": bid.job_id })),
        )],
        DomainEvent::BidRejected { bid } => vec![(
            bid.provider_id,
            NotificationKind::BidRejected,
            bid.id,
            "Your bid was not selected".to_string(),
            Some(json!({ "job_id": bid.job_id })),
        )],
        DomainEvent::WorkSubmitted { job } => vec![(
            job.owner_id,
            NotificationKind::WorkSubmitted,
            job.id,
            "Work was submitted for your review".to_string(),
            None,
        )],
        DomainEvent::RevisionRequested { job } => job
            .assigned_provider_id
            .map(|provider_id| {
                (
                    provider_id,
                    NotificationKind::RevisionRequested,
                    job.id,
                    "The client sent the job back for revision".to_string(),
                    None,
                )
            })
            .into_iter()
            .collect(),
        DomainEvent::JobCompleted { job } => job
            .assigned_provider_id
            .map(|provider_id| {
                (
                    provider_id,
                    NotificationKind::JobCompleted,
                    job.id,
                    "The job was accepted and completed".to_string(),
                    None,
                )
            })
            .into_iter()
            .collect(),
        DomainEvent::JobCancelled { job } => {
            let mut routed = vec![(
                job.owner_id,
                NotificationKind::JobCancelled,
                job.id,
                "The job was cancelled".to_string(),
                None,
            )];
            if let Some(provider_id) = job.assigned_provider_id {
                routed.push((
                    provider_id,
                    NotificationKind::JobCancelled,
                    job.id,
                    "A job you were working on was cancelled".to_string(),
                    None,
                ));
            }
            routed
        }
        DomainEvent::MilestoneSubmitted {
            milestone,
            owner_id,
        } => vec![(
            *owner_id,
            NotificationKind::MilestoneSubmitted,
            milestone.id,
            "A milestone was submitted for your review".to_string(),
            Some(json!({ "job_id": milestone.job_id })),
        )],
        DomainEvent::MilestoneApproved {
            milestone,
            provider_id,
        } => vec![(
            *provider_id,
            NotificationKind::MilestoneApproved,
            milestone.id,
            "Your milestone was approved".to_string(),
            Some(json!({ "job_id": milestone.job_id })),
        )],
        DomainEvent::MilestoneCompleted {
            milestone,
            provider_id,
        } => vec![(
            *provider_id,
            NotificationKind::MilestoneCompleted,
            milestone.id,
            "Your milestone is complete and paid out".to_string(),
            Some(json!({
                "job_id": milestone.job_id,
                "amount": milestone.amount.to_f64(),
                "tx_ref": milestone.escrow_tx_ref,
            })),
        )],
        DomainEvent::MilestoneRejected {
            milestone,
            provider_id,
        } => vec![(
            *provider_id,
            NotificationKind::MilestoneRejected,
            milestone.id,
            milestone
                .rejection_reason
                .clone()
                .map(|reason| format!("Your milestone needs rework: {}", reason))
                .unwrap_or_else(|| "Your milestone needs rework".to_string()),
            Some(json!({ "job_id": milestone.job_id })),
        )],
        DomainEvent::MilestoneVoided {
            milestone,
            provider_id,
        } => vec![(
            *provider_id,
            NotificationKind::MilestoneVoided,
            milestone.id,
            "A milestone was voided by cancellation".to_string(),
            Some(json!({ "job_id": milestone.job_id })),
        )],
        DomainEvent::EscrowWarning {
            owner_id,
            related_ref,
            detail,
        } => vec![(
            *owner_id,
            NotificationKind::EscrowWarning,
            *related_ref,
            detail.clone(),
            None,
        )],
    }
}
