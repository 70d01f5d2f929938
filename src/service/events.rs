// service/events.rs
//
// Core mutations emit these events instead of writing notifications inline;
// the NotificationService consumes them on its own task. A dropped event can
// only ever cost a notification, never a business transition.
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::models::engagementmodel::{Bid, Job, Milestone};

#[derive(Debug, Clone)]
pub enum DomainEvent {
    BidReceived { bid: Bid, owner_id: Uuid },
    BidAccepted { bid: Bid },
    BidRejected { bid: Bid },
    WorkSubmitted { job: Job },
    RevisionRequested { job: Job },
    JobCompleted { job: Job },
    JobCancelled { job: Job },
    MilestoneSubmitted { milestone: Milestone, owner_id: Uuid },
    MilestoneApproved { milestone: Milestone, provider_id: Uuid },
    MilestoneCompleted { milestone: Milestone, provider_id: Uuid },
    MilestoneRejected { milestone: Milestone, provider_id: Uuid },
    MilestoneVoided { milestone: Milestone, provider_id: Uuid },
    EscrowWarning {
        owner_id: Uuid,
        related_ref: Uuid,
        detail: String,
    },
}

pub type EventSender = mpsc::UnboundedSender<DomainEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<DomainEvent>;

pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Fire-and-forget send; a closed channel is logged and swallowed.
pub fn emit(sender: &EventSender, event: DomainEvent) {
    if sender.send(event).is_err() {
        tracing::warn!("event channel closed, notification event dropped");
    }
}
