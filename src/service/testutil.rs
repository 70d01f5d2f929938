// service/testutil.rs
//
// Shared fixtures for the service tests: every service wired to one MemStore
// and one mock escrow gateway, plus DTO builders.
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::BigDecimal;
use uuid::Uuid;

use crate::{
    db::{biddb::BidExt, memstore::MemStore, milestonedb::MilestoneExt},
    dtos::engagementdtos::{
        CreateJobDto, CreateMilestoneDto, RejectMilestoneDto, SubmitBidDto, SubmitMilestoneDto,
    },
    models::engagementmodel::{Bid, Job, Milestone},
    models::usermodel::{AuthUser, UserRole},
    service::{
        bid_service::BidService,
        escrow::{
            EscrowCreated, EscrowError, EscrowGateway, EscrowRelease, EscrowStatusSnapshot,
        },
        events::{self, DomainEvent, EventReceiver},
        job_service::JobService,
        milestone_service::MilestoneService,
        notification_service::NotificationService,
    },
};

/// Escrow gateway double. Flip the fail flags to simulate an unreachable
/// collaborator; the call counters let tests assert idempotence.
#[derive(Debug, Default)]
pub struct MockEscrowGateway {
    pub fail_create: AtomicBool,
    pub fail_release: AtomicBool,
    pub create_calls: AtomicUsize,
    pub release_calls: AtomicUsize,
}

#[async_trait]
impl EscrowGateway for MockEscrowGateway {
    async fn create_escrow(
        &self,
        _client_ref: Uuid,
        _provider_ref: Uuid,
        amount: f64,
    ) -> Result<EscrowCreated, EscrowError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(EscrowError::Timeout);
        }
        let _ = amount;
        Ok(EscrowCreated {
            escrow_id: Uuid::new_v4().to_string(),
            tx_hash: format!("0x{:032x}", rand_suffix()),
        })
    }

    async fn release(&self, escrow_id: &str) -> Result<EscrowRelease, EscrowError> {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_release.load(Ordering::SeqCst) {
            return Err(EscrowError::Timeout);
        }
        Ok(EscrowRelease {
            tx_hash: format!("0xrel{}", escrow_id),
        })
    }

    async fn get_status(&self, escrow_id: &str) -> Result<EscrowStatusSnapshot, EscrowError> {
        Ok(EscrowStatusSnapshot {
            escrow_id: escrow_id.to_string(),
            state: "funded".to_string(),
            amount: 0.0,
            updated_at: Some(Utc::now()),
        })
    }
}

fn rand_suffix() -> u128 {
    Uuid::new_v4().as_u128()
}

pub struct TestHarness {
    pub store: Arc<MemStore>,
    pub gateway: Arc<MockEscrowGateway>,
    pub jobs: Arc<JobService<MemStore>>,
    pub bids: Arc<BidService<MemStore>>,
    pub milestones: Arc<MilestoneService<MemStore, MockEscrowGateway>>,
    pub notifications: Arc<NotificationService<MemStore>>,
    pub events: EventReceiver,
}

impl TestHarness {
    pub async fn store_bid(&self, bid_id: Uuid) -> Bid {
        self.store
            .get_bid(bid_id)
            .await
            .unwrap()
            .expect("bid must exist")
    }

    pub async fn store_milestone(&self, milestone_id: Uuid) -> Milestone {
        self.store
            .get_milestone(milestone_id)
            .await
            .unwrap()
            .expect("milestone must exist")
    }

    /// Insert a pending bid directly, bypassing the open-job check.
    pub async fn seed_pending_bid(&self, job_id: Uuid, provider_id: Uuid) -> Bid {
        self.store
            .insert_bid(
                job_id,
                provider_id,
                BigDecimal::try_from(100.0).unwrap(),
                "late but eager proposal".to_string(),
            )
            .await
            .unwrap()
    }
}

pub fn harness() -> TestHarness {
    let store = Arc::new(MemStore::new());
    let gateway = Arc::new(MockEscrowGateway::default());
    let (tx, rx) = events::channel();

    TestHarness {
        jobs: Arc::new(JobService::new(store.clone(), tx.clone())),
        bids: Arc::new(BidService::new(store.clone(), tx.clone())),
        milestones: Arc::new(MilestoneService::new(store.clone(), gateway.clone(), tx)),
        notifications: Arc::new(NotificationService::new(store.clone())),
        store,
        gateway,
        events: rx,
    }
}

pub fn client(id: Uuid) -> AuthUser {
    AuthUser {
        id,
        role: UserRole::Client,
    }
}

pub fn provider(id: Uuid) -> AuthUser {
    AuthUser {
        id,
        role: UserRole::Provider,
    }
}

pub fn admin(id: Uuid) -> AuthUser {
    AuthUser {
        id,
        role: UserRole::Admin,
    }
}

pub fn job_dto(budget: f64) -> CreateJobDto {
    CreateJobDto {
        title: "Retile the bathroom".to_string(),
        description: "Remove the old tiles and lay new ones".to_string(),
        budget,
    }
}

pub fn bid_dto(amount: f64) -> SubmitBidDto {
    SubmitBidDto {
        amount,
        proposal: "I can start on Monday".to_string(),
    }
}

pub fn milestone_dto(amount: f64, use_escrow: bool) -> CreateMilestoneDto {
    CreateMilestoneDto {
        amount,
        due_date: None,
        use_escrow,
    }
}

pub fn submission_dto() -> SubmitMilestoneDto {
    SubmitMilestoneDto {
        file_ref: Some("uploads/receipt.pdf".to_string()),
        notes: Some("done, see the attached photos".to_string()),
    }
}

pub fn rejection_dto(reason: &str) -> RejectMilestoneDto {
    RejectMilestoneDto {
        reason: reason.to_string(),
    }
}

/// Collect everything currently buffered on the event channel.
pub fn drain(events: &mut EventReceiver) -> Vec<DomainEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

/// Job with one accepted bid from `provider_id`, status assigned.
pub async fn assigned_job(h: &TestHarness, owner_id: Uuid, provider_id: Uuid) -> Job {
    let job = h.jobs.create_job(owner_id, job_dto(1000.0)).await.unwrap();
    let bid = h.bids.submit(job.id, provider_id, bid_dto(900.0)).await.unwrap();
    h.jobs.assign(job.id, bid.id, owner_id).await.unwrap().job
}
