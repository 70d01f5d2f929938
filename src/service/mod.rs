pub mod bid_service;
pub mod error;
pub mod escrow;
pub mod events;
pub mod job_service;
pub mod milestone_service;
pub mod notification_service;

#[cfg(test)]
pub mod testutil;
