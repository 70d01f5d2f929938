pub mod admin;
pub mod bids;
pub mod jobs;
pub mod milestones;
pub mod notifications;
