pub mod biddb;
pub mod db;
pub mod jobdb;
pub mod milestonedb;
pub mod notificationdb;

#[cfg(test)]
pub mod memstore;
