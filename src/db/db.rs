// db/db.rs
use sqlx::{Pool, Postgres};
use thiserror::Error;

/// Dependency-injected data-access handle. Constructed once in main and
/// passed into every service; nothing else owns a connection.
#[derive(Clone)]
pub struct DBClient {
    pub pool: Pool<Postgres>,
}

impl std::fmt::Debug for DBClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DBClient")
            .field("pool", &"Pool<Postgres>")
            .finish()
    }
}

impl DBClient {
    pub fn new(pool: Pool<Postgres>) -> Self {
        DBClient { pool }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// A storage-level uniqueness constraint rejected the write.
    #[error("record violates a uniqueness constraint")]
    Duplicate,

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_error) = error {
            if db_error.is_unique_violation() {
                return StoreError::Duplicate;
            }
        }
        StoreError::Sqlx(error)
    }
}
