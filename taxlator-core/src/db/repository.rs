use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{CalculationKind, HistoryRecord, NewHistoryRecord};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Storage for past calculations.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    async fn create_record(
        &self,
        record: NewHistoryRecord,
    ) -> Result<HistoryRecord, RepositoryError>;

    async fn get_record(&self, id: i64) -> Result<HistoryRecord, RepositoryError>;

    /// Newest first. `None` lists every kind.
    async fn list_records(
        &self,
        kind: Option<CalculationKind>,
    ) -> Result<Vec<HistoryRecord>, RepositoryError>;

    async fn delete_record(&self, id: i64) -> Result<(), RepositoryError>;

    /// Deletes every record created before `cutoff` and returns how many
    /// were removed.
    async fn purge_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, RepositoryError>;
}
