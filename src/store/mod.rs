pub mod mysql;

use async_trait::async_trait;
use derive_more::{Display, Error};

use crate::model::attendance::AttendanceLog;

#[derive(Debug, Display, Error)]
pub enum StoreError {
    #[display(fmt = "attendance store write failed: {}", source)]
    Write { source: sqlx::Error },
    #[display(fmt = "attendance store read failed: {}", source)]
    Read { source: sqlx::Error },
    #[display(fmt = "stored row could not be decoded: {}", reason)]
    Corrupt { reason: String },
    /// Used by embedders whose transport to the store is down.
    #[display(fmt = "attendance store is unavailable")]
    Unavailable,
}

/// Append-only log store the capture flow writes into and the admin surface
/// reads from.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Appends one entry. Idempotent on the entry id: replaying an id that is
    /// already stored acknowledges without writing a duplicate, so a retry
    /// after a lost ack is safe.
    async fn append(&self, entry: &AttendanceLog) -> Result<(), StoreError>;

    /// Entries ordered newest first.
    async fn list_recent(&self, limit: u32, offset: u32) -> Result<Vec<AttendanceLog>, StoreError>;
}
