use std::collections::HashSet;
use std::sync::Mutex;

use tracing::{info, warn};

use crate::model::attendance::AttendanceLog;
use crate::store::{LogStore, StoreError};

/// One optimistically staged attendance entry. `confirmed` flips when the
/// store acknowledges the append.
#[derive(Debug, Clone)]
pub struct StagedEntry {
    pub log: AttendanceLog,
    pub confirmed: bool,
}

/// Per-session ledger implementing the two-phase persistence contract:
/// entries are staged locally before the store is asked to append them, so
/// the caller's list reflects a capture immediately. A failed append leaves
/// the entry staged but unconfirmed; it is never dropped, and a later
/// `retry` replays it against the store (idempotent on the entry id, so no
/// duplicate can result).
#[derive(Default)]
pub struct SessionLedger {
    entries: Mutex<Vec<StagedEntry>>,
}

impl SessionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages an entry ahead of the store append. Staging the same id twice
    /// is a no-op, which keeps retries from double-listing.
    pub fn stage(&self, log: AttendanceLog) {
        let mut entries = self.entries.lock().expect("session ledger poisoned");
        if entries.iter().any(|e| e.log.id == log.id) {
            return;
        }
        entries.push(StagedEntry {
            log,
            confirmed: false,
        });
    }

    /// Marks an entry acknowledged by the store.
    pub fn confirm(&self, id: &str) {
        let mut entries = self.entries.lock().expect("session ledger poisoned");
        if let Some(entry) = entries.iter_mut().find(|e| e.log.id == id) {
            entry.confirmed = true;
        }
    }

    pub fn unconfirmed(&self) -> Vec<AttendanceLog> {
        let entries = self.entries.lock().expect("session ledger poisoned");
        entries
            .iter()
            .filter(|e| !e.confirmed)
            .map(|e| e.log.clone())
            .collect()
    }

    /// Newest staged entries first, mirroring the store's list order.
    pub fn snapshot(&self) -> Vec<StagedEntry> {
        let mut entries: Vec<StagedEntry> = self
            .entries
            .lock()
            .expect("session ledger poisoned")
            .clone();
        entries.sort_by(|a, b| b.log.recorded_at.cmp(&a.log.recorded_at));
        entries
    }

    /// Replays every unconfirmed entry against the store. Returns how many
    /// were confirmed by this pass; stops at the first store error so the
    /// remaining entries stay queued for the next explicit retry.
    pub async fn retry(&self, store: &dyn LogStore) -> Result<usize, StoreError> {
        let pending = self.unconfirmed();
        let mut confirmed = 0usize;
        for log in pending {
            match store.append(&log).await {
                Ok(()) => {
                    self.confirm(&log.id);
                    confirmed += 1;
                    info!(entry_id = %log.id, "Unconfirmed attendance entry reconciled");
                }
                Err(e) => {
                    warn!(entry_id = %log.id, error = %e, "Retry of staged attendance entry failed");
                    return Err(e);
                }
            }
        }
        Ok(confirmed)
    }

    /// Reconciliation on a full reload: entries the authoritative listing
    /// already contains are confirmed and dropped from the session ledger;
    /// anything still missing remains staged and unconfirmed.
    pub fn reconcile(&self, persisted_ids: &HashSet<String>) {
        let mut entries = self.entries.lock().expect("session ledger poisoned");
        entries.retain(|e| !persisted_ids.contains(&e.log.id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::fakes::FlakyStore;
    use crate::model::attendance::{AttendanceStatus, Direction};
    use chrono::Utc;

    fn log(id: &str) -> AttendanceLog {
        AttendanceLog {
            id: id.into(),
            employee_id: 1,
            employee_name: "Ahmed".into(),
            recorded_at: Utc::now(),
            direction: Direction::In,
            photo: vec![1, 2, 3],
            latitude: 24.7136,
            longitude: 46.6753,
            address: None,
            status: AttendanceStatus::Present,
            department_id: None,
        }
    }

    #[test]
    fn staging_is_idempotent_per_id() {
        let ledger = SessionLedger::new();
        ledger.stage(log("a"));
        ledger.stage(log("a"));
        assert_eq!(ledger.snapshot().len(), 1);
    }

    #[test]
    fn confirm_clears_the_unconfirmed_marker() {
        let ledger = SessionLedger::new();
        ledger.stage(log("a"));
        assert_eq!(ledger.unconfirmed().len(), 1);
        ledger.confirm("a");
        assert!(ledger.unconfirmed().is_empty());
        assert!(ledger.snapshot()[0].confirmed);
    }

    #[tokio::test]
    async fn retry_confirms_without_duplicating() {
        let store = FlakyStore::failing_first(1);
        let ledger = SessionLedger::new();
        let entry = log("a");

        ledger.stage(entry.clone());
        assert!(store.append(&entry).await.is_err());
        assert_eq!(ledger.unconfirmed().len(), 1);

        // Explicit user-triggered retry.
        let confirmed = ledger.retry(&store).await.unwrap();
        assert_eq!(confirmed, 1);
        assert!(ledger.unconfirmed().is_empty());
        assert_eq!(store.appended_ids(), vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn retry_stops_at_first_store_error() {
        let store = FlakyStore::failing_first(10);
        let ledger = SessionLedger::new();
        ledger.stage(log("a"));
        ledger.stage(log("b"));

        assert!(ledger.retry(&store).await.is_err());
        assert_eq!(ledger.unconfirmed().len(), 2);
    }

    #[test]
    fn reconcile_drops_entries_the_store_already_has() {
        let ledger = SessionLedger::new();
        ledger.stage(log("a"));
        ledger.stage(log("b"));
        ledger.confirm("a");

        let persisted: HashSet<String> = ["a".to_string()].into_iter().collect();
        ledger.reconcile(&persisted);

        let remaining = ledger.snapshot();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].log.id, "b");
        assert!(!remaining[0].confirmed);
    }
}
