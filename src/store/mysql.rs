use async_trait::async_trait;
use sqlx::MySqlPool;
use tracing::{debug, error};

use crate::model::attendance::{AttendanceLog, AttendanceLogRow};
use crate::store::{LogStore, StoreError};

/// MySQL-backed attendance log store. The captured coordinate is flattened
/// into `latitude`/`longitude`/`address` columns per the storage contract.
#[derive(Clone)]
pub struct MySqlLogStore {
    pool: MySqlPool,
}

impl MySqlLogStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LogStore for MySqlLogStore {
    async fn append(&self, entry: &AttendanceLog) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance_logs
            (id, employee_id, employee_name, recorded_at, direction, photo,
             latitude, longitude, address, status, department_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.id)
        .bind(entry.employee_id)
        .bind(&entry.employee_name)
        .bind(entry.recorded_at)
        .bind(entry.direction.as_ref())
        .bind(&entry.photo)
        .bind(entry.latitude)
        .bind(entry.longitude)
        .bind(&entry.address)
        .bind(entry.status.as_ref())
        .bind(entry.department_id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                // Duplicate id means this entry already landed on an earlier
                // attempt; acknowledge instead of writing it twice.
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.code().as_deref() == Some("23000") {
                        debug!(entry_id = %entry.id, "Replayed append acknowledged");
                        return Ok(());
                    }
                }
                error!(error = %e, entry_id = %entry.id, "Failed to append attendance log");
                Err(StoreError::Write { source: e })
            }
        }
    }

    async fn list_recent(&self, limit: u32, offset: u32) -> Result<Vec<AttendanceLog>, StoreError> {
        let rows = sqlx::query_as::<_, AttendanceLogRow>(
            r#"
            SELECT id, employee_id, employee_name, recorded_at, direction, photo,
                   latitude, longitude, address, status, department_id
            FROM attendance_logs
            ORDER BY recorded_at DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to list attendance logs");
            StoreError::Read { source: e }
        })?;

        rows.into_iter()
            .map(|row| {
                AttendanceLog::try_from(row).map_err(|e| StoreError::Corrupt {
                    reason: e.to_string(),
                })
            })
            .collect()
    }
}
