use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Free-text field report submitted by a worker.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct ReportEntry {
    #[schema(example = 17)]
    pub id: u64,
    #[schema(example = 42)]
    pub employee_id: u64,
    #[schema(example = "Ahmed Al-Qahtani")]
    pub employee_name: String,
    #[schema(example = 3, nullable = true)]
    pub department_id: Option<u64>,
    #[schema(example = "Pump 4 inspected, seals replaced.")]
    pub body: String,
    #[schema(example = "2026-08-30T11:02:44Z", value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}
