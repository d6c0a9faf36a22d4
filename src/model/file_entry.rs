use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// File metadata only; the payload itself lives in external object storage
/// behind `url`.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct FileEntry {
    #[schema(example = 5)]
    pub id: u64,
    #[schema(example = "site-b-manual.pdf")]
    pub name: String,
    #[schema(example = "https://files.example.com/site-b-manual.pdf")]
    pub url: String,
    #[schema(example = 3, nullable = true)]
    pub department_id: Option<u64>,
    #[schema(example = 42)]
    pub uploaded_by: u64,
    #[schema(example = "2026-08-30T09:15:00Z", value_type = String, format = "date-time")]
    pub uploaded_at: DateTime<Utc>,
}
