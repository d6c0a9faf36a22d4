use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Announcement {
    #[schema(example = 8)]
    pub id: u64,
    #[schema(example = "Eid holiday schedule")]
    pub title: String,
    #[schema(example = "Offices closed Thursday and Sunday.")]
    pub body: String,
    #[schema(example = "2026-08-30T08:00:00Z", value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}
