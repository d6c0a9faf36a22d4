use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One department chat message.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct ChatMessage {
    #[schema(example = 910)]
    pub id: u64,
    #[schema(example = 3)]
    pub department_id: u64,
    #[schema(example = 42)]
    pub employee_id: u64,
    #[schema(example = "Ahmed Al-Qahtani")]
    pub sender_name: String,
    #[schema(example = "Heading to site B after lunch")]
    pub body: String,
    #[schema(example = "2026-08-30T12:40:00Z", value_type = String, format = "date-time")]
    pub sent_at: DateTime<Utc>,
}
