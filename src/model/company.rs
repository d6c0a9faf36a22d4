use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Single-row branding record the admin dashboard edits.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct CompanyConfig {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Najm Field Services")]
    pub name: String,
    #[schema(example = "https://files.example.com/logo.png", nullable = true)]
    pub logo_url: Option<String>,
}
