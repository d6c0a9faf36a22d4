use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// JWT subject used for the administrative session; admins are not employee
/// rows.
pub const ADMIN_SUBJECT: &str = "admin";

#[derive(Deserialize, ToSchema)]
pub struct LoginReq {
    /// Phone number, or the configured admin access code.
    #[schema(example = "+966501234567")]
    pub phone: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ActivateReq {
    #[schema(example = "+966501234567")]
    pub phone: String,
    /// Password to set; activation is one-time and one-way.
    pub password: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Credential row fetched by the auth handlers only; never serialized.
#[derive(FromRow)]
pub struct EmployeeAuthRow {
    pub id: u64,
    pub name: String,
    pub phone: String,
    pub password_hash: Option<String>,
    pub role: String,
    pub registered: bool,
    pub department_id: Option<u64>,
}

#[derive(FromRow)]
pub struct RefreshTokenRow {
    pub id: u64,
    pub subject: String,
    pub revoked: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Phone number for workers, [`ADMIN_SUBJECT`] for the admin session.
    pub sub: String,
    /// Role label as stored (`WORKER`, `SUPERVISOR`, `DEPT_HEAD`, `ADMIN`).
    pub role: String,
    pub exp: usize,
    pub jti: String,

    pub token_type: TokenType,
    /// Present for worker sessions, absent for the admin session.
    pub employee_id: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}
