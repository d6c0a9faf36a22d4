use crate::{auth::session::Session, model::company::CompanyConfig};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct UpdateCompany {
    #[schema(example = "Najm Field Services")]
    pub name: String,
    #[schema(example = "https://files.example.com/logo.png", nullable = true)]
    pub logo_url: Option<String>,
}

/// Get company branding
#[utoipa::path(
    get,
    path = "/api/company",
    responses(
        (status = 200, description = "Branding record", body = CompanyConfig),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Company"
)]
pub async fn get_company(
    session: Session,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    if session.is_anonymous() {
        return Err(actix_web::error::ErrorUnauthorized("No session"));
    }

    let company = sqlx::query_as::<_, CompanyConfig>(
        "SELECT id, name, logo_url FROM company_config WHERE id = 1",
    )
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch company config");
        ErrorInternalServerError("Database error")
    })?;

    match company {
        Some(c) => Ok(HttpResponse::Ok().json(c)),
        None => Ok(HttpResponse::NotFound().json(json!({ "error": "Company not configured" }))),
    }
}

/// Update company branding
#[utoipa::path(
    put,
    path = "/api/company",
    request_body = UpdateCompany,
    responses(
        (status = 200, description = "Branding updated"),
        (status = 400, description = "Empty name"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Company"
)]
pub async fn update_company(
    session: Session,
    pool: web::Data<MySqlPool>,
    body: web::Json<UpdateCompany>,
) -> actix_web::Result<impl Responder> {
    session.require_admin()?;

    if body.name.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({ "error": "Name must not be empty" })));
    }

    // Single-row upsert keyed on id 1.
    sqlx::query(
        r#"
        INSERT INTO company_config (id, name, logo_url)
        VALUES (1, ?, ?)
        ON DUPLICATE KEY UPDATE name = VALUES(name), logo_url = VALUES(logo_url)
        "#,
    )
    .bind(body.name.trim())
    .bind(&body.logo_url)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to update company config");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Branding updated" })))
}
