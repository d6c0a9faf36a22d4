use crate::{auth::session::Session, model::file_entry::FileEntry};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateFile {
    #[schema(example = "site-b-manual.pdf")]
    pub name: String,
    /// External storage URL; the payload never flows through this service.
    #[schema(example = "https://files.example.com/site-b-manual.pdf")]
    pub url: String,
    #[schema(example = 3, nullable = true)]
    pub department_id: Option<u64>,
}

/// List shared files
#[utoipa::path(
    get,
    path = "/api/file",
    params(("department_id" = Option<u64>, Query, description = "Filter by department")),
    responses(
        (status = 200, description = "File records", body = [FileEntry]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "File"
)]
pub async fn list_files(
    session: Session,
    pool: web::Data<MySqlPool>,
    query: web::Query<FileQuery>,
) -> actix_web::Result<impl Responder> {
    if session.is_anonymous() {
        return Err(actix_web::error::ErrorUnauthorized("No session"));
    }

    let files = match query.department_id {
        Some(department_id) => {
            sqlx::query_as::<_, FileEntry>(
                r#"
                SELECT id, name, url, department_id, uploaded_by, uploaded_at
                FROM files
                WHERE department_id = ?
                ORDER BY uploaded_at DESC
                "#,
            )
            .bind(department_id)
            .fetch_all(pool.get_ref())
            .await
        }
        None => {
            sqlx::query_as::<_, FileEntry>(
                r#"
                SELECT id, name, url, department_id, uploaded_by, uploaded_at
                FROM files
                ORDER BY uploaded_at DESC
                "#,
            )
            .fetch_all(pool.get_ref())
            .await
        }
    }
    .map_err(|e| {
        error!(error = %e, "Failed to list files");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(files))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FileQuery {
    pub department_id: Option<u64>,
}

/// Register a shared file
#[utoipa::path(
    post,
    path = "/api/file",
    request_body = CreateFile,
    responses(
        (status = 201, description = "File registered"),
        (status = 400, description = "Empty name or url"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Worker session required")
    ),
    security(("bearer_auth" = [])),
    tag = "File"
)]
pub async fn create_file(
    session: Session,
    pool: web::Data<MySqlPool>,
    body: web::Json<CreateFile>,
) -> actix_web::Result<impl Responder> {
    let worker = session.worker()?;

    if body.name.trim().is_empty() || body.url.trim().is_empty() {
        return Ok(
            HttpResponse::BadRequest().json(json!({ "error": "Name and url must not be empty" }))
        );
    }

    let result = sqlx::query(
        r#"
        INSERT INTO files (name, url, department_id, uploaded_by, uploaded_at)
        VALUES (?, ?, ?, ?, NOW())
        "#,
    )
    .bind(body.name.trim())
    .bind(body.url.trim())
    .bind(body.department_id)
    .bind(worker.employee_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to register file");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Created().json(json!({ "id": result.last_insert_id() })))
}

/// Delete a file record
#[utoipa::path(
    delete,
    path = "/api/file/{id}",
    params(("id" = u64, Path, description = "File ID")),
    responses(
        (status = 200, description = "File record deleted"),
        (status = 404, description = "File not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "File"
)]
pub async fn delete_file(
    session: Session,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    session.require_admin()?;
    let file_id = path.into_inner();

    let result = sqlx::query("DELETE FROM files WHERE id = ?")
        .bind(file_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, file_id, "Failed to delete file record");
            ErrorInternalServerError("Database error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({ "error": "File not found" })));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "File record deleted" })))
}
