use crate::{auth::session::Session, model::announcement::Announcement};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateAnnouncement {
    #[schema(example = "Eid holiday schedule")]
    pub title: String,
    #[schema(example = "Offices closed Thursday and Sunday.")]
    pub body: String,
}

/// List announcements, newest first
#[utoipa::path(
    get,
    path = "/api/announcement",
    responses(
        (status = 200, description = "All announcements", body = [Announcement]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Announcement"
)]
pub async fn list_announcements(
    session: Session,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    if session.is_anonymous() {
        return Err(actix_web::error::ErrorUnauthorized("No session"));
    }

    let announcements = sqlx::query_as::<_, Announcement>(
        "SELECT id, title, body, created_at FROM announcements ORDER BY created_at DESC",
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to list announcements");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(announcements))
}

/// Publish an announcement
#[utoipa::path(
    post,
    path = "/api/announcement",
    request_body = CreateAnnouncement,
    responses(
        (status = 201, description = "Announcement published"),
        (status = 400, description = "Empty title or body"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Announcement"
)]
pub async fn create_announcement(
    session: Session,
    pool: web::Data<MySqlPool>,
    body: web::Json<CreateAnnouncement>,
) -> actix_web::Result<impl Responder> {
    session.require_admin()?;

    if body.title.trim().is_empty() || body.body.trim().is_empty() {
        return Ok(
            HttpResponse::BadRequest().json(json!({ "error": "Title and body must not be empty" }))
        );
    }

    let result = sqlx::query(
        "INSERT INTO announcements (title, body, created_at) VALUES (?, ?, NOW())",
    )
    .bind(body.title.trim())
    .bind(body.body.trim())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to publish announcement");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Created().json(json!({ "id": result.last_insert_id() })))
}

/// Delete an announcement
#[utoipa::path(
    delete,
    path = "/api/announcement/{id}",
    params(("id" = u64, Path, description = "Announcement ID")),
    responses(
        (status = 200, description = "Announcement deleted"),
        (status = 404, description = "Announcement not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Announcement"
)]
pub async fn delete_announcement(
    session: Session,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    session.require_admin()?;
    let announcement_id = path.into_inner();

    let result = sqlx::query("DELETE FROM announcements WHERE id = ?")
        .bind(announcement_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, announcement_id, "Failed to delete announcement");
            ErrorInternalServerError("Database error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({ "error": "Announcement not found" })));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Announcement deleted" })))
}
