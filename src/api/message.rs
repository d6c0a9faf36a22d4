use crate::{auth::session::Session, model::message::ChatMessage};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct SendMessage {
    #[schema(example = 3)]
    pub department_id: u64,
    #[schema(example = "Heading to site B after lunch")]
    pub body: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MessageQuery {
    pub department_id: u64,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct MessageListResponse {
    pub data: Vec<ChatMessage>,
    pub limit: u32,
    pub offset: u32,
    pub total: i64,
}

/// Send a department chat message
#[utoipa::path(
    post,
    path = "/api/message",
    request_body = SendMessage,
    responses(
        (status = 201, description = "Message sent"),
        (status = 400, description = "Empty message"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Worker session required")
    ),
    security(("bearer_auth" = [])),
    tag = "Chat"
)]
pub async fn send_message(
    session: Session,
    pool: web::Data<MySqlPool>,
    body: web::Json<SendMessage>,
) -> actix_web::Result<impl Responder> {
    let worker = session.worker()?;

    if body.body.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({ "error": "Message must not be empty" })));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO messages (department_id, employee_id, sender_name, body, sent_at)
        SELECT ?, id, name, ?, NOW()
        FROM employees
        WHERE id = ?
        "#,
    )
    .bind(body.department_id)
    .bind(body.body.trim())
    .bind(worker.employee_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id = worker.employee_id, "Failed to send message");
        ErrorInternalServerError("Database error")
    })?;

    if result.rows_affected() == 0 {
        return Err(actix_web::error::ErrorForbidden("No employee profile"));
    }

    Ok(HttpResponse::Created().json(json!({ "message": "Message sent" })))
}

/// List a department's chat, newest first
#[utoipa::path(
    get,
    path = "/api/message",
    params(
        ("department_id" = u64, Query, description = "Department whose chat to read"),
        ("limit" = Option<u32>, Query, description = "Page size (max 100)"),
        ("offset" = Option<u32>, Query, description = "Rows to skip")
    ),
    responses(
        (status = 200, description = "Page of chat messages", body = MessageListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Chat"
)]
pub async fn list_messages(
    session: Session,
    pool: web::Data<MySqlPool>,
    query: web::Query<MessageQuery>,
) -> actix_web::Result<impl Responder> {
    if session.is_anonymous() {
        return Err(actix_web::error::ErrorUnauthorized("No session"));
    }

    let limit = query.limit.unwrap_or(50).clamp(1, 100);
    let offset = query.offset.unwrap_or(0);

    let total = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM messages WHERE department_id = ?",
    )
    .bind(query.department_id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to count messages");
        ErrorInternalServerError("Database error")
    })?;

    let data = sqlx::query_as::<_, ChatMessage>(
        r#"
        SELECT id, department_id, employee_id, sender_name, body, sent_at
        FROM messages
        WHERE department_id = ?
        ORDER BY sent_at DESC, id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(query.department_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch messages");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(MessageListResponse {
        data,
        limit,
        offset,
        total,
    }))
}
