use crate::{auth::session::Session, model::report::ReportEntry, utils::sql::SqlValue};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateReport {
    #[schema(example = "Pump 4 inspected, seals replaced.")]
    pub body: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReportQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub employee_id: Option<u64>,
    pub department_id: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct ReportListResponse {
    pub data: Vec<ReportEntry>,
    pub limit: u32,
    pub offset: u32,
    pub total: i64,
}

/// Submit a field report
#[utoipa::path(
    post,
    path = "/api/report",
    request_body = CreateReport,
    responses(
        (status = 201, description = "Report created"),
        (status = 400, description = "Empty report body"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Worker session required")
    ),
    security(("bearer_auth" = [])),
    tag = "Report"
)]
pub async fn create_report(
    session: Session,
    pool: web::Data<MySqlPool>,
    body: web::Json<CreateReport>,
) -> actix_web::Result<impl Responder> {
    let worker = session.worker()?;

    if body.body.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({ "error": "Report must not be empty" })));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO reports (employee_id, employee_name, department_id, body, created_at)
        SELECT id, name, department_id, ?, NOW()
        FROM employees
        WHERE id = ?
        "#,
    )
    .bind(body.body.trim())
    .bind(worker.employee_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id = worker.employee_id, "Failed to create report");
        ErrorInternalServerError("Database error")
    })?;

    if result.rows_affected() == 0 {
        return Err(actix_web::error::ErrorForbidden("No employee profile"));
    }

    Ok(HttpResponse::Created().json(json!({ "message": "Report created" })))
}

/// List reports, newest first
#[utoipa::path(
    get,
    path = "/api/report",
    params(
        ("limit" = Option<u32>, Query, description = "Page size (max 100)"),
        ("offset" = Option<u32>, Query, description = "Rows to skip"),
        ("employee_id" = Option<u64>, Query, description = "Filter by employee"),
        ("department_id" = Option<u64>, Query, description = "Filter by department")
    ),
    responses(
        (status = 200, description = "Filtered page of reports", body = ReportListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Report"
)]
pub async fn list_reports(
    session: Session,
    pool: web::Data<MySqlPool>,
    query: web::Query<ReportQuery>,
) -> actix_web::Result<impl Responder> {
    if session.is_anonymous() {
        return Err(actix_web::error::ErrorUnauthorized("No session"));
    }

    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let offset = query.offset.unwrap_or(0);

    let mut conditions: Vec<&str> = Vec::new();
    let mut bindings: Vec<SqlValue> = Vec::new();

    if let Some(employee_id) = query.employee_id {
        conditions.push("employee_id = ?");
        bindings.push(SqlValue::I64(employee_id as i64));
    }
    if let Some(department_id) = query.department_id {
        conditions.push("department_id = ?");
        bindings.push(SqlValue::I64(department_id as i64));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let count_sql = format!("SELECT COUNT(*) FROM reports {}", where_clause);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = match b {
            SqlValue::I64(v) => count_query.bind(*v),
            _ => count_query,
        };
    }
    let total = count_query.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count reports");
        ErrorInternalServerError("Database error")
    })?;

    let data_sql = format!(
        r#"SELECT id, employee_id, employee_name, department_id, body, created_at
           FROM reports {} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"#,
        where_clause
    );
    let mut data_query = sqlx::query_as::<_, ReportEntry>(&data_sql);
    for b in &bindings {
        data_query = match b {
            SqlValue::I64(v) => data_query.bind(*v),
            _ => data_query,
        };
    }
    data_query = data_query.bind(limit).bind(offset);

    let data = data_query.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to fetch reports");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(ReportListResponse {
        data,
        limit,
        offset,
        total,
    }))
}
