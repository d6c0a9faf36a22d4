use crate::api::employee::fetch_employee;
use crate::auth::session::Session;
use crate::config::Config;
use crate::geofence;
use crate::model::attendance::{AttendanceLog, AttendanceLogRow, AttendanceStatus, Direction};
use crate::model::coordinate::Coordinate;
use crate::model::employee::Role;
use crate::store::mysql::MySqlLogStore;
use crate::store::LogStore;
use crate::utils::sql::SqlValue;
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info};
use utoipa::ToSchema;
use uuid::Uuid;

/// A completed capture, as handed over by the device-side flow.
#[derive(Deserialize, ToSchema)]
pub struct SubmitLog {
    /// Client-generated UUID. Reused on retry so the append stays
    /// idempotent; generated server-side when absent.
    #[schema(example = "7b6a1f2e-8f33-4af0-9b6e-2f1d8c1a9b10", nullable = true)]
    pub id: Option<String>,
    pub direction: Direction,
    /// JPEG bytes, base64-encoded.
    #[schema(value_type = String, format = "byte")]
    pub photo: String,
    #[schema(example = 24.7136)]
    pub latitude: f64,
    #[schema(example = 46.6753)]
    pub longitude: f64,
    #[schema(example = "King Fahd Rd, Riyadh", nullable = true)]
    pub address: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct SubmitLogResponse {
    pub id: String,
    pub status: AttendanceStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LogQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub employee_id: Option<u64>,
    pub department_id: Option<u64>,
    pub direction: Option<Direction>,
    /// Filtering on OUT_OF_BOUNDS backs the admin alerts counter.
    pub status: Option<AttendanceStatus>,
}

#[derive(Serialize, ToSchema)]
pub struct LogListResponse {
    pub data: Vec<AttendanceLog>,
    #[schema(example = 20)]
    pub limit: u32,
    #[schema(example = 0)]
    pub offset: u32,
    #[schema(example = 125)]
    pub total: i64,
}

/// Submit one attendance entry
///
/// Server side of the capture flow's Submitting step: the geofence status is
/// evaluated here, against the employee's assigned site, never trusted from
/// the client.
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = SubmitLog,
    responses(
        (status = 201, description = "Entry appended", body = SubmitLogResponse),
        (status = 400, description = "Invalid coordinate or photo payload"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Worker session required"),
        (status = 503, description = "Store write failed; retry with the same id", body = Object, example = json!({
            "error": "Attendance store write failed",
            "retryable": true
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn submit_log(
    session: Session,
    pool: web::Data<MySqlPool>,
    store: web::Data<MySqlLogStore>,
    config: web::Data<Config>,
    body: web::Json<SubmitLog>,
) -> actix_web::Result<impl Responder> {
    let worker = session.worker()?;

    let captured = Coordinate::new(body.latitude, body.longitude, body.address.clone())
        .map_err(actix_web::error::ErrorBadRequest)?;

    let photo = STANDARD
        .decode(&body.photo)
        .map_err(|_| actix_web::error::ErrorBadRequest("Photo must be base64"))?;
    if photo.is_empty() {
        return Err(actix_web::error::ErrorBadRequest("Photo must not be empty"));
    }

    let employee = fetch_employee(pool.get_ref(), worker.employee_id)
        .await?
        .ok_or_else(|| actix_web::error::ErrorForbidden("No employee profile"))?;

    let site = employee.site();
    let status = geofence::evaluate(site.as_ref(), &captured, config.geofence_radius_m)
        .map_err(actix_web::error::ErrorBadRequest)?;

    let entry = AttendanceLog {
        id: body
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        employee_id: worker.employee_id,
        employee_name: employee.name,
        recorded_at: Utc::now(),
        direction: body.direction,
        photo,
        latitude: captured.latitude,
        longitude: captured.longitude,
        address: captured.address,
        status,
        department_id: employee.department_id,
    };

    if let Err(e) = store.append(&entry).await {
        error!(error = %e, entry_id = %entry.id, "Attendance append failed");
        return Ok(HttpResponse::ServiceUnavailable().json(json!({
            "error": "Attendance store write failed",
            "retryable": true,
            "id": entry.id
        })));
    }

    info!(entry_id = %entry.id, status = %status, "Attendance entry appended");

    Ok(HttpResponse::Created().json(SubmitLogResponse {
        id: entry.id,
        status,
    }))
}

/// List attendance entries, newest first
///
/// Admins see everything and may filter; workers always get their own
/// entries only. `total` honors the filters, so a status=OUT_OF_BOUNDS query
/// doubles as the alerts counter.
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(
        ("limit" = Option<u32>, Query, description = "Page size (max 100)"),
        ("offset" = Option<u32>, Query, description = "Rows to skip"),
        ("employee_id" = Option<u64>, Query, description = "Filter by employee"),
        ("department_id" = Option<u64>, Query, description = "Filter by department"),
        ("direction" = Option<String>, Query, description = "IN or OUT"),
        ("status" = Option<String>, Query, description = "PRESENT, OUT_OF_BOUNDS, LATE, ABSENT")
    ),
    responses(
        (status = 200, description = "Filtered page of entries", body = LogListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn list_logs(
    session: Session,
    pool: web::Data<MySqlPool>,
    query: web::Query<LogQuery>,
) -> actix_web::Result<impl Responder> {
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let offset = query.offset.unwrap_or(0);

    let (where_clause, bindings) = build_log_filter(&session, &query)?;

    let count_sql = format!("SELECT COUNT(*) FROM attendance_logs {}", where_clause);
    debug!(sql = %count_sql, "Counting attendance logs");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = match b {
            SqlValue::String(v) => count_query.bind(v.clone()),
            SqlValue::I64(v) => count_query.bind(*v),
            _ => count_query,
        };
    }

    let total = count_query.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %count_sql, "Failed to count attendance logs");
        ErrorInternalServerError("Database error")
    })?;

    let data_sql = format!(
        r#"SELECT id, employee_id, employee_name, recorded_at, direction, photo,
                  latitude, longitude, address, status, department_id
           FROM attendance_logs {} ORDER BY recorded_at DESC, id DESC LIMIT ? OFFSET ?"#,
        where_clause
    );
    debug!(sql = %data_sql, limit, offset, "Fetching attendance logs");

    let mut data_query = sqlx::query_as::<_, AttendanceLogRow>(&data_sql);
    for b in &bindings {
        data_query = match b {
            SqlValue::String(v) => data_query.bind(v.clone()),
            SqlValue::I64(v) => data_query.bind(*v),
            _ => data_query,
        };
    }
    data_query = data_query.bind(limit).bind(offset);

    let rows = data_query.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %data_sql, "Failed to fetch attendance logs");
        ErrorInternalServerError("Database error")
    })?;

    let data = rows
        .into_iter()
        .map(AttendanceLog::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            error!(error = %e, "Stored attendance row could not be decoded");
            ErrorInternalServerError("Database error")
        })?;

    Ok(HttpResponse::Ok().json(LogListResponse {
        data,
        limit,
        offset,
        total,
    }))
}

/// Export filtered attendance entries as CSV
#[utoipa::path(
    get,
    path = "/api/attendance/export",
    responses(
        (status = 200, description = "CSV report, photos omitted", content_type = "text/csv"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn export_csv(
    session: Session,
    pool: web::Data<MySqlPool>,
    query: web::Query<LogQuery>,
) -> actix_web::Result<impl Responder> {
    session.require_admin()?;

    let (where_clause, bindings) = build_log_filter(&session, &query)?;

    let sql = format!(
        r#"SELECT id, employee_id, employee_name, recorded_at, direction, photo,
                  latitude, longitude, address, status, department_id
           FROM attendance_logs {} ORDER BY recorded_at DESC, id DESC"#,
        where_clause
    );

    let mut data_query = sqlx::query_as::<_, AttendanceLogRow>(&sql);
    for b in &bindings {
        data_query = match b {
            SqlValue::String(v) => data_query.bind(v.clone()),
            SqlValue::I64(v) => data_query.bind(*v),
            _ => data_query,
        };
    }

    let rows = data_query.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %sql, "Failed to export attendance logs");
        ErrorInternalServerError("Database error")
    })?;

    let mut csv =
        String::from("id,employee_id,employee_name,recorded_at,direction,status,latitude,longitude,address,department_id\n");
    for row in rows {
        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{}\n",
            csv_field(&row.id),
            row.employee_id,
            csv_field(&row.employee_name),
            row.recorded_at.to_rfc3339(),
            csv_field(&row.direction),
            csv_field(&row.status),
            row.latitude,
            row.longitude,
            csv_field(row.address.as_deref().unwrap_or("")),
            row.department_id.map_or(String::new(), |d| d.to_string()),
        ));
    }

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            "Content-Disposition",
            "attachment; filename=\"attendance.csv\"",
        ))
        .body(csv))
}

/// Shared WHERE builder for listing and export. Workers are always pinned to
/// their own entries regardless of the requested filter.
fn build_log_filter(
    session: &Session,
    query: &LogQuery,
) -> actix_web::Result<(String, Vec<SqlValue>)> {
    let mut conditions: Vec<&str> = Vec::new();
    let mut bindings: Vec<SqlValue> = Vec::new();

    match session {
        Session::Admin => {
            if let Some(employee_id) = query.employee_id {
                conditions.push("employee_id = ?");
                bindings.push(SqlValue::I64(employee_id as i64));
            }
        }
        Session::Worker(w) => {
            if w.role == Role::Admin {
                if let Some(employee_id) = query.employee_id {
                    conditions.push("employee_id = ?");
                    bindings.push(SqlValue::I64(employee_id as i64));
                }
            } else {
                conditions.push("employee_id = ?");
                bindings.push(SqlValue::I64(w.employee_id as i64));
            }
        }
        Session::Anonymous => return Err(actix_web::error::ErrorUnauthorized("No session")),
    }

    if let Some(department_id) = query.department_id {
        conditions.push("department_id = ?");
        bindings.push(SqlValue::I64(department_id as i64));
    }

    if let Some(direction) = query.direction {
        conditions.push("direction = ?");
        bindings.push(SqlValue::String(direction.as_ref().to_owned()));
    }

    if let Some(status) = query.status {
        conditions.push("status = ?");
        bindings.push(SqlValue::String(status.as_ref().to_owned()));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    Ok((where_clause, bindings))
}

fn csv_field(raw: &str) -> String {
    if raw.contains(',') || raw.contains('"') || raw.contains('\n') {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_field_escapes_delimiters_and_quotes() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn worker_filter_is_pinned_to_own_entries() {
        let session = Session::Worker(crate::auth::session::WorkerSession {
            employee_id: 42,
            phone: "+966501234567".into(),
            role: Role::Worker,
        });
        let query = LogQuery {
            limit: None,
            offset: None,
            employee_id: Some(7),
            department_id: None,
            direction: None,
            status: None,
        };
        let (where_clause, bindings) = build_log_filter(&session, &query).unwrap();
        assert_eq!(where_clause, "WHERE employee_id = ?");
        assert!(matches!(bindings[0], SqlValue::I64(42)));
    }

    #[test]
    fn admin_filter_combines_conditions() {
        let query = LogQuery {
            limit: None,
            offset: None,
            employee_id: None,
            department_id: Some(3),
            direction: Some(Direction::In),
            status: Some(AttendanceStatus::OutOfBounds),
        };
        let (where_clause, bindings) = build_log_filter(&Session::Admin, &query).unwrap();
        assert_eq!(
            where_clause,
            "WHERE department_id = ? AND direction = ? AND status = ?"
        );
        assert_eq!(bindings.len(), 3);
        assert!(matches!(&bindings[2], SqlValue::String(s) if s == "OUT_OF_BOUNDS"));
    }
}
