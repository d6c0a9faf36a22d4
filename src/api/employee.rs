use crate::{
    auth::session::Session,
    model::badge::BadgePayload,
    model::employee::{Employee, Role},
    utils::phone_cache,
    utils::phone_filter,
    utils::sql::{SqlValue, build_update_sql, execute_update},
};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::{debug, error};
use utoipa::ToSchema;

/// Columns an admin may touch through the partial-update endpoint. The
/// credential columns are deliberately absent; they change only through
/// activation.
const UPDATABLE_COLUMNS: &[&str] = &[
    "name",
    "phone",
    "job_title",
    "role",
    "department_id",
    "site_latitude",
    "site_longitude",
    "site_address",
    "shift_start",
    "shift_end",
];

const EMPLOYEE_COLUMNS: &str = "id, name, phone, job_title, role, registered, department_id, \
     site_latitude, site_longitude, site_address, shift_start, shift_end";

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "Ahmed Al-Qahtani")]
    pub name: String,
    #[schema(example = "+966501234567")]
    pub phone: String,
    #[schema(example = "Field Technician", nullable = true)]
    pub job_title: Option<String>,
    pub role: Role,
    #[schema(example = 3, nullable = true)]
    pub department_id: Option<u64>,
    #[schema(example = 24.7136, nullable = true)]
    pub site_latitude: Option<f64>,
    #[schema(example = 46.6753, nullable = true)]
    pub site_longitude: Option<f64>,
    #[schema(example = "King Fahd Rd, Riyadh", nullable = true)]
    pub site_address: Option<String>,
    #[schema(example = "08:00:00", value_type = String, format = "time", nullable = true)]
    pub shift_start: Option<NaiveTime>,
    #[schema(example = "17:00:00", value_type = String, format = "time", nullable = true)]
    pub shift_end: Option<NaiveTime>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct EmployeeQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub department_id: Option<u64>,
    pub role: Option<Role>,
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 57)]
    pub total: i64,
}

#[derive(Serialize, ToSchema)]
pub struct BadgeResponse {
    /// JSON string the badge QR code encodes.
    #[schema(example = r#"{"id":42,"name":"Ahmed Al-Qahtani","dept":"Maintenance"}"#)]
    pub payload: String,
}

#[derive(Deserialize, ToSchema)]
pub struct IdentifyReq {
    /// Raw string produced by the QR scanner.
    pub payload: String,
}

/// true  => phone AVAILABLE
/// false => phone TAKEN
pub async fn is_phone_available(phone: &str, pool: &MySqlPool) -> bool {
    let phone = phone.trim();

    // 1️⃣ Cuckoo filter — fast negative
    if !phone_filter::might_exist(phone) {
        return true;
    }

    // 2️⃣ Moka cache — fast positive
    if phone_cache::is_taken(phone).await {
        return false;
    }

    // 3️⃣ Database fallback
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM employees WHERE phone = ? LIMIT 1)",
    )
    .bind(phone)
    .fetch_one(pool)
    .await
    .unwrap_or(true); // fail-safe

    !exists
}

/// Create employee
///
/// New employees start unregistered; they set their own password through the
/// one-time activation step.
#[utoipa::path(
    post,
    path = "/api/employee",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created", body = Object, example = json!({"id": 42})),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Phone number already taken"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn create_employee(
    session: Session,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> actix_web::Result<impl Responder> {
    session.require_admin()?;

    let phone = payload.phone.trim();
    if payload.name.trim().is_empty() || phone.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": "Name and phone must not be empty"
        })));
    }

    if !is_phone_available(phone, pool.get_ref()).await {
        return Ok(HttpResponse::Conflict().json(json!({
            "error": "Phone number already taken"
        })));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO employees
        (name, phone, job_title, role, registered, department_id,
         site_latitude, site_longitude, site_address, shift_start, shift_end)
        VALUES (?, ?, ?, ?, FALSE, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.name.trim())
    .bind(phone)
    .bind(&payload.job_title)
    .bind(payload.role.as_ref())
    .bind(payload.department_id)
    .bind(payload.site_latitude)
    .bind(payload.site_longitude)
    .bind(&payload.site_address)
    .bind(payload.shift_start)
    .bind(payload.shift_end)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(res) => {
            // Keep the availability pipeline in step with the insert.
            phone_filter::insert(phone);
            phone_cache::mark_taken(phone).await;
            Ok(HttpResponse::Created().json(json!({ "id": res.last_insert_id() })))
        }
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "error": "Phone number already taken"
                    })));
                }
            }
            error!(error = %e, "Failed to create employee");
            Ok(HttpResponse::InternalServerError().json(json!({
                "error": "Internal Server Error"
            })))
        }
    }
}

/// List employees
#[utoipa::path(
    get,
    path = "/api/employee",
    params(
        ("page" = Option<u32>, Query, description = "Page number"),
        ("per_page" = Option<u32>, Query, description = "Items per page"),
        ("department_id" = Option<u64>, Query, description = "Filter by department"),
        ("role" = Option<String>, Query, description = "Filter by role"),
        ("search" = Option<String>, Query, description = "Search by name or phone")
    ),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn list_employees(
    session: Session,
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> actix_web::Result<impl Responder> {
    session.require_admin()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let mut conditions: Vec<&str> = Vec::new();
    let mut bindings: Vec<SqlValue> = Vec::new();

    if let Some(department_id) = query.department_id {
        conditions.push("department_id = ?");
        bindings.push(SqlValue::I64(department_id as i64));
    }

    if let Some(role) = query.role {
        conditions.push("role = ?");
        bindings.push(SqlValue::String(role.as_ref().to_owned()));
    }

    if let Some(search) = &query.search {
        conditions.push("(name LIKE ? OR phone LIKE ?)");
        let like = format!("%{}%", search);
        bindings.push(SqlValue::String(like.clone()));
        bindings.push(SqlValue::String(like));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let count_sql = format!("SELECT COUNT(*) FROM employees {}", where_clause);
    debug!(sql = %count_sql, "Counting employees");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = match b {
            SqlValue::String(v) => count_query.bind(v.clone()),
            SqlValue::I64(v) => count_query.bind(*v),
            _ => count_query,
        };
    }

    let total = count_query.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %count_sql, "Failed to count employees");
        ErrorInternalServerError("Database error")
    })?;

    let data_sql = format!(
        "SELECT {} FROM employees {} ORDER BY id DESC LIMIT ? OFFSET ?",
        EMPLOYEE_COLUMNS, where_clause
    );
    debug!(sql = %data_sql, page, per_page, "Fetching employees");

    let mut data_query = sqlx::query_as::<_, Employee>(&data_sql);
    for b in &bindings {
        data_query = match b {
            SqlValue::String(v) => data_query.bind(v.clone()),
            SqlValue::I64(v) => data_query.bind(*v),
            _ => data_query,
        };
    }
    data_query = data_query.bind(per_page as i64).bind(offset as i64);

    let employees = data_query.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %data_sql, "Failed to fetch employees");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data: employees,
        page,
        per_page,
        total,
    }))
}

/// Get employee by id
#[utoipa::path(
    get,
    path = "/api/employee/{id}",
    params(("id" = u64, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "Employee not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn get_employee(
    session: Session,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    session.require_admin()?;
    let employee_id = path.into_inner();

    let employee = fetch_employee(pool.get_ref(), employee_id).await?;

    match employee {
        Some(emp) => Ok(HttpResponse::Ok().json(emp)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "error": "Employee not found"
        }))),
    }
}

/// Update employee (partial)
#[utoipa::path(
    put,
    path = "/api/employee/{id}",
    params(("id" = u64, Path, description = "Employee ID")),
    request_body = Object,
    responses(
        (status = 200, description = "Employee updated"),
        (status = 400, description = "Unknown field or empty payload"),
        (status = 404, description = "Employee not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn update_employee(
    session: Session,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    session.require_admin()?;
    let employee_id = path.into_inner();

    // A phone change re-keys the login; check availability like a create.
    if let Some(new_phone) = body.get("phone").and_then(Value::as_str) {
        let current = sqlx::query_scalar::<_, String>("SELECT phone FROM employees WHERE id = ?")
            .bind(employee_id)
            .fetch_optional(pool.get_ref())
            .await
            .map_err(ErrorInternalServerError)?;
        match current {
            None => return Ok(HttpResponse::NotFound().body("Employee not found")),
            Some(current) if current != new_phone => {
                if !is_phone_available(new_phone, pool.get_ref()).await {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "error": "Phone number already taken"
                    })));
                }
            }
            Some(_) => {}
        }
    }

    let update = build_update_sql("employees", &body, UPDATABLE_COLUMNS, "id", employee_id)?;

    let affected = execute_update(pool.get_ref(), update)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    if affected == 0 {
        return Ok(HttpResponse::NotFound().body("Employee not found"));
    }

    if let Some(new_phone) = body.get("phone").and_then(Value::as_str) {
        phone_filter::insert(new_phone);
        phone_cache::mark_taken(new_phone).await;
    }

    Ok(HttpResponse::Ok().body("Employee updated successfully"))
}

/// Delete employee
#[utoipa::path(
    delete,
    path = "/api/employee/{id}",
    params(("id" = u64, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 404, description = "Employee not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn delete_employee(
    session: Session,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    session.require_admin()?;
    let employee_id = path.into_inner();

    let phone = sqlx::query_scalar::<_, String>("SELECT phone FROM employees WHERE id = ?")
        .bind(employee_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(ErrorInternalServerError)?;

    let result = sqlx::query("DELETE FROM employees WHERE id = ?")
        .bind(employee_id)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(res) => {
            if res.rows_affected() == 0 {
                return Ok(HttpResponse::NotFound().json(json!({
                    "error": "Employee not found"
                })));
            }

            if let Some(phone) = phone {
                phone_filter::remove(&phone);
            }

            Ok(HttpResponse::Ok().json(json!({
                "message": "Successfully deleted"
            })))
        }
        Err(e) => {
            error!(error = %e, employee_id, "Failed to delete employee");
            Ok(HttpResponse::InternalServerError().json(json!({
                "error": "Internal Server Error"
            })))
        }
    }
}

/// Produce the badge QR payload for an employee
#[utoipa::path(
    get,
    path = "/api/employee/{id}/badge",
    params(("id" = u64, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Badge payload", body = BadgeResponse),
        (status = 404, description = "Employee not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn badge(
    session: Session,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    session.require_admin()?;
    let employee_id = path.into_inner();

    let row = sqlx::query_as::<_, (String, Option<String>)>(
        r#"
        SELECT e.name, d.name
        FROM employees e
        LEFT JOIN departments d ON d.id = e.department_id
        WHERE e.id = ?
        "#,
    )
    .bind(employee_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to fetch employee for badge");
        ErrorInternalServerError("Database error")
    })?;

    let Some((name, dept)) = row else {
        return Ok(HttpResponse::NotFound().json(json!({ "error": "Employee not found" })));
    };

    let payload = BadgePayload {
        id: employee_id,
        name,
        dept,
    }
    .encode()
    .map_err(ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(BadgeResponse { payload }))
}

/// Identify an employee from a scanned badge payload
///
/// Only the id in the payload is trusted; the stored record is returned.
#[utoipa::path(
    post,
    path = "/api/employee/identify",
    request_body = IdentifyReq,
    responses(
        (status = 200, description = "Employee identified", body = Employee),
        (status = 400, description = "Payload is not a badge"),
        (status = 404, description = "No employee behind this badge"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn identify(
    session: Session,
    pool: web::Data<MySqlPool>,
    body: web::Json<IdentifyReq>,
) -> actix_web::Result<impl Responder> {
    if session.is_anonymous() {
        return Err(actix_web::error::ErrorUnauthorized("No session"));
    }

    let badge = BadgePayload::parse(&body.payload)
        .map_err(|_| actix_web::error::ErrorBadRequest("Payload is not a badge"))?;

    let employee = fetch_employee(pool.get_ref(), badge.id).await?;

    match employee {
        Some(emp) => Ok(HttpResponse::Ok().json(emp)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "error": "No employee behind this badge"
        }))),
    }
}

pub(crate) async fn fetch_employee(
    pool: &MySqlPool,
    employee_id: u64,
) -> actix_web::Result<Option<Employee>> {
    let sql = format!("SELECT {} FROM employees WHERE id = ?", EMPLOYEE_COLUMNS);
    sqlx::query_as::<_, Employee>(&sql)
        .bind(employee_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Failed to fetch employee");
            ErrorInternalServerError("Database error")
        })
}
