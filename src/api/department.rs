use crate::{auth::session::Session, model::department::Department};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct DepartmentReq {
    #[schema(example = "Maintenance")]
    pub name: String,
}

/// List departments
#[utoipa::path(
    get,
    path = "/api/department",
    responses(
        (status = 200, description = "All departments", body = [Department]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Department"
)]
pub async fn list_departments(pool: web::Data<MySqlPool>) -> actix_web::Result<impl Responder> {
    let departments =
        sqlx::query_as::<_, Department>("SELECT id, name FROM departments ORDER BY name")
            .fetch_all(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to list departments");
                ErrorInternalServerError("Database error")
            })?;

    Ok(HttpResponse::Ok().json(departments))
}

/// Create department
#[utoipa::path(
    post,
    path = "/api/department",
    request_body = DepartmentReq,
    responses(
        (status = 201, description = "Department created"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Name already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Department"
)]
pub async fn create_department(
    session: Session,
    pool: web::Data<MySqlPool>,
    body: web::Json<DepartmentReq>,
) -> actix_web::Result<impl Responder> {
    session.require_admin()?;

    if body.name.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({ "error": "Name must not be empty" })));
    }

    let result = sqlx::query("INSERT INTO departments (name) VALUES (?)")
        .bind(body.name.trim())
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(res) => Ok(HttpResponse::Created().json(json!({ "id": res.last_insert_id() }))),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(
                        HttpResponse::Conflict().json(json!({ "error": "Name already exists" }))
                    );
                }
            }
            error!(error = %e, "Failed to create department");
            Ok(HttpResponse::InternalServerError().json(json!({ "error": "Internal Server Error" })))
        }
    }
}

/// Rename department
#[utoipa::path(
    put,
    path = "/api/department/{id}",
    params(("id" = u64, Path, description = "Department ID")),
    request_body = DepartmentReq,
    responses(
        (status = 200, description = "Department renamed"),
        (status = 404, description = "Department not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Department"
)]
pub async fn update_department(
    session: Session,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<DepartmentReq>,
) -> actix_web::Result<impl Responder> {
    session.require_admin()?;
    let department_id = path.into_inner();

    let result = sqlx::query("UPDATE departments SET name = ? WHERE id = ?")
        .bind(body.name.trim())
        .bind(department_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, department_id, "Failed to rename department");
            ErrorInternalServerError("Database error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({ "error": "Department not found" })));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Department renamed" })))
}

/// Delete department
#[utoipa::path(
    delete,
    path = "/api/department/{id}",
    params(("id" = u64, Path, description = "Department ID")),
    responses(
        (status = 200, description = "Department deleted"),
        (status = 404, description = "Department not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Department"
)]
pub async fn delete_department(
    session: Session,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    session.require_admin()?;
    let department_id = path.into_inner();

    let result = sqlx::query("DELETE FROM departments WHERE id = ?")
        .bind(department_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, department_id, "Failed to delete department");
            ErrorInternalServerError("Database error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({ "error": "Department not found" })));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Department deleted" })))
}
