use crate::{
    auth::{
        jwt::{generate_access_token, generate_refresh_token, verify_token},
        password::{hash_password, verify_password},
    },
    config::Config,
    model::employee::Role,
    models::{ActivateReq, Claims, EmployeeAuthRow, LoginReq, RefreshTokenRow, TokenPair,
             TokenType, ADMIN_SUBJECT},
};
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};

/// Mints and stores an access/refresh pair for a verified subject. Failures
/// are internal; credential checks happen before this is called.
async fn issue_tokens(
    subject: &str,
    role: &str,
    employee_id: Option<u64>,
    pool: &MySqlPool,
    config: &Config,
) -> Result<TokenPair, HttpResponse> {
    let access_token = generate_access_token(
        subject,
        role,
        employee_id,
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(|e| {
        error!(error = %e, "Failed to sign access token");
        HttpResponse::InternalServerError().finish()
    })?;

    let (refresh_token, refresh_claims) = generate_refresh_token(
        subject,
        role,
        employee_id,
        &config.jwt_secret,
        config.refresh_token_ttl,
    )
    .map_err(|e| {
        error!(error = %e, "Failed to sign refresh token");
        HttpResponse::InternalServerError().finish()
    })?;

    debug!(jti = %refresh_claims.jti, "Storing refresh token");

    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (subject, jti, expires_at)
        VALUES (?, ?, FROM_UNIXTIME(?))
        "#,
    )
    .bind(subject)
    .bind(&refresh_claims.jti)
    .bind(refresh_claims.exp as i64)
    .execute(pool)
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to store refresh token");
        HttpResponse::InternalServerError().finish()
    })?;

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

/// Phone-number login. The configured admin access code in the phone field
/// routes to the administrative session instead of an employee row. Every
/// rejection uses the same message so callers cannot probe which part was
/// wrong, or that the admin code exists at all.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Token pair issued", body = TokenPair),
        (status = 400, description = "Missing phone or password"),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_login", skip(pool, config, body))]
pub async fn login(
    body: web::Json<LoginReq>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    info!("Login request received");

    if body.phone.trim().is_empty() || body.password.is_empty() {
        info!("Validation failed: empty phone or password");
        return HttpResponse::BadRequest().body("Phone and password required");
    }

    // Administrative surface: sentinel access code instead of a phone number.
    if body.phone == config.admin_access_code {
        if verify_password(&body.password, &config.admin_password_hash).is_err() {
            info!("Invalid credentials: admin password mismatch");
            return HttpResponse::Unauthorized().body("Invalid credentials");
        }
        return match issue_tokens(
            ADMIN_SUBJECT,
            Role::Admin.as_ref(),
            None,
            pool.get_ref(),
            &config,
        )
        .await
        {
            Ok(pair) => {
                info!("Admin login successful");
                HttpResponse::Ok().json(pair)
            }
            Err(resp) => resp,
        };
    }

    debug!("Fetching employee by phone");

    let employee = match sqlx::query_as::<_, EmployeeAuthRow>(
        r#"
        SELECT id, name, phone, password_hash, role, registered, department_id
        FROM employees
        WHERE phone = ?
        "#,
    )
    .bind(&body.phone)
    .fetch_optional(pool.get_ref())
    .await
    {
        Ok(Some(row)) => {
            debug!(employee_id = row.id, "Employee found");
            row
        }
        Ok(None) => {
            info!("Invalid credentials: unknown phone");
            return HttpResponse::Unauthorized().body("Invalid credentials");
        }
        Err(e) => {
            error!(error = %e, "Database error while fetching employee");
            return HttpResponse::InternalServerError().finish();
        }
    };

    // Unregistered employees have no credential yet; the answer stays the
    // same generic one.
    let Some(password_hash) = employee.password_hash.filter(|_| employee.registered) else {
        info!("Invalid credentials: employee not activated");
        return HttpResponse::Unauthorized().body("Invalid credentials");
    };

    if let Err(e) = verify_password(&body.password, &password_hash) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return HttpResponse::Unauthorized().body("Invalid credentials");
    }

    let pair = match issue_tokens(
        &employee.phone,
        &employee.role,
        Some(employee.id),
        pool.get_ref(),
        &config,
    )
    .await
    {
        Ok(pair) => pair,
        Err(resp) => return resp,
    };

    // Non-fatal; feeds the recent-login cache warmup.
    if let Err(e) = sqlx::query("UPDATE employees SET last_login_at = NOW() WHERE id = ?")
        .bind(employee.id)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to update last_login_at");
    }

    info!("Login successful");

    HttpResponse::Ok().json(pair)
}

/// One-time activation: sets the password and flips the registered flag.
/// Monotonic: the WHERE clause only matches a not-yet-registered row, so
/// re-activation (or activation of an unknown phone) fails identically.
#[utoipa::path(
    post,
    path = "/auth/activate",
    request_body = ActivateReq,
    responses(
        (status = 200, description = "Account activated"),
        (status = 400, description = "Missing phone or password"),
        (status = 401, description = "Activation failed"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_activate", skip(pool, body))]
pub async fn activate(body: web::Json<ActivateReq>, pool: web::Data<MySqlPool>) -> impl Responder {
    if body.phone.trim().is_empty() || body.password.is_empty() {
        return HttpResponse::BadRequest().body("Phone and password required");
    }

    let hashed = match hash_password(&body.password) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "Failed to hash activation password");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let result = sqlx::query(
        r#"
        UPDATE employees
        SET password_hash = ?, registered = TRUE
        WHERE phone = ? AND registered = FALSE
        "#,
    )
    .bind(&hashed)
    .bind(&body.phone)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(res) if res.rows_affected() == 1 => {
            info!("Employee activated");
            HttpResponse::Ok().json(json!({ "message": "Account activated" }))
        }
        Ok(_) => {
            info!("Activation failed: unknown phone or already registered");
            HttpResponse::Unauthorized().body("Activation failed")
        }
        Err(e) => {
            error!(error = %e, "Database error during activation");
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// Rotates a refresh token: the presented one is revoked and a fresh pair is
/// issued against the same subject.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "Rotated token pair", body = TokenPair),
        (status = 401, description = "Missing, invalid, or revoked refresh token"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn refresh_token(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    let claims = match bearer_claims(&req, &config) {
        Some(c) => c,
        None => return HttpResponse::Unauthorized().body("Invalid token"),
    };

    if claims.token_type != TokenType::Refresh {
        return HttpResponse::Unauthorized().finish();
    }

    let record = match sqlx::query_as::<_, RefreshTokenRow>(
        r#"
        SELECT id, subject, revoked
        FROM refresh_tokens
        WHERE jti = ?
        "#,
    )
    .bind(&claims.jti)
    .fetch_optional(pool.get_ref())
    .await
    {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "Database error while fetching refresh token");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let record = match record {
        Some(r) if !r.revoked => r,
        _ => return HttpResponse::Unauthorized().finish(),
    };

    if let Err(e) = sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE id = ?")
        .bind(record.id)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to revoke rotated refresh token");
        return HttpResponse::InternalServerError().finish();
    }

    match issue_tokens(
        &claims.sub,
        &claims.role,
        claims.employee_id,
        pool.get_ref(),
        &config,
    )
    .await
    {
        Ok(pair) => HttpResponse::Ok().json(pair),
        Err(resp) => resp,
    }
}

/// Revokes the presented refresh token. Always succeeds from the caller's
/// point of view, even if the token never existed.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 204, description = "Refresh token revoked")),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    let claims = match bearer_claims(&req, &config) {
        Some(c) => c,
        None => return HttpResponse::NoContent().finish(),
    };

    if claims.token_type != TokenType::Refresh {
        return HttpResponse::NoContent().finish();
    }

    let _ = sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE jti = ?")
        .bind(&claims.jti)
        .execute(pool.get_ref())
        .await;

    HttpResponse::NoContent().finish()
}

fn bearer_claims(req: &HttpRequest, config: &Config) -> Option<Claims> {
    let header = req.headers().get("Authorization")?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?;
    verify_token(token, &config.jwt_secret).ok()
}
