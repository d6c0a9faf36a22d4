use crate::config::Config;
use crate::model::employee::Role;
use crate::models::{Claims, TokenType};
use actix_web::{
    FromRequest, HttpRequest, dev::Payload, error::ErrorForbidden, error::ErrorUnauthorized,
    web::Data,
};
use futures::future::{Ready, ready};
use jsonwebtoken::{DecodingKey, Validation, decode};

#[derive(Debug, Clone)]
pub struct WorkerSession {
    pub employee_id: u64,
    pub phone: String,
    pub role: Role,
}

/// Tagged session dispatched by explicit match. A request is exactly one of
/// these; handlers never compare sentinel strings against typed records.
#[derive(Debug, Clone)]
pub enum Session {
    Admin,
    Worker(WorkerSession),
    Anonymous,
}

impl Session {
    pub fn from_claims(claims: &Claims) -> Self {
        if claims.token_type != TokenType::Access {
            return Session::Anonymous;
        }
        match claims.role.parse::<Role>() {
            Ok(Role::Admin) if claims.employee_id.is_none() => Session::Admin,
            Ok(role) => match claims.employee_id {
                Some(employee_id) => Session::Worker(WorkerSession {
                    employee_id,
                    phone: claims.sub.clone(),
                    role,
                }),
                None => Session::Anonymous,
            },
            Err(_) => Session::Anonymous,
        }
    }

    /// Admin surface: the sentinel admin session, or an employee whose role
    /// is ADMIN.
    pub fn require_admin(&self) -> actix_web::Result<()> {
        match self {
            Session::Admin => Ok(()),
            Session::Worker(w) if w.role == Role::Admin => Ok(()),
            _ => Err(ErrorForbidden("Admin only")),
        }
    }

    /// Worker-facing operations need an employee identity behind the token.
    pub fn worker(&self) -> actix_web::Result<&WorkerSession> {
        match self {
            Session::Worker(w) => Ok(w),
            _ => Err(ErrorForbidden("Worker session required")),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Session::Anonymous)
    }
}

impl FromRequest for Session {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // No credentials is a valid (anonymous) session; a token that fails
        // verification is not.
        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Ok(Session::Anonymous)),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(actix_web::error::ErrorInternalServerError(
                    "Config missing",
                )));
            }
        };

        let data = match decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &Validation::default(),
        ) {
            Ok(d) => d,
            Err(_) => return ready(Err(ErrorUnauthorized("Invalid token"))),
        };

        ready(Ok(Session::from_claims(&data.claims)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: &str, employee_id: Option<u64>, token_type: TokenType) -> Claims {
        Claims {
            sub: "+966501234567".into(),
            role: role.into(),
            exp: 0,
            jti: "j".into(),
            token_type,
            employee_id,
        }
    }

    #[test]
    fn admin_claims_yield_an_admin_session() {
        let session = Session::from_claims(&claims("ADMIN", None, TokenType::Access));
        assert!(session.require_admin().is_ok());
        assert!(session.worker().is_err());
    }

    #[test]
    fn worker_claims_yield_a_worker_session() {
        let session = Session::from_claims(&claims("WORKER", Some(42), TokenType::Access));
        let worker = session.worker().unwrap();
        assert_eq!(worker.employee_id, 42);
        assert_eq!(worker.role, Role::Worker);
        assert!(session.require_admin().is_err());
    }

    #[test]
    fn refresh_tokens_never_authenticate_requests() {
        let session = Session::from_claims(&claims("ADMIN", None, TokenType::Refresh));
        assert!(session.is_anonymous());
    }

    #[test]
    fn unknown_role_is_anonymous() {
        let session = Session::from_claims(&claims("SUPERUSER", Some(1), TokenType::Access));
        assert!(session.is_anonymous());
    }
}
