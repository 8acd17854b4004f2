use crate::models::user::UserRole;
use crate::services::auth::AuthService;
use actix_web::{Error, FromRequest, HttpRequest, dev::Payload, error::ErrorUnauthorized};
use std::future::{Ready, ready};
use tracing::warn;
use uuid::Uuid;

/// Identity extracted from the `Authorization: Bearer` header. Handlers that
/// take this parameter reject unauthenticated requests with 401.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    pub user_role: UserRole,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.user_role == UserRole::Admin
    }
}

fn extract_user(req: &HttpRequest) -> Result<AuthenticatedUser, Error> {
    let header = req
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ErrorUnauthorized("Unauthorized: token missing"))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ErrorUnauthorized("Unauthorized: token missing"))?;

    let auth_service = AuthService::new().map_err(|e| {
        warn!("Auth service unavailable: {}", e);
        ErrorUnauthorized("Unauthorized: invalid token")
    })?;

    let claims = auth_service.decode_token(token).map_err(|e| {
        warn!("Token rejected: {}", e);
        ErrorUnauthorized("Unauthorized: invalid token")
    })?;

    Ok(AuthenticatedUser {
        user_id: claims.sub,
        email: claims.email,
        user_role: claims.role,
    })
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(extract_user(req))
    }
}
