use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::user::UserRole;

/// Claims issued by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| Error::Unauthorized("Token subject is not a user id".into()))
    }

    pub fn role(&self) -> Result<UserRole> {
        self.role
            .as_deref()
            .ok_or_else(|| Error::Forbidden("Token carries no role".into()))?
            .parse()
            .map_err(Error::Forbidden)
    }

    /// The caller's id, provided they hold `role`.
    pub fn require_role(&self, role: UserRole) -> Result<Uuid> {
        if self.role()? != role {
            return Err(Error::Forbidden(format!(
                "This action requires the {} role",
                role.as_str()
            )));
        }
        self.user_id()
    }
}

fn unauthorized(code: &'static str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": code }))).into_response()
}

pub(crate) fn bearer_claims(headers: &HeaderMap) -> std::result::Result<Claims, &'static str> {
    let auth_header = headers.get(AUTHORIZATION).ok_or("missing_authorization")?;
    let auth_str = auth_header.to_str().map_err(|_| "bad_authorization")?;
    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or("unsupported_scheme")?;

    let config = crate::config::get_config();
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| "invalid_token")
}

pub async fn require_bearer_auth(mut req: Request, next: Next) -> Response {
    match bearer_claims(req.headers()) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(code) => unauthorized(code),
    }
}

pub async fn require_admin(mut req: Request, next: Next) -> Response {
    match bearer_claims(req.headers()) {
        Ok(claims) => {
            if !matches!(claims.role(), Ok(UserRole::Admin)) {
                return (StatusCode::FORBIDDEN, Json(json!({"error":"forbidden"}))).into_response();
            }
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(code) => unauthorized(code),
    }
}
