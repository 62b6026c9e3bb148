use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::{axum_http::error_responses::error_response, config::config_loader};

/// Claims issued by the external identity provider. Only `sub` matters to the
/// booking core.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub email: Option<String>,
    pub exp: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: Option<String>,
}

#[derive(Debug)]
pub struct AuthError(anyhow::Error);

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        AuthError(err)
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        warn!(
            error = %self.0,
            status = StatusCode::UNAUTHORIZED.as_u16(),
            "auth: request rejected"
        );
        error_response(StatusCode::UNAUTHORIZED, format!("Unauthorized: {}", self.0))
    }
}

pub fn validate_user_jwt(token: &str, secret: &str) -> Result<UserClaims, AuthError> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::new(jsonwebtoken::Algorithm::HS256);

    let token_data = decode::<UserClaims>(token, &decoding_key, &validation)
        .map_err(|e| anyhow::anyhow!("JWT validation failed: {}", e))?;

    Ok(token_data.claims)
}

fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let auth_header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| anyhow::anyhow!("Missing Authorization header"))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| anyhow::anyhow!("Invalid Authorization header"))?;

    auth_str
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError(anyhow::anyhow!("Invalid Authorization header format")))
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;

        let secret = config_loader::get_user_secret()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        let claims = validate_user_jwt(token, &secret.secret)?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| anyhow::anyhow!("Invalid user ID in token"))?;

        Ok(AuthUser {
            user_id,
            email: claims.email,
        })
    }
}
