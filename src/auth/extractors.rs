use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use super::{claims::SessionClaims, cookies::SESSION_COOKIE, jwt::JwtKeys};
use crate::error::AppError;

fn session_token(parts: &Parts) -> Option<String> {
    CookieJar::from_headers(&parts.headers)
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

/// Requires a valid session cookie; rejects with 401 otherwise.
pub struct AuthUser(pub SessionClaims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = session_token(parts).ok_or_else(|| AppError::Unauthorized("unauthorized".into()))?;

        let keys = JwtKeys::from_ref(state);
        match keys.validate(&token) {
            Ok(claims) => Ok(AuthUser(claims)),
            Err(_) => {
                warn!("invalid or expired token");
                Err(AppError::Unauthorized("invalid or expired token".into()))
            }
        }
    }
}

/// Optional session: a missing or invalid cookie yields an anonymous viewer.
pub struct MaybeAuthUser(pub Option<SessionClaims>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let claims = session_token(parts).and_then(|t| JwtKeys::from_ref(state).validate(&t).ok());
        Ok(MaybeAuthUser(claims))
    }
}
