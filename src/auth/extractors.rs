use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use crate::auth::claims::Identity;
use crate::auth::jwt::JwtKeys;

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Identity resolved from the `accessToken` cookie.
///
/// Gates every protected operation; the core treats the verified payload as
/// a precondition and does not re-check the signature.
pub struct AuthUser(pub Identity);

/// Identity resolved from the `refreshToken` cookie (refresh endpoint only).
pub struct RefreshUser(pub Identity);

fn cookie_token(parts: &Parts, name: &str) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    jar.get(name).map(|c| c.value().to_string())
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let token = cookie_token(parts, ACCESS_COOKIE).ok_or((
            StatusCode::UNAUTHORIZED,
            "Missing access token".to_string(),
        ))?;

        match keys.verify_access(&token) {
            Ok(claims) => Ok(AuthUser(claims.into())),
            Err(_) => {
                warn!("invalid or expired access token");
                Err((
                    StatusCode::UNAUTHORIZED,
                    "Invalid or expired token".to_string(),
                ))
            }
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RefreshUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let token = cookie_token(parts, REFRESH_COOKIE).ok_or((
            StatusCode::UNAUTHORIZED,
            "Missing refresh token".to_string(),
        ))?;

        match keys.verify_refresh(&token) {
            Ok(claims) => Ok(RefreshUser(claims.into())),
            Err(_) => {
                warn!("invalid or expired refresh token");
                Err((
                    StatusCode::UNAUTHORIZED,
                    "Invalid or expired token".to_string(),
                ))
            }
        }
    }
}
