//! Authentication middleware
//!
//! The `AuthUser` extractor locates a bearer token (Authorization
//! header first, `access_token` cookie as fallback), validates it as an
//! access token, loads the identity and rejects with 401 on any
//! failure: missing token, bad signature, expiry, unknown user, or a
//! deactivated account.
//!
//! The session store is deliberately not consulted here: access tokens
//! are stateless and live until natural expiry. Only refresh tokens
//! are revocable.

use crate::auth::cookie::{extract_cookie, ACCESS_COOKIE};
use crate::error::ApiError;
use crate::repositories::UserRepository;
use crate::state::AppState;
use axum::{
    extract::FromRef,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use uuid::Uuid;

/// Authenticated user extracted from a verified access token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
}

/// Locate the bearer token: Authorization header wins over the cookie
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        if let Some(token) = value.strip_prefix("Bearer ") {
            return Some(token.to_string());
        }
        // A malformed Authorization header does not fall through to
        // the cookie; the client asked for header auth and got it wrong.
        return None;
    }
    extract_cookie(headers, ACCESS_COOKIE)
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let token = bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("Access denied. No token provided".to_string()))?;

        // Fails closed; the reason is never surfaced to the client
        let claims = app_state
            .jwt()
            .validate_access_token(&token)
            .map_err(|_| ApiError::Unauthorized("Invalid token".to_string()))?;

        let user_id = claims
            .user_id()
            .map_err(|_| ApiError::Unauthorized("Invalid token".to_string()))?;

        // The identity store stays authoritative for existence and
        // active status even while the token itself is stateless.
        let user = UserRepository::find_by_id(app_state.db(), user_id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::Unauthorized("Invalid token".to_string()))?;

        if !user.is_active {
            return Err(ApiError::Unauthorized("Account deactivated".to_string()));
        }

        Ok(AuthUser {
            user_id: user.id,
            email: user.email,
            role: user.role,
        })
    }
}
