//! Authentication routes
//!
//! Signup, login, logout and refresh. Access tokens are returned in
//! the JSON body; refresh tokens travel only in an HTTP-only cookie
//! scoped to these endpoints.

use crate::auth::cookie::{
    delete_cookie_header, extract_cookie, set_cookie_header, CookieConfig, REFRESH_COOKIE,
};
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::repositories::UserRecord;
use crate::services::AuthService;
use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use vidstream_shared::{
    AccessTokenResponse, AuthResponse, LoginRequest, MessageResponse, SignupRequest, UserPublic,
};

/// Create auth routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/refresh", post(refresh))
}

fn refresh_cookie(state: &AppState) -> CookieConfig {
    CookieConfig::refresh(
        state.config().cookies.secure,
        state.jwt().refresh_token_expiry_secs(),
    )
}

fn user_public(user: &UserRecord) -> UserPublic {
    UserPublic {
        id: user.id.to_string(),
        username: user.username.clone(),
        email: user.email.clone(),
        role: user.role.clone(),
    }
}

/// Register a new user
///
/// POST /api/auth/signup
async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<Response> {
    let session = AuthService::signup(
        state.db(),
        state.jwt(),
        state.sessions(),
        &req.username,
        &req.email,
        &req.password,
    )
    .await?;

    let cookie = set_cookie_header(&refresh_cookie(&state), &session.refresh_token);
    let body = AuthResponse {
        user: user_public(&session.user),
        access_token: session.access_token,
    };

    Ok((StatusCode::CREATED, [(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

/// Login with email and password
///
/// POST /api/auth/login
async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> ApiResult<Response> {
    let session = AuthService::login(
        state.db(),
        state.jwt(),
        state.sessions(),
        &req.email,
        &req.password,
    )
    .await?;

    let cookie = set_cookie_header(&refresh_cookie(&state), &session.refresh_token);
    let body = AuthResponse {
        user: user_public(&session.user),
        access_token: session.access_token,
    };

    Ok(([(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

/// Close the current session
///
/// POST /api/auth/logout (requires a valid access token)
async fn logout(State(state): State<AppState>, auth_user: AuthUser) -> ApiResult<Response> {
    AuthService::logout(state.sessions(), auth_user.user_id).await?;

    let cookie = delete_cookie_header(&refresh_cookie(&state));
    let body = MessageResponse {
        message: "Logout successful".to_string(),
    };

    Ok(([(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

/// Exchange the refresh cookie for a new access token
///
/// POST /api/auth/refresh
///
/// The refresh token is read from the cookie only, never from the
/// body. A successful refresh rotates the cookie.
async fn refresh(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    let presented = extract_cookie(&headers, REFRESH_COOKIE)
        .ok_or_else(|| ApiError::Unauthorized("Refresh token not provided".to_string()))?;

    let refreshed =
        AuthService::refresh(state.db(), state.jwt(), state.sessions(), &presented).await?;

    let cookie = set_cookie_header(&refresh_cookie(&state), &refreshed.refresh_token);
    let body = AccessTokenResponse {
        access_token: refreshed.access_token,
    };

    Ok(([(header::SET_COOKIE, cookie)], Json(body)).into_response())
}
