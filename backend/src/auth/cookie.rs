//! Cookie handling for token transport
//!
//! The refresh token travels exclusively in an HTTP-only cookie scoped
//! to the auth endpoints. The access token may also arrive via a
//! cookie, though the Authorization header takes precedence.

use axum::http::{header, HeaderMap, HeaderValue};

/// Name of the refresh-token cookie
pub const REFRESH_COOKIE: &str = "refresh_token";
/// Name of the fallback access-token cookie
pub const ACCESS_COOKIE: &str = "access_token";
/// Path scope for the refresh cookie; it is never sent with ordinary
/// API requests
pub const REFRESH_COOKIE_PATH: &str = "/api/auth";

/// Cookie attributes for a Set-Cookie header
#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub name: String,
    pub secure: bool,
    pub http_only: bool,
    pub path: String,
    pub max_age_secs: Option<i64>,
}

impl CookieConfig {
    /// Configuration for the refresh-token cookie
    pub fn refresh(secure: bool, max_age_secs: i64) -> Self {
        Self {
            name: REFRESH_COOKIE.to_string(),
            secure,
            http_only: true,
            path: REFRESH_COOKIE_PATH.to_string(),
            max_age_secs: Some(max_age_secs),
        }
    }

    /// Build Set-Cookie header value
    pub fn build_set_cookie(&self, value: &str) -> String {
        let mut cookie = format!("{}={}", self.name, value);

        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str("; SameSite=Lax");
        cookie.push_str(&format!("; Path={}", self.path));

        if let Some(max_age) = self.max_age_secs {
            cookie.push_str(&format!("; Max-Age={}", max_age));
        }

        cookie
    }

    /// Build Set-Cookie header for deletion (expired)
    pub fn build_delete_cookie(&self) -> String {
        format!("{}=; HttpOnly; Path={}; Max-Age=0", self.name, self.path)
    }
}

/// Extract a cookie value from request headers
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(header::COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .find_map(|cookie| {
            let (key, value) = cookie.trim().split_once('=')?;

            if key == name {
                Some(value.to_string())
            } else {
                None
            }
        })
}

/// Create a Set-Cookie header value
pub fn set_cookie_header(config: &CookieConfig, value: &str) -> HeaderValue {
    HeaderValue::from_str(&config.build_set_cookie(value))
        .unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// Create a Set-Cookie header value that clears the cookie
pub fn delete_cookie_header(config: &CookieConfig) -> HeaderValue {
    HeaderValue::from_str(&config.build_delete_cookie())
        .unwrap_or_else(|_| HeaderValue::from_static(""))
}
