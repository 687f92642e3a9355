//! Refresh token cookie
//!
//! `Set-Cookie` values for the httpOnly `refreshToken` cookie and lookup of the
//! cookie in a request `Cookie` header.

use axum::http::{header, HeaderMap, HeaderValue};

use crate::utils::errors::{AppError, AppResult};

pub const REFRESH_COOKIE_NAME: &str = "refreshToken";

/// Cookie carrying a freshly issued refresh token
pub fn refresh_cookie(token: &str, max_age_days: i64, secure: bool) -> AppResult<HeaderValue> {
    let max_age = max_age_days.max(0) * 24 * 60 * 60;
    build(token, max_age, secure)
}

/// Cookie that makes the browser drop the refresh token
pub fn clear_refresh_cookie(secure: bool) -> AppResult<HeaderValue> {
    build("", 0, secure)
}

fn build(value: &str, max_age: i64, secure: bool) -> AppResult<HeaderValue> {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        REFRESH_COOKIE_NAME, value, max_age
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).map_err(|e| AppError::Internal(format!("invalid cookie value: {}", e)))
}

/// Refresh token presented by the client, if any
pub fn refresh_token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == REFRESH_COOKIE_NAME)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
