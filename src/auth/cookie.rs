//! Cookie parsing and Set-Cookie construction for the token cookies.

use axum::http::header;

/// Cookie name for the access token.
pub const ACCESS_COOKIE_NAME: &str = "access_token";

/// Cookie name for the refresh token.
pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

/// Extract a cookie value from the Cookie header.
pub fn get_cookie<'a>(headers: &'a axum::http::HeaderMap, name: &str) -> Option<&'a str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    for part in cookie_header.split(';') {
        let part = part.trim();
        if let Some((key, value)) = part.split_once('=') {
            if key.trim() == name {
                return Some(value.trim());
            }
        }
    }
    None
}

/// Raw access token from the request, if the cookie is present.
pub fn extract_access_token(headers: &axum::http::HeaderMap) -> Option<&str> {
    get_cookie(headers, ACCESS_COOKIE_NAME)
}

/// Raw refresh token from the request, if the cookie is present.
pub fn extract_refresh_token(headers: &axum::http::HeaderMap) -> Option<&str> {
    get_cookie(headers, REFRESH_COOKIE_NAME)
}

/// Build a Set-Cookie value for a token.
///
/// `max_age = None` makes a session cookie that the browser drops on close.
pub fn token_cookie(name: &str, value: &str, max_age: Option<u64>, secure: bool) -> String {
    let mut cookie = format!("{}={}; HttpOnly; SameSite=Strict; Path=/", name, value);
    if let Some(max_age) = max_age {
        cookie.push_str(&format!("; Max-Age={}", max_age));
    }
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Build a Set-Cookie value that deletes a token cookie.
pub fn clear_cookie(name: &str, secure: bool) -> String {
    token_cookie(name, "", Some(0), secure)
}
