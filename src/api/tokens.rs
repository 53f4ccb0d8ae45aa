//! Token API endpoints.
//!
//! - POST `/token` - Exchange username/password for access and refresh cookies
//! - GET `/token/verify` - Report the user behind the access token
//! - POST `/token/refresh` - Exchange the refresh cookie for a new access cookie
//! - POST `/token/clear` - Delete both cookies
//! - GET `/token/status` - Report whether the request is authenticated

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::error::{ApiError, ResultExt};
use crate::auth::{
    ACCESS_COOKIE_NAME, ApiAuthError, Auth, MaybeAuth, REFRESH_COOKIE_NAME, TokenRejection,
    clear_cookie, extract_refresh_token, token_cookie,
};
use crate::db::Database;
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;
use crate::password::check_credentials;

const INVALID_CREDENTIALS: &str = "No active account found with the given credentials";

#[derive(Clone)]
pub struct TokensState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
    pub secure_cookies: bool,
}

impl_has_auth_backend!(TokensState);

pub fn router(state: TokensState) -> Router {
    Router::new()
        .route("/token", post(obtain_tokens))
        .route("/token/", post(obtain_tokens))
        .route("/token/verify", get(verify_token))
        .route("/token/refresh", post(refresh_token))
        .route("/token/clear", post(clear_tokens))
        .route("/token/status", get(token_status))
        .with_state(state)
}

fn default_remember() -> bool {
    true
}

#[derive(Deserialize)]
struct ObtainRequest {
    username: String,
    password: String,
    /// When false both cookies are session cookies
    #[serde(default = "default_remember")]
    remember: bool,
}

#[derive(Serialize)]
struct ObtainResponse {
    user_id: i64,
    access_expire: u64,
    refresh_expire: u64,
}

/// Check credentials and set the access and refresh cookies.
async fn obtain_tokens(
    State(state): State<TokensState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload): Json<ObtainRequest> =
        Json::from_bytes(&body).map_err(|_| ApiError::bad_request("Invalid JSON"))?;

    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(ApiError::bad_request("Username and password are required"));
    }

    let user = state
        .db
        .users()
        .get_by_username(&payload.username)
        .await
        .db_err("Failed to get user")?;

    let user = user.filter(|u| u.active);
    if user.is_none() {
        warn!(username = %payload.username, "Login for unknown or inactive user");
    }

    // Argon2 runs whether or not the user exists
    let password = payload.password;
    let hash = user.as_ref().map(|u| u.password_hash.clone());
    let valid = tokio::task::spawn_blocking(move || check_credentials(&password, hash.as_deref()))
        .await
        .internal_err("Password check failed")?;

    let Some(user) = user else {
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    };
    if !valid {
        warn!(user_id = user.id, "Login with wrong password");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    let refresh = state
        .jwt
        .generate_refresh_token(user.id, payload.remember)
        .internal_err("Failed to generate token")?;
    let access = state
        .jwt
        .generate_access_token(user.id, payload.remember)
        .internal_err("Failed to generate token")?;

    let (access_max_age, refresh_max_age) = if payload.remember {
        (Some(access.duration), Some(refresh.duration))
    } else {
        (None, None)
    };
    let access_cookie = token_cookie(
        ACCESS_COOKIE_NAME,
        &access.token,
        access_max_age,
        state.secure_cookies,
    );
    let refresh_cookie = token_cookie(
        REFRESH_COOKIE_NAME,
        &refresh.token,
        refresh_max_age,
        state.secure_cookies,
    );

    info!(user_id = user.id, remember = payload.remember, "Issued token pair");

    Ok((
        StatusCode::OK,
        AppendHeaders([(SET_COOKIE, access_cookie), (SET_COOKIE, refresh_cookie)]),
        Json(ObtainResponse {
            user_id: user.id,
            access_expire: access.expires_at,
            refresh_expire: refresh.expires_at,
        }),
    ))
}

#[derive(Serialize)]
struct VerifyResponse {
    user_id: i64,
}

/// Returns 200 with the user ID if the access token is valid, 401 if not.
async fn verify_token(Auth(user): Auth) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(VerifyResponse {
            user_id: user.user_id,
        }),
    )
}

#[derive(Serialize)]
struct RefreshResponse {
    access_expire: u64,
}

/// Exchange a valid refresh token for a new access token cookie.
/// The refresh token itself is left in place. A refresh token from a login
/// without `remember` yields another session cookie.
async fn refresh_token(
    State(state): State<TokensState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let refresh_token =
        extract_refresh_token(&headers).ok_or_else(|| ApiError::bad_request("No refresh token"))?;

    let claims = state.jwt.validate_refresh_token(refresh_token).map_err(|e| {
        debug!(error = %e, "Refresh token rejected");
        ApiAuthError::from(TokenRejection::refresh(&e))
    })?;

    let access = state
        .jwt
        .access_token_for(&claims)
        .internal_err("Failed to generate token")?;

    let access_cookie = token_cookie(
        ACCESS_COOKIE_NAME,
        &access.token,
        claims.persistent.then_some(access.duration),
        state.secure_cookies,
    );

    debug!(
        user_id = claims.user_id,
        persistent = claims.persistent,
        "Refreshed access token"
    );

    Ok((
        StatusCode::OK,
        [(SET_COOKIE, access_cookie)],
        Json(RefreshResponse {
            access_expire: access.expires_at,
        }),
    ))
}

/// Delete both cookies, whatever state they are in.
async fn clear_tokens(State(state): State<TokensState>) -> impl IntoResponse {
    let clear_access = clear_cookie(ACCESS_COOKIE_NAME, state.secure_cookies);
    let clear_refresh = clear_cookie(REFRESH_COOKIE_NAME, state.secure_cookies);

    (
        StatusCode::OK,
        AppendHeaders([(SET_COOKIE, clear_access), (SET_COOKIE, clear_refresh)]),
        Json(serde_json::json!({ "success": true })),
    )
}

#[derive(Serialize)]
struct StatusResponse {
    authenticated: bool,
    user_id: Option<i64>,
}

/// Authentication status without requiring authentication.
/// An expired access token next to a valid refresh token reads as
/// unauthenticated here rather than as a 401.
async fn token_status(MaybeAuth(user): MaybeAuth) -> impl IntoResponse {
    Json(StatusResponse {
        authenticated: user.is_some(),
        user_id: user.map(|u| u.user_id),
    })
}
