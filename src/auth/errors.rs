//! Authentication error types.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::jwt::{JwtError, TokenType};

/// Value of the WWW-Authenticate header sent with every 401.
pub const WWW_AUTHENTICATE_VALUE: &str = "Bearer realm=\"api\"";

/// One token that failed validation and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenFailure {
    pub token_type: TokenType,
    pub message: &'static str,
}

impl TokenFailure {
    pub fn new(token_type: TokenType, error: &JwtError) -> Self {
        Self {
            token_type,
            message: error.client_message(),
        }
    }
}

/// Every token failure that led to a request being rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRejection {
    failures: Vec<TokenFailure>,
}

impl TokenRejection {
    pub fn access(error: &JwtError) -> Self {
        Self {
            failures: vec![TokenFailure::new(TokenType::Access, error)],
        }
    }

    pub fn refresh(error: &JwtError) -> Self {
        Self {
            failures: vec![TokenFailure::new(TokenType::Refresh, error)],
        }
    }

    /// Access token and refresh token both failed.
    pub fn combined(access: &JwtError, refresh: &JwtError) -> Self {
        Self {
            failures: vec![
                TokenFailure::new(TokenType::Access, access),
                TokenFailure::new(TokenType::Refresh, refresh),
            ],
        }
    }

    pub fn failures(&self) -> &[TokenFailure] {
        &self.failures
    }
}

/// Internal auth error kind used by the extractors.
#[derive(Debug)]
pub(crate) enum AuthErrorKind {
    /// No usable credentials; the request is anonymous
    NotAuthenticated,
    /// Credentials were supplied and failed validation
    InvalidToken(TokenRejection),
}

/// API authentication errors (JSON body, cookies left untouched).
#[derive(Debug)]
pub struct ApiAuthError(pub(super) AuthErrorKind);

impl From<TokenRejection> for ApiAuthError {
    fn from(rejection: TokenRejection) -> Self {
        Self(AuthErrorKind::InvalidToken(rejection))
    }
}

#[derive(Serialize)]
struct ErrorResponse<'a> {
    error: &'static str,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    messages: Option<&'a [TokenFailure]>,
}

impl IntoResponse for ApiAuthError {
    fn into_response(self) -> Response {
        let body = match &self.0 {
            AuthErrorKind::NotAuthenticated => ErrorResponse {
                error: "Authentication credentials were not provided",
                code: "not_authenticated",
                messages: None,
            },
            AuthErrorKind::InvalidToken(rejection) => ErrorResponse {
                error: "Given token not valid for any token type",
                code: "token_not_valid",
                messages: Some(rejection.failures()),
            },
        };

        let mut response = (StatusCode::UNAUTHORIZED, Json(body)).into_response();
        response.headers_mut().insert(
            header::WWW_AUTHENTICATE,
            HeaderValue::from_static(WWW_AUTHENTICATE_VALUE),
        );
        response
    }
}
