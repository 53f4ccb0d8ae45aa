//! Axum extractors for authentication.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::errors::{ApiAuthError, AuthErrorKind};
use super::policy::{Authentication, authenticate};
use super::state::HasAuthBackend;
use super::types::AuthenticatedUser;

/// Extractor for API endpoints that require authentication.
/// Anonymous requests and rejected tokens both end in a JSON 401.
pub struct Auth(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for Auth
where
    S: HasAuthBackend + Send + Sync,
{
    type Rejection = ApiAuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match authenticate(&parts.headers, state.jwt()) {
            Authentication::Authenticated(user) => Ok(Auth(user)),
            Authentication::Anonymous => Err(ApiAuthError(AuthErrorKind::NotAuthenticated)),
            Authentication::Rejected(rejection) => Err(ApiAuthError::from(rejection)),
        }
    }
}

/// Optional authentication extractor.
/// Anonymous requests pass through as `None`; rejected tokens still fail.
pub struct MaybeAuth(pub Option<AuthenticatedUser>);

impl<S> FromRequestParts<S> for MaybeAuth
where
    S: HasAuthBackend + Send + Sync,
{
    type Rejection = ApiAuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match authenticate(&parts.headers, state.jwt()) {
            Authentication::Authenticated(user) => Ok(MaybeAuth(Some(user))),
            Authentication::Anonymous => Ok(MaybeAuth(None)),
            Authentication::Rejected(rejection) => Err(ApiAuthError::from(rejection)),
        }
    }
}
