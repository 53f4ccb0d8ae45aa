//! Refresh-fallback authentication policy.
//!
//! An access token that fails validation is normally a rejection. When the
//! request also carries a refresh token that still validates, the request is
//! downgraded to anonymous instead, so a client can tell "call refresh" apart
//! from "session is gone" without getting a 401 from unrelated endpoints.
//!
//! The refresh token is only checked for validity here. It never supplies an
//! identity, so it cannot stand in for an access token.

use axum::http::HeaderMap;

use super::cookie::{extract_access_token, extract_refresh_token};
use super::errors::TokenRejection;
use super::types::AuthenticatedUser;
use crate::jwt::JwtConfig;

/// Outcome of authenticating a request.
#[derive(Debug)]
pub enum Authentication {
    /// Access token validated.
    Authenticated(AuthenticatedUser),
    /// No credentials, or an invalid access token backed by a valid refresh token.
    Anonymous,
    /// Credentials were supplied and none of them hold up.
    Rejected(TokenRejection),
}

/// Authenticate a request from its cookies.
pub fn authenticate(headers: &HeaderMap, jwt: &JwtConfig) -> Authentication {
    let Some(access_token) = extract_access_token(headers) else {
        return Authentication::Anonymous;
    };

    let access_err = match jwt.validate_access_token(access_token) {
        Ok(claims) => {
            return Authentication::Authenticated(AuthenticatedUser::from_claims(claims));
        }
        Err(e) => e,
    };

    let Some(refresh_token) = extract_refresh_token(headers) else {
        tracing::debug!(error = %access_err, "Access token rejected, no refresh token");
        return Authentication::Rejected(TokenRejection::access(&access_err));
    };

    // Structural validity only: accepting it here re-issues nothing. Whether a
    // replayed refresh token should also block this downgrade is unresolved.
    match jwt.validate_refresh_token(refresh_token) {
        Ok(_) => {
            tracing::debug!(error = %access_err, "Access token rejected, refresh token valid");
            Authentication::Anonymous
        }
        Err(refresh_err) => {
            tracing::debug!(
                access_error = %access_err,
                refresh_error = %refresh_err,
                "Access and refresh tokens rejected"
            );
            Authentication::Rejected(TokenRejection::combined(&access_err, &refresh_err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::errors::TokenFailure;
    use crate::jwt::{Claims, TokenLifetimes, TokenType};
    use axum::http::{HeaderValue, header};
    use jsonwebtoken::{EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    const SECRET: &[u8] = b"policy-test-secret";

    fn jwt() -> JwtConfig {
        JwtConfig::new(SECRET, TokenLifetimes::default())
    }

    fn headers(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    fn expired(token_type: TokenType) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let claims = Claims {
            token_type,
            user_id: 1,
            jti: "old".to_string(),
            iat: now - 1000,
            exp: now - 500,
            persistent: true,
        };
        jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET))
            .unwrap()
    }

    #[test]
    fn test_no_cookies_is_anonymous() {
        let outcome = authenticate(&HeaderMap::new(), &jwt());
        assert!(matches!(outcome, Authentication::Anonymous));
    }

    #[test]
    fn test_refresh_cookie_alone_is_anonymous() {
        let jwt = jwt();
        let refresh = jwt.generate_refresh_token(5, true).unwrap();

        let outcome = authenticate(&headers(&format!("refresh_token={}", refresh.token)), &jwt);
        assert!(matches!(outcome, Authentication::Anonymous));
    }

    #[test]
    fn test_valid_access_token_authenticates() {
        let jwt = jwt();
        let access = jwt.generate_access_token(5, true).unwrap();

        match authenticate(&headers(&format!("access_token={}", access.token)), &jwt) {
            Authentication::Authenticated(user) => {
                assert_eq!(user.user_id, 5);
                assert_eq!(user.claims.jti, access.jti);
            }
            other => panic!("expected Authenticated, got {:?}", other),
        }
    }

    #[test]
    fn test_expired_access_without_refresh_is_rejected() {
        let cookie = format!("access_token={}", expired(TokenType::Access));

        match authenticate(&headers(&cookie), &jwt()) {
            Authentication::Rejected(rejection) => {
                assert_eq!(
                    rejection.failures(),
                    &[TokenFailure {
                        token_type: TokenType::Access,
                        message: "Token is expired",
                    }]
                );
            }
            other => panic!("expected Rejected, got {:?}", other),
        }
    }

    #[test]
    fn test_expired_access_with_valid_refresh_is_anonymous() {
        let jwt = jwt();
        let refresh = jwt.generate_refresh_token(5, true).unwrap();
        let cookie = format!(
            "access_token={}; refresh_token={}",
            expired(TokenType::Access),
            refresh.token
        );

        let outcome = authenticate(&headers(&cookie), &jwt);
        assert!(matches!(outcome, Authentication::Anonymous));
    }

    #[test]
    fn test_garbage_access_with_valid_refresh_is_anonymous() {
        let jwt = jwt();
        let refresh = jwt.generate_refresh_token(5, true).unwrap();
        let cookie = format!("access_token=garbage; refresh_token={}", refresh.token);

        let outcome = authenticate(&headers(&cookie), &jwt);
        assert!(matches!(outcome, Authentication::Anonymous));
    }

    #[test]
    fn test_expired_access_with_expired_refresh_is_rejected_with_both() {
        let cookie = format!(
            "access_token={}; refresh_token={}",
            expired(TokenType::Access),
            expired(TokenType::Refresh)
        );

        match authenticate(&headers(&cookie), &jwt()) {
            Authentication::Rejected(rejection) => {
                let types: Vec<TokenType> =
                    rejection.failures().iter().map(|f| f.token_type).collect();
                assert_eq!(types, vec![TokenType::Access, TokenType::Refresh]);
            }
            other => panic!("expected Rejected, got {:?}", other),
        }
    }

    #[test]
    fn test_access_token_in_refresh_cookie_is_rejected() {
        let jwt = jwt();
        let access = jwt.generate_access_token(5, true).unwrap();
        let cookie = format!("access_token=garbage; refresh_token={}", access.token);

        match authenticate(&headers(&cookie), &jwt) {
            Authentication::Rejected(rejection) => {
                assert_eq!(rejection.failures()[1].message, "Token has wrong type");
            }
            other => panic!("expected Rejected, got {:?}", other),
        }
    }

    #[test]
    fn test_refresh_token_in_access_cookie_never_authenticates() {
        let jwt = jwt();
        let refresh = jwt.generate_refresh_token(5, true).unwrap();
        let cookie = format!(
            "access_token={}; refresh_token={}",
            refresh.token, refresh.token
        );

        let outcome = authenticate(&headers(&cookie), &jwt);
        assert!(matches!(outcome, Authentication::Anonymous));
    }
}
