//! Authentication user types.

use crate::jwt::Claims;

/// Identity resolved from a valid access token.
///
/// Built from the claims alone; the user table is not consulted.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// JWT claims from the access token
    pub claims: Claims,
    /// Database user ID
    pub user_id: i64,
}

impl AuthenticatedUser {
    pub fn from_claims(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            claims,
        }
    }
}
