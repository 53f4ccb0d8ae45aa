//! JWT token generation and validation.
//!
//! Signing, decoding and expiry checks are done by `jsonwebtoken`; this module
//! only fixes the claim layout and tells access tokens apart from refresh tokens.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Token type for distinguishing access vs refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Short-lived credential proving identity on protected requests
    Access,
    /// Longer-lived credential only good for minting a new access token
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// JWT claims shared by access and refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Token type
    pub token_type: TokenType,
    /// Database user ID
    pub user_id: i64,
    /// JWT ID
    pub jti: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// False when the login asked for browser-session cookies only
    pub persistent: bool,
}

/// Default access token lifetime: 5 minutes
pub const DEFAULT_ACCESS_TOKEN_LIFETIME_SECS: u64 = 5 * 60;

/// Default refresh token lifetime: 1 day
pub const DEFAULT_REFRESH_TOKEN_LIFETIME_SECS: u64 = 24 * 60 * 60;

/// Longest accepted token lifetime: 10 years
pub const MAX_TOKEN_LIFETIME_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Configured token lifetimes in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLifetimes {
    pub access: u64,
    pub refresh: u64,
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self {
            access: DEFAULT_ACCESS_TOKEN_LIFETIME_SECS,
            refresh: DEFAULT_REFRESH_TOKEN_LIFETIME_SECS,
        }
    }
}

/// Configuration for JWT operations.
#[derive(Clone)]
pub struct JwtConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetimes: TokenLifetimes,
}

/// Result of generating an access token.
#[derive(Debug, Clone)]
pub struct AccessTokenResult {
    /// The JWT token string
    pub token: String,
    /// JWT ID
    pub jti: String,
    /// Expiration timestamp (Unix seconds)
    pub expires_at: u64,
    /// Token duration in seconds
    pub duration: u64,
}

/// Result of generating a refresh token.
#[derive(Debug, Clone)]
pub struct RefreshTokenResult {
    /// The JWT token string
    pub token: String,
    /// JWT ID
    pub jti: String,
    /// Expiration timestamp (Unix seconds)
    pub expires_at: u64,
    /// Token duration in seconds
    pub duration: u64,
}

fn now_secs() -> Result<u64, JwtError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| JwtError::TimeError)
}

impl JwtConfig {
    /// Create a new JWT configuration with the given secret and lifetimes.
    pub fn new(secret: &[u8], lifetimes: TokenLifetimes) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            lifetimes,
        }
    }

    pub fn lifetimes(&self) -> TokenLifetimes {
        self.lifetimes
    }

    fn sign(
        &self,
        user_id: i64,
        token_type: TokenType,
        duration: u64,
        persistent: bool,
    ) -> Result<(String, Claims), JwtError> {
        let now = now_secs()?;
        let exp = now.checked_add(duration).ok_or(JwtError::TimeError)?;
        let claims = Claims {
            token_type,
            user_id,
            jti: uuid::Uuid::new_v4().simple().to_string(),
            iat: now,
            exp,
            persistent,
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(JwtError::Encoding)?;

        Ok((token, claims))
    }

    /// Generate an access token for a user.
    pub fn generate_access_token(
        &self,
        user_id: i64,
        persistent: bool,
    ) -> Result<AccessTokenResult, JwtError> {
        let duration = self.lifetimes.access;
        let (token, claims) = self.sign(user_id, TokenType::Access, duration, persistent)?;

        Ok(AccessTokenResult {
            token,
            jti: claims.jti,
            expires_at: claims.exp,
            duration,
        })
    }

    /// Generate a refresh token for a user.
    ///
    /// `persistent` is carried into every access token minted from it.
    pub fn generate_refresh_token(
        &self,
        user_id: i64,
        persistent: bool,
    ) -> Result<RefreshTokenResult, JwtError> {
        let duration = self.lifetimes.refresh;
        let (token, claims) = self.sign(user_id, TokenType::Refresh, duration, persistent)?;

        Ok(RefreshTokenResult {
            token,
            jti: claims.jti,
            expires_at: claims.exp,
            duration,
        })
    }

    /// Mint a fresh access token for the user a validated refresh token names.
    pub fn access_token_for(&self, refresh: &Claims) -> Result<AccessTokenResult, JwtError> {
        if refresh.token_type != TokenType::Refresh {
            return Err(JwtError::WrongTokenType);
        }
        self.generate_access_token(refresh.user_id, refresh.persistent)
    }

    fn validate(&self, token: &str, expected: TokenType) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let token_data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(JwtError::from)?;

        if token_data.claims.token_type != expected {
            return Err(JwtError::WrongTokenType);
        }

        Ok(token_data.claims)
    }

    /// Validate and decode an access token.
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.validate(token, TokenType::Access)
    }

    /// Validate and decode a refresh token.
    ///
    /// Signature, expiry and type only: nothing is re-issued and no store is
    /// consulted.
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.validate(token, TokenType::Refresh)
    }
}

/// Errors that can occur during JWT operations.
#[derive(Debug)]
pub enum JwtError {
    /// Error encoding the token
    Encoding(jsonwebtoken::errors::Error),
    /// Token signature is fine but `exp` has passed
    Expired,
    /// Token could not be decoded or verified
    Invalid(jsonwebtoken::errors::Error),
    /// System time error
    TimeError,
    /// Wrong token type (e.g., using refresh token as access token)
    WrongTokenType,
}

impl JwtError {
    /// Message safe to hand back to clients.
    pub fn client_message(&self) -> &'static str {
        match self {
            JwtError::Expired => "Token is expired",
            JwtError::WrongTokenType => "Token has wrong type",
            JwtError::Invalid(_) => "Token is invalid",
            JwtError::Encoding(_) | JwtError::TimeError => "Token could not be processed",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            _ => JwtError::Invalid(e),
        }
    }
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::Encoding(e) => write!(f, "Failed to encode token: {}", e),
            JwtError::Expired => write!(f, "Token has expired"),
            JwtError::Invalid(e) => write!(f, "Failed to decode token: {}", e),
            JwtError::TimeError => write!(f, "System time error"),
            JwtError::WrongTokenType => write!(f, "Wrong token type"),
        }
    }
}

impl std::error::Error for JwtError {}
