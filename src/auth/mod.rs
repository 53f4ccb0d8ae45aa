//! Cookie-transported JWT authentication.
//!
//! The access token lives in the `access_token` cookie and the refresh token
//! in `refresh_token`. See [`policy`] for how an invalid access token is
//! treated when a refresh token is present.

mod cookie;
mod errors;
mod extractors;
pub mod policy;
mod state;
mod types;

pub use cookie::{
    ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME, clear_cookie, extract_access_token,
    extract_refresh_token, get_cookie, token_cookie,
};
pub use errors::{ApiAuthError, TokenFailure, TokenRejection, WWW_AUTHENTICATE_VALUE};
pub use extractors::{Auth, MaybeAuth};
pub use policy::{Authentication, authenticate};
pub use state::HasAuthBackend;
pub use types::AuthenticatedUser;
