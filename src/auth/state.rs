//! Authentication state trait and macro.

use crate::jwt::JwtConfig;

/// Trait for state types that provide JWT access for authentication.
pub trait HasAuthBackend {
    fn jwt(&self) -> &JwtConfig;
}

/// Macro to implement `HasAuthBackend` for state structs with a `jwt: Arc<JwtConfig>` field.
///
/// # Example
/// ```ignore
/// use crate::impl_has_auth_backend;
///
/// #[derive(Clone)]
/// pub struct MyState {
///     pub jwt: Arc<JwtConfig>,
///     // ... other fields
/// }
///
/// impl_has_auth_backend!(MyState);
/// ```
#[macro_export]
macro_rules! impl_has_auth_backend {
    ($state_type:ty) => {
        impl $crate::auth::HasAuthBackend for $state_type {
            fn jwt(&self) -> &$crate::jwt::JwtConfig {
                &self.jwt
            }
        }
    };
}
