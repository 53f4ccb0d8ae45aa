//! Password hashing with Argon2id.

use argon2::password_hash::{PasswordHash, SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

/// Well-formed hash with the default Argon2id parameters that no password
/// matches. Verifying against it costs the same as verifying a real hash.
const DUMMY_PASSWORD_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$dG9rZW5jb29raWVzYWx0IQ$AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8";

/// Hash a password into a PHC string.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
}

/// Check a password against a stored PHC string.
/// A stored hash that does not parse counts as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .and_then(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed))
        .is_ok()
}

/// Check a login attempt against the stored hash of the matching user.
///
/// With no user the password is still run through Argon2 against a dummy
/// hash, so unknown usernames take as long to reject as wrong passwords.
pub fn check_credentials(password: &str, stored_hash: Option<&str>) -> bool {
    match stored_hash {
        Some(hash) => verify_password(password, hash),
        None => {
            verify_password(password, DUMMY_PASSWORD_HASH);
            false
        }
    }
}
