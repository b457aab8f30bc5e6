use bcrypt::{hash, verify};

use crate::error::AuthError;

/// bcrypt work factor for stored passwords.
pub const BCRYPT_COST: u32 = 10;

/// Hashes a password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    hash(password, BCRYPT_COST).map_err(|_| AuthError::Hashing)
}

/// Checks a password against a stored hash.
///
/// A stored value that is not a bcrypt hash never verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    verify(password, hash).unwrap_or(false)
}
