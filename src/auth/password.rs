//! Credential verifier. bcrypt salts every hash, so hashing the same password
//! twice yields different strings that both verify.

use crate::error::AppError;

/// Hashes `password` at `cost`, which must lie in 4..=31.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    Ok(bcrypt::hash(password, cost)?)
}

/// Checks `password` against a stored bcrypt hash.
///
/// A stored value that is not a bcrypt hash at all is a server-side fault and
/// comes back as an error rather than a mismatch.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AppError> {
    Ok(bcrypt::verify(password, stored_hash)?)
}
