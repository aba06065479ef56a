use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use password_hash::rand_core::OsRng;

use crate::error::{AppError, AppResult};

/// Derive a salted Argon2 PHC string from a clear-text password.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let digest = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(digest)
}

/// Returns `Ok(false)` on mismatch; `Err` only when the stored digest is unreadable.
pub fn verify_password(password: &str, digest: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(digest)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_never_contains_the_password() {
        let digest = hash_password("pepperoni").unwrap();
        assert!(!digest.contains("pepperoni"));
        assert!(digest.starts_with("$argon2"));
    }

    #[test]
    fn verify_accepts_only_the_original_password() {
        let digest = hash_password("pepperoni").unwrap();
        assert!(verify_password("pepperoni", &digest).unwrap());
        assert!(!verify_password("hawaiian", &digest).unwrap());
    }

    #[test]
    fn same_password_hashes_differently() {
        let a = hash_password("margherita").unwrap();
        let b = hash_password("margherita").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn corrupt_digest_is_an_internal_error() {
        let err = verify_password("x", "not-a-phc-string").unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
