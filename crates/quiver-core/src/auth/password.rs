//! Password hashing for user accounts.

use bcrypt::{DEFAULT_COST, hash, verify};

/// Hash a plaintext password with bcrypt at the default cost.
pub fn hash_password(plain: &str) -> Result<String, bcrypt::BcryptError> {
    hash(plain, DEFAULT_COST)
}

/// Check a plaintext password against a stored bcrypt hash. A malformed
/// stored hash counts as a mismatch rather than an error, so login never
/// leaks whether a hash was readable.
pub fn verify_password(plain: &str, hashed: &str) -> bool {
    verify(plain, hashed).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let hashed = hash_password("arrows-and-anchors").unwrap();
        assert!(verify_password("arrows-and-anchors", &hashed));
    }

    #[test]
    fn wrong_password_fails_verification() {
        let hashed = hash_password("arrows-and-anchors").unwrap();
        assert!(!verify_password("arrows-and-arches", &hashed));
    }

    #[test]
    fn malformed_hash_is_a_mismatch() {
        assert!(!verify_password("anything", "not-a-bcrypt-hash"));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b, "two hashes of the same password must differ");
    }
}
