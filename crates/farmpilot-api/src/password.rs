use anyhow::Result;
use bcrypt::{DEFAULT_COST, hash, verify};

/// Bcrypt-hash a plaintext password. Hashing is CPU-bound; callers on the
/// async path run this through `spawn_blocking`.
pub fn hash_password(password: &str) -> Result<String> {
    Ok(hash(password, DEFAULT_COST)?)
}

/// Check a plaintext candidate against a stored bcrypt hash.
pub fn verify_password(password: &str, hashed: &str) -> Result<bool> {
    Ok(verify(password, hashed)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_roundtrip() {
        let hashed = hash_password("hunter2").unwrap();

        assert_ne!(hashed, "hunter2");
        assert!(verify_password("hunter2", &hashed).unwrap());
        assert!(!verify_password("hunter3", &hashed).unwrap());
    }

    #[test]
    fn garbage_hash_is_an_error_not_a_match() {
        assert!(verify_password("pw", "not-a-bcrypt-hash").is_err());
    }
}
