//! Salted password hashing for `client_users`.
//!
//! Hashes are hex-encoded SHA-256 over `salt || password`; verification
//! compares digests in constant time.

use rand::Rng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Generates a fresh random 16-byte salt, hex-encoded.
#[must_use]
pub fn generate_salt() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    hex::encode(bytes)
}

/// Hashes a password with the given salt.
#[must_use]
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Verifies a password attempt against a stored hex digest.
///
/// Malformed stored digests verify as false rather than erroring; a
/// corrupted row should behave like a wrong password.
#[must_use]
pub fn verify_password(password: &str, salt: &str, stored_hash_hex: &str) -> bool {
    let Ok(stored) = hex::decode(stored_hash_hex) else {
        return false;
    };

    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    let computed = hasher.finalize();

    computed.as_slice().ct_eq(&stored).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_password_verifies() {
        let salt = generate_salt();
        let hash = hash_password("hunter2", &salt);
        assert!(verify_password("hunter2", &salt, &hash));
    }

    #[test]
    fn wrong_password_fails() {
        let salt = generate_salt();
        let hash = hash_password("hunter2", &salt);
        assert!(!verify_password("hunter3", &salt, &hash));
    }

    #[test]
    fn wrong_salt_fails() {
        let hash = hash_password("hunter2", "aaaa");
        assert!(!verify_password("hunter2", "bbbb", &hash));
    }

    #[test]
    fn malformed_stored_hash_fails_closed() {
        assert!(!verify_password("hunter2", "aaaa", "not-hex!"));
    }

    #[test]
    fn salts_are_unique_per_call() {
        assert_ne!(generate_salt(), generate_salt());
    }
}
