//! Password hashing
//!
//! `salt$digest` where digest = SHA-256(salt || password), both hex.
//! Verification re-derives the digest and compares in constant time.

use constant_time_eq::constant_time_eq;
use rand::RngCore;
use sha2::{Digest, Sha256};

const SALT_LEN: usize = 16;

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let digest = digest_with_salt(&salt, password);
    format!("{}${}", hex::encode(salt), hex::encode(digest))
}

/// Check `password` against a stored `salt$digest` hash.
///
/// Unparseable hashes verify as false; the reserve account stores an
/// unusable marker on purpose.
pub fn verify_password(stored: &str, password: &str) -> bool {
    let Some((salt_hex, digest_hex)) = stored.split_once('$') else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (hex::decode(salt_hex), hex::decode(digest_hex)) else {
        return false;
    };
    let actual = digest_with_salt(&salt, password);
    constant_time_eq(&actual, &expected)
}

fn digest_with_salt(salt: &[u8], password: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_roundtrip() {
        let hash = hash_password("hunter42x");
        assert!(verify_password(&hash, "hunter42x"));
        assert!(!verify_password(&hash, "hunter42y"));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let a = hash_password("correct horse 1");
        let b = hash_password("correct horse 1");
        assert_ne!(a, b);
        assert!(verify_password(&a, "correct horse 1"));
        assert!(verify_password(&b, "correct horse 1"));
    }

    #[test]
    fn unusable_markers_never_verify() {
        assert!(!verify_password("!", "anything"));
        assert!(!verify_password("", ""));
        assert!(!verify_password("nodollar", "anything"));
        assert!(!verify_password("zz$notreallyhex", "anything"));
    }
}
