//! Password hashing and verification with per-user salts.
//!
//! Hash records have the shape `hex(HMAC-SHA256(key=salt, msg=password)):hex(salt)`.
//! Records without a salt segment are legacy unsalted SHA-256 digests and stay
//! verifiable for migration compatibility.

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::{Digest, Sha256};

const SALT_LEN: usize = 16;

/// Hash a password under a freshly generated random salt.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    hash_with_salt(password, &salt)
}

/// Deterministic variant used by `verify_password`.
pub fn hash_with_salt(password: &str, salt: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(salt)
        .expect("HMAC accepts keys of any length");
    mac.update(password.as_bytes());
    let digest = mac.finalize().into_bytes();
    format!("{}:{}", hex::encode(digest), hex::encode(salt))
}

/// Verify a password against a stored hash record.
///
/// Malformed records verify as `false`; this never errors. Comparison is
/// constant-time regardless of record format.
pub fn verify_password(password: &str, record: &str) -> bool {
    match record.split_once(':') {
        Some((hash_hex, salt_hex)) => {
            let (Ok(expected), Ok(salt)) = (hex::decode(hash_hex), hex::decode(salt_hex)) else {
                return false;
            };
            if salt.is_empty() {
                return false;
            }
            let mut mac = match Hmac::<Sha256>::new_from_slice(&salt) {
                Ok(mac) => mac,
                Err(_) => return false,
            };
            mac.update(password.as_bytes());
            let computed = mac.finalize().into_bytes();
            constant_time_eq(&computed, &expected)
        }
        None => {
            // Legacy unsalted record: plain SHA-256 hex digest
            let Ok(expected) = hex::decode(record) else {
                return false;
            };
            let computed = Sha256::digest(password.as_bytes());
            constant_time_eq(&computed, &expected)
        }
    }
}

/// Enforce the password policy; returns the first violated rule's message.
pub fn check_strength(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < 8 {
        return Err("Password must be at least 8 characters long");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("Password must contain an uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err("Password must contain a lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain a digit");
    }
    if !password.chars().any(|c| !c.is_alphanumeric()) {
        return Err("Password must contain a special character");
    }
    Ok(())
}

/// Byte comparison that does not short-circuit on the first mismatch.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
