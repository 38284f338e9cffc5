//! Password digests and session tokens
//!
//! Passwords are stored as a hex SHA-256 over a per-user random salt followed
//! by the password. Tokens are opaque identifiers for the local session
//! record; nothing validates them server-side.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Generates a fresh random salt
pub fn generate_salt() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    let digest = hasher.finalize();
    format!("{digest:x}")
}

/// Compares a claimed password with a stored digest
pub fn verify_password(salt: &str, password: &str, expected_hash: &str) -> bool {
    let actual = hash_password(salt, password);
    constant_time_eq(actual.as_bytes(), expected_hash.as_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Issues an opaque session token
pub fn issue_token(issued_at_ms: i64) -> String {
    format!("token_{}_{}", issued_at_ms, Uuid::new_v4().simple())
}
