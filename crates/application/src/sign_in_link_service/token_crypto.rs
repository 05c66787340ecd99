use std::fmt::Write;

use opsdesk_core::{AppError, AppResult};
use sha2::{Digest, Sha256};

const TOKEN_BYTES: usize = 32;

/// Draws a fresh link secret. Returns `(secret, digest)`; only the digest is persisted.
pub(super) fn generate_token() -> AppResult<(String, String)> {
    let mut secret = [0u8; TOKEN_BYTES];
    getrandom::fill(&mut secret).map_err(|error| {
        AppError::Internal(format!("operating system randomness unavailable: {error}"))
    })?;

    let secret = encode_hex(&secret);
    let digest = hash_token(&secret);
    Ok((secret, digest))
}

/// Lowercase hex SHA-256 digest of a link secret.
pub(super) fn hash_token(secret: &str) -> String {
    encode_hex(&Sha256::digest(secret.as_bytes()))
}

fn encode_hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut encoded, byte| {
        let _ = write!(encoded, "{byte:02x}");
        encoded
    })
}
