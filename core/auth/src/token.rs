// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! HMAC-SHA256 request tokens.
//!
//! A token is the base64url (no padding) encoded MAC of
//! `service#method#timestamp` keyed with the secret of the calling app.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::errors::SecurityError;

type HmacSha256 = Hmac<Sha256>;

/// Minimum length of an app secret.
pub const MIN_SECRET_LEN: usize = 16;

fn new_mac(secret: &str) -> Result<HmacSha256, SecurityError> {
    HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| SecurityError::InvalidSecret {
        app: String::new(),
        reason: e.to_string(),
    })
}

/// Message covered by the token of a call.
pub fn token_data(service_name: &str, method_name: &str, timestamp: i64) -> String {
    format!("{}#{}#{}", service_name, method_name, timestamp)
}

pub fn encrypt(data: &str, secret: &str) -> Result<String, SecurityError> {
    let mut mac = new_mac(secret)?;
    mac.update(data.as_bytes());
    Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
}

/// Token an invoker attaches to a call issued at `timestamp` (seconds).
pub fn generate(
    secret: &str,
    service_name: &str,
    method_name: &str,
    timestamp: i64,
) -> Result<String, SecurityError> {
    encrypt(&token_data(service_name, method_name, timestamp), secret)
}

/// Check `token` against the MAC of `data` in constant time.
pub fn verify(data: &str, secret: &str, token: &str) -> Result<bool, SecurityError> {
    let Ok(expected) = URL_SAFE_NO_PAD.decode(token.as_bytes()) else {
        return Ok(false);
    };
    let mut mac = new_mac(secret)?;
    mac.update(data.as_bytes());
    Ok(mac.verify_slice(&expected).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef";

    #[test]
    fn test_encrypt_is_deterministic() {
        let a = encrypt("svc#echo#1700000000", SECRET).unwrap();
        let b = encrypt("svc#echo#1700000000", SECRET).unwrap();
        assert_eq!(a, b);
        // 32 bytes of mac, unpadded
        assert_eq!(a.len(), 43);
        assert!(!a.contains('='));
        assert_ne!(a, encrypt("svc#echo#1700000001", SECRET).unwrap());
        assert_ne!(a, encrypt("svc#echo#1700000000", "0123456789abcdeg").unwrap());
    }

    #[test]
    fn test_generate_and_verify() {
        let token = generate(SECRET, "svc", "echo", 1_700_000_000).unwrap();
        let data = token_data("svc", "echo", 1_700_000_000);
        assert!(verify(&data, SECRET, &token).unwrap());
        assert!(!verify(&data, SECRET, "not/base64!").unwrap());
        assert!(!verify(&token_data("svc", "echo", 1), SECRET, &token).unwrap());
    }
}
