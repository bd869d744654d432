//! Protection for credentials cached in config and settings files.
//!
//! Protected format: `enc:<nonce_hex>:<ciphertext_base64>`.
//! Values without the `enc:` prefix pass through unchanged.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;
use std::fmt;
use std::path::Path;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CloudSaveError, Result};

const PREFIX: &str = "enc:";

/// Local 256-bit key, stored hex-encoded in a key file.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; 32]);

impl SecretKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Read the key file, creating it with a fresh key if it is missing.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let bytes = hex::decode(content.trim())
                .map_err(|e| CloudSaveError::Secret(format!("invalid key file: {e}")))?;
            let bytes: [u8; 32] = bytes.try_into().map_err(|_| {
                CloudSaveError::Secret("invalid key file: expected 32 bytes".to_string())
            })?;
            return Ok(Self(bytes));
        }

        let key = Self::generate();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, hex::encode(key.0))?;
        tracing::info!("Created key file {}", path.display());
        Ok(key)
    }

    fn cipher(&self) -> Result<Aes256Gcm> {
        Aes256Gcm::new_from_slice(&self.0)
            .map_err(|e| CloudSaveError::Secret(format!("AES key error: {e}")))
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey([REDACTED])")
    }
}

pub fn is_protected(value: &str) -> bool {
    value.starts_with(PREFIX)
}

/// Encrypt a value for storage.
pub fn protect(plaintext: &str, key: &SecretKey) -> Result<String> {
    let mut nonce_bytes = [0u8; 12];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);

    let ciphertext = key
        .cipher()?
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
        .map_err(|e| CloudSaveError::Secret(format!("encryption failed: {e}")))?;

    Ok(format!(
        "{PREFIX}{}:{}",
        hex::encode(nonce_bytes),
        STANDARD.encode(ciphertext)
    ))
}

/// Decrypt a stored value; plaintext values are returned as-is.
pub fn unprotect(value: &str, key: &SecretKey) -> Result<String> {
    let Some(body) = value.strip_prefix(PREFIX) else {
        return Ok(value.to_string());
    };

    let (nonce_hex, ciphertext_b64) = body
        .split_once(':')
        .ok_or_else(|| CloudSaveError::Secret("invalid protected value format".to_string()))?;

    let nonce_bytes = hex::decode(nonce_hex)
        .map_err(|e| CloudSaveError::Secret(format!("invalid nonce: {e}")))?;
    if nonce_bytes.len() != 12 {
        return Err(CloudSaveError::Secret(format!(
            "invalid nonce length: expected 12, got {}",
            nonce_bytes.len()
        )));
    }
    let ciphertext = STANDARD
        .decode(ciphertext_b64)
        .map_err(|e| CloudSaveError::Secret(format!("invalid ciphertext: {e}")))?;

    let plaintext = key
        .cipher()?
        .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())
        .map_err(|e| CloudSaveError::Secret(format!("decryption failed: {e}")))?;

    String::from_utf8(plaintext).map_err(|e| CloudSaveError::Secret(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn roundtrip_protect_unprotect() {
        let key = SecretKey::from_bytes([42u8; 32]);
        let secret = "my-super-secret-access-key";

        let protected = protect(secret, &key).unwrap();
        assert!(is_protected(&protected));
        assert!(!protected.contains(secret));

        assert_eq!(unprotect(&protected, &key).unwrap(), secret);
    }

    #[test]
    fn plaintext_passthrough() {
        let key = SecretKey::from_bytes([0u8; 32]);
        assert_eq!(unprotect("just-a-plain-value", &key).unwrap(), "just-a-plain-value");
    }

    #[test]
    fn wrong_key_fails() {
        let protected = protect("token", &SecretKey::from_bytes([1u8; 32])).unwrap();
        assert!(unprotect(&protected, &SecretKey::from_bytes([2u8; 32])).is_err());
    }

    #[test]
    fn key_file_is_created_once() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("keys/secret.key");

        let first = SecretKey::load_or_create(&path).unwrap();
        let protected = protect("token", &first).unwrap();

        let second = SecretKey::load_or_create(&path).unwrap();
        assert_eq!(unprotect(&protected, &second).unwrap(), "token");
    }

    #[test]
    fn debug_is_redacted() {
        let key = SecretKey::from_bytes([0x42; 32]);
        assert_eq!(format!("{key:?}"), "SecretKey([REDACTED])");
    }
}
