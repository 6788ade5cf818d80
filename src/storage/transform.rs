//! At-rest record transform
//!
//! A `RecordTransform` turns one record into an opaque string and back.
//! The store never sees keys; callers pass a transform built from their
//! own secret. Key storage and rotation are the caller's concern.
//!
//! `AesGcmTransform` uses AES-256-GCM with a fresh random nonce per
//! record. Sealing the same record twice yields different strings, and a
//! wrong secret or a modified payload fails to open instead of producing
//! garbage.
//!
//! Sealed format: `base64(nonce[12] || ciphertext || tag[16])`.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rand::RngCore;
use sha2::{Digest, Sha256};

use super::errors::{StorageError, StorageResult};
use crate::record::Record;

const NONCE_LEN: usize = 12;

/// Reversible per-record transform keyed by a caller secret.
pub trait RecordTransform {
    /// Seals a record into an opaque string
    fn seal(&self, record: &Record) -> StorageResult<String>;

    /// Opens a sealed string, reproducing the original record exactly
    fn open(&self, sealed: &str) -> StorageResult<Record>;

    /// Identifier recorded alongside sealed snapshots
    fn transform_id(&self) -> &str;
}

/// AES-256-GCM record transform.
pub struct AesGcmTransform {
    cipher: Aes256Gcm,
}

impl AesGcmTransform {
    /// Derives the key as SHA-256 of the secret.
    pub fn from_secret(secret: impl AsRef<[u8]>) -> StorageResult<Self> {
        let key = Sha256::digest(secret.as_ref());
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| StorageError::Transform(format!("invalid key: {}", e)))?;
        Ok(Self { cipher })
    }
}

impl RecordTransform for AesGcmTransform {
    fn seal(&self, record: &Record) -> StorageResult<String> {
        let plaintext =
            serde_json::to_vec(record).map_err(|e| StorageError::Serialize(e.to_string()))?;

        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_slice())
            .map_err(|_| StorageError::Transform("encryption failed".to_string()))?;

        let mut payload = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        payload.extend_from_slice(&nonce);
        payload.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(payload))
    }

    fn open(&self, sealed: &str) -> StorageResult<Record> {
        let payload = STANDARD
            .decode(sealed)
            .map_err(|e| StorageError::Transform(format!("invalid encoding: {}", e)))?;

        if payload.len() < NONCE_LEN {
            return Err(StorageError::Transform(format!(
                "sealed payload too short: {} bytes",
                payload.len()
            )));
        }
        let (nonce, ciphertext) = payload.split_at(NONCE_LEN);

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| {
                StorageError::Transform("authentication failed (wrong secret or tampered data)".to_string())
            })?;

        serde_json::from_slice(&plaintext)
            .map_err(|e| StorageError::Transform(format!("decrypted payload is not a record: {}", e)))
    }

    fn transform_id(&self) -> &str {
        "aes-256-gcm"
    }
}

/// A table whose records have been sealed one by one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedTable {
    /// Source table name
    pub table: String,
    /// Transform that produced the entries
    pub transform_id: String,
    /// Sealed records in table order
    pub entries: Vec<String>,
}
