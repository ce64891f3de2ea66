//! At-rest encryption: AES-256-GCM with a hex JSON envelope.

use crate::error::{EngineError, EngineResult};
use aes_gcm::{
    aead::{generic_array::GenericArray, Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of the AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;
/// Size of the GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;
/// Size of the GCM authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// An AES-256 key, zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey {
    bytes: [u8; KEY_SIZE],
}

impl EncryptionKey {
    /// Creates a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Fails with [`EngineError::BadKeyLength`] unless exactly 32 bytes
    /// are supplied.
    pub fn from_bytes(bytes: &[u8]) -> EngineResult<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(EngineError::BadKeyLength {
                expected: KEY_SIZE,
                actual: bytes.len(),
            });
        }
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(bytes);
        Ok(Self { bytes: key })
    }

    /// Generates a random key.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// The on-disk wrapper of an encrypted payload.
///
/// All three fields are lowercase hex: a 12-byte nonce, the 16-byte GCM
/// tag, and the ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Hex-encoded nonce.
    pub iv: String,
    /// Hex-encoded authentication tag.
    pub tag: String,
    /// Hex-encoded ciphertext.
    pub content: String,
}

/// Encrypts and decrypts envelopes with a fixed key.
pub struct Cipher {
    inner: Aes256Gcm,
}

impl Cipher {
    /// Creates a cipher for `key`.
    #[must_use]
    pub fn new(key: &EncryptionKey) -> Self {
        let key_array = GenericArray::from_slice(key.as_bytes());
        Self {
            inner: Aes256Gcm::new(key_array),
        }
    }

    /// Encrypts `plaintext` under a fresh random nonce.
    pub fn encrypt(&self, plaintext: &[u8]) -> EngineResult<Envelope> {
        let mut iv = [0u8; NONCE_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut iv);
        let nonce = Nonce::from_slice(&iv);

        let sealed = self
            .inner
            .encrypt(nonce, plaintext)
            .map_err(|_| EngineError::encryption_failed("AES-GCM encryption error"))?;

        // The aead crate appends the tag to the ciphertext; the envelope
        // stores them separately.
        let split = sealed.len() - TAG_SIZE;
        Ok(Envelope {
            iv: hex::encode(iv),
            tag: hex::encode(&sealed[split..]),
            content: hex::encode(&sealed[..split]),
        })
    }

    /// Authenticates and decrypts `envelope`.
    ///
    /// # Errors
    ///
    /// Fails with [`EngineError::DecryptionFailed`] on malformed hex, a
    /// wrong-size nonce, or any tag mismatch. Callers must treat the
    /// store as unusable on this error.
    pub fn decrypt(&self, envelope: &Envelope) -> EngineResult<Vec<u8>> {
        let iv = hex::decode(&envelope.iv)
            .map_err(|_| EngineError::decryption_failed("invalid iv hex"))?;
        let tag = hex::decode(&envelope.tag)
            .map_err(|_| EngineError::decryption_failed("invalid tag hex"))?;
        let mut sealed = hex::decode(&envelope.content)
            .map_err(|_| EngineError::decryption_failed("invalid content hex"))?;

        if iv.len() != NONCE_SIZE {
            return Err(EngineError::decryption_failed("nonce must be 12 bytes"));
        }
        if tag.len() != TAG_SIZE {
            return Err(EngineError::decryption_failed("tag must be 16 bytes"));
        }

        sealed.extend_from_slice(&tag);
        let nonce = Nonce::from_slice(&iv);
        self.inner
            .decrypt(nonce, sealed.as_ref())
            .map_err(|_| EngineError::decryption_failed("authentication failed"))
    }
}

impl std::fmt::Debug for Cipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cipher").field("inner", &"Aes256Gcm").finish()
    }
}
