//! Snapshot and WAL payload encoding.
//!
//! A payload is either plain UTF-8 JSON or, when the store is keyed, the
//! JSON rendering of an [`Envelope`]. The same codec covers the snapshot
//! file and individual WAL payloads so an encrypted store never writes a
//! plaintext mutation anywhere on disk.

use crate::crypto::{Cipher, EncryptionKey, Envelope};
use crate::error::{EngineError, EngineResult};
use serde_json::Value;

/// Encodes and decodes disk payloads according to the store configuration.
#[derive(Debug)]
pub struct Codec {
    indented: bool,
    cipher: Option<Cipher>,
}

impl Codec {
    /// Creates a codec. `key` enables envelope encryption; `indented`
    /// selects two-space pretty printing for plaintext snapshots.
    #[must_use]
    pub fn new(key: Option<&EncryptionKey>, indented: bool) -> Self {
        Self {
            indented,
            cipher: key.map(Cipher::new),
        }
    }

    /// Encodes the snapshot body for `doc`.
    ///
    /// Plaintext snapshots honor the `indented` setting; envelopes are
    /// always compact.
    pub fn encode_snapshot(&self, doc: &Value) -> EngineResult<Vec<u8>> {
        match &self.cipher {
            Some(cipher) => {
                let plain = to_json(doc, false)?;
                let envelope = cipher.encrypt(&plain)?;
                serde_json::to_vec(&envelope)
                    .map_err(|e| EngineError::encryption_failed(e.to_string()))
            }
            None => to_json(doc, self.indented),
        }
    }

    /// Decodes snapshot bytes back into a document.
    ///
    /// # Errors
    ///
    /// `SyntaxInvalid` for unparseable plaintext, `DecryptionFailed` for a
    /// malformed or unauthentic envelope.
    pub fn decode_snapshot(&self, bytes: &[u8]) -> EngineResult<Value> {
        match &self.cipher {
            Some(cipher) => {
                let envelope: Envelope = serde_json::from_slice(bytes).map_err(|_| {
                    EngineError::decryption_failed("snapshot is not a valid envelope")
                })?;
                let plain = cipher.decrypt(&envelope)?;
                serde_json::from_slice(&plain).map_err(|e| {
                    EngineError::decryption_failed(format!("invalid JSON after decryption: {e}"))
                })
            }
            None => serde_json::from_slice(bytes)
                .map_err(|e| EngineError::syntax_invalid(e.to_string())),
        }
    }

    /// Encodes a WAL payload (always compact).
    pub fn encode_wal_payload<T: serde::Serialize>(&self, record: &T) -> EngineResult<Vec<u8>> {
        let plain = serde_json::to_vec(record)
            .map_err(|e| EngineError::durability_failed(e.to_string()))?;
        match &self.cipher {
            Some(cipher) => {
                let envelope = cipher.encrypt(&plain)?;
                serde_json::to_vec(&envelope)
                    .map_err(|e| EngineError::encryption_failed(e.to_string()))
            }
            None => Ok(plain),
        }
    }

    /// Decodes a WAL payload.
    pub fn decode_wal_payload<T: serde::de::DeserializeOwned>(
        &self,
        bytes: &[u8],
    ) -> EngineResult<T> {
        let plain = match &self.cipher {
            Some(cipher) => {
                let envelope: Envelope = serde_json::from_slice(bytes).map_err(|_| {
                    EngineError::decryption_failed("WAL payload is not a valid envelope")
                })?;
                cipher.decrypt(&envelope)?
            }
            None => bytes.to_vec(),
        };
        serde_json::from_slice(&plain).map_err(|e| EngineError::syntax_invalid(e.to_string()))
    }
}

fn to_json(doc: &Value, indented: bool) -> EngineResult<Vec<u8>> {
    let result = if indented {
        serde_json::to_vec_pretty(doc)
    } else {
        serde_json::to_vec(doc)
    };
    result.map_err(|e| EngineError::syntax_invalid(e.to_string()))
}
