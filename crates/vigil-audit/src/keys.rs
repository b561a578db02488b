//! Runtime signing key for audit entries.

use std::fmt;

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;

/// Ed25519 key the engine signs audit entries with.
///
/// The secret half is zeroized on drop by `ed25519-dalek`.
pub struct RuntimeKey {
    signing_key: SigningKey,
}

impl RuntimeKey {
    /// Generate a new random key.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Create from 32 secret key bytes.
    #[must_use]
    pub fn from_secret_bytes(bytes: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(bytes),
        }
    }

    /// The public half, recorded in every entry.
    #[must_use]
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Short hex key ID (first 8 bytes of the public key).
    #[must_use]
    pub fn key_id_hex(&self) -> String {
        self.verifying_key()
            .as_bytes()
            .iter()
            .take(8)
            .map(|b| format!("{b:02x}"))
            .collect()
    }

    /// Sign a message.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }
}

impl fmt::Debug for RuntimeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeKey")
            .field("key_id", &self.key_id_hex())
            .finish_non_exhaustive()
    }
}

/// Verify `signature` over `message` with `key`.
pub(crate) fn verify(key: &VerifyingKey, message: &[u8], signature: &Signature) -> bool {
    key.verify(message, signature).is_ok()
}
