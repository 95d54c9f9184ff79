//! Error surface for the VRF agent.
//!
//! Reconstructed from call-site usage: the `wasm_vrf_worker` crate
//! declares `mod errors;` but the module itself was not present in the
//! retrieved pack, so the variant list below is assembled from every
//! constructor/variant observed in `manager.rs` and the `handlers/` call
//! sites (`VrfWorkerError::NoVrfKeypair`, `::VrfNotUnlocked`,
//! `::HkdfDerivationFailed`, `::public_key_mismatch`,
//! `::empty_prf_output`, `::invalid_format`, `::InvalidIvLength`,
//! `::AesGcmError`, `::SerializationError`), with the session-bound
//! variants this crate's own session map needs (P7) added alongside them.

pub type VrfResult<T> = Result<T, VrfAgentError>;

#[derive(Debug, thiserror::Error)]
pub enum HkdfError {
    #[error("VRF seed derivation failed")]
    VrfSeedDerivationFailed,
    #[error("key derivation failed")]
    KeyDerivationFailed,
}

#[derive(Debug, thiserror::Error)]
pub enum AesError {
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),
    #[error("IV generation failed: {0}")]
    IvGenerationFailed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error("VRF public key serialization failed: {0}")]
    VrfPublicKeySerialization(String),
    #[error("VRF keypair serialization failed: {0}")]
    VrfKeypairSerialization(String),
    #[error("VRF keypair data serialization failed: {0}")]
    KeypairDataSerialization(String),
    #[error("VRF keypair data deserialization failed: {0}")]
    KeypairDataDeserialization(String),
    #[error("VRF keypair deserialization failed: {0}")]
    VrfKeypairDeserialization(String),
    #[error("base64 error: {0}")]
    Base64Error(String),
}

#[derive(Debug, thiserror::Error)]
pub enum VrfAgentError {
    #[error("no VRF keypair in memory")]
    NoVrfKeypair,
    #[error("VRF keypair is locked")]
    VrfNotUnlocked,
    #[error("HKDF derivation failed: {0}")]
    HkdfDerivationFailed(#[from] HkdfError),
    #[error("invalid IV length: expected {expected}, got {actual}")]
    InvalidIvLength { expected: usize, actual: usize },
    #[error("AEAD operation failed: {0}")]
    AesGcmError(#[from] AesError),
    #[error("serialization error: {0}")]
    SerializationError(#[from] SerializationError),
    #[error("VRF public key mismatch: expected {expected}..., got {actual}...")]
    PublicKeyMismatch { expected: String, actual: String },
    #[error("PRF output must not be empty")]
    EmptyPrfOutput,
    #[error("invalid format: {0}")]
    InvalidFormat(String),
    #[error("session not found: {0}")]
    SessionNotFound(String),
    #[error("session exhausted: {0}")]
    SessionExhausted(String),
    #[error("session expired: {0}")]
    SessionExpired(String),
    #[error("Shamir3Pass error: {0}")]
    Shamir3Pass(String),
    #[error("bincode error: {0}")]
    Bincode(String),
}

impl VrfAgentError {
    pub fn public_key_mismatch(expected: &str, actual: &str) -> Self {
        let trunc = |s: &str| s.chars().take(crate::config::DISPLAY_TRUNCATE_LENGTH).collect();
        VrfAgentError::PublicKeyMismatch {
            expected: trunc(expected),
            actual: trunc(actual),
        }
    }

    pub fn empty_prf_output() -> Self {
        VrfAgentError::EmptyPrfOutput
    }

    pub fn invalid_format(msg: &str) -> Self {
        VrfAgentError::InvalidFormat(msg.to_string())
    }

    /// Scrub the message before it crosses the agent boundary (P9).
    pub fn scrubbed(&self) -> String {
        kdm::scrub_error_message(&self.to_string())
    }
}

impl From<bincode::Error> for VrfAgentError {
    fn from(err: bincode::Error) -> Self {
        VrfAgentError::Bincode(err.to_string())
    }
}
