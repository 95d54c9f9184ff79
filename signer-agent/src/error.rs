//! Error handling for the signer agent. Secret-bearing messages are scrubbed
//! through [`kdm::scrub_error_message`] before they leave the agent boundary,
//! the same redaction rules the key-derivation module applies.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignerAgentError {
    #[error("invalid action parameters: {0}")]
    InvalidAction(String),

    #[error("intent digest mismatch: expected {expected}, computed {computed}")]
    IntentDigestMismatch { expected: String, computed: String },

    #[error("invalid account id: {0}")]
    InvalidAccountId(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("transaction build failed: {0}")]
    TransactionBuild(String),

    #[error("transaction signing failed: {0}")]
    Signing(String),

    #[error("threshold signing error: {0}")]
    Threshold(String),

    #[error(transparent)]
    Kdm(#[from] kdm::error::KdmError),

    #[error("json error: {0}")]
    Json(String),
}

impl From<serde_json::Error> for SignerAgentError {
    fn from(e: serde_json::Error) -> Self {
        SignerAgentError::Json(e.to_string())
    }
}

impl SignerAgentError {
    /// The scrubbed rendering of this error, safe to hand back across a
    /// process or network boundary.
    pub fn scrubbed(&self) -> String {
        kdm::error::scrub_error_message(&self.to_string())
    }
}

pub type SignerResult<T> = Result<T, SignerAgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    /// P9: an error that embeds a JSON payload carrying a secret field must
    /// never surface that field's value once scrubbed.
    #[test]
    fn scrubbed_error_redacts_embedded_private_key_field() {
        let raw = r#"decryption failed for payload {"nearPrivateKey":"ed25519:top-secret-bytes","accountId":"alice.near"}"#;
        let err = SignerAgentError::InvalidAction(raw.to_string());
        let scrubbed = err.scrubbed();
        assert!(!scrubbed.contains("top-secret-bytes"));
        assert!(scrubbed.contains("alice.near"));
    }
}
