//! Error kinds, ported 1:1 from spec.md §7. The Orchestrator wraps every
//! downstream agent error with the request id and the phase it failed in
//! before handing it to `on_error`/`on_event(phase=*_error)` (spec.md §7
//! Propagation policy) — plaintext secrets never ride along, since each
//! variant only carries the already-scrubbed message from the owning
//! agent.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("input validation failed on field `{field}`: {message}")]
    InputValidation { field: String, message: String },

    #[error("user cancelled")]
    UserCancelled,

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("VRF verification failed: {0}")]
    VrfVerificationFailed(String),

    #[error("intent digest mismatch: ui={ui_digest}, signer={signer_digest}")]
    IntentDigestMismatch { ui_digest: String, signer_digest: String },

    #[error("nonce contention on ({account_id}, {public_key})")]
    NonceContention { account_id: String, public_key: String },

    #[error("chain RPC error after {attempts} attempts: {message}")]
    ChainRpcError { attempts: u32, message: String },

    #[error("relay unavailable: {0}")]
    RelayUnavailable(String),

    #[error("request timed out after {deadline_ms}ms")]
    TimeoutExpired { deadline_ms: u64 },

    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}

impl OrchestratorError {
    pub fn scrubbed(&self) -> String {
        kdm::error::scrub_error_message(&self.to_string())
    }

    /// The error-kind tag used in `on_event(phase={kind}_error)` (spec.md §7).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InputValidation { .. } => "input_validation",
            Self::UserCancelled => "user_cancelled",
            Self::DecryptionFailed(_) => "decryption_failed",
            Self::VrfVerificationFailed(_) => "vrf_verification_failed",
            Self::IntentDigestMismatch { .. } => "intent_digest_mismatch",
            Self::NonceContention { .. } => "nonce_contention",
            Self::ChainRpcError { .. } => "chain_rpc_error",
            Self::RelayUnavailable(_) => "relay_unavailable",
            Self::TimeoutExpired { .. } => "timeout_expired",
            Self::InternalInvariant(_) => "internal_invariant",
        }
    }

    /// Chain-RPC errors retry with bounded exponential backoff except for
    /// explicit client errors (spec.md §7 ChainRpcError).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ChainRpcError { .. } | Self::NonceContention { .. })
    }
}

impl From<signer_agent::SignerAgentError> for OrchestratorError {
    fn from(e: signer_agent::SignerAgentError) -> Self {
        match e {
            signer_agent::SignerAgentError::IntentDigestMismatch { expected, computed } => {
                OrchestratorError::IntentDigestMismatch {
                    ui_digest: expected,
                    signer_digest: computed,
                }
            }
            other => OrchestratorError::InternalInvariant(other.scrubbed()),
        }
    }
}

impl From<vrf_agent::VrfAgentError> for OrchestratorError {
    fn from(e: vrf_agent::VrfAgentError) -> Self {
        match e {
            vrf_agent::VrfAgentError::SessionExhausted(msg) => {
                OrchestratorError::InternalInvariant(format!("session exhausted: {msg}"))
            }
            vrf_agent::VrfAgentError::SessionExpired(msg) => {
                OrchestratorError::InternalInvariant(format!("session expired: {msg}"))
            }
            other => OrchestratorError::VrfVerificationFailed(other.scrubbed()),
        }
    }
}

impl From<confirmation_ui::ConfirmationUiError> for OrchestratorError {
    fn from(e: confirmation_ui::ConfirmationUiError) -> Self {
        match e {
            confirmation_ui::ConfirmationUiError::UserCancelled => OrchestratorError::UserCancelled,
            other => OrchestratorError::InputValidation {
                field: "transactions".to_string(),
                message: other.scrubbed(),
            },
        }
    }
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
