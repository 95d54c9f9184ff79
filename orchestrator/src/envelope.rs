//! Agent request/response envelope (spec.md §6).
//!
//! Grounded on `lib.rs` (`parse_worker_request_envelope`,
//! `WorkerRequestType` dispatch, `send_progress_message` /
//! `ProgressMessageType` / `ProgressStep`). The `postMessage`/`extern "C"`
//! JS bridge used to stream progress events back to the main thread is
//! replaced here by a `tokio::sync::mpsc::UnboundedSender<ProgressEvent>`
//! handed to each request, since this crate runs in a native process
//! rather than a wasm worker behind a message port.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum RequestType {
    DeriveNearKeypairAndEncrypt,
    RecoverKeypairFromPasskey,
    DeriveThresholdEd25519ClientVerifyingShare,
    SignTransactionsWithActions,
    SignDelegateAction,
    DecryptPrivateKeyWithPrf,
    ExtractCosePublicKey,
    SignTransactionWithKeyPair,
    SignNep413Message,
    RegisterDevice2WithDerivedKey,
    /// Internal-only: never issued directly by application code.
    SignAddKeyThresholdPublicKeyNoPrompt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRequest<T> {
    pub request_type: RequestType,
    pub payload: T,
    pub request_id: String,
    /// Optional deadline; on expiry the Orchestrator emits
    /// `TimeoutExpired`, releases nonce reservations, and asks the UI
    /// Agent to dismiss (spec.md §5 Cancellation & timeouts).
    pub deadline_ms: Option<u64>,
}

impl<T> AgentRequest<T> {
    pub fn new(request_type: RequestType, payload: T) -> Self {
        Self {
            request_type,
            payload,
            request_id: crate::progress::generate_request_id(),
            deadline_ms: None,
        }
    }

    pub fn with_deadline(mut self, deadline_ms: u64) -> Self {
        self.deadline_ms = Some(deadline_ms);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseType {
    Success,
    Failure,
    Progress,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse<T> {
    pub response_type: ResponseType,
    pub payload: T,
}

impl<T> AgentResponse<T> {
    pub fn success(payload: T) -> Self {
        Self {
            response_type: ResponseType::Success,
            payload,
        }
    }

    pub fn progress(payload: T) -> Self {
        Self {
            response_type: ResponseType::Progress,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_round_trips_through_json() {
        let req = AgentRequest::new(RequestType::SignTransactionsWithActions, serde_json::json!({"a": 1}));
        let json = serde_json::to_string(&req).unwrap();
        let back: AgentRequest<serde_json::Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.request_type, RequestType::SignTransactionsWithActions);
        assert_eq!(back.payload, serde_json::json!({"a": 1}));
    }
}
