//! Progress event stream, ported from
//! `send_progress_message`/`ProgressMessageType`/`ProgressStep`, with the
//! `postMessage` JS bridge replaced by a `tokio::sync::mpsc` channel
//! (spec.md §6: "Progress responses may be emitted multiple times before
//! the terminal Success/Failure").

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressPhase {
    Started,
    AwaitingConfirmation,
    DerivingSession,
    VerifyingVrf,
    Signing,
    BroadcastingTransaction,
    Done,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub request_id: String,
    pub phase: ProgressPhase,
    pub message: String,
}

pub type ProgressSender = mpsc::UnboundedSender<ProgressEvent>;
pub type ProgressReceiver = mpsc::UnboundedReceiver<ProgressEvent>;

pub fn progress_channel() -> (ProgressSender, ProgressReceiver) {
    mpsc::unbounded_channel()
}

pub fn emit(tx: Option<&ProgressSender>, request_id: &str, phase: ProgressPhase, message: impl Into<String>) {
    if let Some(tx) = tx {
        let _ = tx.send(ProgressEvent {
            request_id: request_id.to_string(),
            phase,
            message: message.into(),
        });
    }
}

/// A unique-per-process request id: millisecond timestamp plus a
/// monotonic counter, matching `confirmation_ui::generate_request_id`'s
/// native branch (this crate has no wasm32 target either).
pub fn generate_request_id() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}", millis, n)
}
