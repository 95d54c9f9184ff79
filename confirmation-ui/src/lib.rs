//! Confirmation UI Agent: owns the user-facing consent step of the
//! threshold-signing pipeline. It normalizes the per-request confirmation
//! policy, renders a human-readable transaction summary, and computes the
//! intent digest the user actually saw so the Signer Agent can refuse to
//! sign anything the user didn't approve (spec.md §4.4, §8 P5).
//!
//! This agent never touches key material, never talks to the relayer, and
//! never parses NEAR transaction binaries — all of that stays with the
//! Signer Agent and the Orchestrator (spec.md §1 Non-goals).

pub mod config;
pub mod digest;
pub mod error;
pub mod normalize;
pub mod summary;
pub mod types;

pub use digest::compute_ui_intent_digest;
pub use error::{ConfirmationUiError, ConfirmationUiResult};
pub use normalize::{generate_request_id, validate_and_normalize_confirmation_config};
pub use summary::create_transaction_summary;
pub use types::{
    ConfirmationBehavior, ConfirmationConfig, ConfirmationSummaryAction, ConfirmationUIMode,
    DisplayedTransaction,
};
