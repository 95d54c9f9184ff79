//! The user-confirmation protocol (spec.md §4.4 steps 1-6, P5).
//!
//! No direct source analogue — the equivalent orchestration
//! lives in the original TypeScript `SignerClient`/`PasskeyManager` layer,
//! outside the retrieved Rust pack. Built from spec.md directly, wiring together
//! `confirmation_ui` (steps 2-4) and `signer_agent::handlers::sign` (step
//! 6), which is the structural reason those two crates compute the
//! intent digest through the same shared `kdm::encoders` function.

use confirmation_ui::types::{ConfirmationBehavior, ConfirmationUIMode};
use confirmation_ui::{ConfirmationConfig, DisplayedTransaction};

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::progress::{emit, ProgressPhase, ProgressSender};

/// Outcome of running the confirmation protocol: either the user
/// approved (carrying the digest to hand the Signer Agent) or declined.
pub enum ConfirmationOutcome {
    Approved { ui_intent_digest: Option<String> },
    Declined,
}

/// A user-facing prompt surface: shows the transactions and either waits
/// for an explicit click or lets an auto-proceed timer elapse. The real
/// implementation lives behind whatever trust boundary renders the UI
/// (an iframe, a native dialog); this trait is the seam the Orchestrator
/// calls through (spec.md §1 Non-goals: no UI framework specified here).
/// Matches `signer_agent::threshold::ThresholdTransport`'s use of native
/// async-fn-in-trait rather than pulling in `async-trait`.
pub trait ConfirmationPrompt {
    async fn await_user_decision(&self, transactions: &[DisplayedTransaction], normalized: &ConfirmationConfig) -> bool;
}

/// Runs spec.md §4.4's steps 1-6 and returns the digest (if any) to
/// include in the Signer request. Generic over `P` rather than
/// `&dyn ConfirmationPrompt`: native async-fn-in-trait isn't dyn-compatible,
/// same reason `ThresholdTransport` is taken as `<T: ThresholdTransport>`.
pub async fn run_confirmation_protocol<P: ConfirmationPrompt>(
    config: &ConfirmationConfig,
    transactions: &[DisplayedTransaction],
    prompt: &P,
    request_id: &str,
    progress: Option<&ProgressSender>,
) -> OrchestratorResult<ConfirmationOutcome> {
    let normalized = confirmation_ui::validate_and_normalize_confirmation_config(config);

    // Step 1: `skip` with an auto-proceeding policy forwards straight to
    // the Signer with no displayed digest.
    if normalized.ui_mode == ConfirmationUIMode::Skip {
        return Ok(ConfirmationOutcome::Approved { ui_intent_digest: None });
    }

    // Steps 2-3: show the intent, compute the binding digest over exactly
    // what was displayed.
    emit(progress, request_id, ProgressPhase::AwaitingConfirmation, "awaiting user confirmation");
    let ui_intent_digest = confirmation_ui::compute_ui_intent_digest(transactions)?;

    // Step 4: wait for the click, or let auto-proceed elapse.
    let approved = match normalized.behavior {
        ConfirmationBehavior::AutoProceed => true,
        ConfirmationBehavior::RequireClick => prompt.await_user_decision(transactions, &normalized).await,
    };

    if !approved {
        return Ok(ConfirmationOutcome::Declined);
    }

    Ok(ConfirmationOutcome::Approved {
        ui_intent_digest: Some(ui_intent_digest),
    })
}

/// Step 6: the Signer recomputes the digest from the raw transaction
/// inputs and rejects on mismatch. This helper just translates that
/// outcome into an `OrchestratorError` carrying both digests for
/// diagnosis (spec.md §7 IntentDigestMismatch).
pub fn require_matching_signer_digest(
    ui_intent_digest: &str,
    signer_intent_digest: &str,
) -> OrchestratorResult<()> {
    if ui_intent_digest != signer_intent_digest {
        return Err(OrchestratorError::IntentDigestMismatch {
            ui_digest: ui_intent_digest.to_string(),
            signer_digest: signer_intent_digest.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysApprove;
    impl ConfirmationPrompt for AlwaysApprove {
        async fn await_user_decision(&self, _transactions: &[DisplayedTransaction], _normalized: &ConfirmationConfig) -> bool {
            true
        }
    }

    struct AlwaysDecline;
    impl ConfirmationPrompt for AlwaysDecline {
        async fn await_user_decision(&self, _transactions: &[DisplayedTransaction], _normalized: &ConfirmationConfig) -> bool {
            false
        }
    }

    fn sample_tx() -> Vec<DisplayedTransaction> {
        vec![DisplayedTransaction {
            receiver_id: "bob.near".to_string(),
            actions: vec![serde_json::json!({"action_type": "Transfer", "deposit": "1"})],
        }]
    }

    #[tokio::test]
    async fn skip_mode_approves_without_a_digest() {
        let config = ConfirmationConfig {
            ui_mode: ConfirmationUIMode::Skip,
            ..ConfirmationConfig::default()
        };
        let outcome = run_confirmation_protocol(&config, &sample_tx(), &AlwaysApprove, "req-1", None)
            .await
            .unwrap();
        assert!(matches!(outcome, ConfirmationOutcome::Approved { ui_intent_digest: None }));
    }

    #[tokio::test]
    async fn require_click_with_decline_returns_declined() {
        let config = ConfirmationConfig {
            ui_mode: ConfirmationUIMode::Modal,
            behavior: ConfirmationBehavior::RequireClick,
            ..ConfirmationConfig::default()
        };
        let outcome = run_confirmation_protocol(&config, &sample_tx(), &AlwaysDecline, "req-2", None)
            .await
            .unwrap();
        assert!(matches!(outcome, ConfirmationOutcome::Declined));
    }

    #[tokio::test]
    async fn auto_proceed_approves_and_returns_a_digest() {
        let config = ConfirmationConfig {
            ui_mode: ConfirmationUIMode::Modal,
            behavior: ConfirmationBehavior::AutoProceed,
            auto_proceed_delay_ms: Some(0),
            theme: None,
        };
        let outcome = run_confirmation_protocol(&config, &sample_tx(), &AlwaysDecline, "req-3", None)
            .await
            .unwrap();
        match outcome {
            ConfirmationOutcome::Approved { ui_intent_digest } => assert!(ui_intent_digest.is_some()),
            ConfirmationOutcome::Declined => panic!("auto-proceed must not decline"),
        }
    }

    #[test]
    fn mismatched_digests_produce_intent_digest_mismatch() {
        let err = require_matching_signer_digest("a".repeat(64).as_str(), "b".repeat(64).as_str()).unwrap_err();
        assert!(matches!(err, OrchestratorError::IntentDigestMismatch { .. }));
    }

    #[test]
    fn matching_digests_are_accepted() {
        let digest = "c".repeat(64);
        assert!(require_matching_signer_digest(&digest, &digest).is_ok());
    }
}
