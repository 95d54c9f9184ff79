//! `registration_credential_confirmation` (spec.md §4.2): drives the
//! secure registration confirmation UI from inside the VRF Agent, so the
//! decision never has to round-trip through a process boundary where PRF
//! output could leak in plaintext. Ported from
//! `handle_registration_credential_confirmation.rs`, with the
//! `wasm_bindgen`/`JsValue` bridge replaced by a native `RegistrationPrompt`
//! trait seam (no UI framework or DOM binding here — spec.md §1 Non-goals).
//!
//! Registration happens before any NEAR/VRF keypair is unlocked, so unlike
//! `confirmation_ui::DisplayedTransaction` there is no transaction batch to
//! summarize yet; the digest instead binds the account/device identity
//! being registered, mirroring the JS helper's `register:{account}:{device}`
//! convention so both sides agree on what was shown.

use confirmation_ui::types::ConfirmationConfig;

/// Request payload for VRF-driven registration credential confirmation.
#[derive(Clone, Debug)]
pub struct RegistrationCredentialConfirmationRequest {
    pub near_account_id: String,
    pub device_number: u32,
    pub contract_id: Option<String>,
    pub near_rpc_url: String,
    pub confirmation_config: ConfirmationConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RegistrationCredentialConfirmationResult {
    pub confirmed: bool,
    pub request_id: String,
    pub intent_digest: String,
}

/// The registration-time confirmation surface: shown before PRF output
/// exists, so it can only display account/device identity, not a
/// transaction intent. Native async-fn-in-trait, the same seam
/// `orchestrator::confirm::ConfirmationPrompt` and
/// `signer_agent::threshold::ThresholdTransport` use.
pub trait RegistrationPrompt {
    async fn await_registration_decision(
        &self,
        request: &RegistrationCredentialConfirmationRequest,
    ) -> bool;
}

fn registration_intent_digest(near_account_id: &str, device_number: u32) -> String {
    format!("register:{}:{}", near_account_id, device_number)
}

/// Runs the registration confirmation protocol and returns the decision
/// plus the digest that was displayed, for the caller to carry forward
/// into the registration transaction. Doesn't touch VRF key state itself
/// — it's a pure confirmation step that can run in `Locked` or `Unlocked`.
pub async fn registration_credential_confirmation<P: RegistrationPrompt>(
    request: RegistrationCredentialConfirmationRequest,
    request_id: String,
    prompt: &P,
) -> RegistrationCredentialConfirmationResult {
    let intent_digest = registration_intent_digest(&request.near_account_id, request.device_number);
    let confirmed = prompt.await_registration_decision(&request).await;

    RegistrationCredentialConfirmationResult {
        confirmed,
        request_id,
        intent_digest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysApprove;
    impl RegistrationPrompt for AlwaysApprove {
        async fn await_registration_decision(
            &self,
            _request: &RegistrationCredentialConfirmationRequest,
        ) -> bool {
            true
        }
    }

    struct AlwaysDecline;
    impl RegistrationPrompt for AlwaysDecline {
        async fn await_registration_decision(
            &self,
            _request: &RegistrationCredentialConfirmationRequest,
        ) -> bool {
            false
        }
    }

    fn sample_request() -> RegistrationCredentialConfirmationRequest {
        RegistrationCredentialConfirmationRequest {
            near_account_id: "alice.near".to_string(),
            device_number: 1,
            contract_id: Some("webauthn.near".to_string()),
            near_rpc_url: "https://rpc.mainnet.near.org".to_string(),
            confirmation_config: ConfirmationConfig::default(),
        }
    }

    #[tokio::test]
    async fn approval_carries_the_displayed_digest() {
        let result = registration_credential_confirmation(
            sample_request(),
            "req-1".to_string(),
            &AlwaysApprove,
        )
        .await;

        assert!(result.confirmed);
        assert_eq!(result.request_id, "req-1");
        assert_eq!(result.intent_digest, "register:alice.near:1");
    }

    #[tokio::test]
    async fn decline_still_reports_the_digest_that_was_shown() {
        let result = registration_credential_confirmation(
            sample_request(),
            "req-2".to_string(),
            &AlwaysDecline,
        )
        .await;

        assert!(!result.confirmed);
        assert_eq!(result.intent_digest, "register:alice.near:1");
    }

    #[test]
    fn digest_is_stable_per_account_and_device() {
        assert_eq!(
            registration_intent_digest("alice.near", 2),
            registration_intent_digest("alice.near", 2)
        );
        assert_ne!(
            registration_intent_digest("alice.near", 1),
            registration_intent_digest("alice.near", 2)
        );
    }
}
