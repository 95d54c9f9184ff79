//! End-to-end scenario tests (spec.md §8) that exercise the full wiring
//! across `confirmation_ui`, `signer_agent`, and this crate's `error`/
//! `confirm` modules rather than any one crate in isolation.

#[cfg(test)]
mod tests {
    use confirmation_ui::DisplayedTransaction;
    use ed25519_dalek::SigningKey;
    use signer_agent::handlers::sign::{handle_sign_transactions_with_actions, SignTransactionsRequest, TxInput};
    use signer_agent::{ActionParams, SignerAgentError};

    use crate::error::OrchestratorError;

    fn test_signing_key() -> String {
        let seed = [7u8; 32];
        let signing_key = SigningKey::from_bytes(&seed);
        let mut bytes = signing_key.to_bytes().to_vec();
        bytes.extend_from_slice(signing_key.verifying_key().as_bytes());
        format!("ed25519:{}", bs58::encode(bytes).into_string())
    }

    /// S1: an honest batch, UI digest and Signer digest computed over the
    /// same inputs, signs successfully with no digest mismatch.
    #[test]
    fn s1_register_and_sign_transfer_succeeds_with_matching_digest() {
        let displayed = vec![DisplayedTransaction {
            receiver_id: "bob.testnet".to_string(),
            actions: vec![serde_json::json!({"action_type": "Transfer", "deposit": "1000000000000000000000000"})],
        }];
        let ui_digest = confirmation_ui::compute_ui_intent_digest(&displayed).unwrap();

        let request = SignTransactionsRequest {
            signer_id: "alice.testnet".to_string(),
            block_hash_b58: bs58::encode([0xAAu8; 32]).into_string(),
            near_private_key: test_signing_key(),
            transactions: vec![TxInput {
                receiver_id: "bob.testnet".to_string(),
                actions: vec![ActionParams::Transfer {
                    deposit: "1000000000000000000000000".to_string(),
                }],
                nonce: 43,
            }],
            expected_intent_digest_hex: Some(ui_digest),
        };

        let outputs = handle_sign_transactions_with_actions(request).unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].receiver_id, "bob.testnet");
    }

    /// S2: the UI Agent displayed amount `1`, but the Signer is asked to
    /// sign the real amount. The digests must diverge and the Signer must
    /// reject with `IntentDigestMismatch`, which the Orchestrator's `From`
    /// impl turns into `OrchestratorError::IntentDigestMismatch` carrying
    /// both digests.
    #[test]
    fn s2_intent_tamper_is_rejected_with_both_digests() {
        let displayed = vec![DisplayedTransaction {
            receiver_id: "bob.testnet".to_string(),
            actions: vec![serde_json::json!({"action_type": "Transfer", "deposit": "1"})],
        }];
        let ui_digest = confirmation_ui::compute_ui_intent_digest(&displayed).unwrap();

        let request = SignTransactionsRequest {
            signer_id: "alice.testnet".to_string(),
            block_hash_b58: bs58::encode([0xAAu8; 32]).into_string(),
            near_private_key: test_signing_key(),
            transactions: vec![TxInput {
                receiver_id: "bob.testnet".to_string(),
                actions: vec![ActionParams::Transfer {
                    deposit: "1000000000000000000000000".to_string(),
                }],
                nonce: 43,
            }],
            expected_intent_digest_hex: Some(ui_digest.clone()),
        };

        let err = handle_sign_transactions_with_actions(request).unwrap_err();
        match &err {
            SignerAgentError::IntentDigestMismatch { expected, computed } => {
                assert_eq!(expected, &ui_digest);
                assert_ne!(computed, &ui_digest);
            }
            other => panic!("expected IntentDigestMismatch, got {other:?}"),
        }

        let orchestrator_err: OrchestratorError = err.into();
        assert!(matches!(orchestrator_err, OrchestratorError::IntentDigestMismatch { .. }));
        assert_eq!(orchestrator_err.kind(), "intent_digest_mismatch");
    }
}
