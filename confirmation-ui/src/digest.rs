//! Canonical intent digest: SHA-256 of the recursively key-alphabetized
//! JSON encoding of the displayed `(receiverId, actions)` list, so the
//! digest is independent of field insertion order between this agent and
//! whatever later re-encodes the same structure (spec.md §4.4 step 3).
//! Ported from `compute_intent_digest_from_js_inputs`, with
//! the alphabetize+hash core moved into `kdm::encoders` so the Signer Agent
//! recomputes the exact same digest rather than a look-alike one.

use crate::error::{ConfirmationUiError, ConfirmationUiResult};
use crate::types::DisplayedTransaction;

/// `ui_intent_digest = SHA-256(canonical_encoding(displayed_intent))`,
/// hex-encoded per spec.md §3's `IntentDigest` data model entry.
pub fn compute_ui_intent_digest(transactions: &[DisplayedTransaction]) -> ConfirmationUiResult<String> {
    if transactions.is_empty() {
        return Err(ConfirmationUiError::EmptyBatch);
    }

    let array = serde_json::to_value(transactions)?;
    let digest = kdm::encoders::compute_intent_digest_hex(&array);
    Ok(kdm::encoders::hex_encode(&digest))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(receiver: &str) -> DisplayedTransaction {
        DisplayedTransaction {
            receiver_id: receiver.to_string(),
            actions: vec![serde_json::json!({"action_type": "Transfer", "deposit": "1"})],
        }
    }

    #[test]
    fn digest_is_deterministic_for_same_intent() {
        let d1 = compute_ui_intent_digest(&[tx("bob.near")]).unwrap();
        let d2 = compute_ui_intent_digest(&[tx("bob.near")]).unwrap();
        assert_eq!(d1, d2);
    }

    #[test]
    fn digest_changes_when_an_amount_changes() {
        let d1 = compute_ui_intent_digest(&[tx("bob.near")]).unwrap();
        let mut changed = tx("bob.near");
        changed.actions[0]["deposit"] = serde_json::json!("2");
        let d2 = compute_ui_intent_digest(&[changed]).unwrap();
        assert_ne!(d1, d2);
    }

    #[test]
    fn digest_rejects_empty_batch() {
        assert!(matches!(
            compute_ui_intent_digest(&[]),
            Err(ConfirmationUiError::EmptyBatch)
        ));
    }

    #[test]
    fn digest_is_order_independent_across_key_insertion_order() {
        let a = DisplayedTransaction {
            receiver_id: "bob.near".to_string(),
            actions: vec![serde_json::json!({"action_type": "Transfer", "deposit": "1"})],
        };
        let b = DisplayedTransaction {
            receiver_id: "bob.near".to_string(),
            actions: vec![serde_json::json!({"deposit": "1", "action_type": "Transfer"})],
        };
        assert_eq!(
            compute_ui_intent_digest(&[a]).unwrap(),
            compute_ui_intent_digest(&[b]).unwrap()
        );
    }
}
