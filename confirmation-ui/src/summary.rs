//! Human-readable transaction summary, ported from
//! `create_transaction_summary_from_parsed`. Works directly over the JSON
//! action shape (`{"action_type": ..., ...}`, matching `signer_agent::ActionParams`'s
//! serde tagging) rather than a shared Rust enum, since this agent has no
//! dependency on the signer agent's action types (spec.md §1 Non-goals: no
//! UI framework or cross-agent type coupling).

use std::collections::HashSet;

use crate::error::{ConfirmationUiError, ConfirmationUiResult};
use crate::types::{ConfirmationSummaryAction, DisplayedTransaction};

fn action_amount(action: &serde_json::Value) -> u128 {
    let action_type = action.get("action_type").and_then(|v| v.as_str()).unwrap_or("");
    let amount_field = match action_type {
        "FunctionCall" | "Transfer" => "deposit",
        "Stake" => "stake",
        _ => return 0,
    };
    action
        .get(amount_field)
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<u128>().ok())
        .unwrap_or(0)
}

pub fn create_transaction_summary(
    transactions: &[DisplayedTransaction],
) -> ConfirmationUiResult<ConfirmationSummaryAction> {
    if transactions.is_empty() {
        return Err(ConfirmationUiError::EmptyBatch);
    }

    let mut total_deposit: u128 = 0;
    let mut unique_receivers: HashSet<&str> = HashSet::new();

    for tx in transactions {
        unique_receivers.insert(tx.receiver_id.as_str());
        for action in &tx.actions {
            total_deposit += action_amount(action);
        }
    }

    let to = match unique_receivers.len() {
        1 => (*unique_receivers.iter().next().unwrap()).to_string(),
        n => format!("{n} recipients"),
    };

    Ok(ConfirmationSummaryAction {
        to,
        total_amount: total_deposit.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_deposits_across_a_single_receiver() {
        let txs = vec![DisplayedTransaction {
            receiver_id: "bob.near".to_string(),
            actions: vec![
                serde_json::json!({"action_type": "Transfer", "deposit": "100"}),
                serde_json::json!({"action_type": "Transfer", "deposit": "50"}),
            ],
        }];
        let summary = create_transaction_summary(&txs).unwrap();
        assert_eq!(summary.to, "bob.near");
        assert_eq!(summary.total_amount, "150");
    }

    #[test]
    fn reports_recipient_count_when_multiple_receivers() {
        let txs = vec![
            DisplayedTransaction {
                receiver_id: "bob.near".to_string(),
                actions: vec![serde_json::json!({"action_type": "Transfer", "deposit": "1"})],
            },
            DisplayedTransaction {
                receiver_id: "carol.near".to_string(),
                actions: vec![serde_json::json!({"action_type": "Transfer", "deposit": "1"})],
            },
        ];
        let summary = create_transaction_summary(&txs).unwrap();
        assert_eq!(summary.to, "2 recipients");
        assert_eq!(summary.total_amount, "2");
    }

    #[test]
    fn non_value_actions_contribute_nothing() {
        let txs = vec![DisplayedTransaction {
            receiver_id: "bob.near".to_string(),
            actions: vec![serde_json::json!({"action_type": "AddKey", "public_key": "ed25519:x"})],
        }];
        let summary = create_transaction_summary(&txs).unwrap();
        assert_eq!(summary.total_amount, "0");
    }

    #[test]
    fn rejects_empty_batch() {
        assert!(matches!(
            create_transaction_summary(&[]),
            Err(ConfirmationUiError::EmptyBatch)
        ));
    }
}
