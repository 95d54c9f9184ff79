//! Core transaction, delegate-action, and NEP-413 message signing.
//!
//! `sign_transactions_with_actions` is the core signing RPC (spec.md §4.3
//! item 3): computes `intent_digest` from the canonical transaction binary,
//! rejects on mismatch against a caller-supplied digest, decrypts the NEAR
//! key just long enough to sign, then zeroizes it. `sign_delegate_action`
//! and `sign_nep413_message` are grounded on the same upstream handlers'
//! hash-then-sign shape.

use borsh::BorshSerialize;
use ed25519_dalek::{Signer, SigningKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::config::{DEFAULT_DELEGATE_MAX_BLOCK_HEIGHT_DELTA, NEP413_DOMAIN_TAG};
use crate::error::{SignerAgentError, SignerResult};
use crate::transaction::{build_actions_from_params, build_transaction_with_actions, sign_transaction};
use crate::types::*;
use crate::ActionParams;

/// Recompute the intent digest from the same `(receiverId, actions)` shape
/// the Confirmation UI Agent displayed, using the shared canonical-JSON
/// algorithm in `kdm::encoders` so the two sides produce byte-identical
/// digests rather than merely similar ones (spec.md §4.4 step 3, P5).
pub fn compute_intent_digest(transactions: &[TxInput]) -> SignerResult<[u8; 32]> {
    let displayed: Vec<serde_json::Value> = transactions
        .iter()
        .map(|tx| {
            serde_json::json!({
                "receiverId": tx.receiver_id,
                "actions": tx.actions,
            })
        })
        .collect();
    let payload = serde_json::to_value(displayed)?;
    Ok(kdm::encoders::compute_intent_digest_hex(&payload))
}

fn parse_signing_key(near_private_key: &str) -> SignerResult<SigningKey> {
    let stripped = near_private_key
        .strip_prefix("ed25519:")
        .ok_or_else(|| SignerAgentError::InvalidPrivateKey("must start with ed25519:".to_string()))?;
    let bytes = bs58::decode(stripped)
        .into_vec()
        .map_err(|e| SignerAgentError::InvalidPrivateKey(format!("bs58 decode failed: {e}")))?;
    if bytes.len() != 64 {
        return Err(SignerAgentError::InvalidPrivateKey(format!(
            "expected 64 bytes, got {}",
            bytes.len()
        )));
    }
    let seed: [u8; 32] = bytes[0..32]
        .try_into()
        .map_err(|_| SignerAgentError::InvalidPrivateKey("failed to extract seed".to_string()))?;
    Ok(SigningKey::from_bytes(&seed))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxInput {
    pub receiver_id: String,
    pub actions: Vec<ActionParams>,
    pub nonce: Nonce,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignTransactionsRequest {
    pub signer_id: String,
    pub block_hash_b58: String,
    pub near_private_key: String,
    pub transactions: Vec<TxInput>,
    /// Digest the Confirmation UI Agent computed over the same inputs;
    /// mismatch against the locally recomputed digest is fatal.
    pub expected_intent_digest_hex: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedTxOutput {
    pub receiver_id: String,
    pub signed_tx_borsh: Vec<u8>,
    pub intent_digest_hex: String,
}

pub fn handle_sign_transactions_with_actions(
    mut request: SignTransactionsRequest,
) -> SignerResult<Vec<SignedTxOutput>> {
    let block_hash_bytes = bs58::decode(&request.block_hash_b58)
        .into_vec()
        .map_err(|e| SignerAgentError::InvalidAction(format!("invalid block hash: {e}")))?;

    let mut signing_key = parse_signing_key(&request.near_private_key)?;
    request.near_private_key.zeroize();

    let digest = compute_intent_digest(&request.transactions)?;
    let digest_hex = hex_encode(&digest);

    if let Some(expected) = &request.expected_intent_digest_hex {
        if expected != &digest_hex {
            signing_key.zeroize();
            return Err(SignerAgentError::IntentDigestMismatch {
                expected: expected.clone(),
                computed: digest_hex,
            });
        }
    }

    let mut outputs = Vec::with_capacity(request.transactions.len());
    for tx_input in &request.transactions {
        let actions = build_actions_from_params(&tx_input.actions)?;
        let transaction = build_transaction_with_actions(
            &request.signer_id,
            &tx_input.receiver_id,
            tx_input.nonce,
            &block_hash_bytes,
            &signing_key,
            actions,
        )?;
        let signed_tx_borsh = sign_transaction(transaction, &signing_key)?;

        outputs.push(SignedTxOutput {
            receiver_id: tx_input.receiver_id.clone(),
            signed_tx_borsh,
            intent_digest_hex: digest_hex.clone(),
        });
    }

    signing_key.zeroize();
    Ok(outputs)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignDelegateActionRequest {
    pub sender_id: String,
    pub receiver_id: String,
    pub actions: Vec<ActionParams>,
    pub nonce: Nonce,
    pub current_block_height: u64,
    pub near_private_key: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignDelegateActionResult {
    pub hash_hex: String,
    pub signed_delegate_borsh: Vec<u8>,
}

pub fn handle_sign_delegate_action(
    mut request: SignDelegateActionRequest,
) -> SignerResult<SignDelegateActionResult> {
    let sender_id: AccountId = request
        .sender_id
        .parse()
        .map_err(SignerAgentError::InvalidAccountId)?;
    let receiver_id: AccountId = request
        .receiver_id
        .parse()
        .map_err(SignerAgentError::InvalidAccountId)?;

    let mut signing_key = parse_signing_key(&request.near_private_key)?;
    request.near_private_key.zeroize();

    let public_key = PublicKey::from_ed25519_bytes(&signing_key.verifying_key().to_bytes());
    let actions = build_actions_from_params(&request.actions)?;

    let delegate_action = DelegateAction {
        sender_id,
        receiver_id,
        actions,
        nonce: request.nonce,
        max_block_height: request.current_block_height + DEFAULT_DELEGATE_MAX_BLOCK_HEIGHT_DELTA,
        public_key,
    };

    let encoded = borsh::to_vec(&delegate_action)
        .map_err(|e| SignerAgentError::Signing(format!("delegate action borsh encode failed: {e}")))?;
    let hash = Sha256::digest(&encoded);
    let signature_bytes = signing_key.sign(&hash);
    signing_key.zeroize();

    let signed_delegate = SignedDelegate {
        delegate_action,
        signature: Signature::from_ed25519_bytes(&signature_bytes.to_bytes()),
    };

    Ok(SignDelegateActionResult {
        hash_hex: hex_encode(&hash),
        signed_delegate_borsh: signed_delegate
            .to_borsh_bytes()
            .map_err(SignerAgentError::Signing)?,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize, BorshSerialize)]
#[serde(rename_all = "camelCase")]
struct Nep413Payload {
    message: String,
    recipient: String,
    #[serde(with = "crate::types::deserializers::serde_array_32")]
    nonce: [u8; 32],
    state: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignNep413MessageRequest {
    pub message: String,
    pub recipient: String,
    pub nonce_b64u: String,
    pub state: Option<String>,
    pub near_private_key: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignNep413MessageResult {
    pub signature_b64u: String,
    pub public_key: String,
}

pub fn handle_sign_nep413_message(
    mut request: SignNep413MessageRequest,
) -> SignerResult<SignNep413MessageResult> {
    let nonce_bytes = kdm::encoders::base64_url_decode(&request.nonce_b64u).map_err(kdm::error::KdmError::from)?;
    if nonce_bytes.len() != 32 {
        return Err(SignerAgentError::InvalidAction(
            "NEP-413 nonce must be 32 bytes".to_string(),
        ));
    }
    let mut nonce = [0u8; 32];
    nonce.copy_from_slice(&nonce_bytes);

    let mut signing_key = parse_signing_key(&request.near_private_key)?;
    request.near_private_key.zeroize();

    let payload = Nep413Payload {
        message: request.message,
        recipient: request.recipient,
        nonce,
        state: request.state,
    };
    let payload_bytes = borsh::to_vec(&payload)
        .map_err(|e| SignerAgentError::Signing(format!("NEP-413 payload borsh encode failed: {e}")))?;

    let mut hasher = Sha256::new();
    hasher.update(NEP413_DOMAIN_TAG.to_le_bytes());
    hasher.update(&payload_bytes);
    let digest = hasher.finalize();

    let signature = signing_key.sign(&digest);
    let public_key = format!(
        "ed25519:{}",
        bs58::encode(signing_key.verifying_key().to_bytes()).into_string()
    );
    signing_key.zeroize();

    Ok(SignNep413MessageResult {
        signature_b64u: kdm::encoders::base64_url_encode(&signature.to_bytes()),
        public_key,
    })
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signing_key_b58() -> String {
        let signing_key = SigningKey::from_bytes(&[6u8; 32]);
        let mut bytes = signing_key.to_bytes().to_vec();
        bytes.extend_from_slice(&signing_key.verifying_key().to_bytes());
        format!("ed25519:{}", bs58::encode(bytes).into_string())
    }

    #[test]
    fn sign_transactions_rejects_intent_digest_mismatch() {
        let request = SignTransactionsRequest {
            signer_id: "alice.near".to_string(),
            block_hash_b58: bs58::encode([0u8; 32]).into_string(),
            near_private_key: signing_key_b58(),
            transactions: vec![TxInput {
                receiver_id: "bob.near".to_string(),
                actions: vec![ActionParams::Transfer {
                    deposit: "1".to_string(),
                }],
                nonce: 1,
            }],
            expected_intent_digest_hex: Some("0".repeat(64)),
        };
        let result = handle_sign_transactions_with_actions(request);
        assert!(matches!(result, Err(SignerAgentError::IntentDigestMismatch { .. })));
    }

    #[test]
    fn sign_transactions_accepts_matching_intent_digest() {
        let transactions = vec![TxInput {
            receiver_id: "bob.near".to_string(),
            actions: vec![ActionParams::Transfer {
                deposit: "1".to_string(),
            }],
            nonce: 1,
        }];
        let digest = compute_intent_digest(&transactions).unwrap();
        let request = SignTransactionsRequest {
            signer_id: "alice.near".to_string(),
            block_hash_b58: bs58::encode([0u8; 32]).into_string(),
            near_private_key: signing_key_b58(),
            transactions,
            expected_intent_digest_hex: Some(hex_encode(&digest)),
        };
        let outputs = handle_sign_transactions_with_actions(request).unwrap();
        assert_eq!(outputs.len(), 1);
        assert!(!outputs[0].signed_tx_borsh.is_empty());
    }

    #[test]
    fn sign_delegate_action_produces_nonempty_signature() {
        let request = SignDelegateActionRequest {
            sender_id: "alice.near".to_string(),
            receiver_id: "bob.near".to_string(),
            actions: vec![ActionParams::Transfer {
                deposit: "1".to_string(),
            }],
            nonce: 1,
            current_block_height: 100,
            near_private_key: signing_key_b58(),
        };
        let result = handle_sign_delegate_action(request).unwrap();
        assert_eq!(result.hash_hex.len(), 64);
        assert!(!result.signed_delegate_borsh.is_empty());
    }

    #[test]
    fn sign_nep413_message_round_trips_signature_verification() {
        let request = SignNep413MessageRequest {
            message: "hello".to_string(),
            recipient: "app.near".to_string(),
            nonce_b64u: kdm::encoders::base64_url_encode(&[1u8; 32]),
            state: None,
            near_private_key: signing_key_b58(),
        };
        let result = handle_sign_nep413_message(request).unwrap();
        assert!(result.public_key.starts_with("ed25519:"));
        assert!(!result.signature_b64u.is_empty());
    }
}
