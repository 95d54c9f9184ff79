//! Threshold-signer entry points: deriving the client's public verifying
//! share for registration, running a full 2-party signature, and the
//! narrowly-scoped post-registration `AddKey` signer. Grounded on
//! `handle_threshold_ed25519_derive_client_verifying_share.rs` and the
//! `behavior ∈ {strict, fallback}` rule in spec.md §4.3.

use kdm::crypto::WrapKey;
use serde::{Deserialize, Serialize};

use crate::error::{SignerAgentError, SignerResult};
use crate::threshold::{
    build_client_key_package, compute_group_public_key_2p_from_verifying_shares,
    derive_threshold_client_signing_share_bytes_v1, derive_threshold_client_verifying_share_bytes_v1,
    sign_ed25519_2p, HttpThresholdTransport, ThresholdSignerConfig, ThresholdTransport,
    DEFAULT_CLIENT_PARTICIPANT_ID, DEFAULT_RELAYER_PARTICIPANT_ID,
};
use crate::transaction::{build_actions_from_params, build_transaction_with_actions};
use crate::types::*;
use crate::ActionParams;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeriveClientVerifyingShareRequest {
    pub wrap_key: WrapKey,
    pub near_account_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeriveClientVerifyingShareResult {
    pub client_verifying_share_b64u: String,
}

pub fn handle_threshold_ed25519_derive_client_verifying_share(
    request: DeriveClientVerifyingShareRequest,
) -> SignerResult<DeriveClientVerifyingShareResult> {
    let share =
        derive_threshold_client_verifying_share_bytes_v1(&request.wrap_key, &request.near_account_id)?;
    Ok(DeriveClientVerifyingShareResult {
        client_verifying_share_b64u: kdm::encoders::base64_url_encode(&share),
    })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ThresholdFallbackBehavior {
    Strict,
    Fallback,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignTransactionThresholdRequest {
    pub wrap_key: WrapKey,
    pub near_account_id: String,
    pub relayer_verifying_share_b64u: String,
    pub signer_cfg: ThresholdSignerConfigRequest,
    pub mpc_session_id: String,
    pub signer_id: String,
    pub receiver_id: String,
    pub actions: Vec<ActionParams>,
    pub nonce: Nonce,
    pub block_hash_b58: String,
    pub behavior: ThresholdFallbackBehavior,
    /// Only used by the `fallback` path, never touched in `strict` mode.
    pub local_fallback_private_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdSignerConfigRequest {
    pub relayer_url: String,
    pub relayer_key_id: String,
    pub bearer_token: Option<String>,
}

impl From<ThresholdSignerConfigRequest> for ThresholdSignerConfig {
    fn from(r: ThresholdSignerConfigRequest) -> Self {
        ThresholdSignerConfig {
            relayer_url: r.relayer_url,
            relayer_key_id: r.relayer_key_id,
            bearer_token: r.bearer_token,
        }
    }
}

pub async fn handle_sign_transaction_threshold(
    request: SignTransactionThresholdRequest,
) -> SignerResult<Vec<u8>> {
    let block_hash_bytes = bs58::decode(&request.block_hash_b58)
        .into_vec()
        .map_err(|e| SignerAgentError::InvalidAction(format!("invalid block hash: {e}")))?;

    let client_signing_share =
        derive_threshold_client_signing_share_bytes_v1(&request.wrap_key, &request.near_account_id)?;
    let client_verifying_share =
        derive_threshold_client_verifying_share_bytes_v1(&request.wrap_key, &request.near_account_id)?;
    let relayer_verifying_share: [u8; 32] = kdm::encoders::base64_url_decode(&request.relayer_verifying_share_b64u)
        .map_err(kdm::error::KdmError::from)?
        .try_into()
        .map_err(|_| SignerAgentError::Threshold("relayer verifying share must be 32 bytes".to_string()))?;

    let group_public_key = compute_group_public_key_2p_from_verifying_shares(
        &client_verifying_share,
        &relayer_verifying_share,
        DEFAULT_CLIENT_PARTICIPANT_ID,
        DEFAULT_RELAYER_PARTICIPANT_ID,
    )?;
    let public_key = PublicKey::from_ed25519_bytes(&group_public_key);

    let actions = build_actions_from_params(&request.actions)?;
    let transaction = Transaction {
        signer_id: request
            .signer_id
            .parse()
            .map_err(SignerAgentError::InvalidAccountId)?,
        public_key,
        nonce: request.nonce,
        receiver_id: request
            .receiver_id
            .parse()
            .map_err(SignerAgentError::InvalidAccountId)?,
        block_hash: CryptoHash::from_bytes(
            block_hash_bytes
                .clone()
                .try_into()
                .map_err(|_| SignerAgentError::InvalidAction("block hash must be 32 bytes".to_string()))?,
        ),
        actions,
    };
    let (tx_hash, _size) = transaction.get_hash_and_size();

    let client_key_package = build_client_key_package(
        &client_signing_share,
        &client_verifying_share,
        &group_public_key,
        DEFAULT_CLIENT_PARTICIPANT_ID,
    )?;
    let cfg: ThresholdSignerConfig = request.signer_cfg.into();

    let transport = HttpThresholdTransport::default();
    let signature_result = sign_ed25519_2p(
        &transport,
        &cfg,
        &request.mpc_session_id,
        &request.near_account_id,
        &tx_hash.0,
        &client_key_package,
        DEFAULT_CLIENT_PARTICIPANT_ID,
        DEFAULT_RELAYER_PARTICIPANT_ID,
    )
    .await;

    let signature_bytes = match (signature_result, &request.behavior) {
        (Ok(sig), _) => sig,
        (Err(e), ThresholdFallbackBehavior::Strict) => return Err(e),
        (Err(_), ThresholdFallbackBehavior::Fallback) => {
            let fallback_key_str = request.local_fallback_private_key.as_deref().ok_or_else(|| {
                SignerAgentError::Threshold("no local fallback key configured".to_string())
            })?;
            return sign_local_fallback(
                &request.signer_id,
                &request.receiver_id,
                request.nonce,
                &block_hash_bytes,
                fallback_key_str,
                request.actions,
            );
        }
    };

    let signature = Signature::from_ed25519_bytes(&signature_bytes);
    let signed_transaction = SignedTransaction::new(signature, transaction);
    signed_transaction
        .to_borsh_bytes()
        .map_err(SignerAgentError::Signing)
}

fn sign_local_fallback(
    signer_id: &str,
    receiver_id: &str,
    nonce: Nonce,
    block_hash_bytes: &[u8],
    near_private_key: &str,
    action_params: Vec<ActionParams>,
) -> SignerResult<Vec<u8>> {
    let stripped = near_private_key
        .strip_prefix("ed25519:")
        .ok_or_else(|| SignerAgentError::InvalidPrivateKey("must start with ed25519:".to_string()))?;
    let bytes = bs58::decode(stripped)
        .into_vec()
        .map_err(|e| SignerAgentError::InvalidPrivateKey(format!("bs58 decode failed: {e}")))?;
    let seed: [u8; 32] = bytes[0..32]
        .try_into()
        .map_err(|_| SignerAgentError::InvalidPrivateKey("failed to extract seed".to_string()))?;
    let signing_key = ed25519_dalek::SigningKey::from_bytes(&seed);

    let actions = build_actions_from_params(&action_params)?;
    let transaction = build_transaction_with_actions(
        signer_id,
        receiver_id,
        nonce,
        block_hash_bytes,
        &signing_key,
        actions,
    )?;
    crate::transaction::sign_transaction(transaction, &signing_key)
}

/// `sign_add_key_threshold_public_key_no_prompt` (spec.md §4.3 item 7):
/// internal post-registration signer that only ever adds the threshold
/// public key to the caller's own account, never touching any other
/// receiver or action shape.
pub fn handle_sign_add_key_threshold_no_prompt(
    account_id: &str,
    threshold_public_key: &str,
    nonce: Nonce,
    block_hash_bytes: &[u8],
    near_private_key: &str,
) -> SignerResult<Vec<u8>> {
    let action_params = vec![ActionParams::AddKey {
        public_key: threshold_public_key.to_string(),
        access_key: serde_json::json!({"nonce": 0, "permission": {"FullAccess": {}}}).to_string(),
    }];

    sign_local_fallback(
        account_id,
        account_id,
        nonce,
        block_hash_bytes,
        near_private_key,
        action_params,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use kdm::encoders::base64_url_encode;

    fn wrap_key(seed_byte: u8) -> WrapKey {
        WrapKey {
            wrap_key_seed: base64_url_encode(&[seed_byte; 32]),
            wrap_key_salt: base64_url_encode(&[9u8; 16]),
        }
    }

    #[test]
    fn derive_client_verifying_share_is_deterministic() {
        let req = DeriveClientVerifyingShareRequest {
            wrap_key: wrap_key(4),
            near_account_id: "alice.near".to_string(),
        };
        let r1 = handle_threshold_ed25519_derive_client_verifying_share(req.clone()).unwrap();
        let r2 = handle_threshold_ed25519_derive_client_verifying_share(req).unwrap();
        assert_eq!(r1.client_verifying_share_b64u, r2.client_verifying_share_b64u);
    }

    #[test]
    fn sign_add_key_threshold_no_prompt_only_ever_targets_own_account() {
        let signing_key = ed25519_dalek::SigningKey::from_bytes(&[2u8; 32]);
        let mut bytes = signing_key.to_bytes().to_vec();
        bytes.extend_from_slice(&signing_key.verifying_key().to_bytes());
        let near_private_key = format!("ed25519:{}", bs58::encode(bytes).into_string());

        let signed = handle_sign_add_key_threshold_no_prompt(
            "alice.near",
            "ed25519:11111111111111111111111111111111",
            1,
            &[0u8; 32],
            &near_private_key,
        )
        .unwrap();
        let parsed = SignedTransaction::from_borsh_bytes(&signed).unwrap();
        assert_eq!(parsed.transaction.signer_id.0, "alice.near");
        assert_eq!(parsed.transaction.receiver_id.0, "alice.near");
        assert_eq!(parsed.transaction.actions.len(), 1);
    }
}
