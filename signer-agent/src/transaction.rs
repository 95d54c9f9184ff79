//! Transaction assembly and signing.
//!
//! Grounded on `build_transaction_with_actions`/
//! `sign_transaction`/`calculate_transaction_hash`. The prior
//! `get_action_handler`/`Action` indirection referenced no defining module
//! in the retrieved source, so actions are built directly through
//! [`ActionParams::to_action`].

use ed25519_dalek::{Signer, SigningKey};
use sha2::{Digest, Sha256};

use crate::actions::ActionParams;
use crate::config::{LINK_DEVICE_REGISTRATION_GAS, LINK_DEVICE_REGISTER_USER_METHOD};
use crate::error::{SignerAgentError, SignerResult};
use crate::types::*;

pub fn build_actions_from_params(action_params: &[ActionParams]) -> SignerResult<Vec<NearAction>> {
    action_params.iter().map(ActionParams::to_action).collect()
}

pub fn build_transaction_with_actions(
    signer_account_id: &str,
    receiver_account_id: &str,
    nonce: Nonce,
    block_hash_bytes: &[u8],
    private_key: &SigningKey,
    actions: Vec<NearAction>,
) -> SignerResult<Transaction> {
    let signer_id: AccountId = signer_account_id
        .parse()
        .map_err(SignerAgentError::InvalidAccountId)?;
    let receiver_id: AccountId = receiver_account_id
        .parse()
        .map_err(SignerAgentError::InvalidAccountId)?;

    if block_hash_bytes.len() != 32 {
        return Err(SignerAgentError::TransactionBuild(
            "block hash must be 32 bytes".to_string(),
        ));
    }
    let mut block_hash_array = [0u8; 32];
    block_hash_array.copy_from_slice(block_hash_bytes);
    let block_hash = CryptoHash::from_bytes(block_hash_array);

    let public_key_bytes = private_key.verifying_key().to_bytes();
    let public_key = PublicKey::from_ed25519_bytes(&public_key_bytes);

    Ok(Transaction {
        signer_id,
        public_key,
        nonce,
        receiver_id,
        block_hash,
        actions,
    })
}

/// Sign an already-built transaction, returning Borsh-serialized
/// `SignedTransaction` bytes.
pub fn sign_transaction(transaction: Transaction, private_key: &SigningKey) -> SignerResult<Vec<u8>> {
    let (transaction_hash, _size) = transaction.get_hash_and_size();
    let signature_bytes = private_key.sign(&transaction_hash.0);
    let signature = Signature::from_ed25519_bytes(&signature_bytes.to_bytes());
    let signed_transaction = SignedTransaction::new(signature, transaction);
    signed_transaction
        .to_borsh_bytes()
        .map_err(SignerAgentError::Signing)
}

pub fn calculate_transaction_hash(signed_tx_bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(signed_tx_bytes);
    format!("{:x}", hasher.finalize())
}

/// Sign the device-2 `verify_and_register_user` call with a freshly derived,
/// still-unencrypted NEAR private key.
pub fn sign_link_device_registration_tx(
    contract_id: &str,
    signer_account_id: &str,
    near_private_key: &str,
    nonce: Nonce,
    block_hash_bytes: &[u8],
    registration_args_json: &serde_json::Value,
) -> SignerResult<Vec<u8>> {
    let private_key_str = near_private_key
        .strip_prefix("ed25519:")
        .ok_or_else(|| SignerAgentError::InvalidPrivateKey("must start with ed25519:".to_string()))?;

    let private_key_bytes = bs58::decode(private_key_str)
        .into_vec()
        .map_err(|e| SignerAgentError::InvalidPrivateKey(format!("bs58 decode failed: {e}")))?;

    if private_key_bytes.len() != 64 {
        return Err(SignerAgentError::InvalidPrivateKey(format!(
            "expected 64 bytes, got {}",
            private_key_bytes.len()
        )));
    }
    let seed_bytes: [u8; 32] = private_key_bytes[0..32]
        .try_into()
        .map_err(|_| SignerAgentError::InvalidPrivateKey("failed to extract seed".to_string()))?;
    let signing_key = SigningKey::from_bytes(&seed_bytes);

    let action_params = vec![ActionParams::FunctionCall {
        method_name: LINK_DEVICE_REGISTER_USER_METHOD.to_string(),
        args: registration_args_json.to_string(),
        gas: LINK_DEVICE_REGISTRATION_GAS.to_string(),
        deposit: "0".to_string(),
    }];

    let actions = build_actions_from_params(&action_params)?;
    let transaction = build_transaction_with_actions(
        signer_account_id,
        contract_id,
        nonce,
        block_hash_bytes,
        &signing_key,
        actions,
    )?;

    sign_transaction(transaction, &signing_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_and_sign_round_trips_through_borsh() {
        let signing_key = SigningKey::from_bytes(&[5u8; 32]);
        let actions = build_actions_from_params(&[ActionParams::Transfer {
            deposit: "1".to_string(),
        }])
        .unwrap();
        let tx = build_transaction_with_actions(
            "alice.near",
            "bob.near",
            1,
            &[0u8; 32],
            &signing_key,
            actions,
        )
        .unwrap();
        let bytes = sign_transaction(tx, &signing_key).unwrap();
        let signed = SignedTransaction::from_borsh_bytes(&bytes).unwrap();
        assert_eq!(signed.transaction.nonce, 1);
        assert!(!calculate_transaction_hash(&bytes).is_empty());
    }
}
