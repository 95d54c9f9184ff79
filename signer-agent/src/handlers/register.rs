//! Device-linking registration: derive the link-device account's keypair
//! and sign its on-chain registration call in one step. Grounded on
//! `handle_register_device2_with_derived_key.rs`, scoped down since its
//! derive and sign halves are already covered by
//! [`crate::handlers::derive::handle_derive_near_keypair_and_encrypt`] and
//! [`crate::transaction::sign_link_device_registration_tx`] — this module
//! only adds the thin request/response shape that ties the two together
//! plus the registration-idempotency probe.

use serde::{Deserialize, Serialize};

use crate::error::SignerResult;
use crate::handlers::derive::{
    handle_derive_near_keypair_and_encrypt, DeriveNearKeypairRequest, DeviceLinkRegistrationParams,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDevice2Request {
    pub prf_output_second_b64u: String,
    pub near_account_id: String,
    pub wrap_key: kdm::crypto::WrapKey,
    pub contract_id: String,
    pub nonce: String,
    pub block_hash_b58: String,
    pub registration_args_json: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDevice2Result {
    pub public_key: String,
    pub encrypted_near_key_data_b64u: String,
    pub chacha20_nonce_b64u: String,
    pub wrap_key_salt_b64u: String,
    pub signed_registration_tx_borsh: Vec<u8>,
}

pub fn handle_register_device2_with_derived_key(
    request: RegisterDevice2Request,
) -> SignerResult<RegisterDevice2Result> {
    let derived = handle_derive_near_keypair_and_encrypt(DeriveNearKeypairRequest {
        prf_output_second_b64u: request.prf_output_second_b64u,
        near_account_id: request.near_account_id,
        wrap_key: request.wrap_key,
        registration_transaction: Some(DeviceLinkRegistrationParams {
            contract_id: request.contract_id,
            nonce: request.nonce,
            block_hash_b58: request.block_hash_b58,
            registration_args_json: request.registration_args_json,
        }),
    })?;

    Ok(RegisterDevice2Result {
        public_key: derived.public_key,
        encrypted_near_key_data_b64u: derived.encrypted_near_key_data_b64u,
        chacha20_nonce_b64u: derived.chacha20_nonce_b64u,
        wrap_key_salt_b64u: derived.wrap_key_salt_b64u,
        signed_registration_tx_borsh: derived
            .signed_registration_tx_borsh
            .expect("registration_transaction was Some"),
    })
}

/// Pure validation half of `check_can_register_user` (grounded on
/// `handle_check_can_register_user.rs`): the live `users[account_id]`
/// contract view-call belongs to the orchestrator's RPC client. This just
/// validates the account id shape the caller is about to probe with.
pub fn validate_check_can_register_user_account_id(account_id: &str) -> SignerResult<()> {
    let _: crate::types::AccountId = account_id
        .parse()
        .map_err(crate::error::SignerAgentError::InvalidAccountId)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kdm::encoders::base64_url_encode;

    #[test]
    fn register_device2_signs_a_registration_transaction() {
        let request = RegisterDevice2Request {
            prf_output_second_b64u: base64_url_encode(&[3u8; 32]),
            near_account_id: "alice.near".to_string(),
            wrap_key: kdm::crypto::WrapKey {
                wrap_key_seed: base64_url_encode(&[1u8; 32]),
                wrap_key_salt: base64_url_encode(&[2u8; 16]),
            },
            contract_id: "web3-authn.testnet".to_string(),
            nonce: "1".to_string(),
            block_hash_b58: bs58::encode([0u8; 32]).into_string(),
            registration_args_json: serde_json::json!({"device_number": 2}),
        };
        let result = handle_register_device2_with_derived_key(request).unwrap();
        assert!(!result.signed_registration_tx_borsh.is_empty());
    }

    #[test]
    fn validate_check_can_register_user_account_id_rejects_empty() {
        assert!(validate_check_can_register_user_account_id("").is_err());
        assert!(validate_check_can_register_user_account_id("alice.near").is_ok());
    }
}
