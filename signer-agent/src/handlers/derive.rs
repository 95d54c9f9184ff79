//! Key derivation handlers: bootstrap a new wallet keypair, recover one
//! from an existing passkey, and decrypt a previously-wrapped private key
//! for local signing. Grounded on `handle_derive_near_keypair_and_encrypt.rs`,
//! `handle_recover_keypair_from_passkey.rs`, and
//! `handle_decrypt_private_key_with_prf.rs`.

use kdm::crypto::WrapKey;
use serde::{Deserialize, Serialize};

use crate::error::{SignerAgentError, SignerResult};
use crate::transaction;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeriveNearKeypairRequest {
    pub prf_output_second_b64u: String,
    pub near_account_id: String,
    pub wrap_key: WrapKey,
    /// Present only when this derivation is part of a device-linking flow.
    pub registration_transaction: Option<DeviceLinkRegistrationParams>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceLinkRegistrationParams {
    pub contract_id: String,
    pub nonce: String,
    pub block_hash_b58: String,
    pub registration_args_json: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeriveNearKeypairResult {
    pub near_account_id: String,
    pub public_key: String,
    pub encrypted_near_key_data_b64u: String,
    pub chacha20_nonce_b64u: String,
    pub wrap_key_salt_b64u: String,
    pub signed_registration_tx_borsh: Option<Vec<u8>>,
}

pub fn handle_derive_near_keypair_and_encrypt(
    request: DeriveNearKeypairRequest,
) -> SignerResult<DeriveNearKeypairResult> {
    let (near_private_key, public_key) = kdm::derive_ed25519_key_from_prf_output(
        &request.prf_output_second_b64u,
        &request.near_account_id,
    )?;

    let kek = request
        .wrap_key
        .derive_kek()
        .map_err(kdm::error::KdmError::EncryptionError)?;
    let encrypted = kdm::encrypt_data_chacha20(&near_private_key, &kek)
        .map_err(kdm::error::KdmError::EncryptionError)?
        .with_wrap_key_salt(request.wrap_key.wrap_key_salt.as_bytes());

    let signed_registration_tx_borsh = match &request.registration_transaction {
        Some(reg) => {
            let nonce = reg
                .nonce
                .parse::<u64>()
                .map_err(|_| SignerAgentError::InvalidAction("invalid nonce".to_string()))?;
            let block_hash_bytes = bs58::decode(&reg.block_hash_b58)
                .into_vec()
                .map_err(|e| SignerAgentError::InvalidAction(format!("invalid block hash: {e}")))?;

            let signed_tx_bytes = transaction::sign_link_device_registration_tx(
                &reg.contract_id,
                &request.near_account_id,
                &near_private_key,
                nonce,
                &block_hash_bytes,
                &reg.registration_args_json,
            )?;
            Some(signed_tx_bytes)
        }
        None => None,
    };

    Ok(DeriveNearKeypairResult {
        near_account_id: request.near_account_id,
        public_key,
        encrypted_near_key_data_b64u: encrypted.encrypted_data_b64u,
        chacha20_nonce_b64u: encrypted.chacha20_nonce_b64u,
        wrap_key_salt_b64u: encrypted.wrap_key_salt_b64u.unwrap_or_default(),
        signed_registration_tx_borsh,
    })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoverKeypairRequest {
    pub ed25519_prf_output_b64u: String,
    pub account_id_hint: Option<String>,
    pub wrap_key: WrapKey,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoverKeypairResult {
    pub public_key: String,
    pub encrypted_data_b64u: String,
    pub chacha20_nonce_b64u: String,
    pub wrap_key_salt_b64u: String,
    pub account_id_hint: Option<String>,
}

pub fn handle_recover_keypair_from_passkey(
    request: RecoverKeypairRequest,
) -> SignerResult<RecoverKeypairResult> {
    let account_id = request
        .account_id_hint
        .clone()
        .unwrap_or_else(|| "recovery-account.testnet".to_string());

    let (private_key, public_key) =
        kdm::derive_ed25519_key_from_prf_output(&request.ed25519_prf_output_b64u, &account_id)?;

    let kek = request
        .wrap_key
        .derive_kek()
        .map_err(kdm::error::KdmError::EncryptionError)?;
    let encrypted = kdm::encrypt_data_chacha20(&private_key, &kek)
        .map_err(kdm::error::KdmError::EncryptionError)?
        .with_wrap_key_salt(request.wrap_key.wrap_key_salt.as_bytes());

    Ok(RecoverKeypairResult {
        public_key,
        encrypted_data_b64u: encrypted.encrypted_data_b64u,
        chacha20_nonce_b64u: encrypted.chacha20_nonce_b64u,
        wrap_key_salt_b64u: encrypted.wrap_key_salt_b64u.unwrap_or_default(),
        account_id_hint: Some(account_id),
    })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptPrivateKeyRequest {
    pub near_account_id: String,
    pub encrypted_private_key_data_b64u: String,
    pub chacha20_nonce_b64u: String,
    pub wrap_key: WrapKey,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptPrivateKeyResult {
    pub private_key: String,
    pub near_account_id: String,
}

pub fn handle_decrypt_private_key_with_prf(
    request: DecryptPrivateKeyRequest,
) -> SignerResult<DecryptPrivateKeyResult> {
    let kek = request
        .wrap_key
        .derive_kek()
        .map_err(kdm::error::KdmError::EncryptionError)?;

    let private_key = kdm::decrypt_data_chacha20(
        &request.encrypted_private_key_data_b64u,
        &request.chacha20_nonce_b64u,
        &kek,
    )
    .map_err(kdm::error::KdmError::EncryptionError)?;

    Ok(DecryptPrivateKeyResult {
        private_key,
        near_account_id: request.near_account_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kdm::encoders::base64_url_encode;

    fn wrap_key() -> WrapKey {
        WrapKey {
            wrap_key_seed: base64_url_encode(&[1u8; 32]),
            wrap_key_salt: base64_url_encode(&[2u8; 16]),
        }
    }

    #[test]
    fn derive_then_decrypt_round_trips() {
        let req = DeriveNearKeypairRequest {
            prf_output_second_b64u: base64_url_encode(&[3u8; 32]),
            near_account_id: "alice.near".to_string(),
            wrap_key: wrap_key(),
            registration_transaction: None,
        };
        let derived = handle_derive_near_keypair_and_encrypt(req).unwrap();
        assert!(derived.public_key.starts_with("ed25519:"));

        let decrypted = handle_decrypt_private_key_with_prf(DecryptPrivateKeyRequest {
            near_account_id: "alice.near".to_string(),
            encrypted_private_key_data_b64u: derived.encrypted_near_key_data_b64u,
            chacha20_nonce_b64u: derived.chacha20_nonce_b64u,
            wrap_key: wrap_key(),
        })
        .unwrap();
        assert!(decrypted.private_key.starts_with("ed25519:"));
    }

    #[test]
    fn recover_keypair_is_deterministic_per_account_hint() {
        let prf = base64_url_encode(&[9u8; 32]);
        let r1 = handle_recover_keypair_from_passkey(RecoverKeypairRequest {
            ed25519_prf_output_b64u: prf.clone(),
            account_id_hint: Some("alice.near".to_string()),
            wrap_key: wrap_key(),
        })
        .unwrap();
        let r2 = handle_recover_keypair_from_passkey(RecoverKeypairRequest {
            ed25519_prf_output_b64u: prf,
            account_id_hint: Some("alice.near".to_string()),
            wrap_key: wrap_key(),
        })
        .unwrap();
        assert_eq!(r1.public_key, r2.public_key);
    }
}
