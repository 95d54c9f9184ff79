//! Wire types shared across the VRF agent's handlers.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VRFKeypairData {
    pub keypair_bytes: Vec<u8>,
    pub public_key_base64: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedVRFKeypair {
    pub encrypted_vrf_data_b64u: String,
    pub chacha20_nonce_b64u: String,
}

/// The raw material a signing session dispenses to the signer agent.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedVrfKeypairResponse {
    pub vrf_public_key: String,
    pub encrypted_vrf_keypair: EncryptedVRFKeypair,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VRFInputData {
    pub user_id: String,
    pub rp_id: String,
    pub block_height: String,
    pub block_hash: String,
    pub intent_digest: Option<String>,
    pub session_policy_digest_32: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VRFChallengeData {
    pub vrf_input: String,
    pub vrf_output: String,
    pub vrf_proof: String,
    pub vrf_public_key: String,
    pub user_id: String,
    pub rp_id: String,
    pub block_height: String,
    pub block_hash: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVrfKeypairBootstrapResponse {
    pub vrf_public_key: String,
    pub vrf_challenge_data: Option<VRFChallengeData>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeterministicVrfKeypairResponse {
    pub vrf_public_key: String,
    pub vrf_challenge_data: Option<VRFChallengeData>,
    pub encrypted_vrf_keypair: Option<EncryptedVRFKeypair>,
    pub success: bool,
    pub server_encrypted_vrf_keypair: Option<EncryptedVRFKeypair>,
}

pub fn parse_block_height(block_height: &str) -> Result<u64, crate::error::VrfAgentError> {
    block_height
        .parse::<u64>()
        .map_err(|_| crate::error::VrfAgentError::invalid_format("blockHeight is not a u64"))
}
