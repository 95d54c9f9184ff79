//! VRF input construction and challenge/proof generation.
//!
//! `vrf_input = SHA256(domain_separator ‖ user_id ‖ rp_id ‖
//! block_height_le ‖ block_hash_bytes)`, exactly as
//! `generate_vrf_challenge_with_keypair` constructs it, with the
//! `intent_digest`/`session_policy_digest_32` enrichment of `VRFInputData`
//! preserved but not yet folded into the hashed bytes (those two fields are
//! carried for the confirmation-ui/orchestrator layer to bind against,
//! matching the upstream struct shape).

use sha2::{Digest, Sha256};
use vrf_wasm::ecvrf::ECVRFKeyPair;
use vrf_wasm::vrf::{VRFKeyPair, VRFProof};

use crate::config::VRF_DOMAIN_SEPARATOR;
use crate::error::{SerializationError, VrfAgentError, VrfResult};
use crate::types::{parse_block_height, VRFChallengeData, VRFInputData};
use kdm::encoders::base64_url_encode;

pub fn generate_vrf_challenge_with_keypair(
    vrf_keypair: &ECVRFKeyPair,
    input_data: VRFInputData,
) -> VrfResult<VRFChallengeData> {
    let block_height_num = parse_block_height(&input_data.block_height)?;
    let block_height_bytes = block_height_num.to_le_bytes();

    let block_hash_bytes = bs58::decode(&input_data.block_hash)
        .into_vec()
        .map_err(|e| VrfAgentError::invalid_format(&format!("invalid blockHash: {}", e)))?;

    let mut vrf_input_data = Vec::new();
    vrf_input_data.extend_from_slice(VRF_DOMAIN_SEPARATOR);
    vrf_input_data.extend_from_slice(input_data.user_id.as_bytes());
    vrf_input_data.extend_from_slice(input_data.rp_id.as_bytes());
    vrf_input_data.extend_from_slice(&block_height_bytes);
    vrf_input_data.extend_from_slice(&block_hash_bytes);

    let vrf_input = Sha256::digest(&vrf_input_data).to_vec();

    let proof = vrf_keypair.prove(&vrf_input);
    let vrf_output = proof.to_hash().to_vec();

    let proof_bytes = bincode::serialize(&proof)
        .map_err(|e| SerializationError::VrfKeypairSerialization(format!("{:?}", e)))?;
    let pk_bytes = bincode::serialize(&vrf_keypair.pk)
        .map_err(|e| SerializationError::VrfPublicKeySerialization(format!("{:?}", e)))?;

    Ok(VRFChallengeData {
        vrf_input: base64_url_encode(&vrf_input),
        vrf_output: base64_url_encode(&vrf_output),
        vrf_proof: base64_url_encode(&proof_bytes),
        vrf_public_key: base64_url_encode(&pk_bytes),
        user_id: input_data.user_id,
        rp_id: input_data.rp_id,
        block_height: input_data.block_height,
        block_hash: base64_url_encode(&block_hash_bytes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_core::SeedableRng;
    use vrf_wasm::rng::WasmRngFromSeed;

    fn test_keypair() -> ECVRFKeyPair {
        let mut rng = WasmRngFromSeed::from_seed([1u8; 32]);
        ECVRFKeyPair::generate(&mut rng)
    }

    fn input() -> VRFInputData {
        VRFInputData {
            user_id: "alice.near".to_string(),
            rp_id: "example.com".to_string(),
            block_height: "12345".to_string(),
            block_hash: bs58::encode([9u8; 32]).into_string(),
            intent_digest: None,
            session_policy_digest_32: None,
        }
    }

    #[test]
    fn challenge_is_deterministic_for_same_keypair_and_input() {
        let kp = test_keypair();
        let c1 = generate_vrf_challenge_with_keypair(&kp, input()).unwrap();
        let c2 = generate_vrf_challenge_with_keypair(&kp, input()).unwrap();
        assert_eq!(c1.vrf_output, c2.vrf_output);
        assert_eq!(c1.vrf_proof, c2.vrf_proof);
    }

    #[test]
    fn challenge_rejects_invalid_block_height() {
        let kp = test_keypair();
        let mut bad_input = input();
        bad_input.block_height = "not-a-number".to_string();
        assert!(generate_vrf_challenge_with_keypair(&kp, bad_input).is_err());
    }

    #[test]
    fn vrf_proof_verifies_against_published_output_and_public_key() {
        let kp = test_keypair();
        let challenge = generate_vrf_challenge_with_keypair(&kp, input()).unwrap();

        let vrf_input = kdm::encoders::base64_url_decode(&challenge.vrf_input).unwrap();
        let proof_bytes = kdm::encoders::base64_url_decode(&challenge.vrf_proof).unwrap();
        let proof: vrf_wasm::ecvrf::ECVRFProof = bincode::deserialize(&proof_bytes).unwrap();

        let output = proof.verify(&vrf_input, &kp.pk).expect("proof must verify");
        assert_eq!(base64_url_encode(&output.to_hash()), challenge.vrf_output);
    }
}
