//! Deterministic derivation of the client's half of a 2-party threshold
//! Ed25519 key, from the wrap key the VRF agent hands over, same as a
//! regular NEAR signing key derivation but domain-separated for threshold
//! use. Ported close to verbatim.

use curve25519_dalek::constants::ED25519_BASEPOINT_POINT;
use curve25519_dalek::scalar::Scalar as CurveScalar;
use hkdf::Hkdf;
use kdm::crypto::WrapKey;
use kdm::encoders::base64_url_decode;
use sha2::Sha256;

use crate::error::{SignerAgentError, SignerResult};

pub(crate) const THRESHOLD_CLIENT_SHARE_SALT_V1: &[u8] =
    b"tatchi-threshold-ed25519-client-share:v1";

pub(crate) fn derive_threshold_client_share_scalar_v1(
    wrap_key: &WrapKey,
    near_account_id: &str,
) -> SignerResult<CurveScalar> {
    let seed_bytes = base64_url_decode(&wrap_key.wrap_key_seed)
        .map_err(|e| SignerAgentError::Threshold(format!("invalid wrap key seed: {e}")))?;
    if seed_bytes.len() != 32 {
        return Err(SignerAgentError::Threshold(format!(
            "invalid WrapKeySeed length: expected 32 bytes, got {}",
            seed_bytes.len()
        )));
    }

    let hk = Hkdf::<Sha256>::new(Some(THRESHOLD_CLIENT_SHARE_SALT_V1), &seed_bytes);
    let mut okm = [0u8; 64];
    hk.expand(near_account_id.as_bytes(), &mut okm)
        .map_err(|_| SignerAgentError::Threshold("HKDF expand failed".to_string()))?;

    let scalar = CurveScalar::from_bytes_mod_order_wide(&okm);
    if scalar == CurveScalar::ZERO {
        return Err(SignerAgentError::Threshold(
            "derived client signing share is zero".to_string(),
        ));
    }
    Ok(scalar)
}

pub fn derive_threshold_client_signing_share_bytes_v1(
    wrap_key: &WrapKey,
    near_account_id: &str,
) -> SignerResult<[u8; 32]> {
    Ok(derive_threshold_client_share_scalar_v1(wrap_key, near_account_id)?.to_bytes())
}

pub fn derive_threshold_client_verifying_share_bytes_v1(
    wrap_key: &WrapKey,
    near_account_id: &str,
) -> SignerResult<[u8; 32]> {
    let scalar = derive_threshold_client_share_scalar_v1(wrap_key, near_account_id)?;
    Ok((ED25519_BASEPOINT_POINT * scalar).compress().to_bytes())
}
