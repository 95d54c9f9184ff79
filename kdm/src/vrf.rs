//! ECVRF (RFC 9381, `ECVRF-EDWARDS25519-SHA512-TAI`) keypair derivation from
//! PRF output, via the `vrf-wasm` crate's Edwards25519 implementation.

use hkdf::Hkdf;
use sha2::Sha256;
use vrf_wasm::ecvrf::ECVRFKeyPair;
use vrf_wasm::rng::WasmRngFromSeed;
use vrf_wasm::vrf::VRFKeyPair;

use crate::config::{near_key_salt_for_account, HKDF_VRF_KEYPAIR_INFO, VRF_SEED_SIZE};
use crate::encoders::base64_url_decode;
use crate::error::KdmError;

/// Deterministically derive an ECVRF keypair from the first PRF output,
/// scoped to `account_id`. The same `(prf_output_base64, account_id)` pair
/// always yields the same keypair (P1).
pub fn derive_vrf_keypair_from_prf(
    prf_output_base64: &str,
    account_id: &str,
) -> Result<ECVRFKeyPair, KdmError> {
    let prf_output = base64_url_decode(prf_output_base64)?;
    if prf_output.is_empty() {
        return Err(KdmError::InvalidInput("Empty PRF output".to_string()));
    }

    let salt = near_key_salt_for_account(account_id);
    let hk = Hkdf::<Sha256>::new(Some(salt.as_bytes()), &prf_output);
    let mut vrf_seed = [0u8; VRF_SEED_SIZE];
    hk.expand(HKDF_VRF_KEYPAIR_INFO, &mut vrf_seed)
        .map_err(|_| KdmError::HkdfError)?;

    let mut rng = WasmRngFromSeed::from_seed(vrf_seed);
    Ok(ECVRFKeyPair::generate(&mut rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoders::base64_url_encode;

    #[test]
    fn vrf_derivation_is_deterministic() {
        let prf = base64_url_encode(&[3u8; 32]);
        let kp1 = derive_vrf_keypair_from_prf(&prf, "alice.near").unwrap();
        let kp2 = derive_vrf_keypair_from_prf(&prf, "alice.near").unwrap();
        assert_eq!(kp1.pk.as_ref(), kp2.pk.as_ref());
    }

    #[test]
    fn vrf_derivation_differs_per_account() {
        let prf = base64_url_encode(&[3u8; 32]);
        let kp_alice = derive_vrf_keypair_from_prf(&prf, "alice.near").unwrap();
        let kp_bob = derive_vrf_keypair_from_prf(&prf, "bob.near").unwrap();
        assert_ne!(kp_alice.pk.as_ref(), kp_bob.pk.as_ref());
    }
}
