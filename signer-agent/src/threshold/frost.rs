//! Group public key computation and `KeyPackage` assembly for the 2-party
//! (client + relayer) FROST-Ed25519 scheme. The group key is the Lagrange
//! interpolation of the two verifying shares at `x = 0`, ported verbatim
//! from the original's hand-rolled `curve25519-dalek` computation (it
//! does not use `frost_ed25519`'s DKG here — key generation is a
//! one-shot split between client and relayer, not a distributed protocol).

use curve25519_dalek::edwards::{CompressedEdwardsY, EdwardsPoint};
use curve25519_dalek::scalar::Scalar as CurveScalar;

use crate::error::{SignerAgentError, SignerResult};

/// Default participant identifiers used throughout this crate: the client
/// device is `1`, the relayer is `2`.
pub const DEFAULT_CLIENT_PARTICIPANT_ID: u16 = 1;
pub const DEFAULT_RELAYER_PARTICIPANT_ID: u16 = 2;

fn decompress(bytes: &[u8; 32]) -> SignerResult<EdwardsPoint> {
    CompressedEdwardsY(*bytes)
        .decompress()
        .ok_or_else(|| SignerAgentError::Threshold("invalid Edwards point encoding".to_string()))
}

pub fn compute_group_public_key_2p_from_verifying_shares(
    client_verifying_share: &[u8; 32],
    relayer_verifying_share: &[u8; 32],
    client_participant_id: u16,
    relayer_participant_id: u16,
) -> SignerResult<[u8; 32]> {
    if client_participant_id == 0 || relayer_participant_id == 0 {
        return Err(SignerAgentError::Threshold(
            "participant ids must be non-zero".to_string(),
        ));
    }
    if client_participant_id == relayer_participant_id {
        return Err(SignerAgentError::Threshold(
            "client and relayer participant ids must differ".to_string(),
        ));
    }

    let client_point = decompress(client_verifying_share)?;
    let relayer_point = decompress(relayer_verifying_share)?;

    // PK = lambda_c * Pc + lambda_r * Pr, Lagrange coefficients at x=0:
    //   lambda_c = xr / (xr - xc), lambda_r = xc / (xc - xr)
    let xc = CurveScalar::from(client_participant_id as u64);
    let xr = CurveScalar::from(relayer_participant_id as u64);
    let denom_c = xr - xc;
    let denom_r = xc - xr;
    if denom_c == CurveScalar::ZERO || denom_r == CurveScalar::ZERO {
        return Err(SignerAgentError::Threshold(
            "client and relayer participant ids must differ".to_string(),
        ));
    }
    let lambda_c = xr * denom_c.invert();
    let lambda_r = xc * denom_r.invert();

    let group_point = client_point * lambda_c + relayer_point * lambda_r;
    Ok(group_point.compress().to_bytes())
}

/// Assemble the client's [`frost_ed25519::keys::KeyPackage`] from its own
/// signing/verifying share and the precomputed group public key.
pub fn build_client_key_package(
    client_signing_share: &[u8; 32],
    client_verifying_share: &[u8; 32],
    group_public_key: &[u8; 32],
    client_participant_id: u16,
) -> SignerResult<frost_ed25519::keys::KeyPackage> {
    let identifier: frost_ed25519::Identifier = client_participant_id
        .try_into()
        .map_err(|_| SignerAgentError::Threshold("invalid client participant id".to_string()))?;

    let signing_share = frost_ed25519::keys::SigningShare::deserialize(client_signing_share)
        .map_err(|e| SignerAgentError::Threshold(format!("invalid client signing share: {e}")))?;
    let verifying_share = frost_ed25519::keys::VerifyingShare::deserialize(client_verifying_share)
        .map_err(|e| SignerAgentError::Threshold(format!("invalid client verifying share: {e}")))?;
    let verifying_key = frost_ed25519::VerifyingKey::deserialize(group_public_key)
        .map_err(|e| SignerAgentError::Threshold(format!("invalid group public key: {e}")))?;

    Ok(frost_ed25519::keys::KeyPackage::new(
        identifier,
        signing_share,
        verifying_share,
        verifying_key,
        2,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use curve25519_dalek::constants::ED25519_BASEPOINT_POINT;

    #[test]
    fn group_public_key_matches_manual_lagrange_combination() {
        let client_scalar = CurveScalar::from_bytes_mod_order([3u8; 32]);
        let relayer_scalar = CurveScalar::from_bytes_mod_order([5u8; 32]);
        let client_point = (ED25519_BASEPOINT_POINT * client_scalar).compress().to_bytes();
        let relayer_point = (ED25519_BASEPOINT_POINT * relayer_scalar).compress().to_bytes();

        let group = compute_group_public_key_2p_from_verifying_shares(&client_point, &relayer_point, 1, 2)
            .unwrap();

        // lambda_c = 2/(2-1) = 2, lambda_r = 1/(1-2) = -1
        let expected_scalar = CurveScalar::from(2u64) * client_scalar - relayer_scalar;
        let expected = (ED25519_BASEPOINT_POINT * expected_scalar).compress().to_bytes();
        assert_eq!(group, expected);
    }

    #[test]
    fn rejects_equal_participant_ids() {
        let p = [1u8; 32];
        assert!(compute_group_public_key_2p_from_verifying_shares(&p, &p, 1, 1).is_err());
    }
}
