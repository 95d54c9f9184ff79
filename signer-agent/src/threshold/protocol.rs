//! Low-level FROST round wire encoding, ported close to verbatim from
//! `protocol.rs`: build a client `KeyPackage`, run round 1/round 2
//! of the standard `frost_ed25519` flow, and aggregate with the relayer's
//! signature share into a plain 64-byte Ed25519 signature.

use std::collections::BTreeMap;

use kdm::encoders::{base64_url_decode, base64_url_encode};
use serde::{Deserialize, Serialize};

use crate::error::{SignerAgentError, SignerResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitmentsWire {
    pub hiding: String,
    pub binding: String,
}

fn threshold_err(context: &str, e: impl std::fmt::Display) -> SignerAgentError {
    SignerAgentError::Threshold(format!("{context}: {e}"))
}

pub struct ClientRound1State {
    pub nonces: frost_ed25519::round1::SigningNonces,
    pub commitments: frost_ed25519::round1::SigningCommitments,
    pub commitments_wire: CommitmentsWire,
}

pub fn client_round1_commit(
    key_package: &frost_ed25519::keys::KeyPackage,
) -> SignerResult<ClientRound1State> {
    let mut rng = frost_ed25519::rand_core::OsRng;
    let (nonces, commitments) = frost_ed25519::round1::commit(key_package.signing_share(), &mut rng);
    let commitments_wire = commitments_to_wire(&commitments)?;
    Ok(ClientRound1State {
        nonces,
        commitments,
        commitments_wire,
    })
}

pub fn commitments_to_wire(
    commitments: &frost_ed25519::round1::SigningCommitments,
) -> SignerResult<CommitmentsWire> {
    let hiding_bytes = commitments
        .hiding()
        .serialize()
        .map_err(|e| threshold_err("serialize hiding commitment", e))?;
    let binding_bytes = commitments
        .binding()
        .serialize()
        .map_err(|e| threshold_err("serialize binding commitment", e))?;
    Ok(CommitmentsWire {
        hiding: base64_url_encode(&hiding_bytes),
        binding: base64_url_encode(&binding_bytes),
    })
}

pub fn commitments_from_wire(
    wire: &CommitmentsWire,
) -> SignerResult<frost_ed25519::round1::SigningCommitments> {
    let hiding_bytes =
        base64_url_decode(wire.hiding.trim()).map_err(|e| threshold_err("invalid commitments.hiding", e))?;
    let binding_bytes = base64_url_decode(wire.binding.trim())
        .map_err(|e| threshold_err("invalid commitments.binding", e))?;

    let hiding = frost_ed25519::round1::NonceCommitment::deserialize(&hiding_bytes)
        .map_err(|e| threshold_err("invalid hiding commitment", e))?;
    let binding = frost_ed25519::round1::NonceCommitment::deserialize(&binding_bytes)
        .map_err(|e| threshold_err("invalid binding commitment", e))?;
    Ok(frost_ed25519::round1::SigningCommitments::new(hiding, binding))
}

pub fn build_signing_package(
    message: &[u8],
    commitments_by_id: BTreeMap<frost_ed25519::Identifier, frost_ed25519::round1::SigningCommitments>,
) -> frost_ed25519::SigningPackage {
    frost_ed25519::SigningPackage::new(commitments_by_id, message)
}

pub fn client_round2_signature_share(
    signing_package: &frost_ed25519::SigningPackage,
    nonces: &frost_ed25519::round1::SigningNonces,
    key_package: &frost_ed25519::keys::KeyPackage,
) -> SignerResult<frost_ed25519::round2::SignatureShare> {
    frost_ed25519::round2::sign(signing_package, nonces, key_package)
        .map_err(|e| threshold_err("round2 sign failed", e))
}

pub fn signature_share_to_b64u(share: &frost_ed25519::round2::SignatureShare) -> String {
    base64_url_encode(&share.serialize())
}

pub fn signature_share_from_b64u(b64u: &str) -> SignerResult<frost_ed25519::round2::SignatureShare> {
    let bytes =
        base64_url_decode(b64u.trim()).map_err(|e| threshold_err("invalid signature share", e))?;
    frost_ed25519::round2::SignatureShare::deserialize(&bytes)
        .map_err(|e| threshold_err("invalid signature share", e))
}

pub fn verifying_share_from_b64u(b64u: &str) -> SignerResult<frost_ed25519::keys::VerifyingShare> {
    let bytes =
        base64_url_decode(b64u.trim()).map_err(|e| threshold_err("invalid verifying share", e))?;
    frost_ed25519::keys::VerifyingShare::deserialize(&bytes)
        .map_err(|e| threshold_err("invalid verifying share", e))
}

pub fn aggregate_signature(
    signing_package: &frost_ed25519::SigningPackage,
    verifying_key: frost_ed25519::VerifyingKey,
    verifying_shares: BTreeMap<frost_ed25519::Identifier, frost_ed25519::keys::VerifyingShare>,
    signature_shares: BTreeMap<frost_ed25519::Identifier, frost_ed25519::round2::SignatureShare>,
) -> SignerResult<[u8; 64]> {
    let pubkey_package = frost_ed25519::keys::PublicKeyPackage::new(verifying_shares, verifying_key);
    let group_signature = frost_ed25519::aggregate(signing_package, &signature_shares, &pubkey_package)
        .map_err(|e| threshold_err("aggregate failed", e))?;
    let bytes = group_signature
        .serialize()
        .map_err(|e| threshold_err("signature serialization failed", e))?;
    if bytes.len() != 64 {
        return Err(SignerAgentError::Threshold(format!(
            "invalid signature length from aggregation: {}",
            bytes.len()
        )));
    }
    let mut out = [0u8; 64];
    out.copy_from_slice(&bytes);
    Ok(out)
}
