//! Drives the client side of a 2-party FROST-Ed25519 signature: round 1
//! commit, hand commitments to the relayer via [`ThresholdTransport`], round
//! 2 sign once the relayer's commitments come back, then aggregate both
//! signature shares into a plain Ed25519 signature. Ported from
//! `coordinator::sign_ed25519_2p_v1`.

use std::collections::BTreeMap;

use crate::error::SignerResult;
use crate::threshold::frost::DEFAULT_CLIENT_PARTICIPANT_ID;
use crate::threshold::protocol;
use crate::threshold::transport::{ThresholdSignerConfig, ThresholdTransport};

pub async fn sign_ed25519_2p<T: ThresholdTransport>(
    transport: &T,
    cfg: &ThresholdSignerConfig,
    mpc_session_id: &str,
    near_account_id: &str,
    signing_digest_32: &[u8],
    client_key_package: &frost_ed25519::keys::KeyPackage,
    client_participant_id: u16,
    relayer_participant_id: u16,
) -> SignerResult<[u8; 64]> {
    let client_identifier: frost_ed25519::Identifier = client_participant_id
        .try_into()
        .unwrap_or_else(|_| DEFAULT_CLIENT_PARTICIPANT_ID.try_into().unwrap());
    let relayer_identifier: frost_ed25519::Identifier = relayer_participant_id.try_into().unwrap();

    let round1 = protocol::client_round1_commit(client_key_package)?;

    let signing_digest_b64u = kdm::encoders::base64_url_encode(signing_digest_32);

    let init = transport
        .sign_init(
            cfg,
            mpc_session_id,
            near_account_id,
            &signing_digest_b64u,
            round1.commitments_wire,
        )
        .await?;

    let relayer_commitments = protocol::commitments_from_wire(&init.relayer_commitments)?;

    let mut commitments_by_id = BTreeMap::new();
    commitments_by_id.insert(client_identifier, round1.commitments);
    commitments_by_id.insert(relayer_identifier, relayer_commitments);
    let signing_package = protocol::build_signing_package(signing_digest_32, commitments_by_id);

    let client_sig_share =
        protocol::client_round2_signature_share(&signing_package, &round1.nonces, client_key_package)?;
    let client_sig_share_b64u = protocol::signature_share_to_b64u(&client_sig_share);

    let relayer_sig_share_b64u = transport
        .sign_finalize(cfg, &init.signing_session_id, &client_sig_share_b64u)
        .await?;
    let relayer_sig_share = protocol::signature_share_from_b64u(&relayer_sig_share_b64u)?;

    let verifying_key = *client_key_package.verifying_key();
    let client_verifying_share = *client_key_package.verifying_share();
    let relayer_verifying_share = protocol::verifying_share_from_b64u(&init.relayer_verifying_share_b64u)?;

    let mut verifying_shares_by_id = BTreeMap::new();
    verifying_shares_by_id.insert(client_identifier, client_verifying_share);
    verifying_shares_by_id.insert(relayer_identifier, relayer_verifying_share);

    let mut signature_shares_by_id = BTreeMap::new();
    signature_shares_by_id.insert(client_identifier, client_sig_share);
    signature_shares_by_id.insert(relayer_identifier, relayer_sig_share);

    protocol::aggregate_signature(
        &signing_package,
        verifying_key,
        verifying_shares_by_id,
        signature_shares_by_id,
    )
}
