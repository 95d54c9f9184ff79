//! 2-party (client + relayer) threshold Ed25519 signing, scoped down from
//! the upstream relayer-fleet "cosigner" mode to the single-relayer case
//! SPEC_FULL.md calls for.

pub mod client_share;
pub mod coordinator;
pub mod frost;
pub mod protocol;
pub mod transport;

pub use client_share::{
    derive_threshold_client_signing_share_bytes_v1, derive_threshold_client_verifying_share_bytes_v1,
};
pub use coordinator::sign_ed25519_2p;
pub use frost::{
    build_client_key_package, compute_group_public_key_2p_from_verifying_shares,
    DEFAULT_CLIENT_PARTICIPANT_ID, DEFAULT_RELAYER_PARTICIPANT_ID,
};
pub use transport::{HttpThresholdTransport, ThresholdSignerConfig, ThresholdTransport};
