//! Named constants for key sizes, HKDF domain-separation strings, and the
//! default structured-log level, mirroring the per-crate config module
//! convention.

pub const CURRENT_LOG_LEVEL: log::Level = log::Level::Info;

pub const CHACHA20_NONCE_SIZE: usize = 12;
pub const CHACHA20_KEY_SIZE: usize = 32;
pub const ED25519_PRIVATE_KEY_SIZE: usize = 32;
pub const VRF_SEED_SIZE: usize = 32;

pub const ED25519_HKDF_KEY_INFO: &str = "ed25519-signing-key-dual-prf-v1";
pub const NEAR_KEK_INFO: &[u8] = b"near-kek";
pub const HKDF_VRF_KEYPAIR_INFO: &[u8] = b"tatchi:v1:vrf-sk";

pub const ERROR_INVALID_KEY_SIZE: &str = "Invalid key size";

/// Account-scoped HKDF salt for Ed25519/ChaCha20 key derivation.
pub fn near_key_salt_for_account(account_id: &str) -> String {
    format!("near-key-derivation:{}", account_id)
}
