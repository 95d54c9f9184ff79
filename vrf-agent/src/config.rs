//! Named constants for the VRF agent, mirroring the upstream per-crate
//! `config.rs` convention.

pub const CURRENT_LOG_LEVEL: log::Level = log::Level::Info;

pub const VRF_DOMAIN_SEPARATOR: &[u8] = b"web3_authn_challenge_v4";
pub const HKDF_CHACHA20_KEY_INFO: &[u8] = b"vrf-chacha20-key";
pub const HKDF_VRF_KEYPAIR_INFO: &[u8] = b"tatchi:v1:vrf-sk";

pub const CHACHA20_KEY_SIZE: usize = 32;
pub const CHACHA20_NONCE_SIZE: usize = 12;
pub const VRF_SEED_SIZE: usize = 32;

pub const SHAMIR_AEAD_HKDF_INFO: &[u8] = b"web3authn-shamir3pass-kek-to-aead-key-v1";
pub const SHAMIR_MIN_PRIME_BITS: usize = 256;
pub const SHAMIR_REJECTION_SAMPLING_MAX_ATTEMPTS: u32 = 10;
pub const SHAMIR_RANDOM_BYTES_OVERHEAD: usize = 64;
pub const DEFAULT_SHAMIR_P_B64U: &str = "3N5w46AIGjGT2v5Vua_TMD5Ywfa9U2F7-WzW8SNDsIM";

pub const DISPLAY_TRUNCATE_LENGTH: usize = 20;

/// Default bounds for a minted signing session: five dispenses or five
/// minutes, whichever comes first.
pub const VRF_SESSION_DEFAULT_TTL_MS: f64 = 5.0 * 60.0 * 1000.0;
pub const VRF_SESSION_DEFAULT_MAX_USES: u32 = 5;
