//! Configuration constants for the signer agent.

/// Change this constant and recompile to adjust logging verbosity.
pub const CURRENT_LOG_LEVEL: log::Level = log::Level::Info;

/// Maximum signing-session duration in milliseconds (30 minutes).
pub const SESSION_MAX_DURATION_MS: f64 = 30.0 * 60.0 * 1000.0;

/// Gas attached to the device-linking `verify_and_register_user` call.
pub const LINK_DEVICE_REGISTRATION_GAS: u64 = 300_000_000_000_000;

/// Method name invoked on the contract during device-2 registration.
pub const LINK_DEVICE_REGISTER_USER_METHOD: &str = "verify_and_register_user";

/// NEP-413 off-chain message signing domain tag: 2^31 + 413, little-endian.
pub const NEP413_DOMAIN_TAG: u32 = (1u32 << 31) + 413;

/// Max block height lookahead NEP-461 delegate actions are granted by
/// default when the caller doesn't specify one.
pub const DEFAULT_DELEGATE_MAX_BLOCK_HEIGHT_DELTA: u64 = 600;
