//! Environment inputs (spec.md §6: "No secrets in configuration").
//!
//! Grounded on `ThresholdSignerConfig`/contract-id constants
//! scattered across `wasm_signer_worker`/`wasm_vrf_worker` config modules,
//! consolidated here since the Orchestrator is the one component that
//! actually owns a process environment (the two wasm workers take their
//! configuration from JS call sites instead).

use std::env;

/// Change this constant and recompile to adjust logging verbosity.
pub const CURRENT_LOG_LEVEL: tracing::Level = tracing::Level::INFO;

pub const DEFAULT_DELEGATE_ACTION_ROUTE: &str = "/signed-delegate";
pub const DEFAULT_CHAIN_RPC_RETRY_ATTEMPTS: u32 = 3;
pub const NONCE_RECONCILE_HORIZON: u64 = 100;

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// WebAuthn RP ID override.
    pub rp_id: String,
    pub contract_id: String,
    pub rpc_url: String,
    pub relay_url: String,
    /// Base64url-encoded Shamir prime `p`, if the deployment overrides the
    /// VRF agent's built-in default.
    pub shamir_prime_b64u: Option<String>,
    pub explorer_url: Option<String>,
    pub delegate_action_route: String,
}

impl OrchestratorConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            rp_id: env::var("W3A_RP_ID").map_err(|_| "W3A_RP_ID not set".to_string())?,
            contract_id: env::var("W3A_CONTRACT_ID").map_err(|_| "W3A_CONTRACT_ID not set".to_string())?,
            rpc_url: env::var("W3A_RPC_URL").map_err(|_| "W3A_RPC_URL not set".to_string())?,
            relay_url: env::var("W3A_RELAY_URL").map_err(|_| "W3A_RELAY_URL not set".to_string())?,
            shamir_prime_b64u: env::var("W3A_SHAMIR_PRIME_B64U").ok(),
            explorer_url: env::var("W3A_EXPLORER_URL").ok(),
            delegate_action_route: env::var("W3A_DELEGATE_ACTION_ROUTE")
                .unwrap_or_else(|_| DEFAULT_DELEGATE_ACTION_ROUTE.to_string()),
        })
    }
}

/// Initialize the process-wide tracing subscriber. Grounded on
/// `fastnear-near-outlayer`'s coordinator `main.rs`
/// (`tracing_subscriber::fmt().with_env_filter(...)`), since its
/// own workers use `log::Level` constants with no process entry point of
/// their own to init from.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "orchestrator=info".into()),
        )
        .try_init();
}
