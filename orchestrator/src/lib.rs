//! Session & Confirmation Orchestrator (spec.md §4.4): the single entry
//! point application code calls into. Routes requests to the VRF Agent,
//! Signer Agent, and Confirmation UI Agent, reserves nonces across
//! concurrent signing calls, mirrors user preferences across wallet
//! origins, and talks to the relay server and NEAR RPC on the agents'
//! behalf. No direct analogue at the module level — the original
//! TypeScript `PasskeyManager`/`SignerClient` fill this role outside the
//! retrieved Rust pack; every submodule is instead grounded on the
//! specific source file named in its own doc comment.

pub mod config;
pub mod confirm;
pub mod contract;
pub mod envelope;
pub mod error;
pub mod nonce;
pub mod preferences;
pub mod progress;
pub mod relay;
#[cfg(test)]
mod scenario_tests;
pub mod store;

pub use config::{init_tracing, OrchestratorConfig};
pub use confirm::{run_confirmation_protocol, ConfirmationOutcome, ConfirmationPrompt};
pub use contract::ContractClient;
pub use envelope::{AgentRequest, AgentResponse, RequestType, ResponseType};
pub use error::{OrchestratorError, OrchestratorResult};
pub use nonce::NonceTable;
pub use preferences::{PreferenceMirror, Preferences, SignerMode, WalletOrigin};
pub use progress::{emit, generate_request_id, progress_channel, ProgressEvent, ProgressPhase, ProgressReceiver, ProgressSender};
pub use relay::{RelayClient, RelayClientConfig};
pub use store::{AuthenticatorRecord, DerivedAddressRecord, InMemoryStore, RecoveryEmailRecord, Store, UserRecord};
