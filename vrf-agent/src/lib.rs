//! VRF Agent: holds the VRF keypair, walks the `Locked` / `Unlocked` /
//! `Cleared` state machine, generates VRF challenges, mints and dispenses
//! bounded signing sessions, and wraps/unwraps the VRF keypair with the
//! relay server via Shamir 3-pass.

pub mod challenge;
pub mod config;
pub mod error;
pub mod manager;
pub mod registration_confirmation;
pub mod session;
pub mod shamir3pass;
pub mod types;

pub use error::{VrfAgentError, VrfResult};
pub use manager::{SecureVRFKeyPair, VRFKeyManager};
pub use registration_confirmation::{
    RegistrationCredentialConfirmationRequest, RegistrationCredentialConfirmationResult,
    RegistrationPrompt,
};
pub use session::{SessionStatusLabel, SessionStatusReport};
pub use shamir3pass::Shamir3Pass;
