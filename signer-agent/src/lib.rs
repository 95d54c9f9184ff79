//! Signer Agent: owns encrypted NEAR keypairs, constructs NEAR transactions,
//! delegate actions, and NEP-413 signed messages, and produces Ed25519
//! signatures — optionally via a 2-party FROST threshold scheme instead of
//! assembling the plaintext key at all. Never exposes plaintext keys beyond
//! the scope of a single sign call.

pub mod actions;
pub mod config;
pub mod error;
pub mod handlers;
pub mod threshold;
pub mod transaction;
pub mod types;

pub use actions::ActionParams;
pub use error::{SignerAgentError, SignerResult};
