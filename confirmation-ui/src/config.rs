//! Configuration constants for the confirmation UI agent.

/// Change this constant and recompile to adjust logging verbosity.
pub const CURRENT_LOG_LEVEL: log::Level = log::Level::Info;

/// Default auto-proceed delay applied when `behavior = autoProceed` but no
/// explicit delay was supplied, matching the upstream default.
pub const DEFAULT_AUTO_PROCEED_DELAY_MS: u32 = 2000;
