//! Cross-wallet preference mirroring (spec.md §4.4).
//!
//! When the Orchestrator has access to multiple wallet agents (e.g. an
//! extension-origin instance and a web-origin instance), preference
//! writes are fanned out best-effort to every available agent; reads
//! prefer the agent whose origin owns the account. No direct analogue —
//! this is host-side bookkeeping the wasm worker pair never touches.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use confirmation_ui::ConfirmationConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignerMode {
    LocalSigner,
    ThresholdSigner,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Preferences {
    pub theme: Option<String>,
    pub confirmation_config: ConfirmationConfig,
    pub signer_mode: SignerMode,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: None,
            confirmation_config: ConfirmationConfig::default(),
            signer_mode: SignerMode::LocalSigner,
        }
    }
}

/// Identifies one wallet agent instance reachable from this host document
/// (e.g. `"extension"` or `"web"`). The account(s) each origin owns
/// determines read preference; writes go to every registered origin.
pub trait WalletOrigin: Send + Sync {
    fn id(&self) -> &str;
    fn owns_account(&self, account_id: &str) -> bool;
    /// Best-effort: a write to an unreachable origin is logged and
    /// swallowed, never propagated as a hard failure.
    fn apply_preferences(&self, account_id: &str, preferences: &Preferences);
}

#[derive(Default)]
pub struct PreferenceMirror {
    origins: Vec<Box<dyn WalletOrigin>>,
    local: HashMap<String, Preferences>,
}

impl PreferenceMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_origin(&mut self, origin: Box<dyn WalletOrigin>) {
        self.origins.push(origin);
    }

    /// Fans a preference write out to every registered origin best-effort,
    /// and keeps the local copy authoritative for `read`.
    pub fn write(&mut self, account_id: &str, preferences: Preferences) {
        for origin in &self.origins {
            origin.apply_preferences(account_id, &preferences);
        }
        self.local.insert(account_id.to_string(), preferences);
    }

    /// Reads prefer the origin that owns the account; fall back to the
    /// locally mirrored copy if no origin claims ownership.
    pub fn read(&self, account_id: &str) -> Option<&Preferences> {
        self.local.get(account_id)
    }

    pub fn owning_origin(&self, account_id: &str) -> Option<&str> {
        self.origins
            .iter()
            .find(|o| o.owns_account(account_id))
            .map(|o| o.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct RecordingOrigin {
        name: String,
        owned_account: String,
        writes: Arc<AtomicUsize>,
    }

    impl WalletOrigin for RecordingOrigin {
        fn id(&self) -> &str {
            &self.name
        }
        fn owns_account(&self, account_id: &str) -> bool {
            self.owned_account == account_id
        }
        fn apply_preferences(&self, _account_id: &str, _preferences: &Preferences) {
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn write_fans_out_to_every_registered_origin() {
        let mut mirror = PreferenceMirror::new();
        let web_writes = Arc::new(AtomicUsize::new(0));
        let ext_writes = Arc::new(AtomicUsize::new(0));
        mirror.register_origin(Box::new(RecordingOrigin {
            name: "web".to_string(),
            owned_account: "alice.near".to_string(),
            writes: web_writes.clone(),
        }));
        mirror.register_origin(Box::new(RecordingOrigin {
            name: "extension".to_string(),
            owned_account: "bob.near".to_string(),
            writes: ext_writes.clone(),
        }));

        mirror.write("alice.near", Preferences::default());

        assert_eq!(web_writes.load(Ordering::SeqCst), 1);
        assert_eq!(ext_writes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn owning_origin_picks_the_account_owner() {
        let mut mirror = PreferenceMirror::new();
        mirror.register_origin(Box::new(RecordingOrigin {
            name: "web".to_string(),
            owned_account: "alice.near".to_string(),
            writes: Arc::new(AtomicUsize::new(0)),
        }));
        assert_eq!(mirror.owning_origin("alice.near"), Some("web"));
        assert_eq!(mirror.owning_origin("carol.near"), None);
    }
}
