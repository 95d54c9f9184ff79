//! Signing-session bookkeeping: mint a use- and time-bounded capability that
//! dispenses the wrap-key seed/salt pair to the signer agent, without ever
//! handing over the VRF secret key itself.
//!
//! Not present verbatim in the retrieved source pack — the `sessions`
//! map referenced by `handle_dispense_session_key.rs` has no defining file
//! in the pack. Reconstructed from that handler's call shape plus
//! `config::VRF_SESSION_DEFAULT_TTL_MS`/`VRF_SESSION_DEFAULT_MAX_USES` and
//! spec.md §4.2/§8 (P7: exactly `k` dispenses permitted).

use std::collections::HashMap;

use kdm::encoders::base64_url_encode;
use rand::RngCore;

use crate::config::{VRF_SESSION_DEFAULT_MAX_USES, VRF_SESSION_DEFAULT_TTL_MS};
use crate::error::VrfAgentError;

#[derive(Clone, Debug)]
pub struct SigningSession {
    wrap_key_seed: Vec<u8>,
    wrap_key_salt: Vec<u8>,
    remaining_uses: Option<u32>,
    expires_at_ms: Option<f64>,
}

/// `{active|exhausted|expired|not_found}` from spec.md §4.2/§6.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatusLabel {
    Active,
    Exhausted,
    Expired,
    NotFound,
}

impl SessionStatusLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Exhausted => "exhausted",
            Self::Expired => "expired",
            Self::NotFound => "not_found",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionStatusReport {
    pub label: SessionStatusLabel,
    pub remaining_uses: Option<u32>,
    pub expires_at_ms: Option<f64>,
}

/// In-memory table of minted signing sessions, one per VRF agent instance.
#[derive(Default)]
pub struct SessionTable {
    sessions: HashMap<String, SigningSession>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    /// Mint a new session bound to `session_id`, with `max_uses` (default
    /// [`VRF_SESSION_DEFAULT_MAX_USES`]) dispenses and a TTL of `ttl_ms`
    /// (default [`VRF_SESSION_DEFAULT_TTL_MS`]) from `now_ms`.
    pub fn mint(
        &mut self,
        session_id: &str,
        max_uses: Option<u32>,
        ttl_ms: Option<f64>,
        now_ms: f64,
    ) -> Result<(), VrfAgentError> {
        let mut wrap_key_seed = vec![0u8; 32];
        rand::thread_rng().fill_bytes(&mut wrap_key_seed);
        let mut wrap_key_salt = vec![0u8; 16];
        rand::thread_rng().fill_bytes(&mut wrap_key_salt);

        let ttl = ttl_ms.unwrap_or(VRF_SESSION_DEFAULT_TTL_MS);
        let session = SigningSession {
            wrap_key_seed,
            wrap_key_salt,
            remaining_uses: Some(max_uses.unwrap_or(VRF_SESSION_DEFAULT_MAX_USES)),
            expires_at_ms: Some(now_ms + ttl),
        };

        self.sessions.insert(session_id.to_string(), session);
        Ok(())
    }

    /// Dispense the wrap-key seed/salt for `session_id`, consuming one use.
    /// Returns the base64url-encoded `(seed, salt)` pair.
    pub fn dispense(
        &mut self,
        session_id: &str,
        now_ms: f64,
    ) -> Result<(String, String), VrfAgentError> {
        let session = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| VrfAgentError::SessionNotFound(session_id.to_string()))?;

        if let Some(expires_at_ms) = session.expires_at_ms {
            if now_ms > expires_at_ms {
                self.sessions.remove(session_id);
                return Err(VrfAgentError::SessionExpired(session_id.to_string()));
            }
        }

        if let Some(remaining) = session.remaining_uses {
            if remaining == 0 {
                self.sessions.remove(session_id);
                return Err(VrfAgentError::SessionExhausted(session_id.to_string()));
            }
        }

        let seed_b64u = base64_url_encode(&session.wrap_key_seed);
        let salt_b64u = base64_url_encode(&session.wrap_key_salt);

        if let Some(remaining) = session.remaining_uses.as_mut() {
            *remaining -= 1;
        }

        Ok((seed_b64u, salt_b64u))
    }

    /// `(remaining_uses, expires_at_ms)` for `session_id`, if it still
    /// exists.
    pub fn status(&self, session_id: &str) -> Option<(Option<u32>, Option<f64>)> {
        self.sessions
            .get(session_id)
            .map(|s| (s.remaining_uses, s.expires_at_ms))
    }

    /// Full `{active|exhausted|expired|not_found}` status report (spec.md
    /// §4.2/§6), grounded on `handle_check_session_status.rs`: a session
    /// past `expires_at_ms` is lazily evicted and reported `expired`;
    /// `remaining_uses = Some(0)` reports `exhausted` without eviction
    /// (S3/P7); otherwise `active`.
    pub fn check_status(&mut self, session_id: &str, now_ms: f64) -> SessionStatusReport {
        let Some(session) = self.sessions.get(session_id) else {
            return SessionStatusReport {
                label: SessionStatusLabel::NotFound,
                remaining_uses: None,
                expires_at_ms: None,
            };
        };
        let remaining_uses = session.remaining_uses;
        let expires_at_ms = session.expires_at_ms;

        if let Some(e) = expires_at_ms {
            if now_ms > e {
                self.sessions.remove(session_id);
                return SessionStatusReport {
                    label: SessionStatusLabel::Expired,
                    remaining_uses,
                    expires_at_ms,
                };
            }
        }

        let label = if remaining_uses == Some(0) {
            SessionStatusLabel::Exhausted
        } else {
            SessionStatusLabel::Active
        };
        SessionStatusReport {
            label,
            remaining_uses,
            expires_at_ms,
        }
    }

    pub fn cancel(&mut self, session_id: &str) {
        self.sessions.remove(session_id);
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispense_decrements_remaining_uses_and_then_exhausts() {
        let mut table = SessionTable::new();
        table.mint("s1", Some(2), Some(60_000.0), 0.0).unwrap();

        assert_eq!(table.status("s1"), Some((Some(2), Some(60_000.0))));
        table.dispense("s1", 10.0).unwrap();
        assert_eq!(table.status("s1").unwrap().0, Some(1));
        table.dispense("s1", 20.0).unwrap();
        // exhausted session persists with remaining_uses = Some(0) (S3/P7):
        // status still reports it, rather than looking unminted.
        assert_eq!(table.status("s1"), Some((Some(0), Some(60_000.0))));
        assert!(matches!(
            table.dispense("s1", 30.0),
            Err(VrfAgentError::SessionExhausted(_))
        ));
    }

    #[test]
    fn dispense_rejects_after_ttl_expires() {
        let mut table = SessionTable::new();
        table.mint("s1", Some(5), Some(1_000.0), 0.0).unwrap();
        let result = table.dispense("s1", 1_001.0);
        assert!(matches!(result, Err(VrfAgentError::SessionExpired(_))));
    }

    #[test]
    fn unbounded_uses_never_exhausts_on_use_count() {
        let mut table = SessionTable::new();
        table.mint("s1", None, Some(60_000.0), 0.0).unwrap();
        for i in 0..50 {
            table.dispense("s1", i as f64).unwrap();
        }
        assert!(table.status("s1").is_some());
    }

    #[test]
    fn dispense_on_unknown_session_fails() {
        let mut table = SessionTable::new();
        assert!(matches!(
            table.dispense("missing", 0.0),
            Err(VrfAgentError::SessionNotFound(_))
        ));
    }

    #[test]
    fn check_status_reports_active_then_exhausted_then_expired_then_not_found() {
        let mut table = SessionTable::new();
        table.mint("s1", Some(1), Some(1_000.0), 0.0).unwrap();

        let active = table.check_status("s1", 0.0);
        assert_eq!(active.label, SessionStatusLabel::Active);
        assert_eq!(active.remaining_uses, Some(1));

        table.dispense("s1", 10.0).unwrap();
        let exhausted = table.check_status("s1", 10.0);
        assert_eq!(exhausted.label, SessionStatusLabel::Exhausted);
        assert_eq!(exhausted.remaining_uses, Some(0));

        let expired = table.check_status("s1", 1_001.0);
        assert_eq!(expired.label, SessionStatusLabel::Expired);

        // lazily evicted once expiry is observed
        let not_found = table.check_status("s1", 1_002.0);
        assert_eq!(not_found.label, SessionStatusLabel::NotFound);
    }

    #[test]
    fn check_status_on_unknown_session_is_not_found() {
        let mut table = SessionTable::new();
        let status = table.check_status("missing", 0.0);
        assert_eq!(status.label, SessionStatusLabel::NotFound);
        assert_eq!(status.remaining_uses, None);
        assert_eq!(status.expires_at_ms, None);
    }
}
