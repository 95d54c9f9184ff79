//! Per-(account, public-key) nonce reservation table (spec.md §4.4, §5, P6).
//!
//! No direct analogue: the wasm worker pair never owns chain nonces, that
//! bookkeeping lives host-side. Built directly from spec.md's description,
//! in the style of `fastnear-near-outlayer`'s coordinator state (an
//! async-`Mutex`-guarded map behind a small owning struct, `tokio`).

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::error::{OrchestratorError, OrchestratorResult};

#[derive(Debug, Clone, Default)]
struct NonceState {
    /// Highest nonce value confirmed on-chain for this key.
    known_nonce: u64,
    /// Highest nonce value handed out by `acquire`, whether or not it has
    /// since been confirmed or released.
    reserved_high_water: u64,
    /// Nonces currently checked out and not yet released or reconciled.
    outstanding: Vec<u64>,
}

#[derive(Debug, Hash, Eq, PartialEq, Clone)]
struct NonceKey {
    account_id: String,
    public_key: String,
}

/// Owns one reservation table per `(account_id, public_key)`. Two
/// requests touching the same key serialize on that key's entry; requests
/// for different keys proceed independently (spec.md §5 Ordering
/// guarantees).
#[derive(Debug, Default)]
pub struct NonceTable {
    entries: Mutex<HashMap<NonceKey, NonceState>>,
}

impl NonceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically allocates `n` consecutive nonces starting at
    /// `max(known_nonce, reserved_high_water) + 1`. Returns them in
    /// ascending order (P6: strictly increasing, assigned in input order).
    pub async fn acquire(&self, account_id: &str, public_key: &str, n: u64) -> Vec<u64> {
        if n == 0 {
            return Vec::new();
        }
        let key = NonceKey {
            account_id: account_id.to_string(),
            public_key: public_key.to_string(),
        };
        let mut entries = self.entries.lock().await;
        let state = entries.entry(key).or_default();

        let start = state.known_nonce.max(state.reserved_high_water) + 1;
        let nonces: Vec<u64> = (start..start + n).collect();
        state.outstanding.extend_from_slice(&nonces);
        state.reserved_high_water = start + n - 1;
        nonces
    }

    /// Returns a single reservation to the pool on per-transaction failure.
    pub async fn release(&self, account_id: &str, public_key: &str, nonce: u64) {
        let key = NonceKey {
            account_id: account_id.to_string(),
            public_key: public_key.to_string(),
        };
        let mut entries = self.entries.lock().await;
        if let Some(state) = entries.get_mut(&key) {
            state.outstanding.retain(|n| *n != nonce);
        }
    }

    /// Releases every reservation for this key on catastrophic failure.
    pub async fn release_all(&self, account_id: &str, public_key: &str) {
        let key = NonceKey {
            account_id: account_id.to_string(),
            public_key: public_key.to_string(),
        };
        let mut entries = self.entries.lock().await;
        if let Some(state) = entries.get_mut(&key) {
            state.outstanding.clear();
        }
    }

    /// Reconciles with the on-chain value and prunes stale reservations
    /// older than `NONCE_RECONCILE_HORIZON` below the confirmed nonce.
    pub async fn update_nonce_from_blockchain(&self, account_id: &str, public_key: &str, chain_nonce: u64) {
        let key = NonceKey {
            account_id: account_id.to_string(),
            public_key: public_key.to_string(),
        };
        let mut entries = self.entries.lock().await;
        let state = entries.entry(key).or_default();
        state.known_nonce = state.known_nonce.max(chain_nonce);
        let floor = state
            .known_nonce
            .saturating_sub(crate::config::NONCE_RECONCILE_HORIZON);
        state.outstanding.retain(|n| *n > floor);
    }

    /// The current reservation high-water mark, used by callers to assert
    /// P6's `max reserved <= reservations_after_release` invariant in tests.
    pub async fn reserved_high_water(&self, account_id: &str, public_key: &str) -> u64 {
        let key = NonceKey {
            account_id: account_id.to_string(),
            public_key: public_key.to_string(),
        };
        self.entries
            .lock()
            .await
            .get(&key)
            .map(|s| s.reserved_high_water)
            .unwrap_or(0)
    }

    pub async fn require_no_contention(
        &self,
        account_id: &str,
        public_key: &str,
        expected_next: u64,
    ) -> OrchestratorResult<()> {
        let high_water = self.reserved_high_water(account_id, public_key).await;
        if high_water >= expected_next {
            return Err(OrchestratorError::NonceContention {
                account_id: account_id.to_string(),
                public_key: public_key.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acquire_returns_consecutive_nonces_from_known_floor() {
        let table = NonceTable::new();
        table.update_nonce_from_blockchain("alice.near", "ed25519:P1", 42).await;
        let nonces = table.acquire("alice.near", "ed25519:P1", 3).await;
        assert_eq!(nonces, vec![43, 44, 45]);
    }

    #[tokio::test]
    async fn release_then_acquire_does_not_reuse_high_water() {
        let table = NonceTable::new();
        let first = table.acquire("alice.near", "ed25519:P1", 2).await;
        table.release(&"alice.near".to_string(), "ed25519:P1", first[1]).await;
        let second = table.acquire("alice.near", "ed25519:P1", 1).await;
        assert_eq!(second, vec![3]);
    }

    #[tokio::test]
    async fn release_all_clears_outstanding_but_not_high_water() {
        let table = NonceTable::new();
        table.acquire("alice.near", "ed25519:P1", 3).await;
        table.release_all("alice.near", "ed25519:P1").await;
        let next = table.acquire("alice.near", "ed25519:P1", 1).await;
        assert_eq!(next, vec![4]);
    }

    #[tokio::test]
    async fn independent_keys_do_not_interfere() {
        let table = NonceTable::new();
        let a = table.acquire("alice.near", "ed25519:P1", 1).await;
        let b = table.acquire("bob.near", "ed25519:P2", 1).await;
        assert_eq!(a, vec![1]);
        assert_eq!(b, vec![1]);
    }
}
