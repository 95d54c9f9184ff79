//! Persisted state layout (spec.md §6), treated as a typed key-value
//! store per spec.md §1 Non-goals/OUT OF SCOPE ("IndexedDB persistence
//! (treated as a typed key-value store)"). `Store` is the injectable
//! boundary; `InMemoryStore` is the reference implementation used by
//! tests and anything that doesn't need real persistence.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::preferences::Preferences;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub device_number: u32,
    pub client_near_public_key: String,
    pub last_updated: u64,
    pub passkey_credential_id: String,
    pub encrypted_vrf_keypair: String,
    pub server_encrypted_vrf_keypair: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatorRecord {
    pub device_number: u32,
    pub credential_public_key_cose: String,
    pub transports: Vec<String>,
    pub name: Option<String>,
    pub registered_at: u64,
    pub synced_at: Option<u64>,
    pub vrf_public_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivedAddressRecord {
    pub address: String,
    pub created_at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryEmailRecord {
    pub hash_hex: String,
    pub email_canonical: String,
}

/// Logical persisted state (spec.md §6). Each method corresponds to one
/// of the five top-level tables; composite keys are passed as tuples
/// rather than pre-joined strings so callers can't construct an invalid
/// key by hand.
pub trait Store: Send + Sync {
    fn get_user(&self, account_id: &str) -> Option<UserRecord>;
    fn put_user(&self, account_id: &str, record: UserRecord);

    fn get_authenticator(&self, account_id: &str, credential_id: &str) -> Option<AuthenticatorRecord>;
    fn put_authenticator(&self, account_id: &str, credential_id: &str, record: AuthenticatorRecord);

    fn get_derived_address(&self, account_id: &str, contract_id: &str, path: &str) -> Option<DerivedAddressRecord>;
    fn put_derived_address(&self, account_id: &str, contract_id: &str, path: &str, record: DerivedAddressRecord);

    fn get_recovery_emails(&self, account_id: &str) -> Vec<RecoveryEmailRecord>;
    fn put_recovery_emails(&self, account_id: &str, records: Vec<RecoveryEmailRecord>);

    fn get_preferences(&self, account_id: &str) -> Option<Preferences>;
    fn put_preferences(&self, account_id: &str, preferences: Preferences);
}

#[derive(Default)]
pub struct InMemoryStore {
    users: Mutex<HashMap<String, UserRecord>>,
    authenticators: Mutex<HashMap<(String, String), AuthenticatorRecord>>,
    derived_addresses: Mutex<HashMap<(String, String, String), DerivedAddressRecord>>,
    recovery_emails: Mutex<HashMap<String, Vec<RecoveryEmailRecord>>>,
    preferences: Mutex<HashMap<String, Preferences>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for InMemoryStore {
    fn get_user(&self, account_id: &str) -> Option<UserRecord> {
        self.users.lock().unwrap().get(account_id).cloned()
    }

    fn put_user(&self, account_id: &str, record: UserRecord) {
        self.users.lock().unwrap().insert(account_id.to_string(), record);
    }

    fn get_authenticator(&self, account_id: &str, credential_id: &str) -> Option<AuthenticatorRecord> {
        self.authenticators
            .lock()
            .unwrap()
            .get(&(account_id.to_string(), credential_id.to_string()))
            .cloned()
    }

    fn put_authenticator(&self, account_id: &str, credential_id: &str, record: AuthenticatorRecord) {
        self.authenticators
            .lock()
            .unwrap()
            .insert((account_id.to_string(), credential_id.to_string()), record);
    }

    fn get_derived_address(&self, account_id: &str, contract_id: &str, path: &str) -> Option<DerivedAddressRecord> {
        self.derived_addresses
            .lock()
            .unwrap()
            .get(&(account_id.to_string(), contract_id.to_string(), path.to_string()))
            .cloned()
    }

    fn put_derived_address(&self, account_id: &str, contract_id: &str, path: &str, record: DerivedAddressRecord) {
        self.derived_addresses.lock().unwrap().insert(
            (account_id.to_string(), contract_id.to_string(), path.to_string()),
            record,
        );
    }

    fn get_recovery_emails(&self, account_id: &str) -> Vec<RecoveryEmailRecord> {
        self.recovery_emails
            .lock()
            .unwrap()
            .get(account_id)
            .cloned()
            .unwrap_or_default()
    }

    fn put_recovery_emails(&self, account_id: &str, records: Vec<RecoveryEmailRecord>) {
        self.recovery_emails
            .lock()
            .unwrap()
            .insert(account_id.to_string(), records);
    }

    fn get_preferences(&self, account_id: &str) -> Option<Preferences> {
        self.preferences.lock().unwrap().get(account_id).cloned()
    }

    fn put_preferences(&self, account_id: &str, preferences: Preferences) {
        self.preferences
            .lock()
            .unwrap()
            .insert(account_id.to_string(), preferences);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_store_round_trips_a_user_record() {
        let store = InMemoryStore::new();
        let record = UserRecord {
            device_number: 1,
            client_near_public_key: "ed25519:abc".to_string(),
            last_updated: 1000,
            passkey_credential_id: "cred-1".to_string(),
            encrypted_vrf_keypair: "ciphertext".to_string(),
            server_encrypted_vrf_keypair: None,
        };
        store.put_user("alice.near", record.clone());
        let fetched = store.get_user("alice.near").unwrap();
        assert_eq!(fetched.client_near_public_key, record.client_near_public_key);
    }

    #[test]
    fn missing_keys_return_none_or_empty() {
        let store = InMemoryStore::new();
        assert!(store.get_user("nobody.near").is_none());
        assert!(store.get_recovery_emails("nobody.near").is_empty());
    }
}
