//! Base64 helpers and the NEP-461 delegate action prefix/hash.

use base64ct::{Base64, Base64UrlUnpadded, Encoding};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// NEP-461 delegate action borsh prefix (2^30 + 366).
pub const DELEGATE_ACTION_PREFIX: u32 = 1_073_742_190;

pub fn base64_url_encode(data: &[u8]) -> String {
    Base64UrlUnpadded::encode_string(data)
}

pub fn base64_url_decode(data: &str) -> Result<Vec<u8>, String> {
    Base64UrlUnpadded::decode_vec(data).map_err(|e| format!("base64url decode error: {}", e))
}

pub fn base64_standard_encode(data: &[u8]) -> String {
    Base64::encode_string(data)
}

pub fn base64_standard_decode(data: &str) -> Result<Vec<u8>, String> {
    Base64::decode_vec(data).map_err(|e| format!("base64 decode error: {}", e))
}

/// Borsh-encode `prefix` (LE u32) followed by `delegate_borsh`.
pub fn encode_delegate_action(delegate_borsh: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + delegate_borsh.len());
    out.extend_from_slice(&DELEGATE_ACTION_PREFIX.to_le_bytes());
    out.extend_from_slice(delegate_borsh);
    out
}

pub fn hash_delegate_action(delegate_borsh: &[u8]) -> [u8; 32] {
    let encoded = encode_delegate_action(delegate_borsh);
    let mut hasher = Sha256::new();
    hasher.update(&encoded);
    hasher.finalize().into()
}

pub fn hex_encode(data: &[u8]) -> String {
    data.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Recursively sort JSON object keys so two independent re-encodings of the
/// same logical value hash identically regardless of field insertion order.
pub fn alphabetize_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = serde_json::Map::new();
            for key in keys {
                if let Some(child) = map.get(key) {
                    out.insert(key.clone(), alphabetize_json(child));
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(alphabetize_json).collect()),
        other => other.clone(),
    }
}

/// The shared intent-digest algorithm used by both the Confirmation UI Agent
/// (over what it displayed) and the Signer Agent (recomputed from the raw
/// transaction inputs it was asked to sign): alphabetize JSON keys, encode
/// as a compact string, SHA-256, hex-encode. Both sides must reach this
/// function with the same `(receiver_id, actions)` shape for the digests to
/// match; any divergence is a real tamper/mismatch signal, not an artifact
/// of nondeterministic encoding.
pub fn compute_intent_digest_hex(transactions: &Value) -> [u8; 32] {
    let canonical = alphabetize_json(transactions);
    let serialized = serde_json::to_string(&canonical).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(serialized.as_bytes());
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_url_round_trips() {
        let data = b"hello world, this is some binary-ish data \x00\x01\x02";
        let encoded = base64_url_encode(data);
        assert!(!encoded.contains('+') && !encoded.contains('/') && !encoded.contains('='));
        let decoded = base64_url_decode(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn base64_url_rejects_invalid_input() {
        assert!(base64_url_decode("not valid base64url!!").is_err());
    }

    #[test]
    fn base64_url_handles_empty_string() {
        assert_eq!(base64_url_decode("").unwrap(), Vec::<u8>::new());
        assert_eq!(base64_url_encode(&[]), "");
    }

    #[test]
    fn delegate_action_prefix_is_stable() {
        assert_eq!(DELEGATE_ACTION_PREFIX, 1u32 << 30 | 366);
    }

    #[test]
    fn hash_delegate_action_is_deterministic() {
        let payload = b"fake-borsh-bytes";
        assert_eq!(hash_delegate_action(payload), hash_delegate_action(payload));
    }
}
