//! Wrap-key derivation, ChaCha20-Poly1305 AEAD, and PRF-seeded Ed25519 key
//! derivation.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use getrandom::getrandom;
use hkdf::Hkdf;
use log::debug;
use sha2::Sha256;

use crate::config::{
    near_key_salt_for_account, CHACHA20_KEY_SIZE, CHACHA20_NONCE_SIZE, ED25519_HKDF_KEY_INFO,
    ED25519_PRIVATE_KEY_SIZE, ERROR_INVALID_KEY_SIZE, NEAR_KEK_INFO,
};
use crate::encoders::{base64_url_decode, base64_url_encode};
use crate::error::KdmError;

/// Ephemeral wrap key material minted by the VRF agent and delivered to the
/// signer agent over a typed channel. Holds the base64url-encoded
/// WrapKeySeed and its salt, and exposes a helper to derive the KEK.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrapKey {
    pub wrap_key_seed: String,
    pub wrap_key_salt: String,
}

impl WrapKey {
    pub fn derive_kek(&self) -> Result<Vec<u8>, String> {
        derive_kek_from_wrap_key_seed(&self.wrap_key_seed, &self.wrap_key_salt)
            .map_err(|e| format!("WrapKeySeed → KEK derivation failed: {}", e))
    }

    pub fn salt_b64u(&self) -> &str {
        &self.wrap_key_salt
    }
}

/// Derive a KEK from a WrapKeySeed + salt via HKDF-SHA256.
pub fn derive_kek_from_wrap_key_seed(
    wrap_key_seed_b64u: &str,
    wrap_key_salt_b64u: &str,
) -> Result<Vec<u8>, KdmError> {
    let wrap_key_seed = base64_url_decode(wrap_key_seed_b64u)?;
    if wrap_key_seed.is_empty() {
        return Err(KdmError::InvalidInput("Empty WrapKeySeed".to_string()));
    }
    let wrap_key_salt = base64_url_decode(wrap_key_salt_b64u)?;
    let hk = Hkdf::<Sha256>::new(Some(&wrap_key_salt), &wrap_key_seed);
    let mut kek = vec![0u8; CHACHA20_KEY_SIZE];
    hk.expand(NEAR_KEK_INFO, &mut kek)
        .map_err(|_| KdmError::HkdfError)?;
    Ok(kek)
}

/// Result of encrypting plaintext under a ChaCha20-Poly1305 AEAD key.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedDataChaCha20 {
    pub encrypted_data_b64u: String,
    pub chacha20_nonce_b64u: String,
    pub wrap_key_salt_b64u: Option<String>,
}

impl EncryptedDataChaCha20 {
    pub fn with_wrap_key_salt(mut self, wrap_key_salt: &[u8]) -> Self {
        self.wrap_key_salt_b64u = Some(base64_url_encode(wrap_key_salt));
        self
    }
}

/// Encrypt `plaintext` with a 32-byte ChaCha20Poly1305 key and a fresh random
/// 96-bit nonce.
pub fn encrypt_data_chacha20(
    plaintext: &str,
    key_bytes: &[u8],
) -> Result<EncryptedDataChaCha20, String> {
    if key_bytes.len() != CHACHA20_KEY_SIZE {
        return Err(ERROR_INVALID_KEY_SIZE.to_string());
    }

    let key = chacha20poly1305::Key::from_slice(key_bytes);
    let cipher = ChaCha20Poly1305::new(key);

    let mut nonce_bytes = [0u8; 12];
    getrandom(&mut nonce_bytes).map_err(|e| format!("Failed to generate nonce: {}", e))?;
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|e| format!("Encryption error: {}", e))?;

    Ok(EncryptedDataChaCha20 {
        encrypted_data_b64u: base64_url_encode(&ciphertext),
        chacha20_nonce_b64u: base64_url_encode(&nonce_bytes),
        wrap_key_salt_b64u: None,
    })
}

/// Decrypt data previously produced by [`encrypt_data_chacha20`].
pub fn decrypt_data_chacha20(
    encrypted_data_b64u: &str,
    chacha20_nonce_b64u: &str,
    key_bytes: &[u8],
) -> Result<String, String> {
    if key_bytes.len() != CHACHA20_KEY_SIZE {
        return Err(ERROR_INVALID_KEY_SIZE.to_string());
    }

    let key = chacha20poly1305::Key::from_slice(key_bytes);
    let cipher = ChaCha20Poly1305::new(key);

    let nonce_bytes = base64_url_decode(chacha20_nonce_b64u)
        .map_err(|e| format!("Base64 decode error for ChaCha20 nonce: {}", e))?;
    if nonce_bytes.len() != CHACHA20_NONCE_SIZE {
        return Err(format!(
            "Decryption ChaCha20 nonce must be {} bytes.",
            CHACHA20_NONCE_SIZE
        ));
    }
    let nonce = Nonce::from_slice(&nonce_bytes);

    let encrypted_data = base64_url_decode(encrypted_data_b64u)
        .map_err(|e| format!("Base64 decode error for encrypted data: {}", e))?;

    let decrypted_bytes = cipher
        .decrypt(nonce, encrypted_data.as_slice())
        .map_err(|e| format!("Decryption error: {}", e))?;

    String::from_utf8(decrypted_bytes).map_err(|e| format!("UTF-8 decoding error: {}", e))
}

/// Derive an Ed25519 NEAR keypair from the second PRF output, scoped to
/// `account_id` via HKDF salt domain separation. Deterministic: the same
/// `(prf_output_base64, account_id)` pair always yields the same keypair
/// (P1).
pub fn derive_ed25519_key_from_prf_output(
    prf_output_base64: &str,
    account_id: &str,
) -> Result<(String, String), KdmError> {
    let prf_output = base64_url_decode(prf_output_base64)?;
    if prf_output.is_empty() {
        return Err(KdmError::InvalidInput("Empty PRF output".to_string()));
    }

    let ed25519_salt = near_key_salt_for_account(account_id);
    let hk = Hkdf::<Sha256>::new(Some(ed25519_salt.as_bytes()), &prf_output);
    let mut ed25519_key_material = [0u8; ED25519_PRIVATE_KEY_SIZE];
    hk.expand(ED25519_HKDF_KEY_INFO.as_bytes(), &mut ed25519_key_material)
        .map_err(|_| KdmError::HkdfError)?;

    let signing_key = ed25519_dalek::SigningKey::from_bytes(&ed25519_key_material);
    let verifying_key = signing_key.verifying_key();

    let seed_bytes = signing_key.to_bytes();
    let public_key_bytes = verifying_key.to_bytes();

    let mut near_private_key_bytes = Vec::with_capacity(64);
    near_private_key_bytes.extend_from_slice(&seed_bytes);
    near_private_key_bytes.extend_from_slice(&public_key_bytes);

    let near_private_key = format!("ed25519:{}", bs58::encode(&near_private_key_bytes).into_string());
    let near_public_key = format!("ed25519:{}", bs58::encode(&public_key_bytes).into_string());

    debug!("Derived Ed25519 key for account: {}", account_id);
    Ok((near_private_key, near_public_key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kek() -> Vec<u8> {
        vec![7u8; CHACHA20_KEY_SIZE]
    }

    #[test]
    fn chacha20_round_trips() {
        let plaintext = "ed25519:top-secret-private-key-material";
        let encrypted = encrypt_data_chacha20(plaintext, &kek()).unwrap();
        let decrypted = decrypt_data_chacha20(
            &encrypted.encrypted_data_b64u,
            &encrypted.chacha20_nonce_b64u,
            &kek(),
        )
        .unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn chacha20_rejects_wrong_key_size() {
        assert!(encrypt_data_chacha20("x", &[0u8; 16]).is_err());
    }

    #[test]
    fn chacha20_decrypt_fails_on_tampered_ciphertext() {
        let encrypted = encrypt_data_chacha20("hello", &kek()).unwrap();
        let mut tampered = encrypted.clone();
        tampered.encrypted_data_b64u.push('A');
        assert!(decrypt_data_chacha20(&tampered.encrypted_data_b64u, &tampered.chacha20_nonce_b64u, &kek()).is_err());
    }

    #[test]
    fn ed25519_derivation_is_deterministic() {
        let prf = base64_url_encode(&[9u8; 32]);
        let (priv1, pub1) = derive_ed25519_key_from_prf_output(&prf, "alice.near").unwrap();
        let (priv2, pub2) = derive_ed25519_key_from_prf_output(&prf, "alice.near").unwrap();
        assert_eq!(priv1, priv2);
        assert_eq!(pub1, pub2);
        assert!(priv1.starts_with("ed25519:"));
        assert!(pub1.starts_with("ed25519:"));
    }

    #[test]
    fn ed25519_derivation_differs_per_account() {
        let prf = base64_url_encode(&[9u8; 32]);
        let (_, pub_alice) = derive_ed25519_key_from_prf_output(&prf, "alice.near").unwrap();
        let (_, pub_bob) = derive_ed25519_key_from_prf_output(&prf, "bob.near").unwrap();
        assert_ne!(pub_alice, pub_bob);
    }

    #[test]
    fn ed25519_derivation_rejects_empty_prf() {
        assert!(derive_ed25519_key_from_prf_output("", "alice.near").is_err());
    }
}
