//! VRF key manager: the `Locked` / `Unlocked` / `Cleared` state machine at
//! the heart of the VRF agent.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use getrandom::getrandom;
use hkdf::Hkdf;
use log::debug;
use rand_core::SeedableRng;
use sha2::Sha256;
use vrf_wasm::ecvrf::ECVRFKeyPair;
use vrf_wasm::rng::WasmRngFromSeed;
use vrf_wasm::vrf::VRFKeyPair;
use zeroize::ZeroizeOnDrop;

use kdm::encoders::{base64_url_decode, base64_url_encode};

use crate::challenge::generate_vrf_challenge_with_keypair;
use crate::config::{CHACHA20_KEY_SIZE, CHACHA20_NONCE_SIZE, DISPLAY_TRUNCATE_LENGTH, HKDF_CHACHA20_KEY_INFO, HKDF_VRF_KEYPAIR_INFO, VRF_SEED_SIZE};
use crate::error::{AesError, HkdfError, SerializationError, VrfAgentError, VrfResult};
use crate::registration_confirmation::{
    RegistrationCredentialConfirmationRequest, RegistrationCredentialConfirmationResult,
    RegistrationPrompt,
};
use crate::session::{SessionStatusReport, SessionTable};
use crate::shamir3pass::Shamir3Pass;
use crate::types::{
    DeterministicVrfKeypairResponse, EncryptedVRFKeypair, EncryptedVrfKeypairResponse,
    GenerateVrfKeypairBootstrapResponse, VRFChallengeData, VRFInputData, VRFKeypairData,
};

/// Secure VRF keypair wrapper with automatic memory zeroization on drop.
#[derive(ZeroizeOnDrop)]
pub struct SecureVRFKeyPair {
    keypair: ECVRFKeyPair,
}

impl SecureVRFKeyPair {
    pub fn new(keypair: ECVRFKeyPair) -> Self {
        Self { keypair }
    }

    pub fn inner(&self) -> &ECVRFKeyPair {
        &self.keypair
    }

    pub fn secret_key_bytes(&self) -> Vec<u8> {
        self.keypair.secret_key_bytes().to_vec()
    }
}

/// `Locked` (no keypair) / `Unlocked` (keypair + active session) state
/// machine, plus the Shamir 3-pass config and the minted signing-session
/// table.
pub struct VRFKeyManager {
    vrf_keypair: Option<SecureVRFKeyPair>,
    session_active: bool,
    session_start_time_ms: f64,
    shamir3pass: Shamir3Pass,
    sessions: SessionTable,
    relay_server_url: Option<String>,
    apply_lock_route: Option<String>,
    remove_lock_route: Option<String>,
}

impl VRFKeyManager {
    pub fn new(
        shamir_p_b64u: Option<&str>,
        relay_server_url: Option<String>,
        apply_lock_route: Option<String>,
        remove_lock_route: Option<String>,
    ) -> Self {
        let shamir3pass = match shamir_p_b64u {
            Some(p) => Shamir3Pass::new(p).unwrap_or_else(|_| Shamir3Pass::new_default()),
            None => Shamir3Pass::new_default(),
        };

        Self {
            vrf_keypair: None,
            session_active: false,
            session_start_time_ms: 0.0,
            shamir3pass,
            sessions: SessionTable::new(),
            relay_server_url,
            apply_lock_route,
            remove_lock_route,
        }
    }

    pub fn shamir3pass(&self) -> &Shamir3Pass {
        &self.shamir3pass
    }

    pub fn shamir3pass_mut(&mut self) -> &mut Shamir3Pass {
        &mut self.shamir3pass
    }

    pub fn relay_server_url(&self) -> Option<&str> {
        self.relay_server_url.as_deref()
    }

    pub fn apply_lock_route(&self) -> Option<&str> {
        self.apply_lock_route.as_deref()
    }

    pub fn remove_lock_route(&self) -> Option<&str> {
        self.remove_lock_route.as_deref()
    }

    pub fn get_vrf_secret_key_bytes(&self) -> VrfResult<Vec<u8>> {
        if !self.session_active {
            return Err(VrfAgentError::NoVrfKeypair);
        }
        let sk = self.vrf_keypair.as_ref().ok_or(VrfAgentError::NoVrfKeypair)?;
        Ok(sk.secret_key_bytes())
    }

    /// Generate a throwaway VRF keypair before PRF is available, for the
    /// first step of a registration ceremony.
    pub fn generate_vrf_keypair_bootstrap(
        &mut self,
        vrf_input_data: Option<VRFInputData>,
        now_ms: f64,
    ) -> VrfResult<GenerateVrfKeypairBootstrapResponse> {
        debug!("Generating VRF keypair for bootstrapping");

        self.vrf_keypair.take();

        let vrf_keypair = self.generate_vrf_keypair();

        let vrf_public_key_bytes = bincode::serialize(&vrf_keypair.pk)
            .map_err(|e| SerializationError::VrfPublicKeySerialization(format!("{:?}", e)))?;
        let vrf_public_key_b64 = base64_url_encode(&vrf_public_key_bytes);

        self.vrf_keypair = Some(SecureVRFKeyPair::new(vrf_keypair));
        self.session_active = true;
        self.session_start_time_ms = now_ms;

        let mut result = GenerateVrfKeypairBootstrapResponse {
            vrf_public_key: vrf_public_key_b64,
            vrf_challenge_data: None,
        };

        if let Some(vrf_input_data) = vrf_input_data {
            let vrf_keypair = self.vrf_keypair.as_ref().unwrap().inner();
            result.vrf_challenge_data =
                Some(generate_vrf_challenge_with_keypair(vrf_keypair, vrf_input_data)?);
        }

        Ok(result)
    }

    /// Encrypt the in-memory bootstrap keypair with real PRF once WebAuthn
    /// has produced it, after checking the public key hasn't drifted.
    pub fn encrypt_vrf_keypair_with_prf(
        &mut self,
        expected_public_key: String,
        prf_key: Vec<u8>,
    ) -> VrfResult<EncryptedVrfKeypairResponse> {
        debug!(
            "Encrypting VRF keypair with PRF output. Expected public key: {}...",
            &expected_public_key[..DISPLAY_TRUNCATE_LENGTH.min(expected_public_key.len())]
        );

        if !self.session_active || self.vrf_keypair.is_none() {
            return Err(VrfAgentError::NoVrfKeypair);
        }

        let vrf_keypair = self.vrf_keypair.as_ref().unwrap().inner();
        let stored_public_key_bytes = bincode::serialize(&vrf_keypair.pk)?;
        let stored_public_key = base64_url_encode(&stored_public_key_bytes);

        if stored_public_key != expected_public_key {
            return Err(VrfAgentError::public_key_mismatch(
                &expected_public_key,
                &stored_public_key,
            ));
        }

        let (vrf_public_key, encrypted_vrf_keypair) =
            self.encrypt_vrf_keypair_data(vrf_keypair, &prf_key)?;

        Ok(EncryptedVrfKeypairResponse {
            vrf_public_key,
            encrypted_vrf_keypair,
        })
    }

    pub fn unlock_vrf_keypair(
        &mut self,
        near_account_id: String,
        encrypted_vrf_keypair: EncryptedVRFKeypair,
        prf_key: Vec<u8>,
        now_ms: f64,
    ) -> VrfResult<()> {
        debug!("Unlocking VRF keypair for {}", near_account_id);
        self.vrf_keypair.take();

        let decrypted_keypair = self.decrypt_vrf_keypair(encrypted_vrf_keypair, prf_key)?;

        self.vrf_keypair = Some(SecureVRFKeyPair::new(decrypted_keypair));
        self.session_active = true;
        self.session_start_time_ms = now_ms;

        Ok(())
    }

    pub fn load_plaintext_vrf_keypair(
        &mut self,
        keypair_data: VRFKeypairData,
        now_ms: f64,
    ) -> VrfResult<()> {
        self.vrf_keypair.take();
        let keypair: ECVRFKeyPair = bincode::deserialize(&keypair_data.keypair_bytes)?;
        self.vrf_keypair = Some(SecureVRFKeyPair::new(keypair));
        self.session_active = true;
        self.session_start_time_ms = now_ms;
        Ok(())
    }

    pub fn generate_vrf_challenge(&self, input_data: VRFInputData) -> VrfResult<VRFChallengeData> {
        if !self.session_active || self.vrf_keypair.is_none() {
            return Err(VrfAgentError::VrfNotUnlocked);
        }
        let vrf_keypair = self.vrf_keypair.as_ref().unwrap().inner();
        generate_vrf_challenge_with_keypair(vrf_keypair, input_data)
    }

    pub fn get_vrf_status(&self, now_ms: f64) -> serde_json::Value {
        let session_duration = if self.session_active {
            now_ms - self.session_start_time_ms
        } else {
            0.0
        };
        serde_json::json!({
            "active": self.session_active,
            "sessionDuration": session_duration,
        })
    }

    /// `Unlocked` -> `Cleared`: drop the VRF keypair and every minted
    /// signing session.
    pub fn logout(&mut self) -> VrfResult<()> {
        if self.vrf_keypair.take().is_some() {
            debug!("VRF keypair cleared with zeroization");
        }
        self.session_active = false;
        self.session_start_time_ms = 0.0;
        self.sessions.clear();
        Ok(())
    }

    /// Deterministically derive a VRF keypair from PRF output for account
    /// recovery, optionally generating a challenge immediately.
    pub fn derive_vrf_keypair_from_prf(
        &self,
        prf_output: Vec<u8>,
        near_account_id: String,
        vrf_input_params: Option<VRFInputData>,
    ) -> VrfResult<(DeterministicVrfKeypairResponse, ECVRFKeyPair)> {
        if prf_output.is_empty() {
            return Err(VrfAgentError::empty_prf_output());
        }

        let vrf_keypair = self.generate_vrf_keypair_from_seed(&prf_output, &near_account_id)?;

        let vrf_public_key_bytes = bincode::serialize(&vrf_keypair.pk)
            .map_err(|e| SerializationError::VrfPublicKeySerialization(format!("{:?}", e)))?;
        let vrf_public_key_b64 = base64_url_encode(&vrf_public_key_bytes);

        let (_public_key, encrypted_vrf_keypair) =
            self.encrypt_vrf_keypair_data(&vrf_keypair, &prf_output)?;

        let vrf_challenge_data = vrf_input_params
            .map(|params| generate_vrf_challenge_with_keypair(&vrf_keypair, params))
            .transpose()?;

        let response = DeterministicVrfKeypairResponse {
            vrf_public_key: vrf_public_key_b64,
            vrf_challenge_data,
            encrypted_vrf_keypair: Some(encrypted_vrf_keypair),
            success: true,
            server_encrypted_vrf_keypair: None,
        };

        Ok((response, vrf_keypair))
    }

    pub fn store_vrf_keypair_in_memory(&mut self, vrf_keypair: ECVRFKeyPair, now_ms: f64) {
        self.vrf_keypair.take();
        self.vrf_keypair = Some(SecureVRFKeyPair::new(vrf_keypair));
        self.session_active = true;
        self.session_start_time_ms = now_ms;
    }

    // === Signing-session minting/dispensing (P7) ===

    pub fn mint_signing_session(
        &mut self,
        session_id: &str,
        max_uses: Option<u32>,
        ttl_ms: Option<f64>,
        now_ms: f64,
    ) -> VrfResult<()> {
        if !self.session_active {
            return Err(VrfAgentError::VrfNotUnlocked);
        }
        self.sessions.mint(session_id, max_uses, ttl_ms, now_ms)
    }

    pub fn dispense_session_key(
        &mut self,
        session_id: &str,
        now_ms: f64,
    ) -> VrfResult<(String, String)> {
        self.sessions.dispense(session_id, now_ms)
    }

    pub fn check_session_status(&mut self, session_id: &str, now_ms: f64) -> SessionStatusReport {
        self.sessions.check_status(session_id, now_ms)
    }

    pub fn cancel_signing_session(&mut self, session_id: &str) {
        self.sessions.cancel(session_id);
    }

    /// Drives the registration confirmation UI (spec.md §4.2). Doesn't
    /// touch VRF key state itself — it's a pure confirmation step that
    /// can run before `unlock_vrf_keypair` has ever been called.
    pub async fn registration_credential_confirmation<P: RegistrationPrompt>(
        &self,
        request: RegistrationCredentialConfirmationRequest,
        request_id: String,
        prompt: &P,
    ) -> RegistrationCredentialConfirmationResult {
        crate::registration_confirmation::registration_credential_confirmation(
            request, request_id, prompt,
        )
        .await
    }

    // === Private helpers ===

    fn decrypt_vrf_keypair(
        &self,
        encrypted_vrf_keypair: EncryptedVRFKeypair,
        prf_key: Vec<u8>,
    ) -> VrfResult<ECVRFKeyPair> {
        let hk = Hkdf::<Sha256>::new(None, &prf_key);
        let mut chacha20_key = [0u8; CHACHA20_KEY_SIZE];
        hk.expand(HKDF_CHACHA20_KEY_INFO, &mut chacha20_key)
            .map_err(|_| HkdfError::KeyDerivationFailed)?;

        let encrypted_data = base64_url_decode(&encrypted_vrf_keypair.encrypted_vrf_data_b64u)
            .map_err(SerializationError::Base64Error)?;
        let iv_nonce_bytes = base64_url_decode(&encrypted_vrf_keypair.chacha20_nonce_b64u)
            .map_err(SerializationError::Base64Error)?;

        if iv_nonce_bytes.len() != CHACHA20_NONCE_SIZE {
            return Err(VrfAgentError::InvalidIvLength {
                expected: CHACHA20_NONCE_SIZE,
                actual: iv_nonce_bytes.len(),
            });
        }

        let key = chacha20poly1305::Key::from_slice(&chacha20_key);
        let cipher = ChaCha20Poly1305::new(key);
        let nonce = Nonce::from_slice(&iv_nonce_bytes);

        let decrypted_data = cipher
            .decrypt(nonce, encrypted_data.as_ref())
            .map_err(|e| AesError::DecryptionFailed(e.to_string()))?;

        let keypair_data: VRFKeypairData = bincode::deserialize(&decrypted_data)
            .map_err(|e| SerializationError::KeypairDataDeserialization(e.to_string()))?;

        let keypair: ECVRFKeyPair = bincode::deserialize(&keypair_data.keypair_bytes)
            .map_err(|e| SerializationError::VrfKeypairDeserialization(e.to_string()))?;

        Ok(keypair)
    }

    fn generate_vrf_keypair(&self) -> ECVRFKeyPair {
        let mut rng = WasmRngFromSeed::from_entropy();
        ECVRFKeyPair::generate(&mut rng)
    }

    fn generate_vrf_keypair_from_seed(&self, seed: &[u8], account_id: &str) -> VrfResult<ECVRFKeyPair> {
        let hk = Hkdf::<Sha256>::new(Some(account_id.as_bytes()), seed);
        let mut vrf_seed = [0u8; VRF_SEED_SIZE];
        hk.expand(HKDF_VRF_KEYPAIR_INFO, &mut vrf_seed)
            .map_err(|_| HkdfError::VrfSeedDerivationFailed)?;

        let mut rng = WasmRngFromSeed::from_seed(vrf_seed);
        Ok(ECVRFKeyPair::generate(&mut rng))
    }

    fn encrypt_vrf_keypair_data(
        &self,
        vrf_keypair: &ECVRFKeyPair,
        prf_key: &[u8],
    ) -> VrfResult<(String, EncryptedVRFKeypair)> {
        let vrf_keypair_bytes = bincode::serialize(vrf_keypair)?;
        let vrf_public_key_bytes = bincode::serialize(&vrf_keypair.pk)?;

        let keypair_data = VRFKeypairData {
            keypair_bytes: vrf_keypair_bytes,
            public_key_base64: base64_url_encode(&vrf_public_key_bytes),
        };

        let keypair_data_bytes = bincode::serialize(&keypair_data)
            .map_err(|e| SerializationError::KeypairDataSerialization(format!("{:?}", e)))?;

        let encrypted_keypair = self.encrypt_vrf_keypair(&keypair_data_bytes, prf_key)?;

        Ok((base64_url_encode(&vrf_public_key_bytes), encrypted_keypair))
    }

    fn encrypt_vrf_keypair(&self, data: &[u8], key: &[u8]) -> VrfResult<EncryptedVRFKeypair> {
        let hk = Hkdf::<Sha256>::new(None, key);
        let mut chacha20_key = [0u8; CHACHA20_KEY_SIZE];
        hk.expand(HKDF_CHACHA20_KEY_INFO, &mut chacha20_key)
            .map_err(|_| HkdfError::KeyDerivationFailed)?;

        let key_slice = chacha20poly1305::Key::from_slice(&chacha20_key);
        let cipher = ChaCha20Poly1305::new(key_slice);

        let mut iv_nonce_bytes = [0u8; CHACHA20_NONCE_SIZE];
        getrandom(&mut iv_nonce_bytes)
            .map_err(|e| AesError::IvGenerationFailed(e.to_string()))?;
        let nonce = Nonce::from_slice(&iv_nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, data)
            .map_err(|e| AesError::EncryptionFailed(e.to_string()))?;

        Ok(EncryptedVRFKeypair {
            encrypted_vrf_data_b64u: base64_url_encode(&ciphertext),
            chacha20_nonce_b64u: base64_url_encode(&iv_nonce_bytes),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(user_id: &str) -> VRFInputData {
        VRFInputData {
            user_id: user_id.to_string(),
            rp_id: "example.com".to_string(),
            block_height: "100".to_string(),
            block_hash: bs58::encode([1u8; 32]).into_string(),
            intent_digest: None,
            session_policy_digest_32: None,
        }
    }

    #[test]
    fn bootstrap_then_encrypt_with_prf_round_trips_through_unlock() {
        let mut mgr = VRFKeyManager::new(None, None, None, None);
        let bootstrap = mgr
            .generate_vrf_keypair_bootstrap(None, 0.0)
            .unwrap();

        let prf_key = vec![4u8; 32];
        let encrypted = mgr
            .encrypt_vrf_keypair_with_prf(bootstrap.vrf_public_key.clone(), prf_key.clone())
            .unwrap();
        assert_eq!(encrypted.vrf_public_key, bootstrap.vrf_public_key);

        mgr.logout().unwrap();
        assert!(mgr.generate_vrf_challenge(input("alice.near")).is_err());

        mgr.unlock_vrf_keypair(
            "alice.near".to_string(),
            encrypted.encrypted_vrf_keypair,
            prf_key,
            1000.0,
        )
        .unwrap();

        let challenge = mgr.generate_vrf_challenge(input("alice.near")).unwrap();
        assert_eq!(challenge.vrf_public_key, bootstrap.vrf_public_key);
    }

    #[test]
    fn encrypt_with_prf_rejects_public_key_mismatch() {
        let mut mgr = VRFKeyManager::new(None, None, None, None);
        mgr.generate_vrf_keypair_bootstrap(None, 0.0).unwrap();
        let result = mgr.encrypt_vrf_keypair_with_prf("not-the-right-key".to_string(), vec![1u8; 32]);
        assert!(matches!(result, Err(VrfAgentError::PublicKeyMismatch { .. })));
    }

    #[test]
    fn derive_from_prf_is_deterministic_per_account() {
        let mgr = VRFKeyManager::new(None, None, None, None);
        let prf = vec![7u8; 32];
        let (r1, _) = mgr
            .derive_vrf_keypair_from_prf(prf.clone(), "alice.near".to_string(), None)
            .unwrap();
        let (r2, _) = mgr
            .derive_vrf_keypair_from_prf(prf, "alice.near".to_string(), None)
            .unwrap();
        assert_eq!(r1.vrf_public_key, r2.vrf_public_key);
    }

    #[test]
    fn session_lifecycle_respects_bounds() {
        let mut mgr = VRFKeyManager::new(None, None, None, None);
        mgr.generate_vrf_keypair_bootstrap(None, 0.0).unwrap();

        mgr.mint_signing_session("sess-1", Some(1), Some(10_000.0), 0.0)
            .unwrap();
        assert!(mgr.dispense_session_key("sess-1", 1.0).is_ok());
        assert!(mgr.dispense_session_key("sess-1", 2.0).is_err());
    }

    #[test]
    fn mint_requires_unlocked_state() {
        let mut mgr = VRFKeyManager::new(None, None, None, None);
        assert!(mgr.mint_signing_session("sess-1", None, None, 0.0).is_err());
    }

    struct AlwaysApprove;
    impl RegistrationPrompt for AlwaysApprove {
        async fn await_registration_decision(
            &self,
            _request: &RegistrationCredentialConfirmationRequest,
        ) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn registration_confirmation_runs_before_the_keypair_is_unlocked() {
        let mgr = VRFKeyManager::new(None, None, None, None);
        let request = RegistrationCredentialConfirmationRequest {
            near_account_id: "alice.near".to_string(),
            device_number: 1,
            contract_id: Some("webauthn.near".to_string()),
            near_rpc_url: "https://rpc.mainnet.near.org".to_string(),
            confirmation_config: confirmation_ui::ConfirmationConfig::default(),
        };

        let result = mgr
            .registration_credential_confirmation(request, "req-1".to_string(), &AlwaysApprove)
            .await;

        assert!(result.confirmed);
        assert_eq!(result.intent_digest, "register:alice.near:1");
    }
}
