//! Shamir 3-pass protocol: commutative modular-exponentiation encryption
//! that lets the client and the relay server cooperatively encrypt/decrypt
//! the VRF keypair without either side ever seeing the other's lock key or
//! the plaintext in the clear.
//!
//! Registration: client generates a random KEK, encrypts the VRF key under
//! it, adds a temporary client lock (KEK_c), the relay server adds its own
//! lock (KEK_cs), the client removes its lock (KEK_s, the value persisted
//! server-side). Login reverses the sequence to recover the original KEK.

use base64ct::{Base64UrlUnpadded, Encoding};
use chacha20poly1305::aead::{generic_array::GenericArray, Aead, Key};
use chacha20poly1305::{ChaCha20Poly1305, KeyInit};
use getrandom::getrandom;
use hkdf::Hkdf;
use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use num_traits::{One, Zero};
use sha2::Sha256;

use crate::config::{
    DEFAULT_SHAMIR_P_B64U, SHAMIR_MIN_PRIME_BITS, SHAMIR_RANDOM_BYTES_OVERHEAD,
    SHAMIR_REJECTION_SAMPLING_MAX_ATTEMPTS,
};
use crate::error::VrfAgentError;

/// Client lock keys for adding/removing locks: `e * d ≡ 1 (mod p-1)`.
#[derive(Clone, Debug)]
pub struct ClientLockKeys {
    pub e: BigUint,
    pub d: BigUint,
}

/// Shamir 3-pass protocol state, parameterized by a shared prime `p`.
#[derive(Clone, Debug)]
pub struct Shamir3Pass {
    p: BigUint,
    p_minus_1: BigUint,
    min_k: BigUint,
    max_k: BigUint,
}

impl Shamir3Pass {
    pub fn new(p_b64u: &str) -> Result<Self, VrfAgentError> {
        let p = decode_biguint_b64u(p_b64u)
            .map_err(|_| VrfAgentError::Shamir3Pass("invalid base64url prime".to_string()))?;
        Self::new_with_biguint(p)
    }

    pub fn new_default() -> Self {
        let p = decode_biguint_b64u(DEFAULT_SHAMIR_P_B64U).expect("default prime is valid");
        Self::new_with_biguint_unchecked(p)
    }

    fn new_with_biguint(p: BigUint) -> Result<Self, VrfAgentError> {
        let bits = p.bits();
        if bits < SHAMIR_MIN_PRIME_BITS as u64 {
            return Err(VrfAgentError::Shamir3Pass(format!(
                "prime too small: {} bits, minimum {}",
                bits, SHAMIR_MIN_PRIME_BITS
            )));
        }
        Ok(Self::new_with_biguint_unchecked(p))
    }

    fn new_with_biguint_unchecked(p: BigUint) -> Self {
        let one = BigUint::one();
        let two = &one + &one;
        let p_minus_1 = &p - &one;
        let p_minus_2 = &p - &two;

        let min_k = if p.bits() >= 1024 {
            BigUint::from(1u128 << 64)
        } else {
            BigUint::from(1u64 << 32)
        };

        Shamir3Pass {
            p,
            p_minus_1,
            min_k,
            max_k: p_minus_2,
        }
    }

    pub fn p(&self) -> &BigUint {
        &self.p
    }

    pub fn p_b64u(&self) -> String {
        encode_biguint_b64u(&self.p)
    }

    pub fn modexp(&self, base: &BigUint, exp: &BigUint) -> BigUint {
        if self.p.is_zero() {
            return BigUint::zero();
        }
        base.modpow(exp, &self.p)
    }

    pub fn modinv(&self, a: &BigUint) -> Option<BigUint> {
        let a_bigint = BigInt::from_biguint(Sign::Plus, a.clone());
        let m_bigint = BigInt::from_biguint(Sign::Plus, self.p_minus_1.clone());

        let (gcd, x, _) = extended_gcd(a_bigint, m_bigint.clone());
        if gcd != BigInt::one() {
            return None;
        }

        let mut x_mod = x % &m_bigint;
        if x_mod.sign() == Sign::Minus {
            x_mod += &m_bigint;
        }
        Some(x_mod.to_biguint().unwrap())
    }

    /// Rejection-sample a random exponent `k` in `[min_k, p-2]` with
    /// `gcd(k, p-1) = 1`.
    pub fn random_k(&self) -> Result<BigUint, VrfAgentError> {
        let range = &self.max_k - &self.min_k;
        let bytes_needed = ((range.bits() + 7) / 8 + SHAMIR_RANDOM_BYTES_OVERHEAD as u64) as usize;

        for _ in 0..SHAMIR_REJECTION_SAMPLING_MAX_ATTEMPTS {
            let mut buf = vec![0u8; bytes_needed];
            getrandom(&mut buf)
                .map_err(|_| VrfAgentError::Shamir3Pass("random generation failed".to_string()))?;

            let candidate = BigUint::from_bytes_be(&buf) % &range;
            let k = &self.min_k + candidate;

            if k.gcd(&self.p_minus_1) == BigUint::one() {
                return Ok(k);
            }
        }

        Err(VrfAgentError::Shamir3Pass(
            "exhausted rejection sampling attempts".to_string(),
        ))
    }

    pub fn generate_lock_keys(&self) -> Result<ClientLockKeys, VrfAgentError> {
        let e = self.random_k()?;
        let d = self
            .modinv(&e)
            .ok_or_else(|| VrfAgentError::Shamir3Pass("no modular inverse".to_string()))?;
        Ok(ClientLockKeys { e, d })
    }

    /// Encrypt `plaintext` with a fresh random KEK, returning
    /// `(ciphertext, kek)`.
    pub fn encrypt_with_random_kek_key(
        &self,
        plaintext: &[u8],
    ) -> Result<(Vec<u8>, BigUint), VrfAgentError> {
        let kek = self.random_k()?;
        let ciphertext = self.encrypt_with_kek(&kek, plaintext)?;
        Ok((ciphertext, kek))
    }

    pub fn decrypt_with_key(
        &self,
        ciphertext: &[u8],
        kek: &BigUint,
    ) -> Result<Vec<u8>, VrfAgentError> {
        self.decrypt_with_kek(kek, ciphertext)
    }

    /// Add a lock: `base^exponent mod p`. `add_lock` and `remove_lock` are
    /// the same modular exponentiation — this identity is exactly the
    /// protocol's commutativity property (P8).
    pub fn add_lock(&self, base: &BigUint, exponent: &BigUint) -> BigUint {
        self.modexp(base, exponent)
    }

    pub fn remove_lock(&self, base: &BigUint, exponent: &BigUint) -> BigUint {
        self.modexp(base, exponent)
    }

    fn derive_aead_key(&self, kek_bytes: &[u8]) -> Result<[u8; 32], VrfAgentError> {
        let hkdf = Hkdf::<Sha256>::new(None, kek_bytes);
        let mut key = [0u8; 32];
        hkdf.expand(crate::config::SHAMIR_AEAD_HKDF_INFO, &mut key)
            .map_err(|_| VrfAgentError::Shamir3Pass("HKDF expansion failed".to_string()))?;
        Ok(key)
    }

    fn encrypt_with_kek(&self, kek: &BigUint, plaintext: &[u8]) -> Result<Vec<u8>, VrfAgentError> {
        let kek_bytes = kek.to_bytes_be();
        let key_bytes = self.derive_aead_key(&kek_bytes)?;

        let cipher = ChaCha20Poly1305::new(Key::<ChaCha20Poly1305>::from_slice(&key_bytes));

        let mut nonce = [0u8; 12];
        getrandom(&mut nonce)
            .map_err(|_| VrfAgentError::Shamir3Pass("random generation failed".to_string()))?;
        let nonce_ga = GenericArray::from_slice(&nonce);

        let ciphertext = cipher
            .encrypt(nonce_ga, plaintext)
            .map_err(|e| VrfAgentError::Shamir3Pass(format!("encryption failed: {}", e)))?;

        let mut result = nonce.to_vec();
        result.extend_from_slice(&ciphertext);
        Ok(result)
    }

    fn decrypt_with_kek(&self, kek: &BigUint, ciphertext: &[u8]) -> Result<Vec<u8>, VrfAgentError> {
        if ciphertext.len() < 12 {
            return Err(VrfAgentError::Shamir3Pass("ciphertext too short".to_string()));
        }

        let (nonce_bytes, ct) = ciphertext.split_at(12);

        let kek_bytes = kek.to_bytes_be();
        let key_bytes = self.derive_aead_key(&kek_bytes)?;

        let cipher = ChaCha20Poly1305::new(Key::<ChaCha20Poly1305>::from_slice(&key_bytes));
        let nonce_ga = GenericArray::from_slice(nonce_bytes);

        cipher
            .decrypt(nonce_ga, ct)
            .map_err(|e| VrfAgentError::Shamir3Pass(format!("decryption failed: {}", e)))
    }
}

fn extended_gcd(a: BigInt, b: BigInt) -> (BigInt, BigInt, BigInt) {
    if b.is_zero() {
        return (a, BigInt::one(), BigInt::zero());
    }
    let (gcd, x1, y1) = extended_gcd(b.clone(), &a % &b);
    let x = y1.clone();
    let y = x1 - (&a / &b) * y1;
    (gcd, x, y)
}

pub fn encode_biguint_b64u(x: &BigUint) -> String {
    Base64UrlUnpadded::encode_string(&x.to_bytes_be())
}

pub fn decode_biguint_b64u(s: &str) -> Result<BigUint, String> {
    let bytes = Base64UrlUnpadded::decode_vec(s).map_err(|_| "invalid base64url".to_string())?;
    Ok(BigUint::from_bytes_be(&bytes))
}

/// The default Shamir prime, base64url-encoded, for configuring a matching
/// relay server.
pub fn default_shamir_p_b64u() -> String {
    DEFAULT_SHAMIR_P_B64U.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locks_are_commutative() {
        let sp = Shamir3Pass::new_default();
        let base = BigUint::from(123456789u64);
        let client_keys = sp.generate_lock_keys().unwrap();
        let server_keys = sp.generate_lock_keys().unwrap();

        // client(server(x)) == server(client(x))
        let client_then_server = sp.add_lock(&sp.add_lock(&base, &client_keys.e), &server_keys.e);
        let server_then_client = sp.add_lock(&sp.add_lock(&base, &server_keys.e), &client_keys.e);
        assert_eq!(client_then_server, server_then_client);
    }

    #[test]
    fn three_pass_round_trip_recovers_original_value() {
        let sp = Shamir3Pass::new_default();
        let original = BigUint::from(42u64);

        let client_keys = sp.generate_lock_keys().unwrap();
        let server_keys = sp.generate_lock_keys().unwrap();

        let kek_c = sp.add_lock(&original, &client_keys.e);
        let kek_cs = sp.add_lock(&kek_c, &server_keys.e);
        let kek_s = sp.remove_lock(&kek_cs, &client_keys.d);

        // Login: re-lock with a fresh client key, server removes its lock, client removes its own.
        let client_keys_2 = sp.generate_lock_keys().unwrap();
        let kek_st = sp.add_lock(&kek_s, &client_keys_2.e);
        let kek_t = sp.remove_lock(&kek_st, &server_keys.d);
        let recovered = sp.remove_lock(&kek_t, &client_keys_2.d);

        assert_eq!(recovered, original);
    }

    #[test]
    fn encrypt_decrypt_round_trips() {
        let sp = Shamir3Pass::new_default();
        let (ciphertext, kek) = sp.encrypt_with_random_kek_key(b"vrf keypair bytes").unwrap();
        let plaintext = sp.decrypt_with_key(&ciphertext, &kek).unwrap();
        assert_eq!(plaintext, b"vrf keypair bytes");
    }

    #[test]
    fn rejects_primes_below_minimum_bits() {
        let small_prime_b64u = encode_biguint_b64u(&BigUint::from(7919u32));
        assert!(Shamir3Pass::new(&small_prime_b64u).is_err());
    }
}
