//! Token sealing for the session store.
//!
//! One key is derived per process from a fixed passphrase and salt; the
//! cipher holds it for its whole lifetime and wipes it on drop. Sealing is
//! AES-256-GCM under a fresh random nonce, with the auth tag left appended
//! to the ciphertext the way `ring` emits it, so [`SealedData`] carries
//! exactly two parts.

use std::num::NonZeroU32;

use ring::aead::{self, Aad, BoundKey, Nonce, NonceSequence, UnboundKey, AES_256_GCM};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroize;

use crate::types::errors::CryptoError;
use crate::types::identity::SealedData;

/// PBKDF2 iteration count for key derivation.
const PBKDF2_ITERATIONS: u32 = 100_000;

/// AES-256-GCM key length in bytes.
const KEY_LENGTH: usize = 32;

/// AES-256-GCM nonce length in bytes.
const NONCE_LENGTH: usize = 12;

/// AES-256-GCM authentication tag length in bytes.
const TAG_LENGTH: usize = 16;

/// Trait defining the sealing operations the session provider needs.
pub trait SessionCipherTrait {
    /// Seals plaintext under a fresh random nonce.
    fn seal(&self, plaintext: &[u8]) -> Result<SealedData, CryptoError>;

    /// Opens data produced by [`SessionCipherTrait::seal`].
    fn open(&self, sealed: &SealedData) -> Result<Vec<u8>, CryptoError>;
}

/// One-shot nonce sequence; `ring` insists on a sequence even for a single
/// seal or open.
struct OneShotNonce(Option<[u8; NONCE_LENGTH]>);

impl NonceSequence for OneShotNonce {
    fn advance(&mut self) -> Result<Nonce, ring::error::Unspecified> {
        self.0
            .take()
            .map(Nonce::assume_unique_for_key)
            .ok_or(ring::error::Unspecified)
    }
}

/// AES-256-GCM cipher bound to one derived key.
pub struct SessionCipher {
    key: Vec<u8>,
    rng: SystemRandom,
}

impl SessionCipher {
    /// Wraps raw key bytes, rejecting anything but a full-length key.
    pub fn from_key(key: Vec<u8>) -> Result<Self, CryptoError> {
        if key.len() != KEY_LENGTH {
            return Err(CryptoError::InvalidKey(format!(
                "need {} key bytes, got {}",
                KEY_LENGTH,
                key.len()
            )));
        }
        Ok(Self {
            key,
            rng: SystemRandom::new(),
        })
    }

    /// Derives the key from a passphrase and salt with PBKDF2-HMAC-SHA256.
    ///
    /// Deterministic, so a session sealed in one run can be opened in the
    /// next.
    pub fn derive(passphrase: &str, salt: &[u8]) -> Result<Self, CryptoError> {
        let iterations = NonZeroU32::new(PBKDF2_ITERATIONS)
            .ok_or_else(|| CryptoError::KeyDerivation("iteration count is zero".to_string()))?;

        let mut key = vec![0u8; KEY_LENGTH];
        pbkdf2::derive(
            pbkdf2::PBKDF2_HMAC_SHA256,
            iterations,
            salt,
            passphrase.as_bytes(),
            &mut key,
        );

        Self::from_key(key)
    }

    fn fresh_nonce(&self) -> Result<[u8; NONCE_LENGTH], CryptoError> {
        let mut nonce = [0u8; NONCE_LENGTH];
        self.rng
            .fill(&mut nonce)
            .map_err(|_| CryptoError::RandomGeneration("nonce generation failed".to_string()))?;
        Ok(nonce)
    }
}

impl SessionCipherTrait for SessionCipher {
    fn seal(&self, plaintext: &[u8]) -> Result<SealedData, CryptoError> {
        let nonce = self.fresh_nonce()?;

        let unbound = UnboundKey::new(&AES_256_GCM, &self.key)
            .map_err(|_| CryptoError::Encryption("sealing key rejected".to_string()))?;
        let mut sealing_key = aead::SealingKey::new(unbound, OneShotNonce(Some(nonce)));

        let mut in_out = plaintext.to_vec();
        sealing_key
            .seal_in_place_append_tag(Aad::empty(), &mut in_out)
            .map_err(|_| CryptoError::Encryption("seal operation failed".to_string()))?;

        Ok(SealedData {
            ciphertext: in_out,
            nonce: nonce.to_vec(),
        })
    }

    fn open(&self, sealed: &SealedData) -> Result<Vec<u8>, CryptoError> {
        if sealed.nonce.len() != NONCE_LENGTH {
            return Err(CryptoError::Decryption(format!(
                "need {} nonce bytes, got {}",
                NONCE_LENGTH,
                sealed.nonce.len()
            )));
        }
        if sealed.ciphertext.len() < TAG_LENGTH {
            return Err(CryptoError::Decryption(
                "ciphertext shorter than the auth tag".to_string(),
            ));
        }

        let mut nonce = [0u8; NONCE_LENGTH];
        nonce.copy_from_slice(&sealed.nonce);

        let unbound = UnboundKey::new(&AES_256_GCM, &self.key)
            .map_err(|_| CryptoError::Decryption("opening key rejected".to_string()))?;
        let mut opening_key = aead::OpeningKey::new(unbound, OneShotNonce(Some(nonce)));

        let mut in_out = sealed.ciphertext.clone();
        let plaintext = opening_key
            .open_in_place(Aad::empty(), &mut in_out)
            .map_err(|_| {
                CryptoError::Decryption("open failed: wrong key or corrupted data".to_string())
            })?;

        Ok(plaintext.to_vec())
    }
}

impl Drop for SessionCipher {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}
