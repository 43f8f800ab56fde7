//! Lamport one-time signatures over SHA-256.
//!
//! Hash-based signatures rest only on preimage resistance, so they stay
//! sound against a quantum adversary. The scheme is strictly one-time: a
//! keypair must sign exactly one digest and then be destroyed.
//!
//! Sizes: secret and public key are 256 pairs of 32-byte values (16 KiB),
//! a signature reveals one value per digest bit (8 KiB).

use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::Zeroizing;

const CHUNK: usize = 32;
const BITS: usize = 256;

/// Length of the secret key and the public key in bytes
pub const KEY_LEN: usize = BITS * 2 * CHUNK;

/// Length of a signature in bytes
pub const SIGNATURE_LEN: usize = BITS * CHUNK;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuantumError {
    #[error("one-time key material already destroyed")]
    KeyDestroyed,
}

/// A Lamport one-time keypair.
///
/// The secret half lives in a [`Zeroizing`] buffer so it is wiped when the
/// keypair is dropped or explicitly destroyed.
pub struct QuantumKeypair {
    secret: Option<Zeroizing<Vec<u8>>>,
    public: Vec<u8>,
}

impl QuantumKeypair {
    /// Generate a fresh one-time keypair from the system RNG
    pub fn generate() -> Self {
        let mut secret = Zeroizing::new(vec![0u8; KEY_LEN]);
        rand::thread_rng().fill_bytes(&mut secret);

        let mut public = vec![0u8; KEY_LEN];
        for i in 0..BITS * 2 {
            let digest = Sha256::digest(&secret[i * CHUNK..(i + 1) * CHUNK]);
            public[i * CHUNK..(i + 1) * CHUNK].copy_from_slice(&digest);
        }

        Self {
            secret: Some(secret),
            public,
        }
    }

    pub fn public_key(&self) -> &[u8] {
        &self.public
    }

    pub fn is_destroyed(&self) -> bool {
        self.secret.is_none()
    }

    /// Sign a 32-byte digest, revealing one secret value per bit
    pub fn sign(&self, digest: &[u8; 32]) -> Result<Vec<u8>, QuantumError> {
        let secret = self.secret.as_ref().ok_or(QuantumError::KeyDestroyed)?;
        let mut signature = vec![0u8; SIGNATURE_LEN];
        for i in 0..BITS {
            let offset = pair_offset(i, bit(digest, i));
            signature[i * CHUNK..(i + 1) * CHUNK]
                .copy_from_slice(&secret[offset..offset + CHUNK]);
        }
        Ok(signature)
    }

    /// Wipe the secret half. Idempotent; subsequent signs fail.
    pub fn destroy(&mut self) {
        // Zeroizing wipes the buffer on drop
        self.secret.take();
    }
}

/// Index into the flat key buffer for bit `i`, branch `b`
fn pair_offset(i: usize, b: u8) -> usize {
    (i * 2 + b as usize) * CHUNK
}

fn bit(digest: &[u8; 32], i: usize) -> u8 {
    (digest[i / 8] >> (7 - i % 8)) & 1
}

/// Check a Lamport signature: each revealed value must hash to the public
/// entry selected by the corresponding digest bit
pub fn verify(digest: &[u8; 32], signature: &[u8], public_key: &[u8]) -> bool {
    if signature.len() != SIGNATURE_LEN || public_key.len() != KEY_LEN {
        return false;
    }
    for i in 0..BITS {
        let revealed = Sha256::digest(&signature[i * CHUNK..(i + 1) * CHUNK]);
        let offset = pair_offset(i, bit(digest, i));
        if revealed.as_slice() != &public_key[offset..offset + CHUNK] {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify_round_trip() {
        let keypair = QuantumKeypair::generate();
        let digest = [0x42u8; 32];
        let sig = keypair.sign(&digest).unwrap();
        assert_eq!(sig.len(), SIGNATURE_LEN);
        assert!(verify(&digest, &sig, keypair.public_key()));
    }

    #[test]
    fn test_wrong_digest_rejected() {
        let keypair = QuantumKeypair::generate();
        let sig = keypair.sign(&[0x42u8; 32]).unwrap();
        assert!(!verify(&[0x43u8; 32], &sig, keypair.public_key()));
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let keypair = QuantumKeypair::generate();
        let digest = [0x42u8; 32];
        let mut sig = keypair.sign(&digest).unwrap();
        sig[100] ^= 0x01;
        assert!(!verify(&digest, &sig, keypair.public_key()));
    }

    #[test]
    fn test_wrong_length_rejected() {
        let keypair = QuantumKeypair::generate();
        let digest = [0u8; 32];
        let sig = keypair.sign(&digest).unwrap();
        assert!(!verify(&digest, &sig[..SIGNATURE_LEN - 1], keypair.public_key()));
        assert!(!verify(&digest, &sig, &keypair.public_key()[..KEY_LEN - 1]));
    }

    #[test]
    fn test_destroy_prevents_signing() {
        let mut keypair = QuantumKeypair::generate();
        assert!(!keypair.is_destroyed());
        keypair.destroy();
        assert!(keypair.is_destroyed());
        assert_eq!(
            keypair.sign(&[0u8; 32]).unwrap_err(),
            QuantumError::KeyDestroyed
        );
        // Idempotent
        keypair.destroy();
    }
}
