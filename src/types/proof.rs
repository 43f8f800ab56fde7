//! Zero-knowledge proof blob and public-input encoding.
//!
//! The proof system itself is an external collaborator; the bridge treats the
//! proof as an opaque (a, b, c) blob plus an ordered public-input vector.

use serde::{Deserialize, Serialize};

use super::Hash32;

/// Opaque Groth16-shaped proof blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZkProof {
    pub a: [Hash32; 2],
    pub b: [[Hash32; 2]; 2],
    pub c: [Hash32; 2],
    pub protocol: String,
    pub curve: String,
}

impl ZkProof {
    /// All-zero proof used for tiers that carry no proof
    pub fn zero() -> Self {
        Self {
            a: [[0u8; 32]; 2],
            b: [[[0u8; 32]; 2]; 2],
            c: [[0u8; 32]; 2],
            protocol: "groth16".to_string(),
            curve: "bn128".to_string(),
        }
    }

    /// Flatten the proof points for hashing
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(8 * 32);
        for p in &self.a {
            out.extend_from_slice(p);
        }
        for pair in &self.b {
            for p in pair {
                out.extend_from_slice(p);
            }
        }
        for p in &self.c {
            out.extend_from_slice(p);
        }
        out
    }
}

/// Inputs handed to the proof collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofInputs {
    pub amount: u128,
    pub timestamp: u64,
    #[serde(with = "super::serde_hash32")]
    pub merkle_root: Hash32,
    pub tier: u8,
    pub nonce: u64,
    pub source_chain: String,
    pub target_chain: String,
}

/// Proof plus public signals as returned by the prover
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofBundle {
    pub proof: ZkProof,
    pub public_signals: Vec<Hash32>,
}

/// Encode a u128 amount as a 32-byte big-endian word
pub fn amount_word(amount: u128) -> Hash32 {
    let mut w = [0u8; 32];
    w[16..32].copy_from_slice(&amount.to_be_bytes());
    w
}

/// Encode a u64 as a 32-byte big-endian word
pub fn u64_word(value: u64) -> Hash32 {
    let mut w = [0u8; 32];
    w[24..32].copy_from_slice(&value.to_be_bytes());
    w
}

/// Canonical public-input vector layout shared by the orchestrator, the
/// prover and the on-ledger verifier:
/// `[amount, timestamp, merkle_root, tier, nonce]`
pub fn encode_public_inputs(inputs: &ProofInputs) -> Vec<Hash32> {
    vec![
        amount_word(inputs.amount),
        u64_word(inputs.timestamp),
        inputs.merkle_root,
        u64_word(inputs.tier as u64),
        u64_word(inputs.nonce),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_encoding() {
        let w = amount_word(0x01_0000_0000u128);
        assert_eq!(w[27], 1);
        assert!(w[..27].iter().all(|&b| b == 0));

        let t = u64_word(42);
        assert_eq!(t[31], 42);
    }

    #[test]
    fn test_public_input_layout() {
        let inputs = ProofInputs {
            amount: 5,
            timestamp: 1000,
            merkle_root: [9u8; 32],
            tier: 3,
            nonce: 77,
            source_chain: "a".into(),
            target_chain: "b".into(),
        };
        let v = encode_public_inputs(&inputs);
        assert_eq!(v.len(), 5);
        assert_eq!(v[0], amount_word(5));
        assert_eq!(v[2], [9u8; 32]);
        assert_eq!(v[3][31], 3);
    }

    #[test]
    fn test_proof_bytes_length() {
        assert_eq!(ZkProof::zero().to_bytes().len(), 8 * 32);
    }
}
