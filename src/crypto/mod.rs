//! Cryptographic primitives: Schnorr over secp256k1, Lamport one-time
//! signatures, and the canonical hashes shared by the coordinator, the
//! orchestrator and the on-ledger verifier.

pub mod quantum;
pub mod schnorr;
pub mod shamir;

use sha2::{Digest, Sha256};

use crate::types::{proof::amount_word, proof::u64_word, Address, Hash32, ZkProof};

/// Domain tag prefixed to every signed bridge message
pub const PROTOCOL_TAG: &[u8] = b"VEILBRIDGE_V1";

/// SHA-256 of concatenated byte slices
pub fn sha256_concat(parts: &[&[u8]]) -> Hash32 {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Canonical message hash the signer network signs and the ledger verifies.
///
/// Binds the protocol tag, source chain, recipient, amount, timestamp,
/// Merkle root, privacy tier and relay id. Both sides must compute this
/// identically or verification fails.
#[allow(clippy::too_many_arguments)]
pub fn canonical_message_hash(
    source_chain: &str,
    recipient: &Address,
    amount: u128,
    timestamp: u64,
    merkle_root: &Hash32,
    tier: u8,
    relay_id: &Hash32,
) -> Hash32 {
    sha256_concat(&[
        PROTOCOL_TAG,
        source_chain.as_bytes(),
        recipient,
        &amount_word(amount),
        &u64_word(timestamp),
        merkle_root,
        &u64_word(tier as u64),
        relay_id,
    ])
}

/// Replay fingerprint: proof bytes, public inputs, relay id and quantum
/// signature bytes hashed together. Recorded by the ledger so the same
/// submission can never mint twice.
pub fn proof_fingerprint(
    proof: &ZkProof,
    public_inputs: &[Hash32],
    relay_id: &Hash32,
    quantum_signature: &[u8],
) -> Hash32 {
    let proof_bytes = proof.to_bytes();
    let mut hasher = Sha256::new();
    hasher.update(&proof_bytes);
    for input in public_inputs {
        hasher.update(input);
    }
    hasher.update(relay_id);
    hasher.update(quantum_signature);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_hash_binds_every_field() {
        let base = canonical_message_hash("btc", &[1u8; 32], 100, 1000, &[2u8; 32], 2, &[3u8; 32]);
        assert_ne!(
            base,
            canonical_message_hash("eth", &[1u8; 32], 100, 1000, &[2u8; 32], 2, &[3u8; 32])
        );
        assert_ne!(
            base,
            canonical_message_hash("btc", &[1u8; 32], 101, 1000, &[2u8; 32], 2, &[3u8; 32])
        );
        assert_ne!(
            base,
            canonical_message_hash("btc", &[1u8; 32], 100, 1000, &[2u8; 32], 3, &[3u8; 32])
        );
        assert_ne!(
            base,
            canonical_message_hash("btc", &[1u8; 32], 100, 1000, &[2u8; 32], 2, &[4u8; 32])
        );
    }

    #[test]
    fn test_fingerprint_binds_quantum_bytes() {
        let proof = ZkProof::zero();
        let inputs = vec![[1u8; 32], [2u8; 32]];
        let a = proof_fingerprint(&proof, &inputs, &[0u8; 32], &[]);
        let b = proof_fingerprint(&proof, &inputs, &[0u8; 32], &[1, 2, 3]);
        assert_ne!(a, b);
    }
}
