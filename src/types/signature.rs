//! Signature types shared between the coordinator, the signer network and
//! the on-ledger verifier.

use serde::{Deserialize, Serialize};

use super::Hash32;

/// A partial signature contribution from one signer node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureShare {
    /// Hash the share signs
    pub message_hash: Hash32,
    /// Contributing node index, 1-based
    pub node_index: u16,
    /// Opaque share bytes
    pub share: Vec<u8>,
}

/// Traditional (r, s, v) signature as produced by the signer network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraditionalSignature {
    #[serde(with = "super::serde_hash32")]
    pub r: Hash32,
    #[serde(with = "super::serde_hash32")]
    pub s: Hash32,
    /// Recovery bit, 2 for even R.y, 3 for odd
    pub v: u8,
}

/// Post-quantum signature material
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantumSignature {
    #[serde(with = "super::serde_bytes_hex")]
    pub signature: Vec<u8>,
    #[serde(with = "super::serde_bytes_hex")]
    pub public_key: Vec<u8>,
}

/// Final signature returned by the coordinator.
///
/// The traditional (r, s, v) is always present; quantum material is attached
/// when post-quantum mode is enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedSignature {
    #[serde(with = "super::serde_hash32")]
    pub r: Hash32,
    #[serde(with = "super::serde_hash32")]
    pub s: Hash32,
    pub v: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantum: Option<QuantumSignature>,
}

impl AggregatedSignature {
    pub fn from_traditional(sig: TraditionalSignature) -> Self {
        Self {
            r: sig.r,
            s: sig.s,
            v: sig.v,
            quantum: None,
        }
    }
}
