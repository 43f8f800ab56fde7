//! Shared data model for the bridge: transfers, tiers, signatures, proofs.

pub mod proof;
pub mod signature;
pub mod tier;
pub mod transfer;

pub use proof::{ProofBundle, ProofInputs, ZkProof};
pub use signature::{AggregatedSignature, QuantumSignature, SignatureShare, TraditionalSignature};
pub use tier::{config_for_raw, PrivacyTier, PrivacyTierConfig};
pub use transfer::{Transfer, TransferKind, TransferStatus, TransferStep};

/// 32-byte account/recipient identifier
pub type Address = [u8; 32];

/// 32-byte hash (message hashes, Merkle roots, relay ids, fingerprints)
pub type Hash32 = [u8; 32];

/// Current unix time in seconds
pub fn unix_now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// Serde helper: [u8; 32] as a hex string
pub mod serde_hash32 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &[u8; 32], ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&hex::encode(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<[u8; 32], D::Error> {
        let s = String::deserialize(de)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("expected 32 bytes"))
    }
}

/// Serde helper: Vec<u8> as a hex string
pub mod serde_bytes_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &[u8], ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&hex::encode(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(de)?;
        hex::decode(&s).map_err(serde::de::Error::custom)
    }
}
