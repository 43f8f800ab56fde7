//! Events emitted by the on-ledger verifier, in execution order.

use serde::{Deserialize, Serialize};

use crate::types::{Address, Hash32};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    MintedWithProof {
        #[serde(with = "crate::types::serde_hash32")]
        recipient: Address,
        amount: u128,
        tier: u8,
        #[serde(with = "crate::types::serde_hash32")]
        fingerprint: Hash32,
    },
    BurnedToChain {
        #[serde(with = "crate::types::serde_hash32")]
        from: Address,
        amount: u128,
        target_chain: String,
        /// Commitment to the destination recipient, never the plain address
        #[serde(with = "crate::types::serde_hash32")]
        recipient_commitment: Hash32,
    },
    NativeAssetLocked {
        #[serde(with = "crate::types::serde_hash32")]
        owner: Address,
        amount: u128,
    },
    LockedAssetWithdrawn {
        #[serde(with = "crate::types::serde_hash32")]
        recipient: Address,
        amount: u128,
        /// Hash of the source-chain transaction that justified the release
        #[serde(with = "crate::types::serde_hash32")]
        tx_hash: Hash32,
    },
    MerkleRootUpdated {
        #[serde(with = "crate::types::serde_hash32")]
        root: Hash32,
    },
    RelayAddressUsed {
        #[serde(with = "crate::types::serde_hash32")]
        relay_id: Hash32,
    },
    PrivacyLevelSet {
        #[serde(with = "crate::types::serde_hash32")]
        account: Address,
        tier: u8,
    },
    RelayRegistered {
        #[serde(with = "crate::types::serde_hash32")]
        relay_id: Hash32,
        #[serde(with = "crate::types::serde_hash32")]
        recipient: Address,
        expires_at: u64,
    },
    OracleAuthorized {
        #[serde(with = "crate::types::serde_hash32")]
        oracle: Address,
    },
    OracleRevoked {
        #[serde(with = "crate::types::serde_hash32")]
        oracle: Address,
    },
    GroupKeyRotated,
    QuantumKeyRotated,
    PausedSet {
        paused: bool,
    },
}
