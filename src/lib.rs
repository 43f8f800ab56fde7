//! veilbridge - privacy-preserving cross-chain value transfer.
//!
//! The bridge moves value between chains without exposing who received it,
//! and for higher privacy tiers without exposing how much. Four pieces
//! cooperate:
//!
//! 1. **Policy engine** ([`policy`]) - picks a privacy tier per transfer
//!    from the user's preference, the amount and live chain conditions.
//! 2. **Signature coordinator** ([`coordinator`]) - accumulates k-of-n
//!    signature shares (or drives the TEE path) and aggregates exactly once
//!    per message hash, optionally attaching a one-time post-quantum
//!    signature.
//! 3. **Transfer orchestrator** ([`orchestrator`]) - drives each transfer
//!    through proof generation, signing, broadcast and confirmation.
//! 4. **On-ledger verifier** ([`ledger`]) - the target-chain contract logic
//!    that re-validates everything before minting, with replay protection.
//!
//! External services (oracles, prover, relay directory, signer network,
//! enclave, the ledger itself) sit behind the traits in [`collaborators`].

pub mod collaborators;
pub mod common;
pub mod config;
pub mod coordinator;
pub mod crypto;
pub mod ledger;
pub mod logging;
pub mod orchestrator;
pub mod policy;
pub mod types;
pub mod units;

// Re-exports: root error type
pub use common::{BridgeError, Result};

// Re-exports: configuration
pub use config::{BridgeConfig, ConfigError, Network, SigningBackend};

// Re-exports: core components
pub use coordinator::{CoordinatorError, SigningMode, ThresholdSignatureCoordinator};
pub use ledger::{CallContext, LedgerEvent, MintRequest, OnChainVerifier, VerifierError};
pub use orchestrator::{
    MintParams, OrchestratorConfig, OrchestratorError, TransferOrchestrator,
};
pub use policy::{PolicyDecision, PrivacyPolicyEngine};

// Re-exports: shared types
pub use types::{
    AggregatedSignature, PrivacyTier, PrivacyTierConfig, Transfer, TransferKind, TransferStatus,
};
