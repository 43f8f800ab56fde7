//! Transfer records and the per-transfer state machine.
//!
//! Lifecycle: initiated → [proof_generated] → signature_completed →
//! broadcasted → confirmed | failed. Failed is reachable from any
//! non-terminal state and is terminal.

use serde::{Deserialize, Serialize};

use super::{Address, Hash32};
use crate::types::tier::PrivacyTier;

/// Status of a transfer through its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    /// Transfer recorded, nothing submitted yet
    Initiated,
    /// ZK proof obtained from the prover
    ProofGenerated,
    /// Aggregated threshold signature obtained
    SignatureCompleted,
    /// Mint/burn/lock transaction submitted to the ledger
    Broadcasted,
    /// Confirmed on the ledger
    Confirmed,
    /// Aborted; terminal
    Failed,
}

impl TransferStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed)
    }

    /// Whether the state machine allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: TransferStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == TransferStatus::Failed {
            return true;
        }
        matches!(
            (self, next),
            (Self::Initiated, Self::ProofGenerated)
                | (Self::Initiated, Self::SignatureCompleted)
                | (Self::ProofGenerated, Self::SignatureCompleted)
                | (Self::SignatureCompleted, Self::Broadcasted)
                | (Self::Broadcasted, Self::Confirmed)
        )
    }
}

impl std::fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Initiated => "initiated",
            Self::ProofGenerated => "proof_generated",
            Self::SignatureCompleted => "signature_completed",
            Self::Broadcasted => "broadcasted",
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Append-only timestamped snapshot of one state transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferStep {
    pub status: TransferStatus,
    pub timestamp: u64,
    /// Step-specific payload (tier reasons, tx refs, error details)
    pub payload: serde_json::Value,
}

/// Direction of a transfer through the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    Mint,
    Burn,
    Lock,
    Withdraw,
}

/// A transfer record tracking one value movement through its lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transfer {
    /// Unique transfer ID
    pub id: String,
    pub kind: TransferKind,
    pub source_chain: String,
    pub target_chain: String,
    pub recipient: Address,
    /// Amount in wei
    pub amount: u128,
    pub merkle_root: Hash32,
    /// Privacy tier chosen by the policy engine
    pub tier: PrivacyTier,
    pub status: TransferStatus,
    /// Relay binding used to hide the recipient, when the tier requires one
    pub relay_id: Option<Hash32>,
    /// Ledger transaction reference once broadcast
    pub tx_ref: Option<String>,
    /// Block that confirmed the transfer
    pub confirmed_block: Option<u64>,
    /// Append-only step log
    pub steps: Vec<TransferStep>,
    pub created_at: u64,
    pub updated_at: u64,
}

impl Transfer {
    pub fn new(
        kind: TransferKind,
        source_chain: impl Into<String>,
        target_chain: impl Into<String>,
        recipient: Address,
        amount: u128,
        merkle_root: Hash32,
        now: u64,
    ) -> Self {
        let id = format!("xfer_{}", uuid::Uuid::new_v4().simple());
        Self {
            id,
            kind,
            source_chain: source_chain.into(),
            target_chain: target_chain.into(),
            recipient,
            amount,
            merkle_root,
            tier: PrivacyTier::Basic,
            status: TransferStatus::Initiated,
            relay_id: None,
            tx_ref: None,
            confirmed_block: None,
            steps: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Record a transition, appending a timestamped snapshot to the step log.
    ///
    /// Returns false (and leaves the record untouched) when the transition
    /// is not allowed by the state machine.
    pub fn advance(&mut self, status: TransferStatus, payload: serde_json::Value, now: u64) -> bool {
        if !self.status.can_transition_to(status) {
            return false;
        }
        self.status = status;
        self.updated_at = now;
        self.steps.push(TransferStep {
            status,
            timestamp: now,
            payload,
        });
        true
    }

    /// Record the error that terminated this transfer
    pub fn fail(&mut self, stage: &str, error: impl std::fmt::Display, now: u64) {
        self.advance(
            TransferStatus::Failed,
            serde_json::json!({ "stage": stage, "error": error.to_string() }),
            now,
        );
    }
}
