//! Collaborator trait surfaces.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

use super::CollaboratorError;
use crate::types::{
    Address, Hash32, PrivacyTier, ProofBundle, ProofInputs, QuantumSignature, SignatureShare,
    TraditionalSignature, ZkProof,
};

/// Live chain conditions used by the policy engine
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChainOracle: Send + Sync {
    /// Current gas price on `chain`, in gwei
    async fn gas_price_gwei(&self, chain: &str) -> Result<u64, CollaboratorError>;

    /// Current congestion on `chain`, 0..=100
    async fn congestion_percent(&self, chain: &str) -> Result<u8, CollaboratorError>;
}

/// The proof service. `prove` before `init` is an error.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProofProvider: Send + Sync {
    /// Prepare the proving backend (circuit artifacts, keys)
    async fn init(&self) -> Result<(), CollaboratorError>;

    async fn prove(&self, inputs: &ProofInputs) -> Result<ProofBundle, CollaboratorError>;
}

/// Issues relay bindings that stand between the on-ledger recipient and the
/// submitted transaction
#[async_trait]
pub trait RelayDirectory: Send + Sync {
    /// Obtain a relay id bound to `recipient`, registered with the ledger.
    /// Tiers that do not hide the recipient get a direct pass-through
    /// binding; the mint path resolves a relay id either way.
    async fn bind(
        &self,
        recipient: &Address,
        tier: PrivacyTier,
    ) -> Result<Hash32, CollaboratorError>;
}

/// Session parameters announced by the signer network before shares flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionAnnouncement {
    pub session_id: String,
    /// Group nonce point x-coordinate
    #[serde(with = "crate::types::serde_hash32")]
    pub r: Hash32,
    /// Recovery bit for the nonce point, 2 even / 3 odd
    pub v: u8,
    pub threshold: usize,
    pub total_nodes: usize,
}

/// The distributed signer network
#[async_trait]
pub trait SignerNetwork: Send + Sync {
    /// Group public key (affine x, y) all aggregated signatures verify under
    fn group_public_key(&self) -> (Hash32, Hash32);

    /// Open a signing session for `message_hash`; nodes then emit shares
    async fn open_session(
        &self,
        message_hash: &Hash32,
    ) -> Result<SessionAnnouncement, CollaboratorError>;

    /// Collect the shares the network produced for a session
    async fn collect_shares(
        &self,
        session: &SessionAnnouncement,
        message_hash: &Hash32,
    ) -> Result<Vec<SignatureShare>, CollaboratorError>;
}

/// Enclave output: the signature plus an attestation binding it to the
/// enclave identity key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnclaveSignature {
    pub signature: TraditionalSignature,
    /// Attestation over SHA-256(message_hash ‖ r ‖ s), serialized r ‖ s ‖ v
    #[serde(with = "crate::types::serde_bytes_hex")]
    pub attestation: Vec<u8>,
}

/// Hardware-enclave signing path
#[async_trait]
pub trait EnclaveSigner: Send + Sync {
    /// Attestation public key (affine x, y) the coordinator trusts
    fn attestation_key(&self) -> (Hash32, Hash32);

    async fn sign(&self, message_hash: &Hash32) -> Result<EnclaveSignature, CollaboratorError>;
}

/// Mint submission as sent to the target ledger
#[derive(Debug, Clone)]
pub struct MintCall {
    pub source_chain: String,
    pub relay_id: Hash32,
    pub amount: u128,
    pub timestamp: u64,
    pub merkle_root: Hash32,
    pub privacy_level: u8,
    pub signature: TraditionalSignature,
    pub proof: ZkProof,
    pub public_inputs: Vec<Hash32>,
    pub quantum: Option<QuantumSignature>,
}

#[derive(Debug, Clone)]
pub struct BurnCall {
    pub caller: Address,
    pub amount: u128,
    pub target_chain: String,
    pub recipient_commitment: Hash32,
}

#[derive(Debug, Clone)]
pub struct LockCall {
    pub caller: Address,
    pub value: u128,
}

/// Oracle-initiated release of locked native value; `source_tx_hash` names
/// the transaction on the other chain that justified it
#[derive(Debug, Clone)]
pub struct WithdrawCall {
    pub recipient: Address,
    pub amount: u128,
    pub source_tx_hash: Hash32,
}

/// Outcome of waiting on a submitted transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationStatus {
    Pending,
    Confirmed { block: u64 },
    Failed { reason: String },
}

/// The target ledger as seen by the orchestrator: submit, then await
/// confirmation. Failures after broadcast surface through the confirmation
/// wait, not the submit call.
#[async_trait]
pub trait BridgeLedger: Send + Sync {
    async fn submit_mint(&self, call: MintCall) -> Result<String, CollaboratorError>;

    async fn submit_burn(&self, call: BurnCall) -> Result<String, CollaboratorError>;

    async fn submit_lock(&self, call: LockCall) -> Result<String, CollaboratorError>;

    async fn submit_withdraw(&self, call: WithdrawCall) -> Result<String, CollaboratorError>;

    async fn confirmation(&self, tx_ref: &str) -> Result<ConfirmationStatus, CollaboratorError>;

    /// Register a relay binding, resolvable until `expires_at`, so mint
    /// submissions can use it
    async fn register_relay(
        &self,
        relay_id: Hash32,
        recipient: Address,
        expires_at: u64,
    ) -> Result<(), CollaboratorError>;
}
