//! Threshold signature coordinator.
//!
//! Accumulates k-of-n signature shares per message hash and aggregates
//! exactly once: the pending session is removed from the map in the same
//! critical section that observes the threshold, so concurrent share
//! deliveries can never trigger a second aggregation. The actual
//! reconstruction runs outside the lock.
//!
//! Two signing paths produce the traditional signature: the distributed
//! signer network (share accumulation) and a hardware enclave whose output
//! is only trusted after its attestation verifies. A one-time post-quantum
//! signature can be attached on top of either path.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, info, warn};
use zeroize::Zeroize;

use crate::collaborators::{
    CollaboratorError, EnclaveSigner, SessionAnnouncement, SignerNetwork,
};
use crate::crypto::{quantum, schnorr, shamir};
use crate::types::{
    AggregatedSignature, Hash32, QuantumSignature, SignatureShare, TraditionalSignature,
};

/// Length of one share: a curve-order scalar
const SHARE_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("no active signing session for this hash")]
    NoActiveSession,
    #[error("a signing session for this hash is already in progress")]
    SessionInProgress,
    #[error("duplicate share from node {0}")]
    DuplicateShare(u16),
    #[error("malformed share from node {0}")]
    InvalidShare(u16),
    #[error("completion already registered for this hash")]
    AlreadyRegistered,
    #[error("aggregated signature failed verification")]
    InvalidSignature,
    #[error("enclave attestation rejected")]
    InvalidAttestation,
    #[error("no post-quantum key available; rotate first")]
    QuantumKeyUnavailable,
    #[error("coordinator destroyed")]
    Destroyed,
    #[error("signing session abandoned before completion")]
    SessionAbandoned,
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

/// Which path produces the traditional signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningMode {
    /// k-of-n share accumulation across the signer network
    Threshold,
    /// Hardware enclave, gated on attestation
    Tee,
}

/// Result of feeding one share into the accumulator
#[derive(Debug, PartialEq, Eq)]
pub enum ShareOutcome {
    Accepted { have: usize, need: usize },
    /// This share met the threshold and aggregation ran
    Completed,
}

/// Working copy of secret share material. Overwritten with random bytes and
/// then zeroed when dropped, on every exit path.
struct ScrubBuffer(Vec<u8>);

impl ScrubBuffer {
    fn new(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }

    fn as_array(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&self.0);
        out
    }
}

impl Drop for ScrubBuffer {
    fn drop(&mut self) {
        rand::thread_rng().fill_bytes(&mut self.0);
        self.0.zeroize();
    }
}

type Completion = oneshot::Sender<Result<TraditionalSignature, CoordinatorError>>;

struct PendingSession {
    announcement: SessionAnnouncement,
    shares: Vec<SignatureShare>,
    seen_nodes: HashSet<u16>,
    completion: Option<Completion>,
}

pub struct ThresholdSignatureCoordinator {
    network: Arc<dyn SignerNetwork>,
    enclave: Option<Arc<dyn EnclaveSigner>>,
    pending: Mutex<HashMap<Hash32, PendingSession>>,
    quantum_key: Mutex<Option<quantum::QuantumKeypair>>,
    destroyed: AtomicBool,
}

impl ThresholdSignatureCoordinator {
    pub fn new(network: Arc<dyn SignerNetwork>, enclave: Option<Arc<dyn EnclaveSigner>>) -> Self {
        Self {
            network,
            enclave,
            pending: Mutex::new(HashMap::new()),
            quantum_key: Mutex::new(None),
            destroyed: AtomicBool::new(false),
        }
    }

    /// Produce a signature over `message_hash`. With `with_quantum`, a
    /// one-time post-quantum signature is attached and the key consumed.
    pub async fn sign_hash(
        &self,
        message_hash: Hash32,
        mode: SigningMode,
        with_quantum: bool,
    ) -> Result<AggregatedSignature, CoordinatorError> {
        self.ensure_alive()?;

        let traditional = match mode {
            SigningMode::Threshold => self.sign_threshold(message_hash).await?,
            SigningMode::Tee => self.sign_tee(&message_hash).await?,
        };

        let quantum = if with_quantum {
            Some(self.sign_quantum(&message_hash).await?)
        } else {
            None
        };

        let mut signature = AggregatedSignature::from_traditional(traditional);
        signature.quantum = quantum;
        Ok(signature)
    }

    async fn sign_threshold(
        &self,
        message_hash: Hash32,
    ) -> Result<TraditionalSignature, CoordinatorError> {
        let announcement = self.start_session(message_hash).await?;
        let receiver = self.register_completion(&message_hash).await?;

        let shares = match self
            .network
            .collect_shares(&announcement, &message_hash)
            .await
        {
            Ok(shares) => shares,
            Err(err) => {
                self.abandon_session(&message_hash).await;
                return Err(err.into());
            }
        };

        for share in shares {
            match self.handle_signature_share(share).await {
                Ok(ShareOutcome::Completed) => break,
                Ok(ShareOutcome::Accepted { .. }) => {}
                // Stragglers after completion are expected
                Err(CoordinatorError::NoActiveSession) => break,
                Err(err) => {
                    warn!(error = %err, "share rejected");
                }
            }
        }

        receiver.await.map_err(|_| CoordinatorError::SessionAbandoned)?
    }

    /// Open a session with the signer network and start accumulating
    pub async fn start_session(
        &self,
        message_hash: Hash32,
    ) -> Result<SessionAnnouncement, CoordinatorError> {
        self.ensure_alive()?;
        let announcement = self.network.open_session(&message_hash).await?;

        let mut pending = self.pending.lock().await;
        if pending.contains_key(&message_hash) {
            return Err(CoordinatorError::SessionInProgress);
        }
        pending.insert(
            message_hash,
            PendingSession {
                announcement: announcement.clone(),
                shares: Vec::new(),
                seen_nodes: HashSet::new(),
                completion: None,
            },
        );
        Ok(announcement)
    }

    /// Register for the session's completion signal. At most one waiter per
    /// session.
    pub async fn register_completion(
        &self,
        message_hash: &Hash32,
    ) -> Result<oneshot::Receiver<Result<TraditionalSignature, CoordinatorError>>, CoordinatorError>
    {
        let mut pending = self.pending.lock().await;
        let session = pending
            .get_mut(message_hash)
            .ok_or(CoordinatorError::NoActiveSession)?;
        if session.completion.is_some() {
            return Err(CoordinatorError::AlreadyRegistered);
        }
        let (sender, receiver) = oneshot::channel();
        session.completion = Some(sender);
        Ok(receiver)
    }

    /// Feed one share into the accumulator.
    ///
    /// Append, dedup, threshold check and session removal happen as one
    /// atomic unit under the session lock; the aggregation itself runs
    /// after the lock is released.
    pub async fn handle_signature_share(
        &self,
        share: SignatureShare,
    ) -> Result<ShareOutcome, CoordinatorError> {
        self.ensure_alive()?;

        let ready = {
            let mut pending = self.pending.lock().await;
            let session = pending
                .get_mut(&share.message_hash)
                .ok_or(CoordinatorError::NoActiveSession)?;

            if share.share.len() != SHARE_LEN {
                return Err(CoordinatorError::InvalidShare(share.node_index));
            }
            // Node indices run 1..=N
            if share.node_index == 0
                || share.node_index as usize > session.announcement.total_nodes
            {
                return Err(CoordinatorError::InvalidShare(share.node_index));
            }
            if !session.seen_nodes.insert(share.node_index) {
                return Err(CoordinatorError::DuplicateShare(share.node_index));
            }
            session.shares.push(share.clone());

            let have = session.shares.len();
            let need = session.announcement.threshold;
            if have < need {
                debug!(node = share.node_index, have, need, "share accepted");
                return Ok(ShareOutcome::Accepted { have, need });
            }
            // Threshold met: take the whole session out so no other caller
            // can aggregate it again
            pending.remove(&share.message_hash)
        };

        let session = ready.ok_or(CoordinatorError::NoActiveSession)?;
        let result = self.aggregate(&share.message_hash, &session);
        if let Some(completion) = session.completion {
            // Receiver may have gone away; aggregation still counts as done
            let _ = completion.send(result);
        }
        info!(hash = %hex::encode(share.message_hash), "threshold reached, signature aggregated");
        Ok(ShareOutcome::Completed)
    }

    /// Reconstruct the response scalar from the collected shares and verify
    /// the assembled signature against the group key
    fn aggregate(
        &self,
        message_hash: &Hash32,
        session: &PendingSession,
    ) -> Result<TraditionalSignature, CoordinatorError> {
        // Working copies of the share scalars live in scrub buffers
        let buffers: Vec<(u16, ScrubBuffer)> = session
            .shares
            .iter()
            .map(|share| (share.node_index, ScrubBuffer::new(&share.share)))
            .collect();
        let points: Vec<(u16, [u8; 32])> = buffers
            .iter()
            .map(|(index, buffer)| (*index, buffer.as_array()))
            .collect();
        let s = shamir::reconstruct(&points);
        drop(buffers);

        let signature = TraditionalSignature {
            r: session.announcement.r,
            s,
            v: session.announcement.v,
        };
        let (px, py) = self.network.group_public_key();
        if !schnorr::verify(message_hash, &px, &py, signature.v, &signature.r, &signature.s) {
            return Err(CoordinatorError::InvalidSignature);
        }
        Ok(signature)
    }

    async fn abandon_session(&self, message_hash: &Hash32) {
        self.pending.lock().await.remove(message_hash);
    }

    /// Enclave path: the output is trusted only after the attestation over
    /// SHA-256(hash ‖ r ‖ s) verifies under the enclave identity key
    async fn sign_tee(&self, message_hash: &Hash32) -> Result<TraditionalSignature, CoordinatorError> {
        let enclave = self
            .enclave
            .as_ref()
            .ok_or_else(|| CollaboratorError::Signing("no enclave configured".into()))?;
        let output = enclave.sign(message_hash).await?;

        if output.attestation.len() != 65 {
            return Err(CoordinatorError::InvalidAttestation);
        }
        let attested: Hash32 = {
            let mut hasher = Sha256::new();
            hasher.update(message_hash);
            hasher.update(output.signature.r);
            hasher.update(output.signature.s);
            hasher.finalize().into()
        };
        let ar: [u8; 32] = output.attestation[0..32]
            .try_into()
            .map_err(|_| CoordinatorError::InvalidAttestation)?;
        let asig: [u8; 32] = output.attestation[32..64]
            .try_into()
            .map_err(|_| CoordinatorError::InvalidAttestation)?;
        let (ax, ay) = enclave.attestation_key();
        if !schnorr::verify(&attested, &ax, &ay, output.attestation[64], &ar, &asig) {
            return Err(CoordinatorError::InvalidAttestation);
        }

        // The enclave signs under the same group key as the network
        let (px, py) = self.network.group_public_key();
        if !schnorr::verify(
            message_hash,
            &px,
            &py,
            output.signature.v,
            &output.signature.r,
            &output.signature.s,
        ) {
            return Err(CoordinatorError::InvalidSignature);
        }
        Ok(output.signature)
    }

    /// Install a fresh one-time post-quantum key; returns the SHA-256 of
    /// its public key for on-ledger registration
    pub async fn rotate_quantum_key(&self) -> Result<Hash32, CoordinatorError> {
        self.ensure_alive()?;
        let keypair = quantum::QuantumKeypair::generate();
        let key_hash: Hash32 = Sha256::digest(keypair.public_key()).into();
        *self.quantum_key.lock().await = Some(keypair);
        Ok(key_hash)
    }

    /// Sign with the one-time key and consume it
    async fn sign_quantum(
        &self,
        message_hash: &Hash32,
    ) -> Result<QuantumSignature, CoordinatorError> {
        let mut slot = self.quantum_key.lock().await;
        let mut keypair = slot.take().ok_or(CoordinatorError::QuantumKeyUnavailable)?;
        let signature = keypair
            .sign(message_hash)
            .map_err(|_| CoordinatorError::QuantumKeyUnavailable)?;
        let public_key = keypair.public_key().to_vec();
        keypair.destroy();
        Ok(QuantumSignature {
            signature,
            public_key,
        })
    }

    pub fn verify_quantum_signature(message_hash: &Hash32, signature: &QuantumSignature) -> bool {
        quantum::verify(message_hash, &signature.signature, &signature.public_key)
    }

    /// Wipe key material and drop all pending sessions. Waiters see their
    /// sessions abandoned; further calls fail.
    pub async fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
        if let Some(mut keypair) = self.quantum_key.lock().await.take() {
            keypair.destroy();
        }
        self.pending.lock().await.clear();
        info!("coordinator destroyed");
    }

    fn ensure_alive(&self) -> Result<(), CoordinatorError> {
        if self.destroyed.load(Ordering::SeqCst) {
            return Err(CoordinatorError::Destroyed);
        }
        Ok(())
    }
}
