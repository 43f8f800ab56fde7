//! In-process collaborator implementations for tests and the local
//! proof-of-concept mode. They exercise the same code paths as production
//! deployments: real Schnorr shares, real commitment-bound proofs and the
//! real verifier logic behind the ledger seam.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use rand::RngCore;
use sha2::{Digest, Sha256};
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;
use zeroize::Zeroizing;

use super::traits::{
    BridgeLedger, BurnCall, ChainOracle, ConfirmationStatus, EnclaveSigner, EnclaveSignature,
    LockCall, MintCall, ProofProvider, RelayDirectory, SessionAnnouncement, SignerNetwork,
    WithdrawCall,
};
use super::CollaboratorError;
use crate::crypto::{schnorr, shamir, PROTOCOL_TAG};
use crate::ledger::{CallContext, MintRequest, OnChainVerifier};
use crate::types::proof::encode_public_inputs;
use crate::types::{
    unix_now, Address, Hash32, PrivacyTier, ProofBundle, ProofInputs, SignatureShare,
    TraditionalSignature, ZkProof,
};

/// Fixed chain conditions, handy for tests
pub struct StaticChainOracle {
    pub gas_gwei: u64,
    pub congestion: u8,
}

#[async_trait]
impl ChainOracle for StaticChainOracle {
    async fn gas_price_gwei(&self, _chain: &str) -> Result<u64, CollaboratorError> {
        Ok(self.gas_gwei)
    }

    async fn congestion_percent(&self, _chain: &str) -> Result<u8, CollaboratorError> {
        Ok(self.congestion)
    }
}

/// Prover that emits commitment-bound proofs accepted by the default
/// on-ledger verifier
pub struct LocalProver {
    ready: AtomicBool,
}

impl LocalProver {
    pub fn new() -> Self {
        Self {
            ready: AtomicBool::new(false),
        }
    }
}

impl Default for LocalProver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProofProvider for LocalProver {
    async fn init(&self) -> Result<(), CollaboratorError> {
        self.ready.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn prove(&self, inputs: &ProofInputs) -> Result<ProofBundle, CollaboratorError> {
        if !self.ready.load(Ordering::SeqCst) {
            return Err(CollaboratorError::ProverNotInitialized);
        }
        let public_signals = encode_public_inputs(inputs);

        // Derive the a/b points deterministically from the inputs
        let seed: Hash32 = {
            let mut hasher = Sha256::new();
            hasher.update(PROTOCOL_TAG);
            hasher.update(b"local-prover");
            for signal in &public_signals {
                hasher.update(signal);
            }
            hasher.update(inputs.source_chain.as_bytes());
            hasher.update(inputs.target_chain.as_bytes());
            hasher.finalize().into()
        };
        let mut proof = ZkProof::zero();
        let mut point = seed;
        for slot in proof
            .a
            .iter_mut()
            .chain(proof.b.iter_mut().flatten())
        {
            point = Sha256::digest(point).into();
            *slot = point;
        }
        crate::ledger::bind_commitment(&mut proof, &public_signals);

        Ok(ProofBundle {
            proof,
            public_signals,
        })
    }
}

/// How long locally issued relay bindings stay resolvable
pub const RELAY_BINDING_TTL_SECS: u64 = 3_600;

/// Relay directory that derives relay ids locally and registers them with
/// the ledger
pub struct LocalRelayDirectory<L: BridgeLedger> {
    ledger: std::sync::Arc<L>,
}

impl<L: BridgeLedger> LocalRelayDirectory<L> {
    pub fn new(ledger: std::sync::Arc<L>) -> Self {
        Self { ledger }
    }
}

#[async_trait]
impl<L: BridgeLedger> RelayDirectory for LocalRelayDirectory<L> {
    async fn bind(
        &self,
        recipient: &Address,
        tier: PrivacyTier,
    ) -> Result<Hash32, CollaboratorError> {
        let relay_id: Hash32 = if tier.config().use_relay_address {
            // Fresh binding per transfer so submissions are unlinkable
            let mut nonce = [0u8; 16];
            rand::thread_rng().fill_bytes(&mut nonce);
            let mut hasher = Sha256::new();
            hasher.update(PROTOCOL_TAG);
            hasher.update(b"relay");
            hasher.update(recipient);
            hasher.update(nonce);
            hasher.finalize().into()
        } else {
            // Stable pass-through binding; the mint path resolves a relay
            // id for every tier
            let mut hasher = Sha256::new();
            hasher.update(PROTOCOL_TAG);
            hasher.update(b"direct");
            hasher.update(recipient);
            hasher.finalize().into()
        };
        let expires_at = unix_now() + RELAY_BINDING_TTL_SECS;
        self.ledger
            .register_relay(relay_id, *recipient, expires_at)
            .await?;
        Ok(relay_id)
    }
}

struct SignerSession {
    nonce: Zeroizing<[u8; 32]>,
    message_hash: Hash32,
}

/// Signer network simulated in-process: one group secret, Shamir-split
/// response scalars, k-of-n quorum
pub struct LocalSignerNetwork {
    secret: Zeroizing<[u8; 32]>,
    public_key: (Hash32, Hash32),
    threshold: usize,
    total: usize,
    sessions: Mutex<HashMap<String, SignerSession>>,
}

impl LocalSignerNetwork {
    pub fn new(secret: [u8; 32], threshold: usize, total: usize) -> Option<Self> {
        if threshold == 0 || threshold > total {
            return None;
        }
        let public_key = schnorr::public_key(&secret)?;
        Some(Self {
            secret: Zeroizing::new(secret),
            public_key,
            threshold,
            total,
            sessions: Mutex::new(HashMap::new()),
        })
    }
}

#[async_trait]
impl SignerNetwork for LocalSignerNetwork {
    fn group_public_key(&self) -> (Hash32, Hash32) {
        self.public_key
    }

    async fn open_session(
        &self,
        message_hash: &Hash32,
    ) -> Result<SessionAnnouncement, CollaboratorError> {
        let (nonce, r, v) = loop {
            let candidate = schnorr::random_scalar();
            if let Some((r, v)) = schnorr::nonce_point(&candidate) {
                break (candidate, r, v);
            }
        };
        let session_id = format!("sess_{}", uuid::Uuid::new_v4().simple());
        self.sessions.lock().await.insert(
            session_id.clone(),
            SignerSession {
                nonce: Zeroizing::new(nonce),
                message_hash: *message_hash,
            },
        );
        debug!(%session_id, threshold = self.threshold, total = self.total, "signing session opened");
        Ok(SessionAnnouncement {
            session_id,
            r,
            v,
            threshold: self.threshold,
            total_nodes: self.total,
        })
    }

    async fn collect_shares(
        &self,
        session: &SessionAnnouncement,
        message_hash: &Hash32,
    ) -> Result<Vec<SignatureShare>, CollaboratorError> {
        let state = self
            .sessions
            .lock()
            .await
            .remove(&session.session_id)
            .ok_or_else(|| CollaboratorError::Signing("unknown session".into()))?;
        if state.message_hash != *message_hash {
            return Err(CollaboratorError::Signing("session hash mismatch".into()));
        }

        let (_, s, _) = schnorr::sign_with_nonce_bytes(message_hash, &self.secret, &state.nonce)
            .ok_or_else(|| CollaboratorError::Signing("degenerate nonce".into()))?;
        let shares = shamir::split(&s, self.threshold, self.total);
        Ok(shares
            .into_iter()
            .map(|(node_index, share)| SignatureShare {
                message_hash: *message_hash,
                node_index,
                share: share.to_vec(),
            })
            .collect())
    }
}

/// Enclave simulated in-process: custodies the group secret and attests
/// every signature with a separate identity key
pub struct LocalEnclave {
    group_secret: Zeroizing<[u8; 32]>,
    attestation_secret: Zeroizing<[u8; 32]>,
    attestation_key: (Hash32, Hash32),
}

impl LocalEnclave {
    pub fn new(group_secret: [u8; 32], attestation_secret: [u8; 32]) -> Option<Self> {
        schnorr::public_key(&group_secret)?;
        let attestation_key = schnorr::public_key(&attestation_secret)?;
        Some(Self {
            group_secret: Zeroizing::new(group_secret),
            attestation_secret: Zeroizing::new(attestation_secret),
            attestation_key,
        })
    }
}

#[async_trait]
impl EnclaveSigner for LocalEnclave {
    fn attestation_key(&self) -> (Hash32, Hash32) {
        self.attestation_key
    }

    async fn sign(&self, message_hash: &Hash32) -> Result<EnclaveSignature, CollaboratorError> {
        let (r, s, v) = schnorr::sign(message_hash, &self.group_secret)
            .ok_or_else(|| CollaboratorError::Signing("enclave signing failed".into()))?;

        let attested: Hash32 = {
            let mut hasher = Sha256::new();
            hasher.update(message_hash);
            hasher.update(r);
            hasher.update(s);
            hasher.finalize().into()
        };
        let (ar, asig, av) = schnorr::sign(&attested, &self.attestation_secret)
            .ok_or_else(|| CollaboratorError::Signing("attestation signing failed".into()))?;
        let mut attestation = Vec::with_capacity(65);
        attestation.extend_from_slice(&ar);
        attestation.extend_from_slice(&asig);
        attestation.push(av);

        Ok(EnclaveSignature {
            signature: TraditionalSignature { r, s, v },
            attestation,
        })
    }
}

/// Ledger backed by an in-process [`OnChainVerifier`].
///
/// Submissions execute immediately; verifier rejections are recorded as
/// failed transactions and surface through [`BridgeLedger::confirmation`],
/// matching how a real chain reports reverts after broadcast.
pub struct InProcessLedger {
    admin: Address,
    verifier: Mutex<OnChainVerifier>,
    txs: Mutex<HashMap<String, ConfirmationStatus>>,
    next_block: AtomicU64,
}

impl InProcessLedger {
    pub fn new(verifier: OnChainVerifier, admin: Address) -> Self {
        Self {
            admin,
            verifier: Mutex::new(verifier),
            txs: Mutex::new(HashMap::new()),
            next_block: AtomicU64::new(1),
        }
    }

    /// Direct access to the verifier state, for setup and assertions
    pub async fn verifier(&self) -> MutexGuard<'_, OnChainVerifier> {
        self.verifier.lock().await
    }

    fn admin_ctx(&self) -> CallContext {
        CallContext {
            caller: self.admin,
            value: 0,
            timestamp: unix_now(),
        }
    }

    async fn record(
        &self,
        result: Result<(), crate::ledger::VerifierError>,
    ) -> Result<String, CollaboratorError> {
        let tx_ref = format!("tx_{}", uuid::Uuid::new_v4().simple());
        let status = match result {
            Ok(()) => ConfirmationStatus::Confirmed {
                block: self.next_block.fetch_add(1, Ordering::SeqCst),
            },
            Err(err) => ConfirmationStatus::Failed {
                reason: format!("{} (code {})", err, err.code()),
            },
        };
        self.txs.lock().await.insert(tx_ref.clone(), status);
        Ok(tx_ref)
    }
}

#[async_trait]
impl BridgeLedger for InProcessLedger {
    async fn submit_mint(&self, call: MintCall) -> Result<String, CollaboratorError> {
        let ctx = self.admin_ctx();
        let request = MintRequest {
            source_chain: call.source_chain,
            relay_id: call.relay_id,
            amount: call.amount,
            timestamp: call.timestamp,
            merkle_root: call.merkle_root,
            privacy_level: call.privacy_level,
            signature: call.signature,
            proof: call.proof,
            public_inputs: call.public_inputs,
            quantum: call.quantum,
        };
        let result = self
            .verifier
            .lock()
            .await
            .mint_with_proof(&ctx, &request)
            .map(|_| ());
        self.record(result).await
    }

    async fn submit_burn(&self, call: BurnCall) -> Result<String, CollaboratorError> {
        let ctx = CallContext {
            caller: call.caller,
            value: 0,
            timestamp: unix_now(),
        };
        let result = self.verifier.lock().await.burn_to_chain(
            &ctx,
            call.amount,
            &call.target_chain,
            call.recipient_commitment,
        );
        self.record(result).await
    }

    async fn submit_lock(&self, call: LockCall) -> Result<String, CollaboratorError> {
        let ctx = CallContext {
            caller: call.caller,
            value: call.value,
            timestamp: unix_now(),
        };
        let result = self.verifier.lock().await.lock_native_asset(&ctx);
        self.record(result).await
    }

    async fn submit_withdraw(&self, call: WithdrawCall) -> Result<String, CollaboratorError> {
        // The in-process runtime holds the oracle role itself
        let ctx = self.admin_ctx();
        let result = self.verifier.lock().await.withdraw_locked_asset(
            &ctx,
            call.recipient,
            call.amount,
            call.source_tx_hash,
        );
        self.record(result).await
    }

    async fn confirmation(&self, tx_ref: &str) -> Result<ConfirmationStatus, CollaboratorError> {
        self.txs
            .lock()
            .await
            .get(tx_ref)
            .cloned()
            .ok_or_else(|| CollaboratorError::UnknownTx(tx_ref.to_string()))
    }

    async fn register_relay(
        &self,
        relay_id: Hash32,
        recipient: Address,
        expires_at: u64,
    ) -> Result<(), CollaboratorError> {
        let ctx = self.admin_ctx();
        self.verifier
            .lock()
            .await
            .register_relay(&ctx, relay_id, recipient, expires_at)
            .map_err(CollaboratorError::LedgerRejected)
    }
}
