//! Transfer orchestrator: drives a transfer through policy decision, proof
//! generation, threshold signing, broadcast and confirmation, recording
//! every transition in the bounded transfer cache.

pub mod cache;

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde_json::json;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::collaborators::{
    BridgeLedger, BurnCall, CollaboratorError, ConfirmationStatus, LockCall, MintCall,
    ProofProvider, RelayDirectory, WithdrawCall,
};
use crate::coordinator::{CoordinatorError, SigningMode, ThresholdSignatureCoordinator};
use crate::crypto::{canonical_message_hash, PROTOCOL_TAG};
use crate::policy::PrivacyPolicyEngine;
use crate::types::{
    unix_now, Address, Hash32, PrivacyTier, ProofInputs, Transfer, TransferKind, TransferStatus,
    ZkProof,
};

pub use cache::TransferCache;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("transfer {0} not found")]
    NotFound(String),
    #[error("transfer rejected on-ledger: {0}")]
    Rejected(String),
    #[error("transfer not confirmed after {0} attempts")]
    ConfirmationTimeout(u32),
    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

/// Tunables for a deployed orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub source_chain: String,
    pub target_chain: String,
    pub signing_mode: SigningMode,
    pub confirm_attempts: u32,
    pub confirm_interval: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            source_chain: "sourcenet".to_string(),
            target_chain: "targetnet".to_string(),
            signing_mode: SigningMode::Threshold,
            confirm_attempts: 30,
            confirm_interval: Duration::from_millis(500),
        }
    }
}

/// A mint request as accepted from callers
#[derive(Debug, Clone)]
pub struct MintParams {
    pub recipient: Address,
    /// Amount in wei
    pub amount: u128,
    pub merkle_root: Hash32,
    /// Explicit tier choice; None lets the policy engine decide
    pub user_preference: Option<PrivacyTier>,
}

pub struct TransferOrchestrator {
    config: OrchestratorConfig,
    policy: Arc<PrivacyPolicyEngine>,
    coordinator: Arc<ThresholdSignatureCoordinator>,
    prover: Arc<dyn ProofProvider>,
    relays: Arc<dyn RelayDirectory>,
    ledger: Arc<dyn BridgeLedger>,
    cache: Mutex<TransferCache>,
}

impl TransferOrchestrator {
    pub fn new(
        config: OrchestratorConfig,
        policy: Arc<PrivacyPolicyEngine>,
        coordinator: Arc<ThresholdSignatureCoordinator>,
        prover: Arc<dyn ProofProvider>,
        relays: Arc<dyn RelayDirectory>,
        ledger: Arc<dyn BridgeLedger>,
    ) -> Self {
        Self {
            config,
            policy,
            coordinator,
            prover,
            relays,
            ledger,
            cache: Mutex::new(TransferCache::default()),
        }
    }

    /// Current snapshot of a transfer, if still cached
    pub async fn status(&self, id: &str) -> Option<Transfer> {
        self.cache.lock().await.get(id).cloned()
    }

    pub async fn cached_transfers(&self) -> usize {
        self.cache.lock().await.len()
    }

    /// Snapshot of all cached transfers, oldest first
    pub async fn transfers(&self) -> Vec<Transfer> {
        self.cache.lock().await.values().cloned().collect()
    }

    /// Mint bridged value on the target chain.
    ///
    /// Runs the full pipeline and returns the confirmed transfer id; on any
    /// failure the cached record is marked failed with the stage and cause.
    #[instrument(skip(self, params), fields(amount = params.amount))]
    pub async fn mint(&self, params: MintParams) -> Result<String, OrchestratorError> {
        let transfer = Transfer::new(
            TransferKind::Mint,
            self.config.source_chain.clone(),
            self.config.target_chain.clone(),
            params.recipient,
            params.amount,
            params.merkle_root,
            unix_now(),
        );
        let id = transfer.id.clone();
        self.cache.lock().await.insert(transfer);

        match self.run_mint(&id, &params).await {
            Ok(()) => Ok(id),
            Err((stage, err)) => {
                warn!(transfer = %id, %stage, error = %err, "mint failed");
                self.record_failure(&id, stage, &err).await;
                Err(err)
            }
        }
    }

    async fn run_mint(
        &self,
        id: &str,
        params: &MintParams,
    ) -> Result<(), (&'static str, OrchestratorError)> {
        let decision = self
            .policy
            .decide_for_user(
                &self.config.target_chain,
                &params.recipient,
                params.amount,
                params.user_preference,
            )
            .await;
        let tier = decision.tier;
        let tier_config = tier.config();
        self.update(id, |t| {
            t.tier = tier;
            t.steps.push(crate::types::TransferStep {
                status: TransferStatus::Initiated,
                timestamp: unix_now(),
                payload: json!({ "tier": tier.as_u8(), "reasons": decision.reasons }),
            });
        })
        .await;

        let relay_id = self
            .relays
            .bind(&params.recipient, tier)
            .await
            .map_err(|e| ("relay", e.into()))?;
        self.update(id, |t| t.relay_id = Some(relay_id)).await;

        let timestamp = unix_now();
        let (proof, public_inputs) = if tier_config.use_zk_proof {
            let inputs = ProofInputs {
                amount: params.amount,
                timestamp,
                merkle_root: params.merkle_root,
                tier: tier.as_u8(),
                nonce: rand::thread_rng().gen(),
                source_chain: self.config.source_chain.clone(),
                target_chain: self.config.target_chain.clone(),
            };
            let bundle = self
                .prover
                .prove(&inputs)
                .await
                .map_err(|e| ("proof", e.into()))?;
            self.advance(
                id,
                TransferStatus::ProofGenerated,
                json!({ "circuit_size": tier_config.circuit_size }),
            )
            .await;
            (bundle.proof, bundle.public_signals)
        } else {
            (ZkProof::zero(), Vec::new())
        };

        let message_hash = canonical_message_hash(
            &self.config.source_chain,
            &params.recipient,
            params.amount,
            timestamp,
            &params.merkle_root,
            tier.as_u8(),
            &relay_id,
        );
        let signature = self
            .coordinator
            .sign_hash(
                message_hash,
                self.config.signing_mode,
                tier_config.use_post_quantum,
            )
            .await
            .map_err(|e| ("signing", e.into()))?;
        self.advance(
            id,
            TransferStatus::SignatureCompleted,
            json!({ "post_quantum": signature.quantum.is_some() }),
        )
        .await;

        let tx_ref = self
            .ledger
            .submit_mint(MintCall {
                source_chain: self.config.source_chain.clone(),
                relay_id,
                amount: params.amount,
                timestamp,
                merkle_root: params.merkle_root,
                privacy_level: tier.as_u8(),
                signature: crate::types::TraditionalSignature {
                    r: signature.r,
                    s: signature.s,
                    v: signature.v,
                },
                proof,
                public_inputs,
                quantum: signature.quantum,
            })
            .await
            .map_err(|e| ("broadcast", e.into()))?;
        self.update(id, |t| t.tx_ref = Some(tx_ref.clone())).await;
        self.advance(id, TransferStatus::Broadcasted, json!({ "tx_ref": tx_ref }))
            .await;

        let block = self
            .await_confirmation(&tx_ref)
            .await
            .map_err(|e| ("confirmation", e))?;
        self.update(id, |t| t.confirmed_block = Some(block)).await;
        self.advance(id, TransferStatus::Confirmed, json!({ "block": block }))
            .await;
        info!(transfer = %id, block, "mint confirmed");
        Ok(())
    }

    /// Burn bridged value for release on the source chain. The destination
    /// recipient only appears on-ledger as a commitment.
    #[instrument(skip(self, recipient))]
    pub async fn burn(
        &self,
        caller: Address,
        amount: u128,
        recipient: Address,
    ) -> Result<String, OrchestratorError> {
        let transfer = Transfer::new(
            TransferKind::Burn,
            self.config.target_chain.clone(),
            self.config.source_chain.clone(),
            recipient,
            amount,
            [0u8; 32],
            unix_now(),
        );
        let id = transfer.id.clone();
        self.cache.lock().await.insert(transfer);

        let commitment: Hash32 = {
            let mut hasher = Sha256::new();
            hasher.update(PROTOCOL_TAG);
            hasher.update(b"burn-recipient");
            hasher.update(recipient);
            hasher.finalize().into()
        };

        let result = self
            .submit_and_confirm(&id, || {
                let call = BurnCall {
                    caller,
                    amount,
                    target_chain: self.config.source_chain.clone(),
                    recipient_commitment: commitment,
                };
                async move { self.ledger.submit_burn(call).await }
            })
            .await;
        match result {
            Ok(()) => Ok(id),
            Err((stage, err)) => {
                self.record_failure(&id, stage, &err).await;
                Err(err)
            }
        }
    }

    /// Lock native value on the target chain
    #[instrument(skip(self))]
    pub async fn lock(&self, caller: Address, value: u128) -> Result<String, OrchestratorError> {
        let transfer = Transfer::new(
            TransferKind::Lock,
            self.config.target_chain.clone(),
            self.config.target_chain.clone(),
            caller,
            value,
            [0u8; 32],
            unix_now(),
        );
        let id = transfer.id.clone();
        self.cache.lock().await.insert(transfer);

        let result = self
            .submit_and_confirm(&id, || {
                let call = LockCall { caller, value };
                async move { self.ledger.submit_lock(call).await }
            })
            .await;
        match result {
            Ok(()) => Ok(id),
            Err((stage, err)) => {
                self.record_failure(&id, stage, &err).await;
                Err(err)
            }
        }
    }

    /// Release previously locked native value to `recipient`, justified by
    /// `source_tx_hash` on the other chain
    #[instrument(skip(self, recipient))]
    pub async fn withdraw(
        &self,
        recipient: Address,
        amount: u128,
        source_tx_hash: Hash32,
    ) -> Result<String, OrchestratorError> {
        let transfer = Transfer::new(
            TransferKind::Withdraw,
            self.config.target_chain.clone(),
            self.config.target_chain.clone(),
            recipient,
            amount,
            [0u8; 32],
            unix_now(),
        );
        let id = transfer.id.clone();
        self.cache.lock().await.insert(transfer);

        let result = self
            .submit_and_confirm(&id, || {
                let call = WithdrawCall {
                    recipient,
                    amount,
                    source_tx_hash,
                };
                async move { self.ledger.submit_withdraw(call).await }
            })
            .await;
        match result {
            Ok(()) => Ok(id),
            Err((stage, err)) => {
                self.record_failure(&id, stage, &err).await;
                Err(err)
            }
        }
    }

    /// Shared tail of the direct ledger calls: no proof or signature stage,
    /// so the record passes straight through signature_completed
    async fn submit_and_confirm<F, Fut>(
        &self,
        id: &str,
        submit: F,
    ) -> Result<(), (&'static str, OrchestratorError)>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<String, CollaboratorError>>,
    {
        self.advance(
            id,
            TransferStatus::SignatureCompleted,
            json!({ "signature": "not required" }),
        )
        .await;

        let tx_ref = submit().await.map_err(|e| ("broadcast", e.into()))?;
        self.update(id, |t| t.tx_ref = Some(tx_ref.clone())).await;
        self.advance(id, TransferStatus::Broadcasted, json!({ "tx_ref": tx_ref }))
            .await;

        let block = self
            .await_confirmation(&tx_ref)
            .await
            .map_err(|e| ("confirmation", e))?;
        self.update(id, |t| t.confirmed_block = Some(block)).await;
        self.advance(id, TransferStatus::Confirmed, json!({ "block": block }))
            .await;
        Ok(())
    }

    /// Poll the ledger until the transaction confirms or fails
    async fn await_confirmation(&self, tx_ref: &str) -> Result<u64, OrchestratorError> {
        for _ in 0..self.config.confirm_attempts {
            match self.ledger.confirmation(tx_ref).await? {
                ConfirmationStatus::Confirmed { block } => return Ok(block),
                ConfirmationStatus::Failed { reason } => {
                    return Err(OrchestratorError::Rejected(reason));
                }
                ConfirmationStatus::Pending => {
                    tokio::time::sleep(self.config.confirm_interval).await;
                }
            }
        }
        Err(OrchestratorError::ConfirmationTimeout(
            self.config.confirm_attempts,
        ))
    }

    async fn advance(&self, id: &str, status: TransferStatus, payload: serde_json::Value) {
        self.update(id, |t| {
            t.advance(status, payload, unix_now());
        })
        .await;
    }

    async fn record_failure(&self, id: &str, stage: &str, err: &OrchestratorError) {
        self.update(id, |t| t.fail(stage, err, unix_now())).await;
    }

    async fn update(&self, id: &str, f: impl FnOnce(&mut Transfer)) {
        let mut cache = self.cache.lock().await;
        if let Some(transfer) = cache.get_mut(id) {
            f(transfer);
        }
    }
}
