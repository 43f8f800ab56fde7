//! On-ledger verifier: the target-chain contract logic that validates
//! proofs and threshold signatures before minting bridged value.
//!
//! Execution is serialized, so every operation takes `&mut self` and either
//! completes all its state changes or returns an error having changed
//! nothing. All validation runs before the first mutation.

pub mod error;
pub mod events;

use std::collections::{HashMap, HashSet};

use crypto_bigint::Encoding;
use sha2::{Digest, Sha256};

use crate::crypto::{self, proof_fingerprint, schnorr};
use crate::types::{Address, Hash32, PrivacyTier, QuantumSignature, TraditionalSignature, ZkProof};
use crate::types::proof::{amount_word, u64_word};

pub use error::VerifierError;
pub use events::LedgerEvent;

/// Proof timestamps may run ahead of the ledger clock by at most 10 minutes
pub const ALLOWED_FUTURE_DRIFT_SECS: u64 = 600;

/// Proofs older than 24 hours are rejected
pub const PROOF_TTL_SECS: u64 = 86_400;

/// Domain tag for commitment-bound proof blobs
const PROOF_DOMAIN: &[u8] = b"VEILBRIDGE_PROOF_V1";

/// Number of public inputs the mint circuit exposes
const PUBLIC_INPUT_COUNT: usize = 5;

/// Transaction context supplied by the ledger runtime
#[derive(Debug, Clone, Copy)]
pub struct CallContext {
    pub caller: Address,
    /// Native value attached to the call, in wei
    pub value: u128,
    /// Ledger clock, unix seconds
    pub timestamp: u64,
}

/// A relay id bound to its real recipient, valid until `expires_at`
#[derive(Debug, Clone, Copy)]
pub struct RelayBinding {
    pub target: Address,
    pub expires_at: u64,
}

/// Everything a mint submission carries
#[derive(Debug, Clone)]
pub struct MintRequest {
    pub source_chain: String,
    pub relay_id: Hash32,
    pub amount: u128,
    /// When the proof was produced, unix seconds
    pub timestamp: u64,
    pub merkle_root: Hash32,
    pub privacy_level: u8,
    pub signature: TraditionalSignature,
    pub proof: ZkProof,
    pub public_inputs: Vec<Hash32>,
    pub quantum: Option<QuantumSignature>,
}

/// Verification seam for the proof system
pub trait ProofVerifier: Send + Sync {
    fn verify_proof(&self, proof: &ZkProof, public_inputs: &[Hash32]) -> bool;
}

/// Checks that the proof's c-points commit to its a/b points and the public
/// inputs. Stands in for the pairing check of a real verifying key while
/// still rejecting any tampered or transplanted proof.
pub struct CommitmentProofVerifier;

fn commitment_root(proof: &ZkProof, public_inputs: &[Hash32]) -> Hash32 {
    let mut hasher = Sha256::new();
    hasher.update(PROOF_DOMAIN);
    for p in &proof.a {
        hasher.update(p);
    }
    for pair in &proof.b {
        for p in pair {
            hasher.update(p);
        }
    }
    for input in public_inputs {
        hasher.update(input);
    }
    hasher.finalize().into()
}

/// Fill in the c-points so the proof passes [`CommitmentProofVerifier`].
/// Used by the local prover and by tests.
pub fn bind_commitment(proof: &mut ZkProof, public_inputs: &[Hash32]) {
    let root = commitment_root(proof, public_inputs);
    proof.c[0] = root;
    proof.c[1] = Sha256::digest(root).into();
}

impl ProofVerifier for CommitmentProofVerifier {
    fn verify_proof(&self, proof: &ZkProof, public_inputs: &[Hash32]) -> bool {
        let root = commitment_root(proof, public_inputs);
        proof.c[0] == root && proof.c[1] == <Hash32>::from(Sha256::digest(root))
    }
}

/// The bridge verifier contract state
pub struct OnChainVerifier {
    admin: Address,
    /// Threshold group public key (affine x, y)
    group_key: (Hash32, Hash32),
    /// SHA-256 of the trusted post-quantum public key, when one is set
    quantum_key_hash: Option<Hash32>,
    oracles: HashSet<Address>,
    relays: HashMap<Hash32, RelayBinding>,
    balances: HashMap<Address, u128>,
    native_locked: HashMap<Address, u128>,
    preferences: HashMap<Address, PrivacyTier>,
    processed: HashSet<Hash32>,
    processed_withdrawals: HashSet<Hash32>,
    current_root: Hash32,
    paused: bool,
    verifier: Box<dyn ProofVerifier>,
    events: Vec<LedgerEvent>,
}

impl OnChainVerifier {
    pub fn new(admin: Address, group_key_x: Hash32, group_key_y: Hash32) -> Self {
        Self::with_verifier(admin, group_key_x, group_key_y, Box::new(CommitmentProofVerifier))
    }

    pub fn with_verifier(
        admin: Address,
        group_key_x: Hash32,
        group_key_y: Hash32,
        verifier: Box<dyn ProofVerifier>,
    ) -> Self {
        Self {
            admin,
            group_key: (group_key_x, group_key_y),
            quantum_key_hash: None,
            // The admin starts out as an authorized oracle so a fresh
            // deployment can register relays before delegating the role
            oracles: HashSet::from([admin]),
            relays: HashMap::new(),
            balances: HashMap::new(),
            native_locked: HashMap::new(),
            preferences: HashMap::new(),
            processed: HashSet::new(),
            processed_withdrawals: HashSet::new(),
            current_root: [0u8; 32],
            paused: false,
            verifier,
            events: Vec::new(),
        }
    }

    /// Mint bridged value after the full validation sequence:
    ///
    /// 1. amount is non-zero
    /// 2. merkle root is non-zero
    /// 3. privacy level is a known tier
    /// 4. proof timestamp is not in the future (10 min drift allowed)
    /// 5. proof timestamp is within the 24 h acceptance window
    /// 6. relay id resolves to an unexpired registered binding
    /// 7. the quantum signature verifies when the maximum tier supplies one,
    ///    the classical threshold signature otherwise
    /// 8. zero-knowledge proof verifies when the tier carries one
    /// 9. the submission fingerprint has not been processed before
    ///
    /// On success the fingerprint is recorded, the current root is updated
    /// when the presented one differs, the recipient is credited and
    /// [`LedgerEvent::RelayAddressUsed`] plus [`LedgerEvent::MintedWithProof`]
    /// are emitted.
    pub fn mint_with_proof(
        &mut self,
        ctx: &CallContext,
        req: &MintRequest,
    ) -> Result<Hash32, VerifierError> {
        self.ensure_active()?;

        if req.amount == 0 {
            return Err(VerifierError::InvalidAmount);
        }
        if req.merkle_root == [0u8; 32] {
            return Err(VerifierError::InvalidRoot);
        }
        let tier =
            PrivacyTier::from_u8(req.privacy_level).ok_or(VerifierError::InvalidPrivacyLevel)?;
        let tier_config = tier.config();

        if req.timestamp > ctx.timestamp + ALLOWED_FUTURE_DRIFT_SECS {
            return Err(VerifierError::FutureProof);
        }
        if req.timestamp + PROOF_TTL_SECS < ctx.timestamp {
            return Err(VerifierError::ExpiredProof);
        }

        let binding = self
            .relays
            .get(&req.relay_id)
            .ok_or(VerifierError::InvalidRelayAddress)?;
        if ctx.timestamp > binding.expires_at {
            return Err(VerifierError::InvalidRelayAddress);
        }
        let recipient = binding.target;

        let message_hash = crypto::canonical_message_hash(
            &req.source_chain,
            &recipient,
            req.amount,
            req.timestamp,
            &req.merkle_root,
            req.privacy_level,
            &req.relay_id,
        );
        let quantum_supplied = req
            .quantum
            .as_ref()
            .filter(|q| !q.signature.is_empty() && !q.public_key.is_empty());
        match quantum_supplied {
            Some(quantum) if tier == PrivacyTier::Maximum => {
                let trusted = self
                    .quantum_key_hash
                    .ok_or(VerifierError::InvalidSignature)?;
                let key_hash: Hash32 = Sha256::digest(&quantum.public_key).into();
                if key_hash != trusted
                    || !crypto::quantum::verify(
                        &message_hash,
                        &quantum.signature,
                        &quantum.public_key,
                    )
                {
                    return Err(VerifierError::InvalidSignature);
                }
            }
            _ => {
                if !schnorr::verify(
                    &message_hash,
                    &self.group_key.0,
                    &self.group_key.1,
                    req.signature.v,
                    &req.signature.r,
                    &req.signature.s,
                ) {
                    return Err(VerifierError::InvalidSignature);
                }
            }
        }

        if tier_config.use_zk_proof {
            if !self.zk_inputs_consistent(req) || !self.verifier.verify_proof(&req.proof, &req.public_inputs)
            {
                return Err(VerifierError::InvalidZKProof);
            }
        }

        let quantum_bytes = req
            .quantum
            .as_ref()
            .map(|q| q.signature.as_slice())
            .unwrap_or(&[]);
        let fingerprint =
            proof_fingerprint(&req.proof, &req.public_inputs, &req.relay_id, quantum_bytes);
        if self.processed.contains(&fingerprint) {
            return Err(VerifierError::ProofAlreadyProcessed);
        }

        // All checks passed; mutate
        self.processed.insert(fingerprint);
        if req.merkle_root != self.current_root {
            self.current_root = req.merkle_root;
            self.events.push(LedgerEvent::MerkleRootUpdated {
                root: req.merkle_root,
            });
        }
        *self.balances.entry(recipient).or_insert(0) += req.amount;
        self.events.push(LedgerEvent::RelayAddressUsed {
            relay_id: req.relay_id,
        });
        self.events.push(LedgerEvent::MintedWithProof {
            recipient,
            amount: req.amount,
            tier: req.privacy_level,
            fingerprint,
        });
        Ok(fingerprint)
    }

    /// Public inputs must bind the call's own amount, timestamp, root and
    /// tier in the canonical layout
    fn zk_inputs_consistent(&self, req: &MintRequest) -> bool {
        req.public_inputs.len() == PUBLIC_INPUT_COUNT
            && req.public_inputs[0] == amount_word(req.amount)
            && req.public_inputs[1] == u64_word(req.timestamp)
            && req.public_inputs[2] == req.merkle_root
            && req.public_inputs[3] == u64_word(req.privacy_level as u64)
    }

    /// Burn bridged value for release on another chain. Only a commitment to
    /// the destination recipient goes into the event log.
    pub fn burn_to_chain(
        &mut self,
        ctx: &CallContext,
        amount: u128,
        target_chain: &str,
        recipient_commitment: Hash32,
    ) -> Result<(), VerifierError> {
        self.ensure_active()?;
        if amount == 0 {
            return Err(VerifierError::InvalidAmount);
        }
        let balance = self.balances.get(&ctx.caller).copied().unwrap_or(0);
        if balance < amount {
            return Err(VerifierError::InsufficientBalance);
        }

        self.balances.insert(ctx.caller, balance - amount);
        self.events.push(LedgerEvent::BurnedToChain {
            from: ctx.caller,
            amount,
            target_chain: target_chain.to_string(),
            recipient_commitment,
        });
        Ok(())
    }

    /// Lock the native value attached to the call
    pub fn lock_native_asset(&mut self, ctx: &CallContext) -> Result<(), VerifierError> {
        self.ensure_active()?;
        if ctx.value == 0 {
            return Err(VerifierError::InvalidAmount);
        }
        *self.native_locked.entry(ctx.caller).or_insert(0) += ctx.value;
        self.events.push(LedgerEvent::NativeAssetLocked {
            owner: ctx.caller,
            amount: ctx.value,
        });
        Ok(())
    }

    /// Release locked native value to `recipient`. Restricted to authorized
    /// oracles; `tx_hash` names the source-chain transaction that justified
    /// the release and is consumed at most once.
    pub fn withdraw_locked_asset(
        &mut self,
        ctx: &CallContext,
        recipient: Address,
        amount: u128,
        tx_hash: Hash32,
    ) -> Result<(), VerifierError> {
        self.ensure_active()?;
        self.ensure_oracle(ctx)?;
        if amount == 0 {
            return Err(VerifierError::InvalidAmount);
        }
        if self.processed_withdrawals.contains(&tx_hash) {
            return Err(VerifierError::WithdrawalAlreadyProcessed);
        }
        let locked = self.native_locked.get(&recipient).copied().unwrap_or(0);
        if locked < amount {
            return Err(VerifierError::InsufficientLocked);
        }

        self.processed_withdrawals.insert(tx_hash);
        self.native_locked.insert(recipient, locked - amount);
        self.events.push(LedgerEvent::LockedAssetWithdrawn {
            recipient,
            amount,
            tx_hash,
        });
        Ok(())
    }

    /// Record the caller's standing privacy tier
    pub fn set_privacy_preference(
        &mut self,
        ctx: &CallContext,
        privacy_level: u8,
    ) -> Result<(), VerifierError> {
        let tier =
            PrivacyTier::from_u8(privacy_level).ok_or(VerifierError::InvalidPrivacyLevel)?;
        self.preferences.insert(ctx.caller, tier);
        self.events.push(LedgerEvent::PrivacyLevelSet {
            account: ctx.caller,
            tier: privacy_level,
        });
        Ok(())
    }

    // --- oracle and admin operations ---

    pub fn register_relay(
        &mut self,
        ctx: &CallContext,
        relay_id: Hash32,
        recipient: Address,
        expires_at: u64,
    ) -> Result<(), VerifierError> {
        self.ensure_oracle(ctx)?;
        if relay_id == [0u8; 32] || expires_at <= ctx.timestamp {
            return Err(VerifierError::InvalidRelayAddress);
        }
        self.relays.insert(
            relay_id,
            RelayBinding {
                target: recipient,
                expires_at,
            },
        );
        self.events.push(LedgerEvent::RelayRegistered {
            relay_id,
            recipient,
            expires_at,
        });
        Ok(())
    }

    pub fn add_authorized_oracle(
        &mut self,
        ctx: &CallContext,
        oracle: Address,
    ) -> Result<(), VerifierError> {
        self.ensure_admin(ctx)?;
        self.oracles.insert(oracle);
        self.events.push(LedgerEvent::OracleAuthorized { oracle });
        Ok(())
    }

    pub fn remove_authorized_oracle(
        &mut self,
        ctx: &CallContext,
        oracle: Address,
    ) -> Result<(), VerifierError> {
        self.ensure_admin(ctx)?;
        self.oracles.remove(&oracle);
        self.events.push(LedgerEvent::OracleRevoked { oracle });
        Ok(())
    }

    pub fn set_group_key(
        &mut self,
        ctx: &CallContext,
        x: Hash32,
        y: Hash32,
    ) -> Result<(), VerifierError> {
        self.ensure_admin(ctx)?;
        if !schnorr::is_on_curve(
            &crypto_bigint::U256::from_be_bytes(x),
            &crypto_bigint::U256::from_be_bytes(y),
        ) {
            return Err(VerifierError::InvalidSignature);
        }
        self.group_key = (x, y);
        self.events.push(LedgerEvent::GroupKeyRotated);
        Ok(())
    }

    pub fn set_quantum_key_hash(
        &mut self,
        ctx: &CallContext,
        key_hash: Hash32,
    ) -> Result<(), VerifierError> {
        self.ensure_admin(ctx)?;
        self.quantum_key_hash = Some(key_hash);
        self.events.push(LedgerEvent::QuantumKeyRotated);
        Ok(())
    }

    pub fn set_paused(&mut self, ctx: &CallContext, paused: bool) -> Result<(), VerifierError> {
        self.ensure_admin(ctx)?;
        self.paused = paused;
        self.events.push(LedgerEvent::PausedSet { paused });
        Ok(())
    }

    // --- views ---

    pub fn balance_of(&self, account: &Address) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn locked_of(&self, account: &Address) -> u128 {
        self.native_locked.get(account).copied().unwrap_or(0)
    }

    pub fn is_processed(&self, fingerprint: &Hash32) -> bool {
        self.processed.contains(fingerprint)
    }

    /// Resolve a relay binding as of `now`; expired bindings do not resolve
    pub fn resolve_relay(&self, relay_id: &Hash32, now: u64) -> Option<Address> {
        self.relays
            .get(relay_id)
            .filter(|binding| now <= binding.expires_at)
            .map(|binding| binding.target)
    }

    pub fn current_root(&self) -> Hash32 {
        self.current_root
    }

    pub fn preference_of(&self, account: &Address) -> Option<PrivacyTier> {
        self.preferences.get(account).copied()
    }

    pub fn is_authorized_oracle(&self, account: &Address) -> bool {
        self.oracles.contains(account)
    }

    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    fn ensure_admin(&self, ctx: &CallContext) -> Result<(), VerifierError> {
        if ctx.caller != self.admin {
            return Err(VerifierError::Unauthorized);
        }
        Ok(())
    }

    fn ensure_oracle(&self, ctx: &CallContext) -> Result<(), VerifierError> {
        if !self.oracles.contains(&ctx.caller) {
            return Err(VerifierError::Unauthorized);
        }
        Ok(())
    }

    fn ensure_active(&self) -> Result<(), VerifierError> {
        if self.paused {
            return Err(VerifierError::Paused);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::proof::encode_public_inputs;
    use crate::types::ProofInputs;

    const ADMIN: Address = [0xadu8; 32];
    const RECIPIENT: Address = [0x01u8; 32];
    const RELAY_ID: Hash32 = [0x0fu8; 32];
    const NOW: u64 = 1_700_000_000;

    fn group_secret() -> [u8; 32] {
        let mut s = [0u8; 32];
        s[31] = 0x07;
        s[10] = 0x99;
        s
    }

    fn ctx(caller: Address) -> CallContext {
        CallContext {
            caller,
            value: 0,
            timestamp: NOW,
        }
    }

    fn setup() -> OnChainVerifier {
        let (px, py) = schnorr::public_key(&group_secret()).unwrap();
        let mut ledger = OnChainVerifier::new(ADMIN, px, py);
        ledger
            .register_relay(&ctx(ADMIN), RELAY_ID, RECIPIENT, NOW + 3_600)
            .unwrap();
        ledger
    }

    fn signed_request(amount: u128, privacy_level: u8, timestamp: u64) -> MintRequest {
        let merkle_root = [0x22u8; 32];
        let message = crypto::canonical_message_hash(
            "sourcenet",
            &RECIPIENT,
            amount,
            timestamp,
            &merkle_root,
            privacy_level,
            &RELAY_ID,
        );
        let (r, s, v) = schnorr::sign(&message, &group_secret()).unwrap();

        let inputs = ProofInputs {
            amount,
            timestamp,
            merkle_root,
            tier: privacy_level,
            nonce: 1,
            source_chain: "sourcenet".into(),
            target_chain: "targetnet".into(),
        };
        let public_inputs = encode_public_inputs(&inputs);
        let mut proof = ZkProof::zero();
        proof.a[0] = [0x33u8; 32];
        bind_commitment(&mut proof, &public_inputs);

        MintRequest {
            source_chain: "sourcenet".into(),
            relay_id: RELAY_ID,
            amount,
            timestamp,
            merkle_root,
            privacy_level,
            signature: TraditionalSignature { r, s, v },
            proof,
            public_inputs,
            quantum: None,
        }
    }

    #[test]
    fn test_mint_happy_path_credits_recipient() {
        let mut ledger = setup();
        let req = signed_request(1_000, 2, NOW - 60);
        let fp = ledger.mint_with_proof(&ctx([9u8; 32]), &req).unwrap();
        assert_eq!(ledger.balance_of(&RECIPIENT), 1_000);
        assert!(ledger.is_processed(&fp));
        assert!(matches!(
            ledger.events().last(),
            Some(LedgerEvent::MintedWithProof { amount: 1_000, tier: 2, .. })
        ));
    }

    #[test]
    fn test_mint_replay_rejected() {
        let mut ledger = setup();
        let req = signed_request(1_000, 2, NOW - 60);
        ledger.mint_with_proof(&ctx([9u8; 32]), &req).unwrap();
        assert_eq!(
            ledger.mint_with_proof(&ctx([9u8; 32]), &req),
            Err(VerifierError::ProofAlreadyProcessed)
        );
        // No double credit
        assert_eq!(ledger.balance_of(&RECIPIENT), 1_000);
    }

    #[test]
    fn test_mint_input_validation() {
        let mut ledger = setup();
        let c = ctx([9u8; 32]);

        let mut req = signed_request(0, 2, NOW - 60);
        assert_eq!(ledger.mint_with_proof(&c, &req), Err(VerifierError::InvalidAmount));

        req = signed_request(1_000, 2, NOW - 60);
        req.merkle_root = [0u8; 32];
        assert_eq!(ledger.mint_with_proof(&c, &req), Err(VerifierError::InvalidRoot));

        req = signed_request(1_000, 0, NOW - 60);
        assert_eq!(
            ledger.mint_with_proof(&c, &req),
            Err(VerifierError::InvalidPrivacyLevel)
        );
        req = signed_request(1_000, 5, NOW - 60);
        assert_eq!(
            ledger.mint_with_proof(&c, &req),
            Err(VerifierError::InvalidPrivacyLevel)
        );
    }

    #[test]
    fn test_mint_freshness_window() {
        let mut ledger = setup();
        let c = ctx([9u8; 32]);

        // Just inside the drift allowance
        let req = signed_request(1_000, 2, NOW + ALLOWED_FUTURE_DRIFT_SECS);
        assert!(ledger.mint_with_proof(&c, &req).is_ok());

        let req = signed_request(1_000, 2, NOW + ALLOWED_FUTURE_DRIFT_SECS + 1);
        assert_eq!(ledger.mint_with_proof(&c, &req), Err(VerifierError::FutureProof));

        // Just inside the TTL
        let req = signed_request(1_000, 2, NOW - PROOF_TTL_SECS);
        assert!(ledger.mint_with_proof(&c, &req).is_ok());

        let req = signed_request(1_000, 2, NOW - PROOF_TTL_SECS - 1);
        assert_eq!(ledger.mint_with_proof(&c, &req), Err(VerifierError::ExpiredProof));
    }

    #[test]
    fn test_mint_unknown_relay_rejected() {
        let mut ledger = setup();
        let mut req = signed_request(1_000, 2, NOW - 60);
        req.relay_id = [0x77u8; 32];
        assert_eq!(
            ledger.mint_with_proof(&ctx([9u8; 32]), &req),
            Err(VerifierError::InvalidRelayAddress)
        );
    }

    #[test]
    fn test_mint_expired_relay_rejected() {
        let mut ledger = setup();
        // Binding expires before the call executes
        let mut c = ctx([9u8; 32]);
        c.timestamp = NOW + 3_601;
        let req = signed_request(1_000, 2, NOW + 3_500);
        assert_eq!(
            ledger.mint_with_proof(&c, &req),
            Err(VerifierError::InvalidRelayAddress)
        );
        assert_eq!(ledger.resolve_relay(&RELAY_ID, NOW + 3_601), None);
        assert_eq!(ledger.resolve_relay(&RELAY_ID, NOW), Some(RECIPIENT));

        // A stale expiry cannot be registered in the first place
        assert_eq!(
            ledger.register_relay(&ctx(ADMIN), [4u8; 32], RECIPIENT, NOW),
            Err(VerifierError::InvalidRelayAddress)
        );
    }

    #[test]
    fn test_mint_tracks_current_root() {
        let mut ledger = setup();
        let c = ctx([9u8; 32]);
        assert_eq!(ledger.current_root(), [0u8; 32]);

        let req = signed_request(1_000, 2, NOW - 60);
        ledger.mint_with_proof(&c, &req).unwrap();
        assert_eq!(ledger.current_root(), req.merkle_root);
        let root_updates = |ledger: &OnChainVerifier| {
            ledger
                .events()
                .iter()
                .filter(|e| matches!(e, LedgerEvent::MerkleRootUpdated { .. }))
                .count()
        };
        assert_eq!(root_updates(&ledger), 1);

        // Same root again: no change notification
        let req = signed_request(2_000, 2, NOW - 50);
        ledger.mint_with_proof(&c, &req).unwrap();
        assert_eq!(root_updates(&ledger), 1);
    }

    #[test]
    fn test_mint_bad_signature_rejected() {
        let mut ledger = setup();
        let mut req = signed_request(1_000, 2, NOW - 60);
        req.signature.s[12] ^= 0x01;
        assert_eq!(
            ledger.mint_with_proof(&ctx([9u8; 32]), &req),
            Err(VerifierError::InvalidSignature)
        );

        // Signature over different parameters than submitted
        let mut req = signed_request(1_000, 2, NOW - 60);
        req.amount = 2_000;
        assert_eq!(
            ledger.mint_with_proof(&ctx([9u8; 32]), &req),
            Err(VerifierError::InvalidSignature)
        );
    }

    #[test]
    fn test_mint_bad_proof_rejected() {
        let mut ledger = setup();
        let c = ctx([9u8; 32]);

        let mut req = signed_request(1_000, 2, NOW - 60);
        req.proof.c[0][0] ^= 0x01;
        assert_eq!(ledger.mint_with_proof(&c, &req), Err(VerifierError::InvalidZKProof));

        // Inputs that do not bind the call's own parameters
        let mut req = signed_request(1_000, 2, NOW - 60);
        req.public_inputs[2] = [0xeeu8; 32];
        bind_commitment(&mut req.proof, &req.public_inputs);
        assert_eq!(ledger.mint_with_proof(&c, &req), Err(VerifierError::InvalidZKProof));
    }

    #[test]
    fn test_mint_basic_tier_skips_proof_check() {
        let mut ledger = setup();
        let mut req = signed_request(1_000, 1, NOW - 60);
        // Garbage proof is fine for a tier that carries none
        req.proof.c[0] = [0xffu8; 32];
        assert!(ledger.mint_with_proof(&ctx([9u8; 32]), &req).is_ok());
    }

    #[test]
    fn test_mint_maximum_tier_without_quantum_uses_schnorr() {
        let mut ledger = setup();
        let c = ctx([9u8; 32]);

        // No quantum material: the classical signature alone authorizes
        let req = signed_request(1_000, 4, NOW - 60);
        assert!(ledger.mint_with_proof(&c, &req).is_ok());

        // Empty quantum vectors count as absent
        let mut req = signed_request(1_000, 4, NOW - 59);
        req.quantum = Some(QuantumSignature {
            signature: vec![],
            public_key: vec![],
        });
        assert!(ledger.mint_with_proof(&c, &req).is_ok());
    }

    #[test]
    fn test_mint_maximum_tier_quantum_branch() {
        let mut ledger = setup();
        let c = ctx([9u8; 32]);

        fn quantum_for(req: &MintRequest, keypair: &crypto::quantum::QuantumKeypair) -> QuantumSignature {
            let message = crypto::canonical_message_hash(
                "sourcenet",
                &RECIPIENT,
                req.amount,
                req.timestamp,
                &req.merkle_root,
                req.privacy_level,
                &RELAY_ID,
            );
            QuantumSignature {
                signature: keypair.sign(&message).unwrap(),
                public_key: keypair.public_key().to_vec(),
            }
        }

        // Quantum material supplied before any key is registered
        let unregistered = crypto::quantum::QuantumKeypair::generate();
        let mut req = signed_request(500, 4, NOW - 58);
        req.quantum = Some(quantum_for(&req, &unregistered));
        assert_eq!(ledger.mint_with_proof(&c, &req), Err(VerifierError::InvalidSignature));

        // A valid quantum signature under the registered key authorizes,
        // even when the classical signature is garbage
        let keypair = crypto::quantum::QuantumKeypair::generate();
        let key_hash: Hash32 = Sha256::digest(keypair.public_key()).into();
        ledger.set_quantum_key_hash(&ctx(ADMIN), key_hash).unwrap();

        let mut req = signed_request(1_000, 4, NOW - 60);
        req.quantum = Some(quantum_for(&req, &keypair));
        req.signature.s = [0u8; 32];
        assert!(ledger.mint_with_proof(&c, &req).is_ok());

        // Unregistered key is rejected even if the signature checks out
        let rogue = crypto::quantum::QuantumKeypair::generate();
        let mut req = signed_request(2_000, 4, NOW - 61);
        req.quantum = Some(quantum_for(&req, &rogue));
        assert_eq!(ledger.mint_with_proof(&c, &req), Err(VerifierError::InvalidSignature));
    }

    #[test]
    fn test_burn_debits_and_emits_commitment() {
        let mut ledger = setup();
        let holder = [9u8; 32];
        let req = signed_request(1_000, 2, NOW - 60);
        ledger.mint_with_proof(&ctx(holder), &req).unwrap();

        // Recipient holds the minted balance
        let commitment = [0x5au8; 32];
        assert_eq!(
            ledger.burn_to_chain(&ctx(RECIPIENT), 2_000, "sourcenet", commitment),
            Err(VerifierError::InsufficientBalance)
        );
        ledger
            .burn_to_chain(&ctx(RECIPIENT), 400, "sourcenet", commitment)
            .unwrap();
        assert_eq!(ledger.balance_of(&RECIPIENT), 600);
        assert!(matches!(
            ledger.events().last(),
            Some(LedgerEvent::BurnedToChain { amount: 400, .. })
        ));
        assert_eq!(
            ledger.burn_to_chain(&ctx(RECIPIENT), 0, "sourcenet", commitment),
            Err(VerifierError::InvalidAmount)
        );
    }

    #[test]
    fn test_lock_and_withdraw_native() {
        let mut ledger = setup();
        let owner = [3u8; 32];
        let mut c = ctx(owner);
        let tx_hash = [0x5cu8; 32];

        assert_eq!(ledger.lock_native_asset(&c), Err(VerifierError::InvalidAmount));

        c.value = 5_000;
        ledger.lock_native_asset(&c).unwrap();
        assert_eq!(ledger.locked_of(&owner), 5_000);

        // Release is oracle-only
        c.value = 0;
        assert_eq!(
            ledger.withdraw_locked_asset(&c, owner, 2_000, tx_hash),
            Err(VerifierError::Unauthorized)
        );

        let oracle = ctx(ADMIN);
        assert_eq!(
            ledger.withdraw_locked_asset(&oracle, owner, 6_000, tx_hash),
            Err(VerifierError::InsufficientLocked)
        );
        ledger
            .withdraw_locked_asset(&oracle, owner, 2_000, tx_hash)
            .unwrap();
        assert_eq!(ledger.locked_of(&owner), 3_000);
        assert!(matches!(
            ledger.events().last(),
            Some(LedgerEvent::LockedAssetWithdrawn { amount: 2_000, .. })
        ));

        // The same source transaction cannot release twice
        assert_eq!(
            ledger.withdraw_locked_asset(&oracle, owner, 1_000, tx_hash),
            Err(VerifierError::WithdrawalAlreadyProcessed)
        );
        assert_eq!(ledger.locked_of(&owner), 3_000);
    }

    #[test]
    fn test_oracle_role_gates_relay_registration() {
        let mut ledger = setup();
        let oracle = [0x44u8; 32];

        // Only the admin can grant the role, only holders can register
        assert_eq!(
            ledger.add_authorized_oracle(&ctx(oracle), oracle),
            Err(VerifierError::Unauthorized)
        );
        assert_eq!(
            ledger.register_relay(&ctx(oracle), [2u8; 32], RECIPIENT, NOW + 60),
            Err(VerifierError::Unauthorized)
        );

        ledger.add_authorized_oracle(&ctx(ADMIN), oracle).unwrap();
        assert!(ledger.is_authorized_oracle(&oracle));
        ledger
            .register_relay(&ctx(oracle), [2u8; 32], RECIPIENT, NOW + 60)
            .unwrap();

        ledger.remove_authorized_oracle(&ctx(ADMIN), oracle).unwrap();
        assert_eq!(
            ledger.register_relay(&ctx(oracle), [3u8; 32], RECIPIENT, NOW + 60),
            Err(VerifierError::Unauthorized)
        );
    }

    #[test]
    fn test_privacy_preference_recorded_per_account() {
        let mut ledger = setup();
        let account = [0x21u8; 32];
        assert_eq!(
            ledger.set_privacy_preference(&ctx(account), 7),
            Err(VerifierError::InvalidPrivacyLevel)
        );
        ledger.set_privacy_preference(&ctx(account), 3).unwrap();
        assert_eq!(ledger.preference_of(&account), Some(PrivacyTier::Enhanced));
        assert!(matches!(
            ledger.events().last(),
            Some(LedgerEvent::PrivacyLevelSet { tier: 3, .. })
        ));
        assert_eq!(ledger.preference_of(&RECIPIENT), None);
    }

    #[test]
    fn test_admin_only_operations() {
        let mut ledger = setup();
        let outsider = ctx([0x66u8; 32]);
        assert_eq!(
            ledger.register_relay(&outsider, [1u8; 32], RECIPIENT, NOW + 60),
            Err(VerifierError::Unauthorized)
        );
        assert_eq!(ledger.set_paused(&outsider, true), Err(VerifierError::Unauthorized));
        assert_eq!(
            ledger.set_quantum_key_hash(&outsider, [1u8; 32]),
            Err(VerifierError::Unauthorized)
        );

        // Off-curve group key rotation is rejected, a real point is accepted
        assert_eq!(
            ledger.set_group_key(&ctx(ADMIN), [1u8; 32], [1u8; 32]),
            Err(VerifierError::InvalidSignature)
        );
        let (nx, ny) = schnorr::public_key(&{
            let mut s = [0u8; 32];
            s[31] = 0x2a;
            s
        })
        .unwrap();
        ledger.set_group_key(&ctx(ADMIN), nx, ny).unwrap();
        assert!(matches!(
            ledger.events().last(),
            Some(LedgerEvent::GroupKeyRotated)
        ));
    }

    #[test]
    fn test_paused_blocks_state_changes() {
        let mut ledger = setup();
        ledger.set_paused(&ctx(ADMIN), true).unwrap();
        let req = signed_request(1_000, 2, NOW - 60);
        assert_eq!(
            ledger.mint_with_proof(&ctx([9u8; 32]), &req),
            Err(VerifierError::Paused)
        );
        let mut c = ctx([3u8; 32]);
        c.value = 100;
        assert_eq!(ledger.lock_native_asset(&c), Err(VerifierError::Paused));

        ledger.set_paused(&ctx(ADMIN), false).unwrap();
        assert!(ledger.mint_with_proof(&ctx([9u8; 32]), &req).is_ok());
    }
}
