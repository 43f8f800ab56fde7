//! External collaborators the bridge talks to: chain oracles, the proof
//! service, the relay directory, the signer network, the TEE enclave and
//! the target ledger.
//!
//! Each concern is a trait so orchestration code can run against HTTP
//! services in production and in-process implementations in tests and the
//! local proof-of-concept mode.

pub mod http;
pub mod local;
pub mod traits;

use thiserror::Error;

pub use http::{HttpChainOracle, HttpProofProvider};
pub use local::{
    InProcessLedger, LocalEnclave, LocalProver, LocalRelayDirectory, LocalSignerNetwork,
    StaticChainOracle,
};
pub use traits::{
    BridgeLedger, BurnCall, ChainOracle, ConfirmationStatus, EnclaveSigner, EnclaveSignature,
    LockCall, MintCall, ProofProvider, RelayDirectory, SessionAnnouncement, SignerNetwork,
    WithdrawCall,
};

#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected response: {0}")]
    BadResponse(String),
    #[error("ledger rejected call: {0}")]
    LedgerRejected(crate::ledger::VerifierError),
    #[error("unknown transaction reference: {0}")]
    UnknownTx(String),
    #[error("signing failed: {0}")]
    Signing(String),
    #[error("proof system not initialized")]
    ProverNotInitialized,
}
