//! On-ledger verifier errors with stable numeric codes.
//!
//! Codes start at 6000 and follow declaration order so clients can match on
//! them across releases.

use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum VerifierError {
    #[error("amount must be greater than zero")]
    InvalidAmount,
    #[error("merkle root must be non-zero")]
    InvalidRoot,
    #[error("privacy level out of range")]
    InvalidPrivacyLevel,
    #[error("proof timestamp is too far in the future")]
    FutureProof,
    #[error("proof timestamp is past the acceptance window")]
    ExpiredProof,
    #[error("relay id does not resolve to a registered recipient")]
    InvalidRelayAddress,
    #[error("threshold signature verification failed")]
    InvalidSignature,
    #[error("zero-knowledge proof verification failed")]
    InvalidZKProof,
    #[error("proof fingerprint already processed")]
    ProofAlreadyProcessed,
    #[error("caller lacks the admin or oracle role")]
    Unauthorized,
    #[error("insufficient bridged balance")]
    InsufficientBalance,
    #[error("insufficient locked native balance")]
    InsufficientLocked,
    #[error("bridge is paused")]
    Paused,
    #[error("withdrawal transaction hash already processed")]
    WithdrawalAlreadyProcessed,
}

impl VerifierError {
    pub fn code(&self) -> u32 {
        match self {
            Self::InvalidAmount => 6000,
            Self::InvalidRoot => 6001,
            Self::InvalidPrivacyLevel => 6002,
            Self::FutureProof => 6003,
            Self::ExpiredProof => 6004,
            Self::InvalidRelayAddress => 6005,
            Self::InvalidSignature => 6006,
            Self::InvalidZKProof => 6007,
            Self::ProofAlreadyProcessed => 6008,
            Self::Unauthorized => 6009,
            Self::InsufficientBalance => 6010,
            Self::InsufficientLocked => 6011,
            Self::Paused => 6012,
            Self::WithdrawalAlreadyProcessed => 6013,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable_and_distinct() {
        let all = [
            VerifierError::InvalidAmount,
            VerifierError::InvalidRoot,
            VerifierError::InvalidPrivacyLevel,
            VerifierError::FutureProof,
            VerifierError::ExpiredProof,
            VerifierError::InvalidRelayAddress,
            VerifierError::InvalidSignature,
            VerifierError::InvalidZKProof,
            VerifierError::ProofAlreadyProcessed,
            VerifierError::Unauthorized,
            VerifierError::InsufficientBalance,
            VerifierError::InsufficientLocked,
            VerifierError::Paused,
            VerifierError::WithdrawalAlreadyProcessed,
        ];
        for (i, e) in all.iter().enumerate() {
            assert_eq!(e.code(), 6000 + i as u32);
        }
    }
}
