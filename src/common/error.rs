//! Unified error handling across all modules.

use thiserror::Error;

/// Root error type for the bridge
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("logging error: {0}")]
    Logging(#[from] crate::logging::LoggingError),

    #[error("collaborator error: {0}")]
    Collaborator(#[from] crate::collaborators::CollaboratorError),

    #[error("coordinator error: {0}")]
    Coordinator(#[from] crate::coordinator::CoordinatorError),

    #[error("orchestration error: {0}")]
    Orchestrator(#[from] crate::orchestrator::OrchestratorError),

    #[error("ledger error: {0}")]
    Ledger(#[from] crate::ledger::VerifierError),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether retrying the same call can reasonably succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            BridgeError::Collaborator(_) | BridgeError::Io(_) => true,
            BridgeError::Orchestrator(err) => matches!(
                err,
                crate::orchestrator::OrchestratorError::ConfirmationTimeout(_)
            ),
            _ => false,
        }
    }

    /// Stable code for API responses and logs
    pub fn error_code(&self) -> &'static str {
        match self {
            BridgeError::Config(_) => "CONFIG_ERROR",
            BridgeError::Logging(_) => "LOGGING_ERROR",
            BridgeError::Collaborator(_) => "COLLABORATOR_ERROR",
            BridgeError::Coordinator(_) => "COORDINATOR_ERROR",
            BridgeError::Orchestrator(_) => "ORCHESTRATION_ERROR",
            BridgeError::Ledger(_) => "LEDGER_ERROR",
            BridgeError::Validation(_) => "VALIDATION_ERROR",
            BridgeError::Internal(_) => "INTERNAL_ERROR",
            BridgeError::Io(_) => "IO_ERROR",
        }
    }
}

/// Result type alias using BridgeError
pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_and_retryability() {
        let err = BridgeError::validation("bad amount");
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert!(!err.is_retryable());

        let err = BridgeError::from(crate::collaborators::CollaboratorError::BadResponse(
            "oops".into(),
        ));
        assert_eq!(err.error_code(), "COLLABORATOR_ERROR");
        assert!(err.is_retryable());

        let err = BridgeError::from(crate::orchestrator::OrchestratorError::ConfirmationTimeout(30));
        assert!(err.is_retryable());
        let err = BridgeError::from(crate::orchestrator::OrchestratorError::Rejected("no".into()));
        assert!(!err.is_retryable());
    }
}
