//! Environment-based configuration.
//!
//! All deployment-specific values come from environment variables; secrets
//! are never hardcoded.
//!
//! # Environment Variables
//!
//! ## Network
//! - `VEIL_NETWORK` - "mainnet", "testnet", or "devnet" (default: "devnet")
//! - `VEIL_SOURCE_CHAIN` - source chain name (required outside devnet)
//! - `VEIL_TARGET_CHAIN` - target chain name (required outside devnet)
//!
//! ## Collaborator endpoints
//! - `VEIL_ORACLE_URL` - chain-conditions oracle base URL
//! - `VEIL_PROVER_URL` - proof service base URL
//!
//! ## Signing
//! - `VEIL_SIGNING_MODE` - "threshold" (production) or "tee"
//! - `VEIL_THRESHOLD` - required signers (e.g. "3")
//! - `VEIL_PARTICIPANTS` - total signer nodes (e.g. "5")
//!
//! ## Optional
//! - `VEIL_DEFAULT_TIER` - fallback privacy tier 1..=4 (default: 2)
//! - `VEIL_CONFIRM_ATTEMPTS` - confirmation poll attempts (default: 30)
//! - `VEIL_CONFIRM_INTERVAL_MS` - poll interval (default: 500)
//! - `VEIL_LOG_LEVEL` - debug, info, warn, error
//! - `VEIL_DEMO_MODE` - "1" to enable the demo flow (devnet/testnet only)

use std::env;
use std::str::FromStr;

use thiserror::Error;

use crate::types::PrivacyTier;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("network mismatch: expected {0}, got {1}")]
    NetworkMismatch(String, String),

    #[error("signer quorum invalid: {0}")]
    QuorumInvalid(String),

    #[error("demo mode not allowed on {0}")]
    DemoModeNotAllowed(String),
}

/// Network environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
    Devnet,
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" | "main" => Ok(Network::Mainnet),
            "testnet" | "test" => Ok(Network::Testnet),
            "devnet" | "dev" => Ok(Network::Devnet),
            _ => Err(ConfigError::InvalidValue(
                "VEIL_NETWORK".to_string(),
                format!("unknown network: {}", s),
            )),
        }
    }
}

impl Network {
    pub fn allows_demo_mode(&self) -> bool {
        matches!(self, Network::Devnet | Network::Testnet)
    }

    pub fn default_oracle_url(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://oracle.veilbridge.io",
            Network::Testnet => "https://oracle.testnet.veilbridge.io",
            Network::Devnet => "http://127.0.0.1:8545",
        }
    }

    pub fn default_prover_url(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://prover.veilbridge.io",
            Network::Testnet => "https://prover.testnet.veilbridge.io",
            Network::Devnet => "http://127.0.0.1:8546",
        }
    }
}

/// Which backend produces the group signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningBackend {
    /// k-of-n threshold signing across the signer network
    Threshold { threshold: u8, participants: u8 },
    /// Hardware enclave signing
    Tee,
}

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub network: Network,
    pub source_chain: String,
    pub target_chain: String,
    pub oracle_url: String,
    pub prover_url: String,
    pub signing: SigningBackend,
    /// Tier used when the amount does not reach any threshold
    pub default_tier: PrivacyTier,
    pub confirm_attempts: u32,
    pub confirm_interval_ms: u64,
    pub demo_mode: bool,
    pub log_level: String,
}

impl BridgeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let network: Network = env::var("VEIL_NETWORK")
            .unwrap_or_else(|_| "devnet".to_string())
            .parse()?;

        let source_chain =
            get_required_or_devnet_default("VEIL_SOURCE_CHAIN", "sourcenet", network)?;
        let target_chain =
            get_required_or_devnet_default("VEIL_TARGET_CHAIN", "targetnet", network)?;

        let oracle_url = env::var("VEIL_ORACLE_URL")
            .unwrap_or_else(|_| network.default_oracle_url().to_string());
        let prover_url = env::var("VEIL_PROVER_URL")
            .unwrap_or_else(|_| network.default_prover_url().to_string());

        let signing = load_signing_backend(network)?;

        let default_tier = match env::var("VEIL_DEFAULT_TIER") {
            Ok(raw) => {
                let value: u8 = raw.parse().map_err(|_| {
                    ConfigError::InvalidValue("VEIL_DEFAULT_TIER".to_string(), raw.clone())
                })?;
                PrivacyTier::from_u8(value).ok_or(ConfigError::InvalidValue(
                    "VEIL_DEFAULT_TIER".to_string(),
                    raw,
                ))?
            }
            Err(_) => PrivacyTier::Standard,
        };

        let confirm_attempts = env::var("VEIL_CONFIRM_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);
        let confirm_interval_ms = env::var("VEIL_CONFIRM_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(500);

        let demo_mode = env::var("VEIL_DEMO_MODE").map(|v| v == "1").unwrap_or(false);
        if demo_mode && !network.allows_demo_mode() {
            return Err(ConfigError::DemoModeNotAllowed(format!("{:?}", network)));
        }

        let log_level = env::var("VEIL_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            network,
            source_chain,
            target_chain,
            oracle_url,
            prover_url,
            signing,
            default_tier,
            confirm_attempts,
            confirm_interval_ms,
            demo_mode,
            log_level,
        })
    }

    /// Validate configuration for production readiness
    pub fn validate_for_production(&self) -> Result<(), ConfigError> {
        if self.network != Network::Mainnet {
            return Err(ConfigError::NetworkMismatch(
                "mainnet".to_string(),
                format!("{:?}", self.network),
            ));
        }

        match self.signing {
            SigningBackend::Threshold { threshold, .. } if threshold >= 2 => {}
            SigningBackend::Threshold { threshold, .. } => {
                return Err(ConfigError::QuorumInvalid(format!(
                    "threshold {} too low for production",
                    threshold
                )));
            }
            SigningBackend::Tee => {
                return Err(ConfigError::QuorumInvalid(
                    "tee-only signing not allowed for production".to_string(),
                ));
            }
        }

        if self.demo_mode {
            return Err(ConfigError::DemoModeNotAllowed("mainnet".to_string()));
        }
        Ok(())
    }

    /// Print configuration summary (no sensitive values)
    pub fn print_summary(&self) {
        println!("=== veilbridge configuration ===");
        println!("Network: {:?}", self.network);
        println!("Chains: {} -> {}", self.source_chain, self.target_chain);
        println!("Oracle: {}", self.oracle_url);
        println!("Prover: {}", self.prover_url);
        println!(
            "Signing: {}",
            match &self.signing {
                SigningBackend::Threshold {
                    threshold,
                    participants,
                } => format!("threshold {}-of-{}", threshold, participants),
                SigningBackend::Tee => "tee".to_string(),
            }
        );
        println!("Default tier: {}", self.default_tier);
        println!("Demo mode: {}", self.demo_mode);
        println!("Log level: {}", self.log_level);
        println!("================================");
    }
}

fn get_required_or_devnet_default(
    var_name: &str,
    devnet_default: &str,
    network: Network,
) -> Result<String, ConfigError> {
    match env::var(var_name) {
        Ok(value) => Ok(value),
        Err(_) => {
            if network == Network::Devnet {
                Ok(devnet_default.to_string())
            } else {
                Err(ConfigError::MissingEnvVar(var_name.to_string()))
            }
        }
    }
}

fn load_signing_backend(network: Network) -> Result<SigningBackend, ConfigError> {
    let mode = env::var("VEIL_SIGNING_MODE").unwrap_or_else(|_| {
        if network == Network::Mainnet {
            "threshold".to_string()
        } else {
            "tee".to_string()
        }
    });

    match mode.to_lowercase().as_str() {
        "tee" => Ok(SigningBackend::Tee),
        "threshold" => {
            let threshold: u8 = env::var("VEIL_THRESHOLD")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .map_err(|_| ConfigError::QuorumInvalid("VEIL_THRESHOLD not a number".into()))?;
            let participants: u8 = env::var("VEIL_PARTICIPANTS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::QuorumInvalid("VEIL_PARTICIPANTS not a number".into()))?;
            if threshold == 0 || threshold > participants {
                return Err(ConfigError::QuorumInvalid(format!(
                    "{}-of-{} is not a valid quorum",
                    threshold, participants
                )));
            }
            Ok(SigningBackend::Threshold {
                threshold,
                participants,
            })
        }
        other => Err(ConfigError::InvalidValue(
            "VEIL_SIGNING_MODE".to_string(),
            other.to_string(),
        )),
    }
}
