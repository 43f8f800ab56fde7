//! Privacy tier levels and their per-tier protection flags.
//!
//! Tiers form a total order (Basic < Standard < Enhanced < Maximum) and every
//! adjustment moves at most one step, saturating at the ends.

use serde::{Deserialize, Serialize};

/// Privacy tier controlling which protections apply to a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivacyTier {
    /// No shielding, plain transfer
    Basic = 1,
    /// ZK proof attached, amount visible
    Standard = 2,
    /// ZK proof, hidden amount, relay address
    Enhanced = 3,
    /// Everything plus post-quantum signature
    Maximum = 4,
}

impl PrivacyTier {
    /// Parse a raw tier value; `None` for anything outside [1, 4]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Basic),
            2 => Some(Self::Standard),
            3 => Some(Self::Enhanced),
            4 => Some(Self::Maximum),
            _ => None,
        }
    }

    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// One step down, saturating at Basic
    pub fn step_down(&self) -> Self {
        match self {
            Self::Basic | Self::Standard => Self::Basic,
            Self::Enhanced => Self::Standard,
            Self::Maximum => Self::Enhanced,
        }
    }

    /// One step up, saturating at Maximum
    pub fn step_up(&self) -> Self {
        match self {
            Self::Basic => Self::Standard,
            Self::Standard => Self::Enhanced,
            Self::Enhanced | Self::Maximum => Self::Maximum,
        }
    }

    /// Gas price ceiling (Gwei) above which this tier is stepped down
    pub fn gas_gwei_threshold(&self) -> u64 {
        match self {
            Self::Basic => u64::MAX,
            Self::Standard => 50,
            Self::Enhanced => 30,
            Self::Maximum => 10,
        }
    }

    /// Protection flags for this tier
    pub fn config(&self) -> PrivacyTierConfig {
        match self {
            Self::Basic => PrivacyTierConfig {
                use_zk_proof: false,
                hide_amount: false,
                use_relay_address: false,
                use_post_quantum: false,
                circuit_size: 0,
            },
            Self::Standard => PrivacyTierConfig {
                use_zk_proof: true,
                hide_amount: false,
                use_relay_address: false,
                use_post_quantum: false,
                circuit_size: 2048,
            },
            Self::Enhanced => PrivacyTierConfig {
                use_zk_proof: true,
                hide_amount: true,
                use_relay_address: true,
                use_post_quantum: false,
                circuit_size: 4096,
            },
            Self::Maximum => PrivacyTierConfig {
                use_zk_proof: true,
                hide_amount: true,
                use_relay_address: true,
                use_post_quantum: true,
                circuit_size: 8192,
            },
        }
    }
}

impl std::fmt::Display for PrivacyTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Basic => "basic",
            Self::Standard => "standard",
            Self::Enhanced => "enhanced",
            Self::Maximum => "maximum",
        };
        write!(f, "{}", s)
    }
}

/// Per-tier protection flags, derived purely from the tier value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivacyTierConfig {
    pub use_zk_proof: bool,
    pub hide_amount: bool,
    pub use_relay_address: bool,
    pub use_post_quantum: bool,
    pub circuit_size: u32,
}

/// Config lookup for a raw tier value; unrecognized tiers fall back to Standard
pub fn config_for_raw(tier: u8) -> PrivacyTierConfig {
    PrivacyTier::from_u8(tier)
        .unwrap_or(PrivacyTier::Standard)
        .config()
}
