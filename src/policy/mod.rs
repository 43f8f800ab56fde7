//! Privacy policy engine: picks the privacy tier for a transfer from the
//! user's preference, the amount at stake and live chain conditions.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::collaborators::ChainOracle;
use crate::types::{Address, PrivacyTier};
use crate::units::WEI_PER_ETHER;

/// Amount thresholds, in wei
pub const MAXIMUM_AMOUNT_WEI: u128 = 100 * WEI_PER_ETHER;
pub const ENHANCED_AMOUNT_WEI: u128 = 10 * WEI_PER_ETHER;
pub const STANDARD_AMOUNT_WEI: u128 = WEI_PER_ETHER;

/// Congestion above this steps the tier down
pub const CONGESTION_HIGH: u8 = 70;
/// Congestion below this steps the tier up
pub const CONGESTION_LOW: u8 = 30;
/// Assumed congestion when the oracle is unreachable
pub const CONGESTION_FALLBACK: u8 = 50;

/// Assumed gas price when the oracle is unreachable, in gwei
pub const GAS_FALLBACK_GWEI: u64 = 30;

/// Congestion readings are reused for this long, per chain
pub const CONGESTION_CACHE_TTL_SECS: u64 = 600;

/// Tier choice plus the reasons behind it, recorded in the transfer log
#[derive(Debug, Clone)]
pub struct PolicyDecision {
    pub tier: PrivacyTier,
    pub reasons: Vec<String>,
}

struct CongestionEntry {
    percent: u8,
    fetched_at: u64,
}

/// Decides privacy tiers. Holds a short-lived per-chain congestion cache so
/// bursts of transfers do not hammer the oracle.
pub struct PrivacyPolicyEngine {
    oracle: Arc<dyn ChainOracle>,
    default_tier: PrivacyTier,
    congestion_cache: Mutex<HashMap<String, CongestionEntry>>,
    preferences: Mutex<HashMap<Address, PrivacyTier>>,
}

impl PrivacyPolicyEngine {
    pub fn new(oracle: Arc<dyn ChainOracle>, default_tier: PrivacyTier) -> Self {
        Self {
            oracle,
            default_tier,
            congestion_cache: Mutex::new(HashMap::new()),
            preferences: Mutex::new(HashMap::new()),
        }
    }

    /// Record a standing tier preference for `user`
    pub async fn set_user_preference(&self, user: Address, tier: PrivacyTier) {
        self.preferences.lock().await.insert(user, tier);
    }

    pub async fn clear_user_preference(&self, user: &Address) {
        self.preferences.lock().await.remove(user);
    }

    pub async fn user_preference(&self, user: &Address) -> Option<PrivacyTier> {
        self.preferences.lock().await.get(user).copied()
    }

    /// [`decide`](Self::decide) with the user's standing preference applied.
    /// A per-call preference overrides the stored one.
    pub async fn decide_for_user(
        &self,
        chain: &str,
        user: &Address,
        amount_wei: u128,
        preference: Option<PrivacyTier>,
    ) -> PolicyDecision {
        let preference = match preference {
            Some(tier) => Some(tier),
            None => self.user_preference(user).await,
        };
        self.decide(chain, amount_wei, preference).await
    }

    /// Pick the tier for a transfer of `amount_wei` on `chain`.
    ///
    /// An explicit user preference wins outright and is never adjusted.
    /// Otherwise the amount sets a base tier, gas over the tier's budget
    /// steps it down once, and congestion nudges it one step either way.
    pub async fn decide(
        &self,
        chain: &str,
        amount_wei: u128,
        user_preference: Option<PrivacyTier>,
    ) -> PolicyDecision {
        if let Some(tier) = user_preference {
            return PolicyDecision {
                tier,
                reasons: vec!["user preference".to_string()],
            };
        }

        let mut reasons = Vec::new();
        let mut tier = if amount_wei >= MAXIMUM_AMOUNT_WEI {
            reasons.push("amount >= 100 ether".to_string());
            PrivacyTier::Maximum
        } else if amount_wei >= ENHANCED_AMOUNT_WEI {
            reasons.push("amount >= 10 ether".to_string());
            PrivacyTier::Enhanced
        } else if amount_wei >= STANDARD_AMOUNT_WEI {
            reasons.push("amount >= 1 ether".to_string());
            PrivacyTier::Standard
        } else {
            reasons.push(format!("chain default {}", self.default_tier));
            self.default_tier
        };

        let gas_gwei = match self.oracle.gas_price_gwei(chain).await {
            Ok(gas_gwei) => gas_gwei,
            Err(err) => {
                warn!(%chain, error = %err, "gas oracle unreachable, assuming {} gwei", GAS_FALLBACK_GWEI);
                reasons.push(format!(
                    "gas oracle unreachable, assuming {} gwei",
                    GAS_FALLBACK_GWEI
                ));
                GAS_FALLBACK_GWEI
            }
        };
        if tier > PrivacyTier::Basic && gas_gwei > tier.gas_gwei_threshold() {
            tier = tier.step_down();
            reasons.push(format!("gas {} gwei above budget, stepped down", gas_gwei));
        }

        let congestion = self.congestion(chain).await;
        if congestion > CONGESTION_HIGH && tier > PrivacyTier::Basic {
            tier = tier.step_down();
            reasons.push(format!("congestion {}% high, stepped down", congestion));
        } else if congestion < CONGESTION_LOW && tier < PrivacyTier::Maximum {
            tier = tier.step_up();
            reasons.push(format!("congestion {}% low, stepped up", congestion));
        }

        debug!(%chain, amount_wei, %tier, "privacy tier decided");
        PolicyDecision { tier, reasons }
    }

    /// Congestion for `chain`, via the cache; falls back to a neutral
    /// reading when the oracle is unreachable
    async fn congestion(&self, chain: &str) -> u8 {
        let now = crate::types::unix_now();
        let mut cache = self.congestion_cache.lock().await;
        if let Some(entry) = cache.get(chain) {
            if now < entry.fetched_at + CONGESTION_CACHE_TTL_SECS {
                return entry.percent;
            }
        }
        match self.oracle.congestion_percent(chain).await {
            Ok(percent) => {
                cache.insert(
                    chain.to_string(),
                    CongestionEntry {
                        percent,
                        fetched_at: now,
                    },
                );
                percent
            }
            Err(err) => {
                warn!(%chain, error = %err, "congestion oracle unreachable, assuming neutral");
                CONGESTION_FALLBACK
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::traits::MockChainOracle;
    use crate::collaborators::{CollaboratorError, StaticChainOracle};

    fn engine(gas: u64, congestion: u8) -> PrivacyPolicyEngine {
        PrivacyPolicyEngine::new(
            Arc::new(StaticChainOracle {
                gas_gwei: gas,
                congestion,
            }),
            PrivacyTier::Basic,
        )
    }

    #[tokio::test]
    async fn test_user_preference_wins_unmodified() {
        // Hostile conditions that would otherwise step the tier down
        let engine = engine(500, 99);
        let decision = engine
            .decide("targetnet", 1, Some(PrivacyTier::Maximum))
            .await;
        assert_eq!(decision.tier, PrivacyTier::Maximum);
        assert_eq!(decision.reasons, vec!["user preference"]);
    }

    #[tokio::test]
    async fn test_amount_sets_base_tier() {
        let engine = engine(5, 50);
        assert_eq!(
            engine.decide("c", 150 * WEI_PER_ETHER, None).await.tier,
            PrivacyTier::Maximum
        );
        assert_eq!(
            engine.decide("c", 10 * WEI_PER_ETHER, None).await.tier,
            PrivacyTier::Enhanced
        );
        assert_eq!(
            engine.decide("c", 2 * WEI_PER_ETHER, None).await.tier,
            PrivacyTier::Standard
        );
        assert_eq!(
            engine.decide("c", WEI_PER_ETHER / 2, None).await.tier,
            PrivacyTier::Basic
        );
    }

    #[tokio::test]
    async fn test_expensive_gas_steps_down_one_tier() {
        // 40 gwei is over Maximum's 10 gwei budget: exactly one step down
        let hot = engine(40, 50);
        let decision = hot.decide("c", 150 * WEI_PER_ETHER, None).await;
        assert_eq!(decision.tier, PrivacyTier::Enhanced);
        assert_eq!(
            decision
                .reasons
                .iter()
                .filter(|r| r.contains("stepped down"))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_gas_spike_with_calm_congestion_round_trips() {
        // Base Maximum, gas 60 steps down once, congestion 20 steps back up
        let market = engine(60, 20);
        let decision = market.decide("c", 150 * WEI_PER_ETHER, None).await;
        assert_eq!(decision.tier, PrivacyTier::Maximum);
        assert_eq!(decision.reasons.len(), 3);
    }

    #[tokio::test]
    async fn test_congestion_adjusts_one_step() {
        let busy = engine(5, 80);
        assert_eq!(
            busy.decide("c", 10 * WEI_PER_ETHER, None).await.tier,
            PrivacyTier::Standard
        );

        let calm = engine(5, 10);
        assert_eq!(
            calm.decide("c", 10 * WEI_PER_ETHER, None).await.tier,
            PrivacyTier::Maximum
        );

        // Already at the top of the scale: no movement
        assert_eq!(
            calm.decide("c", 150 * WEI_PER_ETHER, None).await.tier,
            PrivacyTier::Maximum
        );
    }

    #[tokio::test]
    async fn test_oracle_failure_falls_back_to_defaults() {
        let mut oracle = MockChainOracle::new();
        oracle
            .expect_gas_price_gwei()
            .returning(|_| Err(CollaboratorError::BadResponse("down".into())));
        oracle
            .expect_congestion_percent()
            .returning(|_| Err(CollaboratorError::BadResponse("down".into())));
        let engine = PrivacyPolicyEngine::new(Arc::new(oracle), PrivacyTier::Basic);

        // Assumed 30 gwei sits at Enhanced's budget; neutral congestion
        let decision = engine.decide("c", 10 * WEI_PER_ETHER, None).await;
        assert_eq!(decision.tier, PrivacyTier::Enhanced);

        // The assumed gas still steps Maximum down
        let decision = engine.decide("c", 150 * WEI_PER_ETHER, None).await;
        assert_eq!(decision.tier, PrivacyTier::Enhanced);
    }

    #[tokio::test]
    async fn test_stored_user_preference_applies_and_clears() {
        let user = [0x15u8; 32];
        let engine = engine(500, 99);
        engine.set_user_preference(user, PrivacyTier::Maximum).await;

        let decision = engine.decide_for_user("c", &user, 1, None).await;
        assert_eq!(decision.tier, PrivacyTier::Maximum);
        assert_eq!(decision.reasons, vec!["user preference"]);

        // A per-call preference overrides the stored one
        let decision = engine
            .decide_for_user("c", &user, 1, Some(PrivacyTier::Standard))
            .await;
        assert_eq!(decision.tier, PrivacyTier::Standard);

        engine.clear_user_preference(&user).await;
        assert!(engine.user_preference(&user).await.is_none());
        let decision = engine.decide_for_user("c", &user, 1, None).await;
        assert_eq!(decision.tier, PrivacyTier::Basic);
    }

    #[tokio::test]
    async fn test_congestion_reading_is_cached_per_chain() {
        let mut oracle = MockChainOracle::new();
        oracle.expect_gas_price_gwei().returning(|_| Ok(5));
        oracle
            .expect_congestion_percent()
            .times(2)
            .returning(|chain| if chain == "a" { Ok(80) } else { Ok(10) });
        let engine = PrivacyPolicyEngine::new(Arc::new(oracle), PrivacyTier::Basic);

        // Two decisions per chain; only the first hits the oracle
        for _ in 0..2 {
            assert_eq!(
                engine.decide("a", 10 * WEI_PER_ETHER, None).await.tier,
                PrivacyTier::Standard
            );
            assert_eq!(
                engine.decide("b", 10 * WEI_PER_ETHER, None).await.tier,
                PrivacyTier::Maximum
            );
        }
    }
}
