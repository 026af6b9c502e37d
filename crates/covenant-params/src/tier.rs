//! Tier classification (spec §3.1, §4.1).
//!
//! Mirrors the teacher's tiered lock/reward/vote-weight tables
//! (`passive-stake/src/constants.rs`) but keyed by bonded *amount* rather
//! than lock *duration* — this system has no timed lock tiers, only a
//! strictly increasing bonded-amount ladder.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// An owner's classification by bonded amount. `None` (no tier) sorts below
/// every real tier; the `i8` repr lets `GetUserTier`/`HasMinimumTier`
/// comparisons use plain integer ordering exactly like the spec's
/// `tier ≥ Validator` phrasing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
#[borsh(use_discriminant = true)]
#[repr(i8)]
pub enum Tier {
    None = -1,
    Holder = 0,
    Keeper = 1,
    Warden = 2,
    Steward = 3,
    Archon = 4,
    Validator = 5,
}

impl Tier {
    pub const ALL: [Tier; 6] = [
        Tier::Holder,
        Tier::Keeper,
        Tier::Warden,
        Tier::Steward,
        Tier::Archon,
        Tier::Validator,
    ];

    pub fn as_i8(self) -> i8 {
        self as i8
    }
}

/// Strictly increasing bonded-amount thresholds, one per real tier
/// (`Tier::None` has no threshold — anything below `Holder` is `None`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct TierThresholds {
    pub holder: u64,
    pub keeper: u64,
    pub warden: u64,
    pub steward: u64,
    pub archon: u64,
    pub validator: u64,
}

impl TierThresholds {
    /// Mainnet profile. Values are in micro-token units.
    pub const MAINNET: TierThresholds = TierThresholds {
        holder: 1_000,
        keeper: 10_000,
        warden: 100_000,
        steward: 1_000_000,
        archon: 10_000_000,
        validator: 100_000_000,
    };

    /// Testnet profile: three orders of magnitude smaller, so test
    /// environments can exercise every tier without needing mainnet-scale
    /// balances (spec §3.1: "a separate testnet profile uses thresholds
    /// three orders of magnitude smaller").
    pub const TESTNET: TierThresholds = TierThresholds {
        holder: 1,
        keeper: 10,
        warden: 100,
        steward: 1_000,
        archon: 10_000,
        validator: 100_000,
    };

    pub fn threshold(&self, tier: Tier) -> Option<u64> {
        match tier {
            Tier::None => None,
            Tier::Holder => Some(self.holder),
            Tier::Keeper => Some(self.keeper),
            Tier::Warden => Some(self.warden),
            Tier::Steward => Some(self.steward),
            Tier::Archon => Some(self.archon),
            Tier::Validator => Some(self.validator),
        }
    }

    /// The highest tier `T` such that `bonded_amount >= threshold(T)`.
    pub fn tier_for_amount(&self, bonded_amount: u64) -> Tier {
        if bonded_amount >= self.validator {
            Tier::Validator
        } else if bonded_amount >= self.archon {
            Tier::Archon
        } else if bonded_amount >= self.steward {
            Tier::Steward
        } else if bonded_amount >= self.warden {
            Tier::Warden
        } else if bonded_amount >= self.keeper {
            Tier::Keeper
        } else if bonded_amount >= self.holder {
            Tier::Holder
        } else {
            Tier::None
        }
    }

    /// `true` iff thresholds are strictly increasing across the tier ladder,
    /// the invariant §3.1 requires of any threshold set (genesis or a
    /// governance-authored parameter update).
    pub fn is_monotone(&self) -> bool {
        self.holder < self.keeper
            && self.keeper < self.warden
            && self.warden < self.steward
            && self.steward < self.archon
            && self.archon < self.validator
    }
}

/// Selects the threshold profile for a chain id. Testnet chain ids carry a
/// `-testnet` or `-devnet` suffix by this chain's convention (mirroring
/// Cosmos-SDK-style `chain-id` suffixing); anything else runs the mainnet
/// profile. Documented here because spec §3.1 leaves the selection rule
/// itself unspecified ("the profile selected is a function of the chain
/// identifier").
pub fn thresholds_for_chain(chain_id: &str) -> TierThresholds {
    if is_testnet_chain(chain_id) {
        TierThresholds::TESTNET
    } else {
        TierThresholds::MAINNET
    }
}

/// `true` for chain ids carrying the `-testnet`/`-devnet` suffix this chain's
/// convention uses to pick the scaled-down profile. Shared with
/// `StakingParams::defaults_for_chain` so every chain-scaled default (tier
/// thresholds, `min_stake_amount`) is derived from the same rule.
pub fn is_testnet_chain(chain_id: &str) -> bool {
    chain_id.ends_with("-testnet") || chain_id.ends_with("-devnet")
}

/// Reward weight multiplier per tier, basis points of the staked amount
/// (spec §4.5 "weight combines bonded amount and tier multiplier").
/// Mirrors the teacher's `reward_rate_bps_for_tier` table, re-keyed from
/// lock-duration tiers to bonded-amount tiers.
pub fn tier_reward_weight_bps(tier: Tier) -> u64 {
    match tier {
        Tier::None => 0,
        Tier::Holder => 10_000,
        Tier::Keeper => 12_000,
        Tier::Warden => 15_000,
        Tier::Steward => 20_000,
        Tier::Archon => 30_000,
        Tier::Validator => 50_000,
    }
}

/// Maximum fraction of bonded stake (`tier.SlashRisk`, basis points) a
/// single slash can take, regardless of the offense's configured fraction.
/// Higher tiers have proportionally more to lose in absolute terms, so the
/// cap tightens rather than loosens as tier rises, mirroring the teacher's
/// "only the validator's own stake is slashed" containment principle.
pub fn tier_slash_risk_bps(tier: Tier) -> u64 {
    match tier {
        Tier::None => 0,
        Tier::Holder => 5_000,
        Tier::Keeper => 4_000,
        Tier::Warden => 3_500,
        Tier::Steward => 3_000,
        Tier::Archon => 2_500,
        Tier::Validator => 2_000,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_for_amount_picks_highest_eligible() {
        let t = TierThresholds::MAINNET;
        assert_eq!(t.tier_for_amount(0), Tier::None);
        assert_eq!(t.tier_for_amount(999), Tier::None);
        assert_eq!(t.tier_for_amount(1_000), Tier::Holder);
        assert_eq!(t.tier_for_amount(99_999), Tier::Keeper);
        assert_eq!(t.tier_for_amount(100_000_000), Tier::Validator);
        assert_eq!(t.tier_for_amount(u64::MAX), Tier::Validator);
    }

    #[test]
    fn testnet_profile_is_three_orders_smaller() {
        let m = TierThresholds::MAINNET;
        let t = TierThresholds::TESTNET;
        assert_eq!(m.holder, t.holder * 1_000);
        assert_eq!(m.validator, t.validator * 1_000);
    }

    #[test]
    fn chain_id_selects_profile() {
        assert_eq!(thresholds_for_chain("covenant-1"), TierThresholds::MAINNET);
        assert_eq!(thresholds_for_chain("covenant-testnet"), TierThresholds::TESTNET);
        assert_eq!(thresholds_for_chain("covenant-devnet"), TierThresholds::TESTNET);
    }

    #[test]
    fn default_profiles_are_monotone() {
        assert!(TierThresholds::MAINNET.is_monotone());
        assert!(TierThresholds::TESTNET.is_monotone());
    }

    #[test]
    fn tier_ordering_matches_spec_validator_gate() {
        assert!(Tier::Validator > Tier::Archon);
        assert!(Tier::None < Tier::Holder);
    }
}
