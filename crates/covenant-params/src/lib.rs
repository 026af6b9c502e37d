//! Parameter Registry (component C12): every tunable the staking and
//! governance engines consult, validated on change and mutable only through
//! a governance-authored `UpdateParams` message (spec §4.8). This is the
//! configuration layer for the whole crate — there is no environment
//! variable or config-file path; the chain's configuration *is* on-chain
//! state, loaded at genesis and versioned thereafter.

mod governance;
mod staking;
mod tier;

pub use governance::GovernanceParams;
pub use staking::{ReputationAction, SlashReason, StakingParams};
pub use tier::{thresholds_for_chain, tier_reward_weight_bps, tier_slash_risk_bps, Tier, TierThresholds};
