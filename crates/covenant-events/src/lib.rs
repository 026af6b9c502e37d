//! Typed event bus adapter (spec §6.2, component C13).
//!
//! Events are the indexer-facing channel: stable, attribute-carrying records
//! describing what happened. They are distinct from `log` output (operator
//! diagnostics) — neither substitutes for the other, matching the split the
//! teacher's on-chain programs keep between `ic_msg!` tracing and account
//! state an indexer would read back.

use covenant_types::{Address, LockKind};

/// One emitted domain event. Every variant carries the stable attribute set
/// an external indexer needs without having to re-query state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Stake {
        owner: Address,
        amount: u64,
        new_total: u64,
    },
    Unstake {
        owner: Address,
        amount: u64,
        remaining: u64,
    },
    TierChange {
        owner: Address,
        old_tier: i8,
        new_tier: i8,
    },
    ClaimRewards {
        owner: Address,
        amount: u64,
    },
    Slash {
        owner: Address,
        reason: String,
        amount: u64,
        fraction_bps: u64,
    },
    RewardsDistributed {
        epoch: u64,
        total: u64,
        staker_pool: u64,
        validator_pool: u64,
        governance_pool: u64,
        recipient_policy: &'static str,
    },
    StakeLocked {
        owner: Address,
        kind: LockKind,
        reference: String,
    },
    StakeUnlocked {
        owner: Address,
        kind: LockKind,
        reference: String,
    },
    UnbondingStarted {
        owner: Address,
        amount: u64,
        completion_time: u64,
    },
    UnbondingCompleted {
        owner: Address,
        amount: u64,
    },
    UnbondingCancelled {
        owner: Address,
        amount: u64,
    },
    InheritanceUnbondingCompleted {
        owner: Address,
        recipient: Address,
        amount: u64,
    },
    CommitmentAdded {
        owner: Address,
        reference: String,
        amount: u64,
    },
    CommitmentReleased {
        owner: Address,
        reference: String,
        amount: u64,
    },
    ReputationChange {
        owner: Address,
        delta: i64,
        new_score: u64,
        reason: String,
    },
    SubmitProposal {
        proposal_id: u64,
        proposer: Address,
    },
    Vote {
        proposal_id: u64,
        voter: Address,
        power: u64,
    },
    ProposalDeposit {
        proposal_id: u64,
        depositor: Address,
        amount: u64,
    },
    ProposalPassed {
        proposal_id: u64,
    },
    ProposalRejected {
        proposal_id: u64,
        reason: String,
    },
    ProposalExecuted {
        proposal_id: u64,
    },
    ProposalFailed {
        proposal_id: u64,
        result: String,
    },
    ParamsUpdated {
        authority: Address,
    },
}

/// Sink for domain events. The host wires this to whatever out-of-process
/// indexer transport it runs; this crate only requires ordered delivery of
/// what is emitted within one handler invocation.
pub trait EventBus {
    fn emit(&mut self, event: Event);
}

/// In-memory event bus used by tests and as a reference host wiring.
#[derive(Debug, Default, Clone)]
pub struct MemEventBus {
    events: Vec<Event>,
}

impl MemEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

impl EventBus for MemEventBus {
    fn emit(&mut self, event: Event) {
        log::debug!("event emitted: {event:?}");
        self.events.push(event);
    }
}
