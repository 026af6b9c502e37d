//! Hooks consumed by collaborators (spec §6.3).
//!
//! Invoked in fixed registration order after the triggering state mutation
//! has already committed. A hook returning an error is logged and swallowed
//! — hooks are advisory and never roll back the mutation that fired them.

use covenant_params::Tier;
use covenant_types::{Address, CoreError};

pub trait StakeHooks {
    fn after_stake(&mut self, _owner: &Address, _amount: u64, _new_total: u64) -> Result<(), CoreError> {
        Ok(())
    }

    fn after_unstake(&mut self, _owner: &Address, _amount: u64, _remaining: u64) -> Result<(), CoreError> {
        Ok(())
    }

    fn after_tier_change(&mut self, _owner: &Address, _old: Tier, _new: Tier) -> Result<(), CoreError> {
        Ok(())
    }

    fn after_slash(&mut self, _owner: &Address, _amount: u64) -> Result<(), CoreError> {
        Ok(())
    }

    fn after_reputation_change(&mut self, _owner: &Address, _delta: i64, _new_score: u64) -> Result<(), CoreError> {
        Ok(())
    }
}

/// Ordered set of registered hook subscribers. Errors are logged, never
/// propagated, matching spec §6.3's "hooks are advisory" contract.
#[derive(Default)]
pub struct HookRegistry {
    subscribers: Vec<Box<dyn StakeHooks>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, hook: Box<dyn StakeHooks>) {
        self.subscribers.push(hook);
    }

    pub fn fire_after_stake(&mut self, owner: &Address, amount: u64, new_total: u64) {
        for hook in &mut self.subscribers {
            if let Err(e) = hook.after_stake(owner, amount, new_total) {
                log::warn!("AfterStake hook failed for {owner:?}: {e}");
            }
        }
    }

    pub fn fire_after_unstake(&mut self, owner: &Address, amount: u64, remaining: u64) {
        for hook in &mut self.subscribers {
            if let Err(e) = hook.after_unstake(owner, amount, remaining) {
                log::warn!("AfterUnstake hook failed for {owner:?}: {e}");
            }
        }
    }

    pub fn fire_after_tier_change(&mut self, owner: &Address, old: Tier, new: Tier) {
        for hook in &mut self.subscribers {
            if let Err(e) = hook.after_tier_change(owner, old, new) {
                log::warn!("AfterTierChange hook failed for {owner:?}: {e}");
            }
        }
    }

    pub fn fire_after_slash(&mut self, owner: &Address, amount: u64) {
        for hook in &mut self.subscribers {
            if let Err(e) = hook.after_slash(owner, amount) {
                log::warn!("AfterSlash hook failed for {owner:?}: {e}");
            }
        }
    }

    pub fn fire_after_reputation_change(&mut self, owner: &Address, delta: i64, new_score: u64) {
        for hook in &mut self.subscribers {
            if let Err(e) = hook.after_reputation_change(owner, delta, new_score) {
                log::warn!("AfterReputationChange hook failed for {owner:?}: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Counting {
        calls: Rc<RefCell<u32>>,
    }

    impl StakeHooks for Counting {
        fn after_stake(&mut self, _owner: &Address, _amount: u64, _new_total: u64) -> Result<(), CoreError> {
            *self.calls.borrow_mut() += 1;
            Ok(())
        }
    }

    struct Failing;
    impl StakeHooks for Failing {
        fn after_stake(&mut self, _owner: &Address, _amount: u64, _new_total: u64) -> Result<(), CoreError> {
            Err(CoreError::Store("boom".to_string()))
        }
    }

    #[test]
    fn hooks_fire_in_registration_order_and_swallow_errors() {
        let calls = Rc::new(RefCell::new(0));
        let mut registry = HookRegistry::new();
        registry.register(Box::new(Failing));
        registry.register(Box::new(Counting { calls: calls.clone() }));

        registry.fire_after_stake(&Address::new([1; 32]), 10, 10);
        assert_eq!(*calls.borrow(), 1);
    }
}
