use crate::domain::{Address, Decimal};
use std::collections::HashMap;

/// Governance-token stakes. Custody is in the staking pool balance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StakingPool {
    stakes: HashMap<Address, Decimal>,
}

impl StakingPool {
    pub fn stake(&mut self, staker: &Address, amount: Decimal) {
        *self
            .stakes
            .entry(staker.clone())
            .or_insert_with(Decimal::zero) += amount;
    }

    /// Unstake up to `amount`; returns the amount released.
    pub fn unstake(&mut self, staker: &Address, amount: Decimal) -> Decimal {
        let current = self.staked_of(staker);
        let released = current.min(amount);
        let remaining = current - released;
        if remaining.is_zero() {
            self.stakes.remove(staker);
        } else {
            self.stakes.insert(staker.clone(), remaining);
        }
        released
    }

    pub fn staked_of(&self, staker: &Address) -> Decimal {
        self.stakes
            .get(staker)
            .copied()
            .unwrap_or_else(Decimal::zero)
    }
}
