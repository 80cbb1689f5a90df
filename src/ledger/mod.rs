//! Committed ledger state and the transactional boundary around it.
//!
//! Every mutating entry point (a cast batch, a redemption, an inbound event)
//! runs against a working copy through [`LedgerState::transact`]. The copy
//! replaces the committed state only when the whole unit succeeds, so a
//! failure at any step leaves positions, ranking, balances and pending records
//! exactly as they were.

pub mod balances;
pub mod stability_pool;
pub mod staking;

pub use balances::{pool_address, Balances, RESERVE_POOL, STABILITY_POOL, STAKING_POOL};
pub use stability_pool::StabilityPool;
pub use staking::StakingPool;

use crate::domain::{Address, Decimal, LedgerRecord, Position};
use crate::engine::sorted_positions::SortedPositions;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct LedgerState {
    pub positions: HashMap<Address, Position>,
    /// Active positions only.
    pub ranking: SortedPositions,
    pub balances: Balances,
    pub stability: StabilityPool,
    pub staking: StakingPool,
    /// Collateral left behind by fully redeemed positions, claimable by the owner.
    pub surplus: HashMap<Address, Decimal>,
    pending: Vec<LedgerRecord>,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self, owner: &Address) -> Option<&Position> {
        self.positions.get(owner)
    }

    pub fn surplus_of(&self, owner: &Address) -> Decimal {
        self.surplus
            .get(owner)
            .copied()
            .unwrap_or_else(Decimal::zero)
    }

    pub fn record(&mut self, record: LedgerRecord) {
        self.pending.push(record);
    }

    pub fn pending_records(&self) -> &[LedgerRecord] {
        &self.pending
    }

    /// Drain records accumulated since the last call.
    pub fn take_records(&mut self) -> Vec<LedgerRecord> {
        std::mem::take(&mut self.pending)
    }

    /// Run `f` against a working copy and commit it only on `Ok`.
    pub fn transact<T, E>(
        &mut self,
        f: impl FnOnce(&mut LedgerState) -> Result<T, E>,
    ) -> Result<T, E> {
        let mut working = self.clone();
        let value = f(&mut working)?;
        *self = working;
        Ok(value)
    }
}
