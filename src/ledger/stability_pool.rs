//! Stability pool deposits and the collateral gains credited to depositors.
//!
//! Token custody lives in [`Balances`](super::Balances) under the stability
//! pool address. This type only tracks who is owed what.

use crate::domain::{Address, Decimal};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StabilityPool {
    deposits: HashMap<Address, Decimal>,
    gains: HashMap<Address, Decimal>,
    frontends: HashMap<Address, Address>,
}

impl StabilityPool {
    pub fn deposit(&mut self, depositor: &Address, amount: Decimal, frontend: Option<Address>) {
        *self
            .deposits
            .entry(depositor.clone())
            .or_insert_with(Decimal::zero) += amount;
        // The first tag sticks.
        if let Some(frontend) = frontend {
            self.frontends.entry(depositor.clone()).or_insert(frontend);
        }
    }

    /// Withdraw up to `amount`. Returns what was actually withdrawn.
    pub fn withdraw(&mut self, depositor: &Address, amount: Decimal) -> Decimal {
        let current = self.deposit_of(depositor);
        let taken = current.min(amount);
        let remaining = current - taken;
        if remaining.is_zero() {
            self.deposits.remove(depositor);
            self.frontends.remove(depositor);
        } else {
            self.deposits.insert(depositor.clone(), remaining);
        }
        taken
    }

    pub fn credit_gain(&mut self, depositor: &Address, amount: Decimal) {
        *self
            .gains
            .entry(depositor.clone())
            .or_insert_with(Decimal::zero) += amount;
    }

    /// Remove and return the pending collateral gain.
    pub fn take_gain(&mut self, depositor: &Address) -> Decimal {
        self.gains.remove(depositor).unwrap_or_else(Decimal::zero)
    }

    pub fn deposit_of(&self, depositor: &Address) -> Decimal {
        self.deposits
            .get(depositor)
            .copied()
            .unwrap_or_else(Decimal::zero)
    }

    pub fn gain_of(&self, depositor: &Address) -> Decimal {
        self.gains
            .get(depositor)
            .copied()
            .unwrap_or_else(Decimal::zero)
    }

    pub fn frontend_of(&self, depositor: &Address) -> Option<&Address> {
        self.frontends.get(depositor)
    }

    pub fn total_deposits(&self) -> Decimal {
        self.deposits.values().copied().sum()
    }
}
