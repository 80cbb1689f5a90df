//! Settlement balances per (holder, asset).

use crate::domain::{Address, Asset, Decimal};
use crate::error::LedgerError;
use std::collections::HashMap;

/// Holds the reserve component of every active position's debt.
pub const RESERVE_POOL: &str = "pool:reserve";
/// Holds debt tokens deposited into the stability pool, and collateral gains owed to depositors.
pub const STABILITY_POOL: &str = "pool:stability";
/// Holds staked governance tokens.
pub const STAKING_POOL: &str = "pool:staking";

pub fn pool_address(name: &str) -> Address {
    Address::new(name)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Balances {
    entries: HashMap<(Address, Asset), Decimal>,
}

impl Balances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, holder: &Address, asset: Asset) -> Decimal {
        self.entries
            .get(&(holder.clone(), asset))
            .copied()
            .unwrap_or_else(Decimal::zero)
    }

    /// Create `amount` out of thin air (borrowing, external funding).
    pub fn mint(
        &mut self,
        holder: &Address,
        asset: Asset,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Ok(());
        }
        let balance = self
            .entries
            .entry((holder.clone(), asset))
            .or_insert_with(Decimal::zero);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::overflow(&format!("{} balance of {}", asset, holder)))?;
        Ok(())
    }

    /// Destroy `amount` from `holder`, failing if the balance is short.
    pub fn burn(
        &mut self,
        holder: &Address,
        asset: Asset,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Ok(());
        }
        let available = self.balance_of(holder, asset);
        let remaining = available
            .checked_sub(amount)
            .ok_or_else(|| LedgerError::InsufficientSettlementBalance {
                account: holder.clone(),
                asset,
                needed: amount,
                available,
            })?;
        if remaining.is_zero() {
            self.entries.remove(&(holder.clone(), asset));
        } else {
            self.entries.insert((holder.clone(), asset), remaining);
        }
        Ok(())
    }

    pub fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        asset: Asset,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        self.burn(from, asset, amount)?;
        self.mint(to, asset, amount)
    }

    /// Every non-zero balance held by `holder`.
    pub fn holdings(&self, holder: &Address) -> Vec<(Asset, Decimal)> {
        let mut out: Vec<_> = self
            .entries
            .iter()
            .filter(|((h, _), _)| h == holder)
            .map(|((_, asset), amount)| (*asset, *amount))
            .collect();
        out.sort_by_key(|(asset, _)| *asset);
        out
    }
}
