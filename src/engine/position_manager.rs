//! Position lifecycle: open, adjust, close, redemption and externally driven
//! status changes.
//!
//! Every mutation keeps three things in step: the position map, the ranking
//! (active positions only, re-sorted whenever collateral or debt moves) and the
//! settlement balances. A [`LedgerRecord`] is queued for each mutation and
//! published by the caller once the surrounding transaction commits.

use crate::config::LedgerParams;
use crate::domain::{
    compute_collateral_ratio, Address, Asset, Decimal, LedgerRecord, Position, PositionStatus,
    Ratio, RecordKind, TimeMs,
};
use crate::engine::hints::{approximate_hint, exact_insert_position, InsertPosition};
use crate::engine::redemption::{plan_redemption, RedemptionPlan, RedemptionStep};
use crate::engine::sorted_positions::SortedPositions;
use crate::error::LedgerError;
use crate::ledger::{pool_address, LedgerState, RESERVE_POOL};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Caller-supplied neighbors for a re-sorted position. Either may be stale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertHints {
    pub upper: Option<Address>,
    pub lower: Option<Address>,
}

impl InsertHints {
    pub fn new(upper: Option<Address>, lower: Option<Address>) -> Self {
        Self { upper, lower }
    }
}

/// A combined collateral/debt change. Zero fields are no-ops.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionChange {
    pub collateral_in: Decimal,
    pub collateral_out: Decimal,
    pub borrow: Decimal,
    pub repay: Decimal,
    /// Highest borrowing fee rate the caller accepts. Only checked when borrowing.
    pub max_fee: Decimal,
}

/// Resolve an insert position for `ratio`.
///
/// A caller pair is used as-is when it is valid and places the position ahead
/// of every equal ratio. Otherwise the first caller hint that is still a
/// member seeds the exact walk, falling back to a sampled approximate hint. A
/// walk that goes stale is retried with fresh samples up to `hint_retries`
/// times.
pub fn find_insert_position(
    ranking: &SortedPositions,
    ratio: Ratio,
    hints: &InsertHints,
    params: &LedgerParams,
) -> Result<InsertPosition, LedgerError> {
    let ahead_of_ties = hints
        .upper
        .as_ref()
        .map_or(true, |upper| ranking.ratio_of(upper).is_some_and(|r| r > ratio));
    if (hints.upper.is_some() || hints.lower.is_some())
        && ahead_of_ties
        && ranking.is_valid_insert_position(ratio, hints.upper.as_ref(), hints.lower.as_ref())
    {
        return Ok(InsertPosition {
            prev: hints.upper.clone(),
            next: hints.lower.clone(),
        });
    }

    let mut start = hints
        .upper
        .iter()
        .chain(hints.lower.iter())
        .find(|h| ranking.contains(h))
        .cloned();
    let mut seed = params.hint_seed;
    let mut attempt = 0usize;

    loop {
        let hint = match start.take() {
            Some(handle) => Some(handle),
            None => approximate_hint(ranking, ratio, params.hint_sample_attempts, seed).map(
                |approx| {
                    seed = approx.next_seed;
                    approx.handle
                },
            ),
        };
        match exact_insert_position(ranking, ratio, hint.as_ref(), params.max_walk_steps) {
            Err(err) if err.is_retryable() && attempt < params.hint_retries => {
                attempt += 1;
                warn!(attempt, error = %err, "insert hint went stale, resampling");
            }
            result => return result,
        }
    }
}

pub struct PositionManager<'a> {
    state: &'a mut LedgerState,
    params: &'a LedgerParams,
    price: Decimal,
}

impl<'a> PositionManager<'a> {
    pub fn new(state: &'a mut LedgerState, params: &'a LedgerParams, price: Decimal) -> Self {
        Self {
            state,
            params,
            price,
        }
    }

    /// Open a position for `owner`, pulling collateral from their wallet and
    /// minting `borrow` debt tokens to it. Returns the amount borrowed.
    pub fn open(
        &mut self,
        owner: &Address,
        collateral: Decimal,
        max_fee: Decimal,
        borrow: Decimal,
        hints: &InsertHints,
    ) -> Result<Decimal, LedgerError> {
        if self
            .state
            .positions
            .get(owner)
            .is_some_and(Position::is_active)
        {
            return Err(LedgerError::PositionAlreadyActive(owner.clone()));
        }
        if !collateral.is_positive() {
            return Err(LedgerError::InvalidAmount(format!(
                "collateral must be positive, got {}",
                collateral
            )));
        }
        ensure_non_negative(borrow, "borrow")?;

        let fee = self.borrowing_fee(borrow, max_fee)?;
        let net_debt = borrow
            .checked_add(fee)
            .ok_or_else(|| LedgerError::overflow("net debt"))?;
        if net_debt < self.params.min_net_debt {
            return Err(LedgerError::BelowMinimumNetDebt {
                net_debt,
                minimum: self.params.min_net_debt,
            });
        }
        let debt = net_debt
            .checked_add(self.params.reserve_minimum)
            .ok_or_else(|| LedgerError::overflow("debt"))?;
        self.check_collateral_ratio(collateral, debt)?;

        self.state.balances.burn(owner, Asset::Collateral, collateral)?;
        self.state.balances.mint(owner, Asset::Debt, borrow)?;
        self.state.balances.mint(
            &pool_address(RESERVE_POOL),
            Asset::Debt,
            self.params.reserve_minimum,
        )?;

        let position = Position::new(owner.clone(), collateral, debt);
        self.reposition(owner, position.nominal_ratio(), hints)?;
        self.state
            .record(LedgerRecord::between(RecordKind::Open, None, &position));
        debug!(owner = %owner, collateral = %collateral, debt = %debt, "position opened");
        self.state.positions.insert(owner.clone(), position);
        Ok(borrow)
    }

    /// Apply a combined change to an active position and re-sort it.
    pub fn adjust(
        &mut self,
        owner: &Address,
        change: &PositionChange,
        hints: &InsertHints,
        kind: RecordKind,
    ) -> Result<Position, LedgerError> {
        let before = self.active(owner)?;

        ensure_non_negative(change.collateral_in, "collateral deposit")?;
        ensure_non_negative(change.collateral_out, "collateral withdrawal")?;
        ensure_non_negative(change.borrow, "borrow")?;
        ensure_non_negative(change.repay, "repay")?;
        if change.collateral_in.is_positive() && change.collateral_out.is_positive() {
            return Err(LedgerError::InvalidAmount(
                "cannot deposit and withdraw collateral in one adjustment".to_string(),
            ));
        }
        if change.collateral_in.is_zero()
            && change.collateral_out.is_zero()
            && change.borrow.is_zero()
            && change.repay.is_zero()
        {
            return Err(LedgerError::InvalidAmount(
                "adjustment changes nothing".to_string(),
            ));
        }

        let fee = self.borrowing_fee(change.borrow, change.max_fee)?;
        let collateral = before
            .collateral
            .checked_add(change.collateral_in)
            .ok_or_else(|| LedgerError::overflow("collateral"))?
            .checked_sub(change.collateral_out)
            .ok_or_else(|| {
                LedgerError::InvalidAmount(format!(
                    "withdrawal {} exceeds collateral {}",
                    change.collateral_out, before.collateral
                ))
            })?;
        let debt = before
            .debt
            .checked_add(change.borrow)
            .and_then(|debt| debt.checked_add(fee))
            .ok_or_else(|| LedgerError::overflow("debt"))?
            - change.repay;
        if debt < self.params.reserve_minimum {
            return Err(LedgerError::BelowReserveMinimum {
                debt,
                minimum: self.params.reserve_minimum,
            });
        }
        let net_debt = debt - self.params.reserve_minimum;
        if net_debt < self.params.min_net_debt {
            return Err(LedgerError::BelowMinimumNetDebt {
                net_debt,
                minimum: self.params.min_net_debt,
            });
        }
        if change.collateral_out.is_positive() || change.borrow.is_positive() {
            self.check_collateral_ratio(collateral, debt)?;
        }

        let balances = &mut self.state.balances;
        balances.burn(owner, Asset::Collateral, change.collateral_in)?;
        balances.mint(owner, Asset::Collateral, change.collateral_out)?;
        balances.mint(owner, Asset::Debt, change.borrow)?;
        balances.burn(owner, Asset::Debt, change.repay)?;

        let after = Position {
            collateral,
            debt,
            ..before.clone()
        };
        self.reposition(owner, after.nominal_ratio(), hints)?;
        self.state
            .record(LedgerRecord::between(kind, Some(&before), &after));
        self.state.positions.insert(owner.clone(), after.clone());
        Ok(after)
    }

    /// Repay the net debt from the owner's wallet, retire the reserve and
    /// release all collateral. Returns the collateral released.
    pub fn close(&mut self, owner: &Address) -> Result<Decimal, LedgerError> {
        let before = self.active(owner)?;
        let net_debt = before.net_debt(self.params.reserve_minimum);

        self.state.balances.burn(owner, Asset::Debt, net_debt)?;
        self.retire_reserve(&before)?;
        self.state
            .balances
            .mint(owner, Asset::Collateral, before.collateral)?;
        self.state.ranking.remove(owner);

        let mut after = before.clone();
        after.settle(PositionStatus::Closed);
        self.state
            .record(LedgerRecord::between(RecordKind::Close, Some(&before), &after));
        self.state.positions.insert(owner.clone(), after);
        debug!(owner = %owner, released = %before.collateral, "position closed");
        Ok(before.collateral)
    }

    /// Pay out collateral surplus left by a full redemption.
    pub fn claim_collateral(&mut self, owner: &Address) -> Result<Decimal, LedgerError> {
        let amount = self
            .state
            .surplus
            .remove(owner)
            .filter(|amount| amount.is_positive())
            .ok_or_else(|| LedgerError::NothingToClaim(owner.clone()))?;
        self.state.balances.mint(owner, Asset::Collateral, amount)?;
        self.state.record(LedgerRecord {
            kind: RecordKind::ClaimCollateral,
            position: owner.clone(),
            collateral_before: amount,
            collateral_after: Decimal::zero(),
            debt_before: Decimal::zero(),
            debt_after: Decimal::zero(),
            time_ms: TimeMs::now(),
        });
        Ok(amount)
    }

    /// Burn `amount` debt tokens from `redeemer` against the weakest eligible
    /// positions and pay out the drawn collateral.
    pub fn redeem(
        &mut self,
        redeemer: &Address,
        amount: Decimal,
    ) -> Result<RedemptionPlan, LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(format!(
                "redemption amount must be positive, got {}",
                amount
            )));
        }
        let plan = plan_redemption(
            &self.state.ranking,
            &self.state.positions,
            amount,
            self.price,
            self.params,
        );
        let applied = plan.applied();
        if applied.is_zero() {
            return Err(LedgerError::InvalidAmount(
                "no position can absorb the redemption".to_string(),
            ));
        }

        self.state.balances.burn(redeemer, Asset::Debt, applied)?;
        for step in &plan.steps {
            self.apply_redemption_step(step)?;
        }
        self.state
            .balances
            .mint(redeemer, Asset::Collateral, plan.collateral_drawn())?;
        Ok(plan)
    }

    fn apply_redemption_step(&mut self, step: &RedemptionStep) -> Result<(), LedgerError> {
        let before = self.active(&step.owner)?;
        let mut after = before.clone();
        after.collateral = before.collateral - step.collateral_drawn;
        after.debt = before.debt - step.debt_applied;

        if step.full {
            self.credit_surplus(&step.owner, after.collateral)?;
            self.retire_reserve(&after)?;
            self.state.ranking.remove(&step.owner);
            after.settle(PositionStatus::Redeemed);
            self.state
                .record(LedgerRecord::between(RecordKind::Redeemed, Some(&before), &after));
        } else {
            self.reposition(&step.owner, after.nominal_ratio(), &InsertHints::default())?;
            self.state.record(LedgerRecord::between(
                RecordKind::Redemption,
                Some(&before),
                &after,
            ));
        }
        self.state.positions.insert(step.owner.clone(), after);
        Ok(())
    }

    /// An external redemption fully consumed the position.
    pub fn mark_redeemed(
        &mut self,
        owner: &Address,
        collateral_surplus: Decimal,
    ) -> Result<(), LedgerError> {
        let before = self.existing(owner)?;
        if !before.is_active() {
            return Err(LedgerError::InvalidTransition {
                owner: owner.clone(),
                from: before.status,
                to: PositionStatus::Redeemed,
            });
        }
        ensure_non_negative(collateral_surplus, "collateral surplus")?;

        self.retire_reserve(&before)?;
        self.credit_surplus(owner, collateral_surplus)?;
        self.state.ranking.remove(owner);
        let mut after = before.clone();
        after.settle(PositionStatus::Redeemed);
        self.state
            .record(LedgerRecord::between(RecordKind::Redeemed, Some(&before), &after));
        self.state.positions.insert(owner.clone(), after);
        Ok(())
    }

    /// The position was liquidated externally. Allowed from active or redeemed.
    pub fn mark_liquidated(&mut self, owner: &Address) -> Result<(), LedgerError> {
        let before = self.existing(owner)?;
        let mut after = before.clone();
        match before.status {
            PositionStatus::Active => {
                self.retire_reserve(&before)?;
                self.state.ranking.remove(owner);
                after.settle(PositionStatus::Liquidated);
            }
            PositionStatus::Redeemed => after.status = PositionStatus::Liquidated,
            from => {
                return Err(LedgerError::InvalidTransition {
                    owner: owner.clone(),
                    from,
                    to: PositionStatus::Liquidated,
                })
            }
        }
        self.state
            .record(LedgerRecord::between(RecordKind::Liquidated, Some(&before), &after));
        self.state.positions.insert(owner.clone(), after);
        Ok(())
    }

    fn reposition(
        &mut self,
        owner: &Address,
        ratio: Ratio,
        hints: &InsertHints,
    ) -> Result<(), LedgerError> {
        self.state.ranking.remove(owner);
        let slot = find_insert_position(&self.state.ranking, ratio, hints, self.params)?;
        self.state
            .ranking
            .insert(owner.clone(), ratio, slot.prev, slot.next)
    }

    fn borrowing_fee(&self, amount: Decimal, max_fee: Decimal) -> Result<Decimal, LedgerError> {
        if amount.is_zero() {
            return Ok(Decimal::zero());
        }
        let rate = self.params.borrowing_fee_rate;
        if rate > max_fee {
            return Err(LedgerError::MaxFeeExceeded { rate, max: max_fee });
        }
        amount
            .checked_mul(rate)
            .ok_or_else(|| LedgerError::overflow("borrowing fee"))
    }

    fn check_collateral_ratio(
        &self,
        collateral: Decimal,
        debt: Decimal,
    ) -> Result<(), LedgerError> {
        let ratio = compute_collateral_ratio(collateral, debt, self.price);
        if ratio < Ratio(self.params.min_collateral_ratio) {
            return Err(LedgerError::CollateralRatioTooLow {
                ratio,
                minimum: self.params.min_collateral_ratio,
            });
        }
        Ok(())
    }

    /// The reserve component leaves the reserve pool with the position.
    fn retire_reserve(&mut self, position: &Position) -> Result<(), LedgerError> {
        let reserve = self.params.reserve_minimum.min(position.debt);
        self.state
            .balances
            .burn(&pool_address(RESERVE_POOL), Asset::Debt, reserve)
    }

    fn credit_surplus(&mut self, owner: &Address, amount: Decimal) -> Result<(), LedgerError> {
        if !amount.is_positive() {
            return Ok(());
        }
        let surplus = self
            .state
            .surplus
            .entry(owner.clone())
            .or_insert_with(Decimal::zero);
        *surplus = surplus
            .checked_add(amount)
            .ok_or_else(|| LedgerError::overflow("collateral surplus"))?;
        Ok(())
    }

    fn existing(&self, owner: &Address) -> Result<Position, LedgerError> {
        self.state
            .positions
            .get(owner)
            .cloned()
            .ok_or_else(|| LedgerError::PositionNotFound(owner.clone()))
    }

    fn active(&self, owner: &Address) -> Result<Position, LedgerError> {
        let position = self.existing(owner)?;
        if !position.is_active() {
            return Err(LedgerError::PositionNotActive {
                owner: owner.clone(),
                status: position.status,
            });
        }
        Ok(position)
    }
}

fn ensure_non_negative(amount: Decimal, what: &str) -> Result<(), LedgerError> {
    if amount.is_negative() {
        return Err(LedgerError::InvalidAmount(format!(
            "{} must not be negative, got {}",
            what, amount
        )));
    }
    Ok(())
}
