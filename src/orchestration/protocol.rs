//! The protocol facade: owns the committed ledger, runs every mutation inside a
//! transaction and publishes audit records once it commits.

use crate::cast::{CastContext, Dispatcher, Executor};
use crate::config::{Config, LedgerParams};
use crate::domain::{
    batch_digest, compute_nominal_ratio, Address, Asset, Decimal, LedgerRecord, Position,
    PositionEvent, Ratio, Receipt, Spell,
};
use crate::engine::{
    approximate_hint, find_insert_position, plan_redemption, redemption_hints, ApproxHint,
    InsertHints, PositionManager, RedemptionHints, RedemptionStep,
};
use crate::error::{CastFailure, LedgerError};
use crate::external::{AuditSink, FixedPriceFeed, PriceFeed};
use crate::ledger::{pool_address, LedgerState, STABILITY_POOL};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CastOutcome {
    pub batch_id: Uuid,
    pub batch_digest: String,
    pub receipts: Vec<Receipt>,
    pub records: Vec<LedgerRecord>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionOutcome {
    pub redeemer: Address,
    pub requested: Decimal,
    pub redeemed: Decimal,
    pub collateral_paid: Decimal,
    pub remainder: Decimal,
    pub steps: Vec<RedemptionStep>,
    pub records: Vec<LedgerRecord>,
}

/// Where a position with the given balances would be ranked right now.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertHintView {
    pub nominal_ratio: Ratio,
    pub approx_hint: Option<ApproxHint>,
    pub upper_hint: Option<Address>,
    pub lower_hint: Option<Address>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub owner: Address,
    pub nominal_ratio: Ratio,
    pub collateral: Decimal,
    pub debt: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub address: Address,
    pub collateral: Decimal,
    pub debt: Decimal,
    pub governance: Decimal,
    pub collateral_surplus: Decimal,
    pub stability_deposit: Decimal,
    pub stability_gain: Decimal,
    pub staked: Decimal,
}

#[derive(Debug)]
pub struct Protocol {
    state: LedgerState,
    params: LedgerParams,
    dispatcher: Dispatcher,
    price_feed: Arc<dyn PriceFeed>,
    audit: Arc<dyn AuditSink>,
}

impl Protocol {
    pub fn new(
        params: LedgerParams,
        price_feed: Arc<dyn PriceFeed>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            state: LedgerState::new(),
            params,
            dispatcher: Dispatcher::standard(),
            price_feed,
            audit,
        }
    }

    pub fn from_config(config: &Config, audit: Arc<dyn AuditSink>) -> Self {
        Self::new(
            config.params.clone(),
            Arc::new(FixedPriceFeed::new(config.collateral_price)),
            audit,
        )
    }

    pub fn params(&self) -> &LedgerParams {
        &self.params
    }

    pub fn price(&self) -> Decimal {
        self.price_feed.current_price()
    }

    pub fn set_price_feed(&mut self, price_feed: Arc<dyn PriceFeed>) {
        self.price_feed = price_feed;
    }

    pub fn operations(&self) -> Vec<&'static str> {
        self.dispatcher.operations()
    }

    /// Run a batch. Either every spell takes effect or none does.
    pub fn cast(
        &mut self,
        context: &CastContext,
        spells: &[Spell],
    ) -> Result<CastOutcome, CastFailure> {
        let batch_id = Uuid::new_v4();
        let digest = batch_digest(spells);
        let price = self.price_feed.current_price();
        let executor = Executor::new(&self.dispatcher, &self.params, price);

        match executor.execute(spells, context, &mut self.state) {
            Ok(receipts) => {
                let records = self.publish();
                info!(
                    batch_id = %batch_id,
                    account = %context.account,
                    spells = spells.len(),
                    records = records.len(),
                    "batch committed"
                );
                Ok(CastOutcome {
                    batch_id,
                    batch_digest: digest,
                    receipts,
                    records,
                })
            }
            Err(failure) => {
                warn!(
                    batch_id = %batch_id,
                    account = %context.account,
                    step = failure.step,
                    operation = %failure.operation,
                    kind = failure.error.kind(),
                    "batch rejected"
                );
                Err(failure)
            }
        }
    }

    pub fn redeem(
        &mut self,
        redeemer: &Address,
        amount: Decimal,
    ) -> Result<RedemptionOutcome, LedgerError> {
        let price = self.price();
        let params = &self.params;
        let plan = self
            .state
            .transact(|state| PositionManager::new(state, params, price).redeem(redeemer, amount))?;
        let records = self.publish();
        info!(
            redeemer = %redeemer,
            requested = %amount,
            redeemed = %plan.applied(),
            positions = plan.steps.len(),
            "redemption committed"
        );
        Ok(RedemptionOutcome {
            redeemer: redeemer.clone(),
            requested: plan.requested,
            redeemed: plan.applied(),
            collateral_paid: plan.collateral_drawn(),
            remainder: plan.remainder,
            steps: plan.steps,
            records,
        })
    }

    /// Read-only preview of a redemption of `amount`.
    pub fn redemption_hints(&self, amount: Decimal) -> RedemptionHints {
        let plan = plan_redemption(
            &self.state.ranking,
            &self.state.positions,
            amount,
            self.price(),
            &self.params,
        );
        redemption_hints(&plan)
    }

    pub fn insert_hint(
        &self,
        collateral: Decimal,
        debt: Decimal,
    ) -> Result<InsertHintView, LedgerError> {
        let ratio = compute_nominal_ratio(collateral, debt);
        let ranking = &self.state.ranking;
        let approx = approximate_hint(
            ranking,
            ratio,
            self.params.hint_sample_attempts,
            self.params.hint_seed,
        );
        let slot = find_insert_position(ranking, ratio, &InsertHints::default(), &self.params)?;
        Ok(InsertHintView {
            nominal_ratio: ratio,
            approx_hint: approx,
            upper_hint: slot.prev,
            lower_hint: slot.next,
        })
    }

    /// Apply a status change reported by the external source of truth.
    pub fn apply_event(
        &mut self,
        event: &PositionEvent,
    ) -> Result<Vec<LedgerRecord>, LedgerError> {
        let price = self.price();
        let params = &self.params;
        self.state.transact(|state| match event {
            PositionEvent::Redeemed {
                owner,
                collateral_surplus,
            } => PositionManager::new(state, params, price)
                .mark_redeemed(owner, *collateral_surplus),
            PositionEvent::Liquidated { owner } => {
                PositionManager::new(state, params, price).mark_liquidated(owner)
            }
            PositionEvent::StabilityGain { depositor, amount } => {
                if !amount.is_positive() {
                    return Err(LedgerError::InvalidAmount(format!(
                        "stability gain must be positive, got {}",
                        amount
                    )));
                }
                state
                    .balances
                    .mint(&pool_address(STABILITY_POOL), Asset::Collateral, *amount)?;
                state.stability.credit_gain(depositor, *amount);
                Ok(())
            }
        })?;
        let records = self.publish();
        info!(event = event.kind_name(), records = records.len(), "inbound event applied");
        Ok(records)
    }

    /// Credit `amount` of `asset` to `holder` from outside the ledger.
    /// Returns the new balance.
    pub fn fund(
        &mut self,
        holder: &Address,
        asset: Asset,
        amount: Decimal,
    ) -> Result<Decimal, LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(format!(
                "funding amount must be positive, got {}",
                amount
            )));
        }
        self.state.balances.mint(holder, asset, amount)?;
        info!(holder = %holder, asset = %asset, amount = %amount, "wallet funded");
        Ok(self.state.balances.balance_of(holder, asset))
    }

    pub fn position(&self, owner: &Address) -> Option<&Position> {
        self.state.position(owner)
    }

    pub fn balance_of(&self, holder: &Address, asset: Asset) -> Decimal {
        self.state.balances.balance_of(holder, asset)
    }

    pub fn account(&self, address: &Address) -> AccountView {
        let balances = &self.state.balances;
        AccountView {
            address: address.clone(),
            collateral: balances.balance_of(address, Asset::Collateral),
            debt: balances.balance_of(address, Asset::Debt),
            governance: balances.balance_of(address, Asset::Governance),
            collateral_surplus: self.state.surplus_of(address),
            stability_deposit: self.state.stability.deposit_of(address),
            stability_gain: self.state.stability.gain_of(address),
            staked: self.state.staking.staked_of(address),
        }
    }

    /// Active positions from strongest to weakest.
    pub fn ranking(&self) -> Vec<RankingEntry> {
        self.state
            .ranking
            .iter()
            .filter_map(|(owner, ratio)| {
                self.state.position(owner).map(|p| RankingEntry {
                    owner: owner.clone(),
                    nominal_ratio: ratio,
                    collateral: p.collateral,
                    debt: p.debt,
                })
            })
            .collect()
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    fn publish(&mut self) -> Vec<LedgerRecord> {
        let records = self.state.take_records();
        if !records.is_empty() {
            self.audit.publish(&records);
        }
        records
    }
}
