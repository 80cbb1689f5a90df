//! The spell catalogue: one handler per connector operation.
//!
//! Handlers receive arguments already checked against their declared kinds.
//! Every handler acts on the batch account's wallet except `basic.deposit`,
//! which pulls from the origin wallet.

use crate::cast::dispatcher::{Handler, SpellContext};
use crate::domain::ArgKind::{Address as Addr, Amount, Asset as AssetKind, Hint};
use crate::domain::{Address, Asset, Decimal, RecordKind, Value};
use crate::engine::position_manager::{InsertHints, PositionChange};
use crate::error::LedgerError;
use crate::ledger::{pool_address, STABILITY_POOL, STAKING_POOL};

pub fn catalogue() -> Vec<Handler> {
    vec![
        Handler {
            name: "basic.deposit",
            params: &[AssetKind, Amount],
            invoke: basic_deposit,
        },
        Handler {
            name: "basic.withdraw",
            params: &[AssetKind, Amount, Addr],
            invoke: basic_withdraw,
        },
        Handler {
            name: "trove.open",
            params: &[Amount, Amount, Amount, Hint, Hint],
            invoke: trove_open,
        },
        Handler {
            name: "trove.close",
            params: &[],
            invoke: trove_close,
        },
        Handler {
            name: "trove.deposit",
            params: &[Amount, Hint, Hint],
            invoke: trove_deposit,
        },
        Handler {
            name: "trove.withdraw",
            params: &[Amount, Hint, Hint],
            invoke: trove_withdraw,
        },
        Handler {
            name: "trove.borrow",
            params: &[Amount, Amount, Hint, Hint],
            invoke: trove_borrow,
        },
        Handler {
            name: "trove.repay",
            params: &[Amount, Hint, Hint],
            invoke: trove_repay,
        },
        Handler {
            name: "trove.adjust",
            params: &[Amount, Amount, Amount, Amount, Amount, Hint, Hint],
            invoke: trove_adjust,
        },
        Handler {
            name: "trove.claim_collateral",
            params: &[],
            invoke: trove_claim_collateral,
        },
        Handler {
            name: "stability.deposit",
            params: &[Amount, Hint],
            invoke: stability_deposit,
        },
        Handler {
            name: "stability.withdraw",
            params: &[Amount],
            invoke: stability_withdraw,
        },
        Handler {
            name: "stability.move_gain_to_trove",
            params: &[Hint, Hint],
            invoke: stability_move_gain_to_trove,
        },
        Handler {
            name: "staking.stake",
            params: &[Amount],
            invoke: staking_stake,
        },
        Handler {
            name: "staking.unstake",
            params: &[Amount],
            invoke: staking_unstake,
        },
    ]
}

/// Typed accessors over validated argument values.
struct Args<'v> {
    operation: &'static str,
    values: &'v [Value],
}

impl<'v> Args<'v> {
    fn new(operation: &'static str, values: &'v [Value]) -> Self {
        Self { operation, values }
    }

    fn mismatch(&self, index: usize, expected: &str) -> LedgerError {
        LedgerError::ArgumentMismatch {
            operation: self.operation.to_string(),
            reason: format!("argument {} is not {}", index, expected),
        }
    }

    fn amount(&self, index: usize) -> Result<Decimal, LedgerError> {
        match self.values.get(index) {
            Some(Value::Amount(value)) if value.is_negative() => Err(LedgerError::InvalidAmount(
                format!("{} argument {} is negative", self.operation, index),
            )),
            Some(Value::Amount(value)) => Ok(*value),
            _ => Err(self.mismatch(index, "an amount")),
        }
    }

    /// Amount that must be strictly positive.
    fn positive(&self, index: usize) -> Result<Decimal, LedgerError> {
        let value = self.amount(index)?;
        if !value.is_positive() {
            return Err(LedgerError::InvalidAmount(format!(
                "{} requires a positive amount",
                self.operation
            )));
        }
        Ok(value)
    }

    fn asset(&self, index: usize) -> Result<Asset, LedgerError> {
        match self.values.get(index) {
            Some(Value::Asset(asset)) => Ok(*asset),
            _ => Err(self.mismatch(index, "an asset")),
        }
    }

    fn address(&self, index: usize) -> Result<Address, LedgerError> {
        match self.values.get(index) {
            Some(Value::Address(address)) => Ok(address.clone()),
            _ => Err(self.mismatch(index, "an address")),
        }
    }

    fn hint(&self, index: usize) -> Result<Option<Address>, LedgerError> {
        match self.values.get(index) {
            Some(Value::Address(address)) => Ok(Some(address.clone())),
            Some(Value::Empty) => Ok(None),
            _ => Err(self.mismatch(index, "a hint")),
        }
    }

    /// Upper/lower hint pair starting at `index`.
    fn hints(&self, index: usize) -> Result<InsertHints, LedgerError> {
        Ok(InsertHints::new(self.hint(index)?, self.hint(index + 1)?))
    }
}

fn basic_deposit(ctx: &mut SpellContext<'_>, values: &[Value]) -> Result<Value, LedgerError> {
    let args = Args::new("basic.deposit", values);
    let asset = args.asset(0)?;
    let amount = args.positive(1)?;
    ctx.state
        .balances
        .transfer(ctx.origin, ctx.account, asset, amount)?;
    Ok(Value::Amount(amount))
}

fn basic_withdraw(ctx: &mut SpellContext<'_>, values: &[Value]) -> Result<Value, LedgerError> {
    let args = Args::new("basic.withdraw", values);
    let asset = args.asset(0)?;
    let amount = args.positive(1)?;
    let recipient = args.address(2)?;
    ctx.state
        .balances
        .transfer(ctx.account, &recipient, asset, amount)?;
    Ok(Value::Amount(amount))
}

fn trove_open(ctx: &mut SpellContext<'_>, values: &[Value]) -> Result<Value, LedgerError> {
    let args = Args::new("trove.open", values);
    let collateral = args.amount(0)?;
    let max_fee = args.amount(1)?;
    let borrow = args.amount(2)?;
    let hints = args.hints(3)?;
    let account = ctx.account;
    let borrowed = ctx
        .positions()
        .open(account, collateral, max_fee, borrow, &hints)?;
    Ok(Value::Amount(borrowed))
}

fn trove_close(ctx: &mut SpellContext<'_>, _values: &[Value]) -> Result<Value, LedgerError> {
    let account = ctx.account;
    let released = ctx.positions().close(account)?;
    Ok(Value::Amount(released))
}

fn adjust(
    ctx: &mut SpellContext<'_>,
    change: PositionChange,
    hints: InsertHints,
    kind: RecordKind,
) -> Result<(), LedgerError> {
    let account = ctx.account;
    ctx.positions().adjust(account, &change, &hints, kind)?;
    Ok(())
}

fn trove_deposit(ctx: &mut SpellContext<'_>, values: &[Value]) -> Result<Value, LedgerError> {
    let args = Args::new("trove.deposit", values);
    let amount = args.positive(0)?;
    let change = PositionChange {
        collateral_in: amount,
        ..PositionChange::default()
    };
    adjust(ctx, change, args.hints(1)?, RecordKind::Deposit)?;
    Ok(Value::Amount(amount))
}

fn trove_withdraw(ctx: &mut SpellContext<'_>, values: &[Value]) -> Result<Value, LedgerError> {
    let args = Args::new("trove.withdraw", values);
    let amount = args.positive(0)?;
    let change = PositionChange {
        collateral_out: amount,
        ..PositionChange::default()
    };
    adjust(ctx, change, args.hints(1)?, RecordKind::Withdraw)?;
    Ok(Value::Amount(amount))
}

fn trove_borrow(ctx: &mut SpellContext<'_>, values: &[Value]) -> Result<Value, LedgerError> {
    let args = Args::new("trove.borrow", values);
    let max_fee = args.amount(0)?;
    let amount = args.positive(1)?;
    let change = PositionChange {
        borrow: amount,
        max_fee,
        ..PositionChange::default()
    };
    adjust(ctx, change, args.hints(2)?, RecordKind::Borrow)?;
    Ok(Value::Amount(amount))
}

fn trove_repay(ctx: &mut SpellContext<'_>, values: &[Value]) -> Result<Value, LedgerError> {
    let args = Args::new("trove.repay", values);
    let amount = args.positive(0)?;
    let change = PositionChange {
        repay: amount,
        ..PositionChange::default()
    };
    adjust(ctx, change, args.hints(1)?, RecordKind::Repay)?;
    Ok(Value::Amount(amount))
}

fn trove_adjust(ctx: &mut SpellContext<'_>, values: &[Value]) -> Result<Value, LedgerError> {
    let args = Args::new("trove.adjust", values);
    let change = PositionChange {
        max_fee: args.amount(0)?,
        collateral_out: args.amount(1)?,
        collateral_in: args.amount(2)?,
        borrow: args.amount(3)?,
        repay: args.amount(4)?,
    };
    let borrow = change.borrow;
    adjust(ctx, change, args.hints(5)?, RecordKind::Adjust)?;
    Ok(Value::Amount(borrow))
}

fn trove_claim_collateral(
    ctx: &mut SpellContext<'_>,
    _values: &[Value],
) -> Result<Value, LedgerError> {
    let account = ctx.account;
    let claimed = ctx.positions().claim_collateral(account)?;
    Ok(Value::Amount(claimed))
}

/// Pending stability gains are paid out whenever a deposit changes.
fn pay_out_stability_gain(ctx: &mut SpellContext<'_>) -> Result<Decimal, LedgerError> {
    let gain = ctx.state.stability.take_gain(ctx.account);
    ctx.state.balances.transfer(
        &pool_address(STABILITY_POOL),
        ctx.account,
        Asset::Collateral,
        gain,
    )?;
    Ok(gain)
}

fn stability_deposit(ctx: &mut SpellContext<'_>, values: &[Value]) -> Result<Value, LedgerError> {
    let args = Args::new("stability.deposit", values);
    let amount = args.positive(0)?;
    let frontend = args.hint(1)?;
    pay_out_stability_gain(ctx)?;
    ctx.state.balances.transfer(
        ctx.account,
        &pool_address(STABILITY_POOL),
        Asset::Debt,
        amount,
    )?;
    ctx.state.stability.deposit(ctx.account, amount, frontend);
    Ok(Value::Amount(amount))
}

fn stability_withdraw(ctx: &mut SpellContext<'_>, values: &[Value]) -> Result<Value, LedgerError> {
    let args = Args::new("stability.withdraw", values);
    let amount = args.amount(0)?;
    pay_out_stability_gain(ctx)?;
    let withdrawn = ctx.state.stability.withdraw(ctx.account, amount);
    ctx.state.balances.transfer(
        &pool_address(STABILITY_POOL),
        ctx.account,
        Asset::Debt,
        withdrawn,
    )?;
    Ok(Value::Amount(withdrawn))
}

fn stability_move_gain_to_trove(
    ctx: &mut SpellContext<'_>,
    values: &[Value],
) -> Result<Value, LedgerError> {
    let args = Args::new("stability.move_gain_to_trove", values);
    let hints = args.hints(0)?;
    let gain = pay_out_stability_gain(ctx)?;
    if gain.is_zero() {
        return Err(LedgerError::InvalidAmount(
            "no collateral gain to move".to_string(),
        ));
    }
    let change = PositionChange {
        collateral_in: gain,
        ..PositionChange::default()
    };
    adjust(ctx, change, hints, RecordKind::Deposit)?;
    Ok(Value::Amount(gain))
}

fn staking_stake(ctx: &mut SpellContext<'_>, values: &[Value]) -> Result<Value, LedgerError> {
    let args = Args::new("staking.stake", values);
    let amount = args.positive(0)?;
    ctx.state.balances.transfer(
        ctx.account,
        &pool_address(STAKING_POOL),
        Asset::Governance,
        amount,
    )?;
    ctx.state.staking.stake(ctx.account, amount);
    Ok(Value::Amount(amount))
}

fn staking_unstake(ctx: &mut SpellContext<'_>, values: &[Value]) -> Result<Value, LedgerError> {
    let args = Args::new("staking.unstake", values);
    let amount = args.amount(0)?;
    let released = ctx.state.staking.unstake(ctx.account, amount);
    ctx.state.balances.transfer(
        &pool_address(STAKING_POOL),
        ctx.account,
        Asset::Governance,
        released,
    )?;
    Ok(Value::Amount(released))
}
