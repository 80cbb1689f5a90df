//! Runs a batch of spells in order with all-or-nothing semantics.

use crate::cast::dispatcher::{Dispatcher, SpellContext};
use crate::cast::registers::Registers;
use crate::config::LedgerParams;
use crate::domain::{Address, Decimal, Receipt, Spell};
use crate::error::{CastFailure, LedgerError};
use crate::ledger::LedgerState;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Who a batch acts for and whose wallet funds `basic.deposit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastContext {
    pub account: Address,
    pub origin: Address,
}

impl CastContext {
    pub fn new(account: Address, origin: Address) -> Self {
        Self { account, origin }
    }

    /// The account funds its own deposits.
    pub fn for_account(account: Address) -> Self {
        Self {
            origin: account.clone(),
            account,
        }
    }
}

pub struct Executor<'d> {
    dispatcher: &'d Dispatcher,
    params: &'d LedgerParams,
    price: Decimal,
}

impl<'d> Executor<'d> {
    pub fn new(dispatcher: &'d Dispatcher, params: &'d LedgerParams, price: Decimal) -> Self {
        Self {
            dispatcher,
            params,
            price,
        }
    }

    /// Execute `spells` against `state`. On failure `state` is left exactly as
    /// it was and the failing step is reported.
    pub fn execute(
        &self,
        spells: &[Spell],
        context: &CastContext,
        state: &mut LedgerState,
    ) -> Result<Vec<Receipt>, CastFailure> {
        state.transact(|working| {
            let mut registers = Registers::new();
            let mut receipts = Vec::with_capacity(spells.len());
            for (step, spell) in spells.iter().enumerate() {
                let receipt = self
                    .run_step(step, spell, context, working, &mut registers)
                    .map_err(|error| CastFailure {
                        step,
                        operation: spell.operation.clone(),
                        error,
                    })?;
                receipts.push(receipt);
            }
            Ok(receipts)
        })
    }

    fn run_step(
        &self,
        step: usize,
        spell: &Spell,
        context: &CastContext,
        state: &mut LedgerState,
        registers: &mut Registers,
    ) -> Result<Receipt, LedgerError> {
        let handler = self.dispatcher.resolve(&spell.operation)?;
        handler.check_arity(spell.args.len())?;

        let values = spell
            .args
            .iter()
            .map(|arg| registers.resolve(arg, handler.name))
            .collect::<Result<Vec<_>, _>>()?;
        handler.check_kinds(&values)?;

        let mut ctx = SpellContext {
            state,
            params: self.params,
            price: self.price,
            account: &context.account,
            origin: &context.origin,
        };
        let output = (handler.invoke)(&mut ctx, &values)?;

        let written_to = spell.output_register();
        if let Some(register) = written_to {
            registers.write(register, output.clone());
        }
        debug!(step, operation = handler.name, output = ?output, "spell executed");

        Ok(Receipt {
            step,
            operation: spell.operation.clone(),
            output,
            written_to,
        })
    }
}
