//! Operation name → handler lookup and signature validation.

use crate::cast::spells;
use crate::config::LedgerParams;
use crate::domain::{Address, ArgKind, Decimal, Value};
use crate::engine::position_manager::PositionManager;
use crate::error::LedgerError;
use crate::ledger::LedgerState;
use std::collections::HashMap;

/// Everything a handler may touch while a batch runs.
pub struct SpellContext<'a> {
    pub state: &'a mut LedgerState,
    pub params: &'a LedgerParams,
    pub price: Decimal,
    /// Account the batch acts for. Positions and wallets are keyed by it.
    pub account: &'a Address,
    /// Wallet that funds `basic.deposit`.
    pub origin: &'a Address,
}

impl<'a> SpellContext<'a> {
    pub fn positions(&mut self) -> PositionManager<'_> {
        PositionManager::new(self.state, self.params, self.price)
    }
}

pub type SpellFn = fn(&mut SpellContext<'_>, &[Value]) -> Result<Value, LedgerError>;

#[derive(Clone, Copy)]
pub struct Handler {
    pub name: &'static str,
    pub params: &'static [ArgKind],
    pub invoke: SpellFn,
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handler")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}

impl Handler {
    pub fn check_arity(&self, got: usize) -> Result<(), LedgerError> {
        if got != self.params.len() {
            return Err(LedgerError::ArgumentMismatch {
                operation: self.name.to_string(),
                reason: format!("expected {} arguments, got {}", self.params.len(), got),
            });
        }
        Ok(())
    }

    pub fn check_kinds(&self, values: &[Value]) -> Result<(), LedgerError> {
        self.check_arity(values.len())?;
        for (index, (kind, value)) in self.params.iter().zip(values).enumerate() {
            if !kind.accepts(value) {
                return Err(LedgerError::ArgumentMismatch {
                    operation: self.name.to_string(),
                    reason: format!(
                        "argument {} expects {:?}, got {}",
                        index,
                        kind,
                        value.kind_name()
                    ),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct Dispatcher {
    handlers: HashMap<&'static str, Handler>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatcher with the full spell catalogue registered.
    pub fn standard() -> Self {
        let mut dispatcher = Self::new();
        for handler in spells::catalogue() {
            dispatcher.register(handler);
        }
        dispatcher
    }

    pub fn register(&mut self, handler: Handler) {
        self.handlers.insert(handler.name, handler);
    }

    pub fn resolve(&self, operation: &str) -> Result<&Handler, LedgerError> {
        self.handlers
            .get(operation)
            .ok_or_else(|| LedgerError::UnknownOperation(operation.to_string()))
    }

    /// Registered operation names, sorted.
    pub fn operations(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }
}
