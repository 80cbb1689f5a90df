//! Batch-scoped scratch registers.

use crate::domain::{Arg, RegisterId, Value};
use crate::error::LedgerError;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct Registers {
    slots: HashMap<RegisterId, Value>,
}

impl Registers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store or overwrite. Register 0 is never stored.
    pub fn write(&mut self, id: RegisterId, value: Value) {
        if !id.is_none() {
            self.slots.insert(id, value);
        }
    }

    pub fn read(&self, id: RegisterId) -> Result<&Value, LedgerError> {
        self.slots.get(&id).ok_or(LedgerError::UnsetRegister(id))
    }

    /// Turn a spell argument into a concrete value.
    pub fn resolve(&self, arg: &Arg, operation: &str) -> Result<Value, LedgerError> {
        match arg {
            Arg::Literal(value) => Ok(value.clone()),
            Arg::Register(id) if id.is_none() => Err(LedgerError::ArgumentMismatch {
                operation: operation.to_string(),
                reason: "register 0 cannot be read".to_string(),
            }),
            Arg::Register(id) => self.read(*id).cloned(),
        }
    }
}
