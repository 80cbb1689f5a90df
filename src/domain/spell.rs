//! Spells: the caller-supplied units of work inside a cast batch.

use crate::domain::{Address, Asset, Decimal, RegisterId};
use serde::{Deserialize, Serialize};

/// A value flowing through spell arguments and scratch registers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Value {
    Amount(Decimal),
    Asset(Asset),
    Address(Address),
    /// Absent optional value (e.g. "no hint").
    Empty,
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Amount(_) => "amount",
            Value::Asset(_) => "asset",
            Value::Address(_) => "address",
            Value::Empty => "empty",
        }
    }
}

/// Declared kind of a handler parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgKind {
    Amount,
    Asset,
    Address,
    /// Optional position handle: accepts `Address` or `Empty`.
    Hint,
}

impl ArgKind {
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (ArgKind::Amount, Value::Amount(_))
                | (ArgKind::Asset, Value::Asset(_))
                | (ArgKind::Address, Value::Address(_))
                | (ArgKind::Hint, Value::Address(_))
                | (ArgKind::Hint, Value::Empty)
        )
    }
}

/// A spell argument: either a literal or a reference to a scratch register
/// written by an earlier spell of the same batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arg {
    Literal(Value),
    Register(RegisterId),
}

impl Arg {
    pub fn amount(value: Decimal) -> Self {
        Arg::Literal(Value::Amount(value))
    }

    pub fn asset(asset: Asset) -> Self {
        Arg::Literal(Value::Asset(asset))
    }

    pub fn address(address: Address) -> Self {
        Arg::Literal(Value::Address(address))
    }

    /// Hint argument; `None` encodes "no hint".
    pub fn hint(handle: Option<Address>) -> Self {
        match handle {
            Some(address) => Arg::Literal(Value::Address(address)),
            None => Arg::Literal(Value::Empty),
        }
    }

    pub fn register(id: u32) -> Self {
        Arg::Register(RegisterId(id))
    }
}

/// One operation invocation in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spell {
    pub operation: String,
    #[serde(default)]
    pub args: Vec<Arg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<RegisterId>,
}

impl Spell {
    pub fn new(operation: impl Into<String>, args: Vec<Arg>) -> Self {
        Self {
            operation: operation.into(),
            args,
            output: None,
        }
    }

    pub fn with_output(mut self, register: u32) -> Self {
        self.output = Some(RegisterId(register));
        self
    }

    /// Declared output register; register 0 means "none".
    pub fn output_register(&self) -> Option<RegisterId> {
        self.output.filter(|id| !id.is_none())
    }
}

/// Per-step outcome of a committed batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub step: usize,
    pub operation: String,
    pub output: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub written_to: Option<RegisterId>,
}

/// Stable fingerprint of a batch: hex SHA-256 of its canonical JSON.
pub fn batch_digest(spells: &[Spell]) -> String {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    for spell in spells {
        // Serializing these plain data types cannot fail.
        let encoded = serde_json::to_vec(spell).unwrap_or_default();
        hasher.update((encoded.len() as u64).to_le_bytes());
        hasher.update(&encoded);
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    #[test]
    fn test_spell_json_shape() {
        let json = r#"{
            "operation": "trove.open",
            "args": [
                {"register": 1},
                {"literal": {"amount": 0.005}},
                {"literal": {"amount": 2000}},
                {"literal": "empty"},
                {"literal": {"address": "0xabc"}}
            ],
            "output": 2
        }"#;
        let spell: Spell = serde_json::from_str(json).unwrap();
        assert_eq!(spell.operation, "trove.open");
        assert_eq!(spell.args[0], Arg::register(1));
        assert_eq!(spell.args[1], Arg::amount(d("0.005")));
        assert_eq!(spell.args[3], Arg::hint(None));
        assert_eq!(spell.args[4], Arg::hint(Some(Address::new("0xabc"))));
        assert_eq!(spell.output_register(), Some(RegisterId(2)));
    }

    #[test]
    fn test_output_register_zero_means_none() {
        let spell = Spell::new("trove.close", vec![]).with_output(0);
        assert_eq!(spell.output_register(), None);
    }

    #[test]
    fn test_hint_kind_accepts_address_or_empty() {
        assert!(ArgKind::Hint.accepts(&Value::Empty));
        assert!(ArgKind::Hint.accepts(&Value::Address(Address::new("0xa"))));
        assert!(!ArgKind::Hint.accepts(&Value::Amount(d("1"))));
        assert!(!ArgKind::Address.accepts(&Value::Empty));
        assert!(ArgKind::Amount.accepts(&Value::Amount(d("1"))));
    }

    #[test]
    fn test_batch_digest_is_stable_and_order_sensitive() {
        let a = Spell::new(
            "basic.deposit",
            vec![Arg::asset(Asset::Collateral), Arg::amount(d("5"))],
        );
        let b = Spell::new("trove.close", vec![]);
        let first = batch_digest(&[a.clone(), b.clone()]);
        assert_eq!(first, batch_digest(&[a.clone(), b.clone()]));
        assert_ne!(first, batch_digest(&[b, a]));
        assert_eq!(first.len(), 64);
    }
}
