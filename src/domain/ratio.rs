//! Health ratios used to rank and police positions.

use crate::domain::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scale applied to the nominal ratio so typical values land in a readable range.
pub const NOMINAL_RATIO_SCALE: i64 = 100;

/// A collateral-to-debt ratio. `Ratio::INFINITE` stands in for zero debt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ratio(pub Decimal);

impl Ratio {
    pub const INFINITE: Ratio = Ratio(Decimal::MAX);

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_infinite(&self) -> bool {
        *self == Ratio::INFINITE
    }

    /// Absolute distance between two ratios, used when ranking hint samples.
    pub fn distance(&self, other: Ratio) -> Decimal {
        if self >= &other {
            self.0 - other.0
        } else {
            other.0 - self.0
        }
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_infinite() {
            write!(f, "inf")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Price-independent ratio that orders the registry: `collateral * 100 / debt`.
pub fn compute_nominal_ratio(collateral: Decimal, debt: Decimal) -> Ratio {
    if debt.is_zero() {
        return Ratio::INFINITE;
    }
    let scale = Decimal::from_int(NOMINAL_RATIO_SCALE);
    collateral
        .checked_mul(scale)
        .and_then(|scaled| scaled.checked_div(debt))
        // Very large collateral: divide first and give up the last digits.
        .or_else(|| collateral.checked_div(debt).and_then(|r| r.checked_mul(scale)))
        .map(Ratio)
        .unwrap_or(Ratio::INFINITE)
}

/// Price-aware ratio `collateral * price / debt`, compared against the
/// minimum collateral ratio.
pub fn compute_collateral_ratio(collateral: Decimal, debt: Decimal, price: Decimal) -> Ratio {
    if debt.is_zero() {
        return Ratio::INFINITE;
    }
    collateral
        .checked_mul(price)
        .and_then(|value| value.checked_div(debt))
        .map(Ratio)
        .unwrap_or(Ratio::INFINITE)
}
