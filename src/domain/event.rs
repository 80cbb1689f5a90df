//! Status changes reported by the external source of truth.

use crate::domain::{Address, Decimal};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PositionEvent {
    /// The position was fully redeemed elsewhere; `collateral_surplus` becomes claimable.
    Redeemed {
        owner: Address,
        #[serde(rename = "collateralSurplus", default)]
        collateral_surplus: Decimal,
    },
    Liquidated {
        owner: Address,
    },
    /// Collateral gained by a stability depositor from an offset liquidation.
    StabilityGain {
        depositor: Address,
        amount: Decimal,
    },
}

impl PositionEvent {
    pub fn kind_name(&self) -> &'static str {
        match self {
            PositionEvent::Redeemed { .. } => "redeemed",
            PositionEvent::Liquidated { .. } => "liquidated",
            PositionEvent::StabilityGain { .. } => "stabilityGain",
        }
    }
}
