//! Collateralized debt position owned by the ledger.

use crate::domain::{compute_nominal_ratio, Address, Decimal, Ratio};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionStatus {
    Active,
    Closed,
    Redeemed,
    Liquidated,
}

impl std::fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionStatus::Active => write!(f, "active"),
            PositionStatus::Closed => write!(f, "closed"),
            PositionStatus::Redeemed => write!(f, "redeemed"),
            PositionStatus::Liquidated => write!(f, "liquidated"),
        }
    }
}

/// One account's collateral/debt pair.
///
/// `debt` includes the fixed reserve component, so an active position always
/// carries at least the reserve minimum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub owner: Address,
    pub collateral: Decimal,
    pub debt: Decimal,
    pub status: PositionStatus,
}

impl Position {
    pub fn new(owner: Address, collateral: Decimal, debt: Decimal) -> Self {
        Self {
            owner,
            collateral,
            debt,
            status: PositionStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == PositionStatus::Active
    }

    pub fn nominal_ratio(&self) -> Ratio {
        compute_nominal_ratio(self.collateral, self.debt)
    }

    /// Debt excluding the reserve component.
    pub fn net_debt(&self, reserve_minimum: Decimal) -> Decimal {
        self.debt
            .checked_sub(reserve_minimum)
            .unwrap_or_else(Decimal::zero)
    }

    /// Zero the balances and move to a terminal status.
    pub fn settle(&mut self, status: PositionStatus) {
        self.collateral = Decimal::zero();
        self.debt = Decimal::zero();
        self.status = status;
    }
}
