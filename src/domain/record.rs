//! Audit records emitted for every position mutation.

use crate::domain::{Address, Decimal, Position, TimeMs};
use serde::{Deserialize, Serialize};

/// What kind of mutation produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Open,
    Deposit,
    Withdraw,
    Borrow,
    Repay,
    Adjust,
    Close,
    Redemption,
    Redeemed,
    Liquidated,
    ClaimCollateral,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RecordKind::Open => "open",
            RecordKind::Deposit => "deposit",
            RecordKind::Withdraw => "withdraw",
            RecordKind::Borrow => "borrow",
            RecordKind::Repay => "repay",
            RecordKind::Adjust => "adjust",
            RecordKind::Close => "close",
            RecordKind::Redemption => "redemption",
            RecordKind::Redeemed => "redeemed",
            RecordKind::Liquidated => "liquidated",
            RecordKind::ClaimCollateral => "claim_collateral",
        };
        write!(f, "{}", name)
    }
}

/// Before/after view of a single position mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRecord {
    pub kind: RecordKind,
    pub position: Address,
    pub collateral_before: Decimal,
    pub collateral_after: Decimal,
    pub debt_before: Decimal,
    pub debt_after: Decimal,
    pub time_ms: TimeMs,
}

impl LedgerRecord {
    /// Build a record from the position state before and after a mutation.
    /// A missing `before` means the position did not exist (or was not active).
    pub fn between(kind: RecordKind, before: Option<&Position>, after: &Position) -> Self {
        let (collateral_before, debt_before) = before
            .map(|p| (p.collateral, p.debt))
            .unwrap_or((Decimal::zero(), Decimal::zero()));
        Self {
            kind,
            position: after.owner.clone(),
            collateral_before,
            collateral_after: after.collateral,
            debt_before,
            debt_after: after.debt,
            time_ms: TimeMs::now(),
        }
    }
}
