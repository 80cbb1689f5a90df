use crate::domain::{Address, Asset, Decimal, PositionStatus, Ratio, RegisterId};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Every way a spell, redemption or inbound event can be rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("unknown operation {0:?}")]
    UnknownOperation(String),
    #[error("argument mismatch for {operation}: {reason}")]
    ArgumentMismatch { operation: String, reason: String },
    #[error("register {0} read before it was written")]
    UnsetRegister(RegisterId),
    #[error("debt {debt} would fall below the reserve minimum {minimum}")]
    BelowReserveMinimum { debt: Decimal, minimum: Decimal },
    #[error("net debt {net_debt} is below the minimum {minimum}")]
    BelowMinimumNetDebt { net_debt: Decimal, minimum: Decimal },
    #[error("insert hint is stale after {steps} steps")]
    StaleHint { steps: usize },
    #[error("invalid neighbors for {handle}")]
    InvalidNeighbors { handle: Address },
    #[error("insufficient {asset} balance for {account}: need {needed}, have {available}")]
    InsufficientSettlementBalance {
        account: Address,
        asset: Asset,
        needed: Decimal,
        available: Decimal,
    },
    #[error("no position for {0}")]
    PositionNotFound(Address),
    #[error("position {owner} is {status}")]
    PositionNotActive {
        owner: Address,
        status: PositionStatus,
    },
    #[error("position {0} is already active")]
    PositionAlreadyActive(Address),
    #[error("collateral ratio {ratio} is below the minimum {minimum}")]
    CollateralRatioTooLow { ratio: Ratio, minimum: Decimal },
    #[error("fee rate {rate} exceeds the caller maximum {max}")]
    MaxFeeExceeded { rate: Decimal, max: Decimal },
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("nothing to claim for {0}")]
    NothingToClaim(Address),
    #[error("cannot move position {owner} from {from} to {to}")]
    InvalidTransition {
        owner: Address,
        from: PositionStatus,
        to: PositionStatus,
    },
}

impl LedgerError {
    /// Stable machine-readable code for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::UnknownOperation(_) => "UnknownOperation",
            LedgerError::ArgumentMismatch { .. } => "ArgumentMismatch",
            LedgerError::UnsetRegister(_) => "UnsetRegister",
            LedgerError::BelowReserveMinimum { .. } => "BelowReserveMinimum",
            LedgerError::BelowMinimumNetDebt { .. } => "BelowMinimumNetDebt",
            LedgerError::StaleHint { .. } => "StaleHint",
            LedgerError::InvalidNeighbors { .. } => "InvalidNeighbors",
            LedgerError::InsufficientSettlementBalance { .. } => "InsufficientSettlementBalance",
            LedgerError::PositionNotFound(_) => "PositionNotFound",
            LedgerError::PositionNotActive { .. } => "PositionNotActive",
            LedgerError::PositionAlreadyActive(_) => "PositionAlreadyActive",
            LedgerError::CollateralRatioTooLow { .. } => "CollateralRatioTooLow",
            LedgerError::MaxFeeExceeded { .. } => "MaxFeeExceeded",
            LedgerError::InvalidAmount(_) => "InvalidAmount",
            LedgerError::NothingToClaim(_) => "NothingToClaim",
            LedgerError::InvalidTransition { .. } => "InvalidTransition",
        }
    }

    /// An amount that would leave the representable range.
    pub fn overflow(what: &str) -> Self {
        LedgerError::InvalidAmount(format!("{} is out of range", what))
    }

    /// Only a stale hint is worth retrying with a fresh approximate hint.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::StaleHint { .. })
    }
}

/// A batch aborted at `step`; nothing from the batch was committed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("spell {step} ({operation}) failed: {error}")]
pub struct CastFailure {
    pub step: usize,
    pub operation: String,
    #[source]
    pub error: LedgerError,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Rejected(#[from] LedgerError),
    #[error(transparent)]
    CastRejected(#[from] CastFailure),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = match &self {
            AppError::Rejected(err) => json!({
                "error": err.to_string(),
                "kind": err.kind(),
            }),
            AppError::CastRejected(failure) => json!({
                "error": failure.to_string(),
                "kind": failure.error.kind(),
                "step": failure.step,
                "operation": failure.operation,
            }),
            other => json!({ "error": other.to_string() }),
        };

        let status = match self {
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Rejected(_) | AppError::CastRejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };

        (status, Json(body)).into_response()
    }
}
