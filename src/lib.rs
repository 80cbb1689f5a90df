pub mod api;
pub mod cast;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod external;
pub mod ledger;
pub mod orchestration;

pub use cast::{CastContext, Dispatcher, Executor};
pub use config::{Config, LedgerParams};
pub use domain::{
    Address, Arg, Asset, Decimal, LedgerRecord, Position, PositionEvent, PositionStatus, Ratio,
    Receipt, RegisterId, Spell, Value,
};
pub use engine::{InsertHints, SortedPositions};
pub use error::{AppError, CastFailure, LedgerError};
pub use external::{AuditSink, FixedPriceFeed, MemoryAuditSink, PriceFeed, TracingAuditSink};
pub use ledger::LedgerState;
pub use orchestration::Protocol;
