//! Domain types for the spell ledger.
//!
//! This module provides:
//! - Lossless numeric handling via the Decimal wrapper
//! - Primitives: TimeMs, Address, Asset, RegisterId
//! - Health ratios and their computation
//! - Positions, spells, audit records and inbound status events

pub mod decimal;
pub mod event;
pub mod position;
pub mod primitives;
pub mod ratio;
pub mod record;
pub mod spell;

pub use decimal::Decimal;
pub use event::PositionEvent;
pub use position::{Position, PositionStatus};
pub use primitives::{Address, AddressParseError, Asset, RegisterId, TimeMs};
pub use ratio::{compute_collateral_ratio, compute_nominal_ratio, Ratio, NOMINAL_RATIO_SCALE};
pub use record::{LedgerRecord, RecordKind};
pub use spell::{batch_digest, Arg, ArgKind, Receipt, Spell, Value};
