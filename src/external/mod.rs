//! Boundaries to the outside world: the collateral price oracle and the audit
//! sink that receives committed ledger records.

pub mod audit;
pub mod price_feed;

pub use audit::{AuditSink, MemoryAuditSink, TracingAuditSink};
pub use price_feed::{FixedPriceFeed, PriceFeed};
