//! Ranking and lifecycle engine.
//!
//! - `sorted_positions`: doubly-linked ranking by nominal ratio
//! - `hints`: approximate and exact insert-position search
//! - `redemption`: tail-first redemption planning and hints
//! - `position_manager`: lifecycle state machine tying ledger and ranking together

pub mod hints;
pub mod position_manager;
pub mod redemption;
pub mod sorted_positions;

pub use hints::{approximate_hint, exact_insert_position, next_seed, ApproxHint, InsertPosition};
pub use position_manager::{find_insert_position, InsertHints, PositionChange, PositionManager};
pub use redemption::{
    plan_redemption, redemption_hints, RedemptionHints, RedemptionPlan, RedemptionStep,
};
pub use sorted_positions::SortedPositions;
