use crate::domain::Decimal;
use std::fmt;

/// Source of the collateral price, in debt units per unit of collateral.
///
/// Read once per batch, redemption or hint query, so every step of a batch
/// sees the same price.
pub trait PriceFeed: Send + Sync + fmt::Debug {
    fn current_price(&self) -> Decimal;
}

/// Feed that always returns the same price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPriceFeed {
    price: Decimal,
}

impl FixedPriceFeed {
    pub fn new(price: Decimal) -> Self {
        Self { price }
    }
}

impl PriceFeed for FixedPriceFeed {
    fn current_price(&self) -> Decimal {
        self.price
    }
}
