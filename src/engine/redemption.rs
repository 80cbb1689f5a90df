//! Redemption: exchanging debt tokens for collateral drawn from the weakest
//! positions first.
//!
//! Planning is read-only. The walk starts at the tail of the ranking (lowest
//! nominal ratio) and moves towards the head. Positions under the minimum
//! collateral ratio are passed over, since they are liquidation candidates.
//! Each visited position either absorbs its whole net debt (a full step, after
//! which it keeps only the reserve and leaves the ranking) or absorbs the
//! remainder of the request (a partial step). A partial step that would leave
//! the position under the minimum net debt is skipped and the walk continues.

use crate::config::LedgerParams;
use crate::domain::{
    compute_collateral_ratio, compute_nominal_ratio, Address, Decimal, Position, Ratio,
};
use crate::engine::sorted_positions::SortedPositions;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionStep {
    pub owner: Address,
    pub debt_applied: Decimal,
    pub collateral_drawn: Decimal,
    /// The position's whole net debt was redeemed.
    pub full: bool,
    /// Nominal ratio the position is left with.
    pub ratio_after: Ratio,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionPlan {
    pub requested: Decimal,
    pub steps: Vec<RedemptionStep>,
    /// Part of the request no eligible position could absorb.
    pub remainder: Decimal,
}

impl RedemptionPlan {
    pub fn applied(&self) -> Decimal {
        self.steps.iter().map(|s| s.debt_applied).sum()
    }

    pub fn collateral_drawn(&self) -> Decimal {
        self.steps.iter().map(|s| s.collateral_drawn).sum()
    }

    pub fn partial_step(&self) -> Option<&RedemptionStep> {
        self.steps.last().filter(|s| !s.full)
    }
}

/// What a redeemer needs to know before submitting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionHints {
    /// First position the walk will touch.
    pub first_redemption_hint: Option<Address>,
    /// Nominal ratio of the partially redeemed position, if the walk ends on one.
    pub partial_redemption_ratio: Option<Ratio>,
    /// Largest part of the request that can actually be redeemed.
    pub truncated_amount: Decimal,
}

pub fn plan_redemption(
    ranking: &SortedPositions,
    positions: &HashMap<Address, Position>,
    amount: Decimal,
    price: Decimal,
    params: &LedgerParams,
) -> RedemptionPlan {
    let minimum = Ratio(params.min_collateral_ratio);
    let mut remaining = amount;
    let mut steps = Vec::new();
    let mut visited = 0usize;
    let mut cursor = ranking.tail();

    while let Some(owner) = cursor {
        if !remaining.is_positive() {
            break;
        }
        if params.max_redemption_iterations > 0 && visited >= params.max_redemption_iterations {
            break;
        }
        cursor = ranking.prev_of(owner);

        let Some(position) = positions.get(owner).filter(|p| p.is_active()) else {
            continue;
        };
        if compute_collateral_ratio(position.collateral, position.debt, price) < minimum {
            continue;
        }
        visited += 1;

        let net_debt = position.net_debt(params.reserve_minimum);
        if net_debt.is_zero() {
            continue;
        }

        let full = remaining >= net_debt;
        let debt_applied = if full { net_debt } else { remaining };
        let debt_after = position.debt - debt_applied;
        if !full && debt_after - params.reserve_minimum < params.min_net_debt {
            continue;
        }

        let Some(drawn) = debt_applied.checked_div(price) else {
            break;
        };
        let collateral_drawn = drawn.min(position.collateral);
        let collateral_after = position.collateral - collateral_drawn;

        steps.push(RedemptionStep {
            owner: owner.clone(),
            debt_applied,
            collateral_drawn,
            full,
            ratio_after: compute_nominal_ratio(collateral_after, debt_after),
        });
        remaining = remaining - debt_applied;
    }

    RedemptionPlan {
        requested: amount,
        steps,
        remainder: remaining,
    }
}

pub fn redemption_hints(plan: &RedemptionPlan) -> RedemptionHints {
    RedemptionHints {
        first_redemption_hint: plan.steps.first().map(|s| s.owner.clone()),
        partial_redemption_ratio: plan.partial_step().map(|s| s.ratio_after),
        truncated_amount: plan.applied(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(v: i64) -> Decimal {
        Decimal::from_int(v)
    }

    fn setup(entries: &[(&str, i64, i64)]) -> (SortedPositions, HashMap<Address, Position>) {
        // Entries must be given strongest first.
        let mut ranking = SortedPositions::new();
        let mut positions = HashMap::new();
        let mut prev: Option<Address> = None;
        for (name, coll, debt) in entries {
            let owner = Address::new(*name);
            let position = Position::new(owner.clone(), d(*coll), d(*debt));
            ranking
                .insert(owner.clone(), position.nominal_ratio(), prev.clone(), None)
                .unwrap();
            positions.insert(owner.clone(), position);
            prev = Some(owner);
        }
        (ranking, positions)
    }

    #[test]
    fn test_walk_starts_at_weakest_and_goes_up() {
        // price 100: ratios 10, 5, 2.5
        let (ranking, positions) =
            setup(&[("strong", 100, 1000), ("mid", 100, 2000), ("weak", 100, 4000)]);
        let params = LedgerParams::default();
        let plan = plan_redemption(&ranking, &positions, d(5000), d(100), &params);

        assert_eq!(plan.steps[0].owner, Address::new("weak"));
        assert!(plan.steps[0].full);
        assert_eq!(plan.steps[0].debt_applied, d(3800));
        assert_eq!(plan.steps[0].collateral_drawn, d(38));
        // 1200 left: mid would keep 2000 - 1200 - 200 = 600 net, under 1800, skipped.
        // strong has net 800, a full step.
        assert_eq!(plan.steps[1].owner, Address::new("strong"));
        assert!(plan.steps[1].full);
        assert_eq!(plan.remainder, d(400));
        assert_eq!(plan.applied(), d(4600));
    }

    #[test]
    fn test_partial_step_and_hints() {
        let (ranking, positions) = setup(&[("a", 100, 5000), ("b", 100, 6000)]);
        let params = LedgerParams::default();
        let plan = plan_redemption(&ranking, &positions, d(1000), d(100), &params);

        assert_eq!(plan.steps.len(), 1);
        let step = &plan.steps[0];
        assert_eq!(step.owner, Address::new("b"));
        assert!(!step.full);
        assert_eq!(step.collateral_drawn, d(10));
        assert_eq!(step.ratio_after, compute_nominal_ratio(d(90), d(5000)));

        let hints = redemption_hints(&plan);
        assert_eq!(hints.first_redemption_hint, Some(Address::new("b")));
        assert_eq!(hints.partial_redemption_ratio, Some(step.ratio_after));
        assert_eq!(hints.truncated_amount, d(1000));
    }

    #[test]
    fn test_undercollateralized_tail_is_passed_over() {
        // price 1: "sick" has ratio 100/4000 = 0.025 < 1.1
        let (ranking, positions) = setup(&[("healthy", 10000, 3000), ("sick", 100, 4000)]);
        let params = LedgerParams::default();
        let plan = plan_redemption(&ranking, &positions, d(500), d(1), &params);
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.steps[0].owner, Address::new("healthy"));
    }

    #[test]
    fn test_iteration_cap() {
        let (ranking, positions) = setup(&[("a", 100, 2500), ("b", 100, 2500), ("c", 100, 2500)]);
        let params = LedgerParams {
            max_redemption_iterations: 2,
            ..LedgerParams::default()
        };
        let plan = plan_redemption(&ranking, &positions, d(10000), d(100), &params);
        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.remainder, d(10000 - 2 * 2300));
    }

    #[test]
    fn test_empty_ranking_redeems_nothing() {
        let plan = plan_redemption(
            &SortedPositions::new(),
            &HashMap::new(),
            d(100),
            d(100),
            &LedgerParams::default(),
        );
        assert!(plan.steps.is_empty());
        let hints = redemption_hints(&plan);
        assert_eq!(hints.first_redemption_hint, None);
        assert_eq!(hints.truncated_amount, Decimal::zero());
    }
}
