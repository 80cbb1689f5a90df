//! Insert-position hints for the ranked registry.
//!
//! Finding a position's slot is split in two: a cheap sampled guess that lands
//! near the right place, then a bounded walk from that guess to an exact
//! adjacent pair.

use crate::domain::{Address, Decimal, Ratio};
use crate::engine::sorted_positions::SortedPositions;
use crate::error::LedgerError;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Best sample found by [`approximate_hint`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproxHint {
    pub handle: Address,
    /// Distance between the sampled ratio and the target.
    pub diff: Decimal,
    /// Seed to pass to a follow-up call for a fresh sample sequence.
    pub next_seed: u64,
}

/// Neighbors an exact search settled on. `None` marks the head or tail boundary.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertPosition {
    pub prev: Option<Address>,
    pub next: Option<Address>,
}

/// Advance the pseudo-random seed chain: first 8 bytes of SHA-256 over the
/// little-endian seed.
pub fn next_seed(seed: u64) -> u64 {
    let digest = Sha256::digest(seed.to_le_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

/// Sample `attempts` random members and return the one whose ratio is closest
/// to `target`, starting from the tail as the initial candidate.
///
/// Returns `None` only when the registry is empty.
pub fn approximate_hint(
    list: &SortedPositions,
    target: Ratio,
    attempts: usize,
    seed: u64,
) -> Option<ApproxHint> {
    let tail = list.tail()?;
    let mut best = tail;
    let mut best_diff = list.ratio_of(tail)?.distance(target);
    let mut seed = seed;
    let size = list.len() as u64;

    for _ in 0..attempts {
        seed = next_seed(seed);
        let Some(candidate) = list.member_at((seed % size) as usize) else {
            continue;
        };
        let Some(ratio) = list.ratio_of(candidate) else {
            continue;
        };
        let diff = ratio.distance(target);
        if diff < best_diff {
            best = candidate;
            best_diff = diff;
        }
    }

    Some(ApproxHint {
        handle: best.clone(),
        diff: best_diff,
        next_seed: seed,
    })
}

/// Walk from `hint` (or the head when `None`) to the adjacent pair that
/// `target` belongs between.
///
/// The returned pair satisfies `ratio(prev) > target >= ratio(next)`, so a new
/// entry lands ahead of any existing entries with an equal ratio. A hint that
/// is not a member, or a walk longer than `max_steps`, is reported as
/// [`LedgerError::StaleHint`].
pub fn exact_insert_position(
    list: &SortedPositions,
    target: Ratio,
    hint: Option<&Address>,
    max_steps: usize,
) -> Result<InsertPosition, LedgerError> {
    let start = match hint {
        Some(handle) if list.contains(handle) => handle,
        Some(_) => return Err(LedgerError::StaleHint { steps: 0 }),
        None => match list.head() {
            Some(head) => head,
            None => return Ok(InsertPosition::default()),
        },
    };

    let start_ratio = list
        .ratio_of(start)
        .ok_or(LedgerError::StaleHint { steps: 0 })?;
    let mut steps = 0usize;
    let mut current = start;

    if start_ratio > target {
        // Descend towards the tail until the next entry is no stronger than target.
        loop {
            match list.next_of(current) {
                None => {
                    return Ok(InsertPosition {
                        prev: Some(current.clone()),
                        next: None,
                    })
                }
                Some(next) if list.ratio_of(next).is_some_and(|r| r <= target) => {
                    return Ok(InsertPosition {
                        prev: Some(current.clone()),
                        next: Some(next.clone()),
                    })
                }
                Some(next) => {
                    steps += 1;
                    if steps > max_steps {
                        return Err(LedgerError::StaleHint { steps });
                    }
                    current = next;
                }
            }
        }
    }

    // Ascend towards the head until the previous entry is strictly stronger.
    loop {
        match list.prev_of(current) {
            None => {
                return Ok(InsertPosition {
                    prev: None,
                    next: Some(current.clone()),
                })
            }
            Some(prev) if list.ratio_of(prev).is_some_and(|r| r > target) => {
                return Ok(InsertPosition {
                    prev: Some(prev.clone()),
                    next: Some(current.clone()),
                })
            }
            Some(prev) => {
                steps += 1;
                if steps > max_steps {
                    return Err(LedgerError::StaleHint { steps });
                }
                current = prev;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a(s: &str) -> Address {
        Address::new(s)
    }

    fn r(v: i64) -> Ratio {
        Ratio(Decimal::from_int(v))
    }

    /// Ratios 90, 80, ..., 10 from head to tail under handles n9..n1.
    fn ladder() -> SortedPositions {
        let mut list = SortedPositions::new();
        let mut prev: Option<Address> = None;
        for i in (1..=9).rev() {
            let handle = a(&format!("n{}", i));
            list.insert(handle.clone(), r(i * 10), prev.clone(), None)
                .unwrap();
            prev = Some(handle);
        }
        list
    }

    #[test]
    fn test_next_seed_is_deterministic_and_moves() {
        assert_eq!(next_seed(1_298_379), next_seed(1_298_379));
        assert_ne!(next_seed(1_298_379), 1_298_379);
        assert_ne!(next_seed(1_298_379), next_seed(452_354));
    }

    #[test]
    fn test_approximate_hint_empty_registry() {
        assert!(approximate_hint(&SortedPositions::new(), r(5), 50, 1).is_none());
    }

    #[test]
    fn test_approximate_hint_without_samples_returns_tail() {
        let list = ladder();
        let hint = approximate_hint(&list, r(55), 0, 7).unwrap();
        assert_eq!(hint.handle, a("n1"));
        assert_eq!(hint.diff, Decimal::from_int(45));
        assert_eq!(hint.next_seed, 7);
    }

    #[test]
    fn test_approximate_hint_never_worse_than_tail() {
        let list = ladder();
        let tail_diff = r(10).distance(r(75));
        let hint = approximate_hint(&list, r(75), 50, 1_298_379).unwrap();
        assert!(hint.diff <= tail_diff);
        assert_eq!(list.ratio_of(&hint.handle).unwrap().distance(r(75)), hint.diff);
    }

    #[test]
    fn test_exact_position_from_head_and_from_hint() {
        let list = ladder();
        let from_head = exact_insert_position(&list, r(55), None, 100).unwrap();
        assert_eq!(from_head.prev, Some(a("n6")));
        assert_eq!(from_head.next, Some(a("n5")));

        let from_tail = exact_insert_position(&list, r(55), Some(&a("n1")), 100).unwrap();
        assert_eq!(from_tail, from_head);
    }

    #[test]
    fn test_exact_position_boundaries() {
        let list = ladder();
        let top = exact_insert_position(&list, r(95), Some(&a("n3")), 100).unwrap();
        assert_eq!(top.prev, None);
        assert_eq!(top.next, Some(a("n9")));

        let bottom = exact_insert_position(&list, r(5), Some(&a("n7")), 100).unwrap();
        assert_eq!(bottom.prev, Some(a("n1")));
        assert_eq!(bottom.next, None);

        let empty = exact_insert_position(&SortedPositions::new(), r(5), None, 1).unwrap();
        assert_eq!(empty, InsertPosition::default());
    }

    #[test]
    fn test_exact_position_places_new_entry_before_equal_ratio() {
        let list = ladder();
        let pos = exact_insert_position(&list, r(50), Some(&a("n2")), 100).unwrap();
        assert_eq!(pos.prev, Some(a("n6")));
        assert_eq!(pos.next, Some(a("n5")));

        let pos = exact_insert_position(&list, r(50), Some(&a("n8")), 100).unwrap();
        assert_eq!(pos.prev, Some(a("n6")));
        assert_eq!(pos.next, Some(a("n5")));
    }

    #[test]
    fn test_stale_hint_on_non_member_or_long_walk() {
        let list = ladder();
        let err = exact_insert_position(&list, r(55), Some(&a("ghost")), 100).unwrap_err();
        assert_eq!(err, LedgerError::StaleHint { steps: 0 });

        let err = exact_insert_position(&list, r(5), Some(&a("n9")), 3).unwrap_err();
        assert_eq!(err, LedgerError::StaleHint { steps: 4 });
    }

    #[test]
    fn test_exact_result_is_accepted_by_insert() {
        let mut list = ladder();
        let hint = approximate_hint(&list, r(42), 20, 452_354).unwrap();
        let pos = exact_insert_position(&list, r(42), Some(&hint.handle), 100).unwrap();
        list.insert(a("new"), r(42), pos.prev, pos.next).unwrap();
        assert!(list.is_ordered());
        assert_eq!(list.next_of(&a("new")), Some(&a("n4")));
    }
}
