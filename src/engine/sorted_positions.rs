//! Doubly-linked ranking of active positions, ordered by descending nominal ratio.
//!
//! The list stores only handles, links and the ratio each node was inserted
//! with. Position balances stay in the ledger. A dense member array beside the
//! links gives O(1) random access for hint sampling.

use crate::domain::{Address, Ratio};
use crate::error::LedgerError;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Node {
    prev: Option<Address>,
    next: Option<Address>,
    ratio: Ratio,
    /// Index of this handle in `members`.
    slot: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortedPositions {
    nodes: HashMap<Address, Node>,
    members: Vec<Address>,
    /// Highest ratio.
    head: Option<Address>,
    /// Lowest ratio.
    tail: Option<Address>,
}

impl SortedPositions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, handle: &Address) -> bool {
        self.nodes.contains_key(handle)
    }

    pub fn head(&self) -> Option<&Address> {
        self.head.as_ref()
    }

    pub fn tail(&self) -> Option<&Address> {
        self.tail.as_ref()
    }

    pub fn ratio_of(&self, handle: &Address) -> Option<Ratio> {
        self.nodes.get(handle).map(|node| node.ratio)
    }

    /// Neighbor towards the tail.
    pub fn next_of(&self, handle: &Address) -> Option<&Address> {
        self.nodes.get(handle).and_then(|node| node.next.as_ref())
    }

    /// Neighbor towards the head.
    pub fn prev_of(&self, handle: &Address) -> Option<&Address> {
        self.nodes.get(handle).and_then(|node| node.prev.as_ref())
    }

    /// Member at a dense index. Index order is unrelated to ranking order.
    pub fn member_at(&self, index: usize) -> Option<&Address> {
        self.members.get(index)
    }

    /// Whether `(prev, next)` is an adjacent pair that `ratio` can sit between
    /// without breaking the descending order. Equal ratios are accepted on
    /// either side.
    pub fn is_valid_insert_position(
        &self,
        ratio: Ratio,
        prev: Option<&Address>,
        next: Option<&Address>,
    ) -> bool {
        match (prev, next) {
            (None, None) => self.is_empty(),
            (None, Some(next)) => {
                self.head.as_ref() == Some(next)
                    && self.ratio_of(next).is_some_and(|r| ratio >= r)
            }
            (Some(prev), None) => {
                self.tail.as_ref() == Some(prev)
                    && self.ratio_of(prev).is_some_and(|r| r >= ratio)
            }
            (Some(prev), Some(next)) => {
                self.next_of(prev) == Some(next)
                    && self.ratio_of(prev).is_some_and(|r| r >= ratio)
                    && self.ratio_of(next).is_some_and(|r| ratio >= r)
            }
        }
    }

    /// Link `handle` between `prev` and `next`.
    ///
    /// The pair is re-validated against the current list, so a hint computed
    /// against an older snapshot cannot corrupt the order.
    pub fn insert(
        &mut self,
        handle: Address,
        ratio: Ratio,
        prev: Option<Address>,
        next: Option<Address>,
    ) -> Result<(), LedgerError> {
        if self.contains(&handle)
            || !self.is_valid_insert_position(ratio, prev.as_ref(), next.as_ref())
        {
            return Err(LedgerError::InvalidNeighbors { handle });
        }

        match &prev {
            Some(p) => {
                if let Some(node) = self.nodes.get_mut(p) {
                    node.next = Some(handle.clone());
                }
            }
            None => self.head = Some(handle.clone()),
        }
        match &next {
            Some(n) => {
                if let Some(node) = self.nodes.get_mut(n) {
                    node.prev = Some(handle.clone());
                }
            }
            None => self.tail = Some(handle.clone()),
        }

        let slot = self.members.len();
        self.members.push(handle.clone());
        self.nodes.insert(
            handle,
            Node {
                prev,
                next,
                ratio,
                slot,
            },
        );
        Ok(())
    }

    /// Unlink `handle`. Returns false if it was not a member.
    pub fn remove(&mut self, handle: &Address) -> bool {
        let Some(node) = self.nodes.remove(handle) else {
            return false;
        };

        match &node.prev {
            Some(p) => {
                if let Some(prev) = self.nodes.get_mut(p) {
                    prev.next = node.next.clone();
                }
            }
            None => self.head = node.next.clone(),
        }
        match &node.next {
            Some(n) => {
                if let Some(next) = self.nodes.get_mut(n) {
                    next.prev = node.prev.clone();
                }
            }
            None => self.tail = node.prev.clone(),
        }

        self.members.swap_remove(node.slot);
        if let Some(moved) = self.members.get(node.slot) {
            if let Some(moved_node) = self.nodes.get_mut(moved) {
                moved_node.slot = node.slot;
            }
        }
        true
    }

    /// Handles and ratios from head (strongest) to tail (weakest).
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            cursor: self.head.as_ref(),
        }
    }

    /// True when every adjacent pair is in descending ratio order and the
    /// links agree in both directions.
    pub fn is_ordered(&self) -> bool {
        let mut count = 0;
        let mut prev: Option<(&Address, Ratio)> = None;
        let mut cursor = self.head.as_ref();
        while let Some(handle) = cursor {
            let Some(node) = self.nodes.get(handle) else {
                return false;
            };
            if node.prev.as_ref() != prev.map(|(h, _)| h) {
                return false;
            }
            if let Some((_, prev_ratio)) = prev {
                if prev_ratio < node.ratio {
                    return false;
                }
            }
            count += 1;
            prev = Some((handle, node.ratio));
            cursor = node.next.as_ref();
        }
        count == self.len() && prev.map(|(h, _)| h) == self.tail.as_ref()
    }
}

pub struct Iter<'a> {
    list: &'a SortedPositions,
    cursor: Option<&'a Address>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a Address, Ratio);

    fn next(&mut self) -> Option<Self::Item> {
        let handle = self.cursor?;
        let node = self.list.nodes.get(handle)?;
        self.cursor = node.next.as_ref();
        Some((handle, node.ratio))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Decimal;

    fn a(s: &str) -> Address {
        Address::new(s)
    }

    fn r(v: i64) -> Ratio {
        Ratio(Decimal::from_int(v))
    }

    fn order(list: &SortedPositions) -> Vec<String> {
        list.iter().map(|(h, _)| h.as_str().to_string()).collect()
    }

    #[test]
    fn test_insert_into_empty_requires_no_neighbors() {
        let mut list = SortedPositions::new();
        let err = list.insert(a("x"), r(5), Some(a("ghost")), None).unwrap_err();
        assert_eq!(err.kind(), "InvalidNeighbors");

        list.insert(a("x"), r(5), None, None).unwrap();
        assert_eq!(list.head(), Some(&a("x")));
        assert_eq!(list.tail(), Some(&a("x")));
        assert!(list.is_ordered());
    }

    #[test]
    fn test_insert_at_head_middle_and_tail() {
        let mut list = SortedPositions::new();
        list.insert(a("mid"), r(5), None, None).unwrap();
        list.insert(a("top"), r(9), None, Some(a("mid"))).unwrap();
        list.insert(a("low"), r(1), Some(a("mid")), None).unwrap();
        list.insert(a("m2"), r(3), Some(a("mid")), Some(a("low"))).unwrap();

        assert_eq!(order(&list), vec!["top", "mid", "m2", "low"]);
        assert_eq!(list.len(), 4);
        assert!(list.is_ordered());
    }

    #[test]
    fn test_insert_rejects_non_adjacent_or_misordered_pair() {
        let mut list = SortedPositions::new();
        list.insert(a("a"), r(9), None, None).unwrap();
        list.insert(a("b"), r(5), Some(a("a")), None).unwrap();
        list.insert(a("c"), r(1), Some(a("b")), None).unwrap();

        // Not adjacent.
        let err = list.insert(a("d"), r(4), Some(a("a")), Some(a("c"))).unwrap_err();
        assert_eq!(err, LedgerError::InvalidNeighbors { handle: a("d") });
        // Adjacent but the ratio does not fit.
        assert!(list.insert(a("d"), r(7), Some(a("b")), Some(a("c"))).is_err());
        // Claims to be the new head but is weaker than the head.
        assert!(list.insert(a("d"), r(8), None, Some(a("a"))).is_err());
        // Duplicate member.
        assert!(list.insert(a("b"), r(5), Some(a("a")), Some(a("b"))).is_err());
        assert!(list.is_ordered());
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_remove_relinks_and_is_idempotent() {
        let mut list = SortedPositions::new();
        list.insert(a("a"), r(9), None, None).unwrap();
        list.insert(a("b"), r(5), Some(a("a")), None).unwrap();
        list.insert(a("c"), r(1), Some(a("b")), None).unwrap();

        assert!(list.remove(&a("b")));
        assert!(!list.remove(&a("b")));
        assert_eq!(order(&list), vec!["a", "c"]);
        assert_eq!(list.next_of(&a("a")), Some(&a("c")));
        assert_eq!(list.prev_of(&a("c")), Some(&a("a")));

        assert!(list.remove(&a("a")));
        assert_eq!(list.head(), Some(&a("c")));
        assert!(list.remove(&a("c")));
        assert!(list.is_empty());
        assert_eq!(list.head(), None);
        assert_eq!(list.tail(), None);
    }

    #[test]
    fn test_member_slots_stay_dense_after_remove() {
        let mut list = SortedPositions::new();
        list.insert(a("a"), r(9), None, None).unwrap();
        list.insert(a("b"), r(5), Some(a("a")), None).unwrap();
        list.insert(a("c"), r(1), Some(a("b")), None).unwrap();
        list.remove(&a("a"));

        let mut members: Vec<_> = (0..list.len())
            .filter_map(|i| list.member_at(i))
            .map(|h| h.as_str().to_string())
            .collect();
        members.sort();
        assert_eq!(members, vec!["b", "c"]);
        assert!(list.member_at(2).is_none());

        // The moved member must still be removable through its updated slot.
        assert!(list.remove(&a("c")));
        assert_eq!(list.member_at(0), Some(&a("b")));
    }

    #[test]
    fn test_equal_ratios_accepted_on_either_side() {
        let mut list = SortedPositions::new();
        list.insert(a("a"), r(5), None, None).unwrap();
        list.insert(a("b"), r(5), None, Some(a("a"))).unwrap();
        list.insert(a("c"), r(5), Some(a("a")), None).unwrap();
        assert_eq!(order(&list), vec!["b", "a", "c"]);
        assert!(list.is_ordered());
    }
}
