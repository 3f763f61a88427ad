//! Item-to-owner assignments derived from a [`HashRing`].
//!
//! The store keeps two views of the same bindings: item → owner, and
//! owner → items. Every mutation updates both so that an item is listed under
//! exactly one owner, the one it is bound to.

use crate::config::RebalanceStrategy;
use crate::error::{Error, Result};
use crate::partitioning::hashring::HashRing;
use crate::types::Reassignment;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{trace, warn};

/// Current item assignments.
#[derive(Debug, Clone, Default)]
pub struct AssignmentStore {
    /// Item name → owner name.
    members: HashMap<String, String>,

    /// Owner name → items bound to it. Owners without items have no entry.
    index: HashMap<String, Vec<String>>,
}

impl AssignmentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of assigned items.
    pub fn item_count(&self) -> usize {
        self.members.len()
    }

    /// Whether no items are assigned.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether an item is assigned.
    pub fn contains_item(&self, item: &str) -> bool {
        self.members.contains_key(item)
    }

    /// Owner an item is bound to.
    pub fn owner_of(&self, item: &str) -> Option<&str> {
        self.members.get(item).map(String::as_str)
    }

    /// Items bound to an owner. Empty for unknown owners.
    pub fn owner_items(&self, owner: &str) -> &[String] {
        self.index.get(owner).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Owners holding at least one item, with their item count.
    pub fn owners_with_items(&self) -> impl Iterator<Item = (&str, usize)> {
        self.index
            .iter()
            .map(|(owner, items)| (owner.as_str(), items.len()))
    }

    /// Items from `items` that are not assigned yet, first occurrence only.
    pub fn unassigned<I, S>(&self, items: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        items
            .into_iter()
            .filter_map(|item| {
                let item = item.as_ref();
                (!self.members.contains_key(item) && seen.insert(item.to_string()))
                    .then(|| item.to_string())
            })
            .collect()
    }

    /// Assign every item that is not assigned yet to its nearest owner.
    ///
    /// Already assigned items keep their owner. Fails with
    /// [`Error::EmptyRing`] before touching any state if the ring has no
    /// points. Returns how many items were newly assigned.
    pub fn insert_items<I, S>(&mut self, ring: &HashRing, items: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if ring.is_empty() {
            return Err(Error::EmptyRing);
        }

        let mut inserted = 0;
        for item in items {
            let item = item.as_ref();
            if self.members.contains_key(item) {
                continue;
            }
            if let Some(owner) = ring.owner_for(item) {
                trace!(item, owner, "assigned item");
                self.assign(item.to_string(), owner.to_string());
                inserted += 1;
            }
        }

        Ok(inserted)
    }

    /// Remove an item. Returns the owner it was bound to.
    pub fn remove_item(&mut self, item: &str) -> Option<String> {
        let owner = self.members.remove(item)?;
        self.detach(item, &owner);
        trace!(item, owner = %owner, "removed item");
        Some(owner)
    }

    /// Recompute assignments against the current ring.
    ///
    /// Returns the items whose owner changed, sorted by item name. If the ring
    /// is empty every item is dropped and reported with no new owner.
    pub fn rebalance(&mut self, ring: &HashRing, strategy: RebalanceStrategy) -> Vec<Reassignment> {
        if ring.is_empty() {
            return self.drop_all();
        }

        let mut moves = match strategy {
            RebalanceStrategy::Full => self.rebalance_full(ring),
            RebalanceStrategy::Incremental => self.rebalance_incremental(ring),
        };
        moves.sort_by(|a, b| a.item.cmp(&b.item));
        moves
    }

    /// Sorted copy of the owner index, for diagnostics and tests.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<String>> {
        self.index
            .iter()
            .map(|(owner, items)| {
                let mut items = items.clone();
                items.sort();
                (owner.clone(), items)
            })
            .collect()
    }

    /// Clear the index and re-insert every known item.
    fn rebalance_full(&mut self, ring: &HashRing) -> Vec<Reassignment> {
        let previous = std::mem::take(&mut self.members);
        self.index.clear();

        if let Err(e) = self.insert_items(ring, previous.keys()) {
            warn!(error = %e, items = previous.len(), "rebalance could not re-insert items");
            return previous
                .into_iter()
                .map(|(item, from)| Reassignment::dropped(item, from))
                .collect();
        }

        previous
            .into_iter()
            .filter_map(|(item, from)| {
                let to = self.members.get(&item)?;
                (*to != from).then(|| Reassignment::new(item.clone(), from, to.clone()))
            })
            .collect()
    }

    /// Move only the items whose nearest owner changed.
    fn rebalance_incremental(&mut self, ring: &HashRing) -> Vec<Reassignment> {
        let moves: Vec<Reassignment> = self
            .members
            .iter()
            .filter_map(|(item, from)| {
                let to = ring.owner_for(item)?;
                (to != from).then(|| Reassignment::new(item.as_str(), from.as_str(), to))
            })
            .collect();

        for m in &moves {
            if let Some(to) = &m.to {
                self.detach(&m.item, &m.from);
                self.assign(m.item.clone(), to.clone());
            }
        }

        moves
    }

    fn drop_all(&mut self) -> Vec<Reassignment> {
        self.index.clear();
        let dropped: Vec<Reassignment> = self
            .members
            .drain()
            .map(|(item, from)| Reassignment::dropped(item, from))
            .collect();
        if !dropped.is_empty() {
            warn!(items = dropped.len(), "ring is empty, dropped all assignments");
        }
        dropped
    }

    fn assign(&mut self, item: String, owner: String) {
        self.index
            .entry(owner.clone())
            .or_default()
            .push(item.clone());
        self.members.insert(item, owner);
    }

    /// Remove `item` from `owner`'s index entry. Order of the rest may change.
    fn detach(&mut self, item: &str, owner: &str) {
        if let Some(items) = self.index.get_mut(owner) {
            if let Some(pos) = items.iter().position(|i| i == item) {
                items.swap_remove(pos);
            }
            if items.is_empty() {
                self.index.remove(owner);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(owners: &[&str]) -> HashRing {
        let mut ring = HashRing::new(100);
        ring.add_owners(owners.iter().copied());
        ring
    }

    fn items(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("item-{}", i)).collect()
    }

    /// Every member is listed once, under its own owner, and nowhere else.
    fn assert_consistent(store: &AssignmentStore) {
        let indexed: usize = store.index.values().map(Vec::len).sum();
        assert_eq!(indexed, store.members.len());
        for (item, owner) in &store.members {
            let listed = store.owner_items(owner).iter().filter(|i| *i == item).count();
            assert_eq!(listed, 1, "item {} listed {} times under {}", item, listed, owner);
        }
        assert!(store.index.values().all(|items| !items.is_empty()));
    }

    #[test]
    fn test_insert_on_empty_ring_fails() {
        let mut store = AssignmentStore::new();
        let err = store.insert_items(&HashRing::new(10), ["a", "b"]).unwrap_err();

        assert_eq!(err, Error::EmptyRing);
        assert!(store.is_empty());
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_insert_assigns_nearest_owner() {
        let ring = ring(&["a", "b", "c"]);
        let mut store = AssignmentStore::new();

        assert_eq!(store.insert_items(&ring, items(300)).unwrap(), 300);
        for item in items(300) {
            assert_eq!(store.owner_of(&item), ring.owner_for(&item));
        }
        assert_consistent(&store);
    }

    #[test]
    fn test_insert_is_idempotent() {
        let ring = ring(&["a", "b"]);
        let mut store = AssignmentStore::new();

        assert_eq!(store.insert_items(&ring, ["x", "x", "y"]).unwrap(), 2);
        assert_eq!(store.insert_items(&ring, ["x"]).unwrap(), 0);

        let owner = store.owner_of("x").unwrap().to_string();
        let occurrences = store.owner_items(&owner).iter().filter(|i| *i == "x").count();
        assert_eq!(occurrences, 1);
        assert_eq!(store.item_count(), 2);
        assert_consistent(&store);
    }

    #[test]
    fn test_remove_and_reinsert() {
        let ring = ring(&["a", "b", "c"]);
        let mut store = AssignmentStore::new();
        store.insert_items(&ring, items(50)).unwrap();

        let owner = store.remove_item("item-7").unwrap();
        assert!(!store.owner_items(&owner).contains(&"item-7".to_string()));
        assert!(!store.contains_item("item-7"));
        assert_consistent(&store);

        assert_eq!(store.insert_items(&ring, ["item-7"]).unwrap(), 1);
        assert_eq!(store.owner_of("item-7"), Some(owner.as_str()));
    }

    #[test]
    fn test_remove_unknown_item() {
        let mut store = AssignmentStore::new();
        assert_eq!(store.remove_item("ghost"), None);
    }

    #[test]
    fn test_owner_items_unknown_owner() {
        let store = AssignmentStore::new();
        assert!(store.owner_items("nobody").is_empty());
    }

    #[test]
    fn test_unassigned_filters_members_and_duplicates() {
        let ring = ring(&["a"]);
        let mut store = AssignmentStore::new();
        store.insert_items(&ring, ["x"]).unwrap();

        assert_eq!(store.unassigned(["x", "y", "y", "z"]), vec!["y", "z"]);
    }

    #[test]
    fn test_rebalance_after_add_moves_only_to_new_owner() {
        let mut ring = ring(&["a", "b", "c"]);
        let mut store = AssignmentStore::new();
        store.insert_items(&ring, items(2000)).unwrap();

        ring.add_owners(["d"]);
        let moves = store.rebalance(&ring, RebalanceStrategy::Full);

        assert!(!moves.is_empty());
        for m in &moves {
            assert_eq!(m.to.as_deref(), Some("d"), "{} moved away from d", m);
            assert_ne!(m.from, "d");
        }
        assert_eq!(store.owner_items("d").len(), moves.len());
        assert_consistent(&store);
    }

    #[test]
    fn test_rebalance_after_remove_reassigns_all() {
        let mut ring = ring(&["a", "b", "c"]);
        let mut store = AssignmentStore::new();
        store.insert_items(&ring, items(1000)).unwrap();
        let held_by_b: Vec<String> = store.owner_items("b").to_vec();
        assert!(!held_by_b.is_empty());

        ring.remove_owner("b");
        let moves = store.rebalance(&ring, RebalanceStrategy::Full);

        assert_eq!(moves.len(), held_by_b.len());
        assert_eq!(store.item_count(), 1000);
        assert!(store.owner_items("b").is_empty());
        for item in &held_by_b {
            let owner = store.owner_of(item).unwrap();
            assert!(owner == "a" || owner == "c");
        }
        assert_consistent(&store);
    }

    #[test]
    fn test_rebalance_on_empty_ring_drops_everything() {
        let mut ring = ring(&["a"]);
        let mut store = AssignmentStore::new();
        store.insert_items(&ring, items(10)).unwrap();

        ring.remove_owner("a");
        let moves = store.rebalance(&ring, RebalanceStrategy::Full);

        assert_eq!(moves.len(), 10);
        assert!(moves.iter().all(Reassignment::is_dropped));
        assert!(store.is_empty());
        assert!(store.owner_items("a").is_empty());
    }

    #[test]
    fn test_incremental_matches_full() {
        let mut ring = ring(&["a", "b", "c"]);
        let mut full = AssignmentStore::new();
        full.insert_items(&ring, items(3000)).unwrap();
        let mut incremental = full.clone();

        ring.add_owners(["d", "e"]);
        let full_moves = full.rebalance(&ring, RebalanceStrategy::Full);
        let incremental_moves = incremental.rebalance(&ring, RebalanceStrategy::Incremental);
        assert_eq!(full_moves, incremental_moves);
        assert_eq!(full.snapshot(), incremental.snapshot());
        assert_consistent(&incremental);

        ring.remove_owner("a");
        let full_moves = full.rebalance(&ring, RebalanceStrategy::Full);
        let incremental_moves = incremental.rebalance(&ring, RebalanceStrategy::Incremental);
        assert_eq!(full_moves, incremental_moves);
        assert_eq!(full.snapshot(), incremental.snapshot());
        assert!(incremental.owner_items("a").is_empty());
        assert_consistent(&incremental);
    }

    #[test]
    fn test_rebalance_without_change_moves_nothing() {
        let ring = ring(&["a", "b"]);
        let mut store = AssignmentStore::new();
        store.insert_items(&ring, items(100)).unwrap();
        let before = store.snapshot();

        for strategy in [RebalanceStrategy::Full, RebalanceStrategy::Incremental] {
            assert!(store.rebalance(&ring, strategy).is_empty());
            assert_eq!(store.snapshot(), before);
        }
    }
}
