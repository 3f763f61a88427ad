//! Consistent hashing ring with virtual points.
//!
//! Each owner is represented by a fixed number of virtual points on a 32-bit
//! ring. An item belongs to the owner of the first point strictly clockwise of
//! the item's hash, wrapping past the largest point back to the smallest.

use crate::config::{RingConfig, DEFAULT_VNODES_PER_OWNER};
use crate::partitioning::hash::HashFunction;
use crate::types::HashPoint;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

/// A consistent hash ring mapping 32-bit points to owner names.
#[derive(Debug, Clone)]
pub struct HashRing {
    /// Virtual points mapped to their owner. Last write wins on collision.
    points: HashMap<HashPoint, String>,

    /// Ascending key set of `points`, used for binary search.
    sorted: Vec<HashPoint>,

    /// Registered owners.
    owners: BTreeSet<String>,

    /// Number of virtual points per owner.
    vnodes_per_owner: usize,

    /// Hash used for virtual points and item names.
    hash_function: HashFunction,
}

impl HashRing {
    /// Create an empty ring with `vnodes_per_owner` points per owner.
    pub fn new(vnodes_per_owner: usize) -> Self {
        Self::with_hash_function(vnodes_per_owner, HashFunction::default())
    }

    /// Create an empty ring with a specific hash function.
    pub fn with_hash_function(vnodes_per_owner: usize, hash_function: HashFunction) -> Self {
        Self {
            points: HashMap::new(),
            sorted: Vec::new(),
            owners: BTreeSet::new(),
            vnodes_per_owner,
            hash_function,
        }
    }

    /// Create an empty ring from a tracker configuration.
    pub fn from_config(config: &RingConfig) -> Self {
        Self::with_hash_function(config.vnodes_per_owner, config.hash_function)
    }

    /// Number of virtual points per owner.
    pub fn vnodes_per_owner(&self) -> usize {
        self.vnodes_per_owner
    }

    /// Hash function used by this ring.
    pub fn hash_function(&self) -> HashFunction {
        self.hash_function
    }

    /// Number of registered owners.
    pub fn owner_count(&self) -> usize {
        self.owners.len()
    }

    /// Number of distinct points on the ring.
    ///
    /// May be lower than `owner_count() * vnodes_per_owner()` when points
    /// collide.
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Whether the ring has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether an owner is registered.
    pub fn contains_owner(&self, owner: &str) -> bool {
        self.owners.contains(owner)
    }

    /// Registered owners in ascending name order.
    pub fn owners(&self) -> impl Iterator<Item = &str> {
        self.owners.iter().map(String::as_str)
    }

    /// Points on the ring in ascending order.
    pub fn sorted_points(&self) -> &[HashPoint] {
        &self.sorted
    }

    /// Owner of an exact point, if one sits there.
    pub fn owner_at(&self, point: HashPoint) -> Option<&str> {
        self.points.get(&point).map(String::as_str)
    }

    /// Add owners to the ring.
    ///
    /// Every owner gets `vnodes_per_owner` points. The sorted sequence is
    /// refreshed once for the whole batch. Returns how many owners were not
    /// registered before.
    pub fn add_owners<I, S>(&mut self, owners: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = 0;
        for owner in owners {
            let owner = owner.as_ref();
            for i in 0..self.vnodes_per_owner {
                let point = self.hash_function.vnode_point(owner, i);
                self.points.insert(point, owner.to_string());
            }
            if self.owners.insert(owner.to_string()) {
                added += 1;
            }
            debug!(owner, points = self.vnodes_per_owner, "added owner to ring");
        }

        self.refresh_sorted();
        added
    }

    /// Remove an owner and all of its points.
    ///
    /// Points that another owner overwrote through a collision are left in
    /// place. Returns false if the owner was not registered.
    pub fn remove_owner(&mut self, owner: &str) -> bool {
        if !self.owners.remove(owner) {
            return false;
        }

        for i in 0..self.vnodes_per_owner {
            let point = self.hash_function.vnode_point(owner, i);
            if self.points.get(&point).is_some_and(|o| o == owner) {
                self.points.remove(&point);
            }
        }

        self.refresh_sorted();
        debug!(owner, remaining = self.owners.len(), "removed owner from ring");
        true
    }

    /// Owner of the first point strictly greater than `hash`.
    ///
    /// Wraps to the smallest point when `hash` is at or past the largest one.
    /// Returns `None` only when the ring is empty.
    pub fn nearest_owner(&self, hash: HashPoint) -> Option<&str> {
        let idx = self.sorted.partition_point(|&p| p <= hash);
        let point = self.sorted.get(idx).or_else(|| self.sorted.first())?;
        self.owner_at(*point)
    }

    /// Owner an item would be assigned to in the current ring state.
    pub fn owner_for(&self, item: &str) -> Option<&str> {
        self.nearest_owner(self.hash_function.hash(item.as_bytes()))
    }

    /// Count sample keys per owner.
    ///
    /// This is useful for testing/monitoring point distribution.
    pub fn distribution(&self, sample_size: usize) -> HashMap<String, usize> {
        let mut distribution = HashMap::new();

        for i in 0..sample_size {
            let key = format!("sample_key_{}", i);
            if let Some(owner) = self.owner_for(&key) {
                *distribution.entry(owner.to_string()).or_insert(0) += 1;
            }
        }

        distribution
    }

    /// Bring `sorted` back in line with the key set of `points`.
    ///
    /// Stale values are pruned, unseen keys are appended, then the whole
    /// sequence is sorted.
    fn refresh_sorted(&mut self) {
        let points = &self.points;
        self.sorted.retain(|p| points.contains_key(p));

        let known: HashSet<HashPoint> = self.sorted.iter().copied().collect();
        self.sorted
            .extend(points.keys().copied().filter(|p| !known.contains(p)));
        self.sorted.sort_unstable();
    }
}

impl Default for HashRing {
    fn default() -> Self {
        Self::new(DEFAULT_VNODES_PER_OWNER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a ring with hand-placed points.
    fn ring_with_points(points: &[(HashPoint, &str)]) -> HashRing {
        let mut ring = HashRing::new(1);
        for &(point, owner) in points {
            ring.points.insert(point, owner.to_string());
            ring.owners.insert(owner.to_string());
        }
        ring.refresh_sorted();
        ring
    }

    fn assert_sorted_matches_points(ring: &HashRing) {
        let mut expected: Vec<HashPoint> = ring.points.keys().copied().collect();
        expected.sort_unstable();
        assert_eq!(ring.sorted_points(), expected.as_slice());
    }

    #[test]
    fn test_empty_ring() {
        let ring = HashRing::new(100);
        assert!(ring.is_empty());
        assert_eq!(ring.owner_count(), 0);
        assert_eq!(ring.nearest_owner(42), None);
        assert_eq!(ring.owner_for("item"), None);
    }

    #[test]
    fn test_wrap_around() {
        let ring = ring_with_points(&[(10, "a"), (50, "b"), (90, "c")]);

        assert_eq!(ring.nearest_owner(95), Some("a"));
        assert_eq!(ring.nearest_owner(30), Some("b"));
        assert_eq!(ring.nearest_owner(0), Some("a"));
        assert_eq!(ring.nearest_owner(u32::MAX), Some("a"));
    }

    #[test]
    fn test_exact_point_goes_clockwise() {
        let ring = ring_with_points(&[(10, "a"), (50, "b"), (90, "c")]);

        // Strictly greater: a probe sitting on a point belongs to the next one.
        assert_eq!(ring.nearest_owner(10), Some("b"));
        assert_eq!(ring.nearest_owner(50), Some("c"));
        assert_eq!(ring.nearest_owner(90), Some("a"));
    }

    #[test]
    fn test_add_owners_places_points() {
        let mut ring = HashRing::new(100);
        let added = ring.add_owners(["a", "b", "c"]);

        assert_eq!(added, 3);
        assert_eq!(ring.owner_count(), 3);
        assert!(ring.point_count() <= 300);
        assert!(ring.point_count() > 290, "unexpected collision count");
        assert_sorted_matches_points(&ring);
        assert_eq!(ring.owners().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_add_same_owner_twice() {
        let mut ring = HashRing::new(100);
        ring.add_owners(["a"]);
        let points = ring.point_count();

        assert_eq!(ring.add_owners(["a"]), 0);
        assert_eq!(ring.owner_count(), 1);
        assert_eq!(ring.point_count(), points);
        assert_sorted_matches_points(&ring);
    }

    #[test]
    fn test_remove_owner_prunes_sorted_points() {
        let mut ring = HashRing::new(100);
        ring.add_owners(["a", "b"]);

        assert!(ring.remove_owner("a"));
        assert_eq!(ring.owner_count(), 1);
        assert_sorted_matches_points(&ring);
        for &point in ring.sorted_points() {
            assert_eq!(ring.owner_at(point), Some("b"));
        }
        for i in 0..1000 {
            assert_eq!(ring.owner_for(&format!("item-{}", i)), Some("b"));
        }
    }

    #[test]
    fn test_remove_unknown_owner() {
        let mut ring = HashRing::new(10);
        ring.add_owners(["a"]);

        assert!(!ring.remove_owner("zzz"));
        assert_eq!(ring.owner_count(), 1);
        assert_eq!(ring.point_count(), 10);
    }

    #[test]
    fn test_remove_last_owner_empties_ring() {
        let mut ring = HashRing::new(10);
        ring.add_owners(["a"]);
        ring.remove_owner("a");

        assert!(ring.is_empty());
        assert!(ring.sorted_points().is_empty());
        assert_eq!(ring.nearest_owner(7), None);
    }

    #[test]
    fn test_collision_last_write_wins() {
        // "owner-15898#0" and "owner-1767644#0" share an FNV-32 hash.
        let mut ring = HashRing::new(1);
        ring.add_owners(["owner-15898"]);
        ring.add_owners(["owner-1767644"]);

        assert_eq!(ring.owner_count(), 2);
        assert_eq!(ring.point_count(), 1);
        assert_eq!(ring.owner_at(0x7c98_2b31), Some("owner-1767644"));

        // Removing the overwritten owner must not delete the surviving point.
        ring.remove_owner("owner-15898");
        assert_eq!(ring.owner_at(0x7c98_2b31), Some("owner-1767644"));
        assert_sorted_matches_points(&ring);

        ring.remove_owner("owner-1767644");
        assert!(ring.is_empty());
        assert_sorted_matches_points(&ring);
    }

    #[test]
    fn test_deterministic_placement() {
        let mut ring1 = HashRing::new(100);
        let mut ring2 = HashRing::new(100);
        ring1.add_owners(["a", "b", "c"]);
        ring2.add_owners(["c", "b", "a"]);

        for i in 0..500 {
            let item = format!("item-{}", i);
            assert_eq!(ring1.owner_for(&item), ring2.owner_for(&item));
            assert_eq!(ring1.owner_for(&item), ring1.owner_for(&item));
        }
    }

    #[test]
    fn test_distribution() {
        let mut ring = HashRing::with_hash_function(1000, HashFunction::XxHash32);
        ring.add_owners(["a", "b", "c"]);

        let distribution = ring.distribution(10_000);

        // Each owner should have roughly 1/3 of keys (with some variance)
        for owner in ring.owners() {
            let count = distribution.get(owner).copied().unwrap_or(0);
            assert!(
                count > 2500 && count < 4500,
                "owner {} has {} keys",
                owner,
                count
            );
        }
    }

    #[test]
    fn test_fnv_distribution_reaches_every_owner() {
        // FNV-1 clusters keys sharing a prefix, so only a loose bound holds.
        for hash_function in [HashFunction::Fnv32, HashFunction::Fnv32a] {
            let mut ring = HashRing::with_hash_function(1000, hash_function);
            ring.add_owners(["a", "b", "c"]);

            let distribution = ring.distribution(10_000);
            assert_eq!(distribution.values().sum::<usize>(), 10_000);
            for owner in ring.owners() {
                let count = distribution.get(owner).copied().unwrap_or(0);
                assert!(count > 1000, "{:?}: owner {} has {} keys", hash_function, owner, count);
            }
        }
    }

    #[test]
    fn test_xxhash_ring_distribution() {
        let mut ring = HashRing::with_hash_function(1000, HashFunction::XxHash32);
        ring.add_owners(["a", "b", "c", "d"]);

        let distribution = ring.distribution(10_000);
        assert_eq!(distribution.values().sum::<usize>(), 10_000);
        for owner in ring.owners() {
            let count = distribution.get(owner).copied().unwrap_or(0);
            assert!(count > 1500 && count < 3500, "owner {} has {} keys", owner, count);
        }
    }
}
