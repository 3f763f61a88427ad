//! Consistent-hashing ring for assigning items to a changing set of owners.
//!
//! Owners (shard controllers, collectors, nodes) each place a fixed number of
//! virtual points on a 32-bit ring. An item belongs to the owner of the first
//! point clockwise of the item's hash. When owners join or leave, only the
//! items whose nearest point changed move.
//!
//! # Features
//!
//! - FNV-1 hashing by default, with FNV-1a and xxHash32 available
//! - Full or incremental rebalancing behind the same API
//! - One reader/writer lock over ring and assignments
//! - Lock-free counters and gauges for membership and churn
//!
//! # Example
//!
//! ```rust
//! use shard_ring::{OwnershipTracker, RingConfig};
//!
//! let tracker = OwnershipTracker::with_config(RingConfig::new().with_vnodes_per_owner(200))?;
//!
//! // Inserting before any owner exists fails without side effects.
//! assert!(tracker.insert_items(["pod-1"]).is_err());
//!
//! tracker.add_owners(["collector-1", "collector-2", "collector-3"]);
//! tracker.insert_items(["pod-1", "pod-2", "pod-3"])?;
//!
//! // Adding an owner reports every item that moved.
//! for moved in tracker.add_owners(["collector-4"]) {
//!     println!("{}", moved);
//! }
//!
//! let owner = tracker.owner_of("pod-1").unwrap();
//! assert!(tracker.owner_items(&owner).contains(&"pod-1".to_string()));
//! # Ok::<(), shard_ring::Error>(())
//! ```
//!
//! # Consistency Model
//!
//! - **Owner add/remove**: exclusive lock for the mutation and the rebalance
//! - **Item insert/remove**: exclusive while mutating (see [`InsertLockMode`])
//! - **Lookups**: shared lock; always see a state between two mutations

pub mod config;
pub mod error;
pub mod metrics;
pub mod partitioning;
pub mod types;

// Re-export main types for convenience
pub use config::{InsertLockMode, RebalanceStrategy, RingConfig, DEFAULT_VNODES_PER_OWNER};
pub use error::{Error, Result};
pub use metrics::{RingMetrics, RingMetricsSnapshot};
pub use partitioning::{AssignmentStore, HashFunction, HashRing, OwnershipTracker};
pub use types::{HashPoint, Reassignment, RingStats};
