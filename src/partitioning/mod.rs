//! Partitioning module for assigning items to owners.
//!
//! This module implements consistent hashing so that:
//! - Items spread across all registered owners
//! - Adding or removing an owner moves only the items whose nearest owner
//!   changed
//! - Every assigned item is listed under exactly one owner
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    OwnershipTracker                          │
//! │                 (one RwLock over both)                       │
//! │  ┌──────────────────────────────────────────────────────┐  │
//! │  │                    HashRing                           │  │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐   │  │
//! │  │  │ 17:a│→│ 93:c│→│140:b│→│201:a│→│388:b│→│412:c│   │  │
//! │  │  └─────┘ └─────┘ └─────┘ └─────┘ └─────┘ └─────┘   │  │
//! │  │      1000 virtual points per owner by default         │  │
//! │  └──────────────────────────────────────────────────────┘  │
//! │  ┌──────────────────────────────────────────────────────┐  │
//! │  │                 AssignmentStore                       │  │
//! │  │   item → owner          owner → [items]               │  │
//! │  └──────────────────────────────────────────────────────┘  │
//! │                                                             │
//! │  Item "pod-7" → hash 150 → next point 201 → owner "a"       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use shard_ring::partitioning::{HashRing, OwnershipTracker};
//!
//! let mut ring = HashRing::new(100);
//! ring.add_owners(["a", "b", "c"]);
//! let owner = ring.owner_for("pod-7");
//! assert!(owner.is_some());
//!
//! let tracker = OwnershipTracker::new();
//! tracker.add_owners(["a", "b"]);
//! tracker.insert_items(["pod-7"]).unwrap();
//! let owner = tracker.owner_of("pod-7").unwrap();
//! assert!(tracker.owner_items(&owner).contains(&"pod-7".to_string()));
//! ```

mod assignment;
mod hash;
mod hashring;
mod tracker;

pub use assignment::AssignmentStore;
pub use hash::{fnv32, fnv32a, vnode_key, HashFunction};
pub use hashring::HashRing;
pub use tracker::OwnershipTracker;
