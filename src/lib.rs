//! # deltakit
//!
//! Delta-state CRDTs with Lamport-clock causal metadata for local-first
//! replication.
//!
//! A CRDT (Conflict-free Replicated Data Type) is a data structure that can
//! be replicated across multiple devices and updated independently. When
//! replicas are merged, they are guaranteed to converge to the same state
//! without requiring coordination or consensus. The types in this crate are
//! additionally *delta-state* CRDTs: a replica can summarize what it has
//! seen as a compact [`VersionVector`] and receive only the entries that
//! summary does not cover, instead of the full state.
//!
//! ## Quick Start
//!
//! ```
//! use deltakit::prelude::*;
//!
//! // Grow-only counter
//! let mut c1 = GCounter::new("device-1");
//! c1.increment();
//!
//! let mut c2 = GCounter::new("device-2");
//! c2.increment();
//!
//! c1.merge(&c2);
//! assert_eq!(c1.value(), 2);
//!
//! // Delta synchronization: send only what the other side is missing.
//! let delta = c1.delta(Some(&c2.state())).expect("c2 is behind");
//! c2.merge_delta(&delta).unwrap();
//! assert_eq!(c2.value(), 2);
//! ```
//!
//! ## Available CRDTs
//!
//! ### Counters
//! - [`GCounter`] - Grow-only counter (increment only)
//! - [`PNCounter`] - Positive-negative counter (increment and decrement)
//!
//! ### Collections
//! - [`ORSet`] - Observed-remove set (add and remove freely)
//! - [`ORMap`] - Observed-remove map (last-writer-wins per key)
//!
//! ## The traits
//!
//! All types implement [`Replicable`], whose [`merge`](Replicable::merge)
//! is guaranteed to be commutative, associative, and idempotent, and
//! [`DeltaCrdt`], which adds the `state`/`delta`/`merge_delta` protocol.
//! Full-state merges never fail; delta merges report
//! [`MergeError::ConflictingHistory`] when remote metadata disagrees with
//! local metadata under an identical timestamp, which can only happen when
//! two replicas share an actor id.
//!
//! ## Serialization
//!
//! With the `serde` feature enabled, every CRDT plus its state and delta
//! types implement `Serialize`/`Deserialize` with a stable, map-ordered
//! shape.

mod crdt;
mod error;
mod gcounter;
mod or_core;
mod or_map;
mod or_set;
mod pncounter;
mod timestamp;
mod version;

pub mod prelude;

pub use crdt::{DeltaCrdt, Replicable};
pub use error::MergeError;
pub use gcounter::{GCounter, GCounterDelta};
pub use or_map::{ORMap, ORMapDelta};
pub use or_set::{ORSet, ORSetDelta};
pub use pncounter::{PNCounter, PNCounterDelta, PNCounterState};
pub use timestamp::LamportTimestamp;
pub use version::VersionVector;
