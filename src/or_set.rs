use std::collections::BTreeMap;

use crate::error::MergeError;
use crate::or_core::{EntryMeta, OrCore};
use crate::timestamp::LamportTimestamp;
use crate::version::VersionVector;
use crate::{DeltaCrdt, Replicable};

/// An observed-remove set (OR-Set).
///
/// Elements can be freely added, removed, and re-added. Every mutation is
/// stamped with the replica's Lamport clock; a remove tombstones the entry
/// it observed rather than deleting it, so a concurrent insert with a
/// higher timestamp survives the merge.
///
/// Tombstones are never garbage-collected: memory grows with the number of
/// distinct values ever inserted. Compacting them away would need a
/// causal-stability oracle this crate does not provide.
///
/// # Example
///
/// ```
/// use deltakit::prelude::*;
///
/// let mut s1 = ORSet::new("node-1");
/// s1.insert("apple");
/// s1.insert("banana");
/// s1.remove(&"banana");
///
/// let mut s2 = ORSet::new("node-2");
/// s2.merge(&s1);
/// s2.insert("banana"); // re-insert at a later timestamp
///
/// s1.merge(&s2);
/// assert!(s1.contains(&"banana"));
/// assert!(s1.contains(&"apple"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ORSet<A: Ord + Clone, T: Ord + Clone> {
    core: OrCore<A, T, ()>,
}

impl<A: Ord + Clone, T: Ord + Clone> ORSet<A, T> {
    /// Create a new empty OR-Set for the given actor.
    pub fn new(actor: A) -> Self {
        Self {
            core: OrCore::new(actor),
        }
    }

    /// Create a set whose Lamport clock starts at `clock`.
    pub fn with_clock(actor: A, clock: u64) -> Self {
        Self {
            core: OrCore::with_clock(actor, clock),
        }
    }

    /// Insert an element into the set.
    ///
    /// Returns `true` if the element was absent or tombstoned before.
    pub fn insert(&mut self, value: T) -> bool {
        self.core.upsert(value, ()).is_none()
    }

    /// Remove an element from the set.
    ///
    /// The entry is tombstoned at a fresh timestamp; concurrent inserts
    /// with higher timestamps on other replicas will survive the merge.
    ///
    /// Returns the removed element, or `None` if it was not present.
    pub fn remove(&mut self, value: &T) -> Option<T> {
        self.core.tombstone(value).map(|()| value.clone())
    }

    /// Check if the set contains an element.
    #[must_use]
    pub fn contains(&self, value: &T) -> bool {
        self.core.is_live(value)
    }

    /// Get the number of elements in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.core.live_len()
    }

    /// Check if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over the elements in the set.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.core.live_iter().map(|(value, ())| value)
    }

    /// Get this replica's actor ID.
    #[must_use]
    pub fn actor(&self) -> &A {
        self.core.actor()
    }

    /// This replica's current Lamport timestamp.
    #[must_use]
    pub fn timestamp(&self) -> &LamportTimestamp<A> {
        &self.core.timestamp
    }
}

impl<A: Ord + Clone, T: Ord + Clone> IntoIterator for ORSet<A, T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        let items: Vec<T> = self.iter().cloned().collect();
        items.into_iter()
    }
}

impl<A: Ord + Clone, T: Ord + Clone> Replicable for ORSet<A, T> {
    fn merge(&mut self, other: &Self) {
        self.core.merge(&other.core);
    }
}

/// Delta for [`ORSet`]: the metadata entries the remote summary does not
/// cover, tombstones included.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ORSetDelta<A: Ord + Clone, T: Ord + Clone> {
    entries: BTreeMap<T, EntryMeta<A, ()>>,
}

impl<A: Ord + Clone, T: Ord + Clone> ORSetDelta<A, T> {
    /// Number of entries carried by this delta.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the delta carries no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<A: Ord + Clone, T: Ord + Clone> DeltaCrdt for ORSet<A, T> {
    type State = VersionVector<A>;
    type Delta = ORSetDelta<A, T>;

    fn state(&self) -> VersionVector<A> {
        self.core.state()
    }

    fn delta(&self, remote: Option<&VersionVector<A>>) -> Option<ORSetDelta<A, T>> {
        self.core
            .delta_entries(remote)
            .map(|entries| ORSetDelta { entries })
    }

    fn merge_delta(&mut self, delta: &ORSetDelta<A, T>) -> Result<(), MergeError> {
        self.core.merge_entries(&delta.entries)
    }
}
