use std::collections::BTreeMap;

use crate::error::MergeError;
use crate::or_core::{EntryMeta, OrCore};
use crate::timestamp::LamportTimestamp;
use crate::version::VersionVector;
use crate::{DeltaCrdt, Replicable};

/// An observed-remove map (OR-Map).
///
/// Same skeleton as [`ORSet`](crate::ORSet), except that every key also
/// carries a value. Concurrent writes to the same key resolve
/// last-writer-wins by Lamport timestamp; a remove tombstones the entry it
/// observed, keeping the last value around so delta application can
/// compare full metadata on timestamp collisions.
///
/// Tombstones are never garbage-collected: memory grows with the number of
/// distinct keys ever inserted.
///
/// # Example
///
/// ```
/// use deltakit::prelude::*;
///
/// let mut m1 = ORMap::new("node-1");
/// m1.insert("theme", "light");
///
/// let mut m2 = ORMap::new("node-2");
/// m2.merge(&m1);
/// m2.insert("theme", "dark"); // later write
///
/// m1.merge(&m2);
/// assert_eq!(m1.get(&"theme"), Some(&"dark"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ORMap<A: Ord + Clone, K: Ord + Clone, V: Clone + PartialEq> {
    core: OrCore<A, K, V>,
}

impl<A: Ord + Clone, K: Ord + Clone, V: Clone + PartialEq> ORMap<A, K, V> {
    /// Create a new empty OR-Map for the given actor.
    pub fn new(actor: A) -> Self {
        Self {
            core: OrCore::new(actor),
        }
    }

    /// Create a map whose Lamport clock starts at `clock`.
    pub fn with_clock(actor: A, clock: u64) -> Self {
        Self {
            core: OrCore::with_clock(actor, clock),
        }
    }

    /// Assign `value` to `key` at a fresh timestamp.
    ///
    /// Returns the value that was live under the key before, if any.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.core.upsert(key, value)
    }

    /// Remove a key from the map.
    ///
    /// The entry is tombstoned at a fresh timestamp; its last value is
    /// retained internally for metadata comparison only.
    ///
    /// Returns the removed value, or `None` if the key was not present.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.core.tombstone(key)
    }

    /// Get the value for a key.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.core.get(key)
    }

    /// Check if the map contains a key.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.core.is_live(key)
    }

    /// Get the number of entries in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.core.live_len()
    }

    /// Check if the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.core.live_iter()
    }

    /// Iterate over the keys in the map.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.core.live_iter().map(|(key, _)| key)
    }

    /// Iterate over the values in the map.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.core.live_iter().map(|(_, value)| value)
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

impl<A: Ord + Clone, K: Ord + Clone, V: Clone + PartialEq> Replicable for ORMap<A, K, V> {
    fn merge(&mut self, other: &Self) {
        self.core.merge(&other.core);
    }
}

/// Delta for [`ORMap`]: the metadata entries the remote summary does not
/// cover, tombstones included.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ORMapDelta<A: Ord + Clone, K: Ord + Clone, V: Clone + PartialEq> {
    entries: BTreeMap<K, EntryMeta<A, V>>,
}

impl<A: Ord + Clone, K: Ord + Clone, V: Clone + PartialEq> ORMapDelta<A, K, V> {
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

impl<A: Ord + Clone, K: Ord + Clone, V: Clone + PartialEq> DeltaCrdt for ORMap<A, K, V> {
    type State = VersionVector<A>;
    type Delta = ORMapDelta<A, K, V>;

    fn state(&self) -> VersionVector<A> {
        self.core.state()
    }

    fn delta(&self, remote: Option<&VersionVector<A>>) -> Option<ORMapDelta<A, K, V>> {
        self.core
            .delta_entries(remote)
            .map(|entries| ORMapDelta { entries })
    }

    fn merge_delta(&mut self, delta: &ORMapDelta<A, K, V>) -> Result<(), MergeError> {
        self.core.merge_entries(&delta.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_map_is_empty() {
        let m = ORMap::<&str, String, u32>::new("a");
        assert!(m.is_empty());
        assert_eq!(m.len(), 0);
    }

    #[test]
    fn insert_and_get() {
        let mut m = ORMap::new("a");
        assert_eq!(m.insert("k", 1), None);
        assert_eq!(m.get(&"k"), Some(&1));
        assert!(m.contains_key(&"k"));
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn overwrite_returns_previous_value() {
        let mut m = ORMap::new("a");
        m.insert("k", 1);
        assert_eq!(m.insert("k", 2), Some(1));
        assert_eq!(m.get(&"k"), Some(&2));
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn remove_key() {
        let mut m = ORMap::new("a");
        m.insert("k", 1);
        assert_eq!(m.remove(&"k"), Some(1));
        assert_eq!(m.get(&"k"), None);
        assert!(!m.contains_key(&"k"));
        assert_eq!(m.len(), 0);
    }

    #[test]
    fn remove_nonexistent_returns_none() {
        let mut m = ORMap::<&str, &str, u32>::new("a");
        assert_eq!(m.remove(&"k"), None);
    }

    #[test]
    fn reassign_after_remove() {
        let mut m = ORMap::new("a");
        m.insert("k", 1);
        m.remove(&"k");
        assert_eq!(m.insert("k", 2), None);
        assert_eq!(m.get(&"k"), Some(&2));
    }

    #[test]
    fn with_clock_starts_ahead() {
        let mut m = ORMap::with_clock("a", 5);
        m.insert("k", 1);
        assert_eq!(m.timestamp().clock, 6);
    }

    #[test]
    fn keys_and_values_skip_tombstones() {
        let mut m = ORMap::new("a");
        m.insert("x", 1);
        m.insert("y", 2);
        m.insert("z", 3);
        m.remove(&"y");

        let keys: Vec<&&str> = m.keys().collect();
        assert_eq!(keys, vec![&"x", &"z"]);
        let values: Vec<&u32> = m.values().collect();
        assert_eq!(values, vec![&1, &3]);
    }

    #[test]
    fn later_write_wins_on_merge() {
        let mut m1 = ORMap::new("a");
        m1.insert("k", 1); // (1, "a")

        let mut m2 = ORMap::new("b");
        m2.insert("k", 2); // (1, "b"): same clock, higher actor

        let left = m1.clone().merged(&m2);
        let right = m2.clone().merged(&m1);
        assert_eq!(left.get(&"k"), Some(&2));
        assert_eq!(right.get(&"k"), Some(&2));
    }

    #[test]
    fn remote_remove_loses_to_later_write() {
        let mut m1 = ORMap::new("a");
        m1.insert("k", 1);

        let mut m2 = ORMap::new("b");
        m2.merge(&m1);
        m2.remove(&"k"); // tombstone at clock 2

        m1.insert("other", 0);
        m1.insert("k", 3); // rewrite at clock 3

        m1.merge(&m2);
        assert_eq!(m1.get(&"k"), Some(&3));
    }

    #[test]
    fn merge_is_idempotent() {
        let mut m1 = ORMap::new("a");
        m1.insert("x", 1);

        let mut m2 = ORMap::new("b");
        m2.insert("y", 2);

        m1.merge(&m2);
        let after_first = m1.clone();
        m1.merge(&m2);

        assert_eq!(m1, after_first);
    }

    #[test]
    fn delta_apply_equivalent_to_merge() {
        let mut m1 = ORMap::new("a");
        m1.insert("x", 1);
        m1.insert("y", 2);
        m1.remove(&"x");

        let mut m2 = ORMap::new("b");
        m2.insert("z", 3);

        let merged_full = m2.clone().merged(&m1);
        let full: Vec<(&&str, &u32)> = merged_full.iter().collect();

        let mut via_delta = m2.clone();
        via_delta
            .merge_delta(&m1.delta(Some(&m2.state())).unwrap())
            .unwrap();
        let delta_pairs: Vec<(&&str, &u32)> = via_delta.iter().collect();

        assert_eq!(full, delta_pairs);
    }

    #[test]
    fn delta_is_none_when_remote_is_current() {
        let mut m = ORMap::new("a");
        m.insert("k", 1);
        assert!(m.delta(Some(&m.state())).is_none());
    }

    #[test]
    fn tied_timestamp_with_divergent_value_is_a_conflict() {
        // Same actor id on two replicas: both writes land at (1, "a")
        // with different values.
        let mut m1 = ORMap::new("a");
        m1.insert("k", 1);

        let mut m2 = ORMap::new("a");
        m2.insert("k", 2);

        let err = m1.merge_delta(&m2.delta(None).unwrap()).unwrap_err();
        assert!(matches!(err, MergeError::ConflictingHistory(_)));
        // Nothing was applied.
        assert_eq!(m1.get(&"k"), Some(&1));
    }

    #[test]
    fn tied_timestamp_with_equal_metadata_is_fine() {
        let mut m1 = ORMap::new("a");
        m1.insert("k", 1);

        let m2 = m1.clone();
        assert!(m1.merge_delta(&m2.delta(None).unwrap()).is_ok());
        assert_eq!(m1.get(&"k"), Some(&1));
    }

    #[test]
    fn tombstone_retains_value_for_metadata_comparison() {
        // Two same-actor replicas remove the same key at the same clock;
        // identical corpse values make the histories indistinguishable,
        // so the delta is accepted.
        let mut m1 = ORMap::new("a");
        m1.insert("k", 1);
        m1.remove(&"k");

        let mut m2 = ORMap::new("a");
        m2.insert("k", 1);
        m2.remove(&"k");

        assert!(m1.merge_delta(&m2.delta(None).unwrap()).is_ok());

        // A diverging corpse value is caught.
        let mut m3 = ORMap::new("a");
        m3.insert("k", 9);
        m3.remove(&"k");

        let err = m1.merge_delta(&m3.delta(None).unwrap()).unwrap_err();
        assert!(matches!(err, MergeError::ConflictingHistory(_)));
    }

    #[test]
    fn merge_delta_advances_own_clock_past_observed_history() {
        let mut original = ORMap::new("a");
        original.insert("x", 1);
        original.insert("y", 2);

        let mut rebuilt = ORMap::new("a");
        rebuilt.merge_delta(&original.delta(None).unwrap()).unwrap();
        assert_eq!(rebuilt.timestamp().clock, 2);

        rebuilt.insert("z", 3);
        assert_eq!(rebuilt.timestamp().clock, 3);
    }
}
