//! Shared engine for the observed-remove collections.
//!
//! [`ORSet`](crate::ORSet) and [`ORMap`](crate::ORMap) differ only in the
//! payload each key carries: `()` for the set, the mapped value for the
//! map. Everything else lives here once: per-key `(deleted, timestamp)`
//! metadata, tombstoning, the version-vector summary, delta extraction,
//! and both merge paths.

use std::collections::BTreeMap;

use tracing::{trace, warn};

use crate::error::MergeError;
use crate::timestamp::LamportTimestamp;
use crate::version::VersionVector;

/// Metadata kept for every key ever observed: the tombstone flag, the
/// timestamp of the mutation that produced this record, and the payload.
///
/// Tombstoned entries keep their last payload so that delta application
/// can compare full metadata when timestamps collide.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub(crate) struct EntryMeta<A, P> {
    pub(crate) deleted: bool,
    pub(crate) ts: LamportTimestamp<A>,
    pub(crate) payload: P,
}

/// An observed-remove keyed store with per-entry Lamport metadata.
///
/// Entries are never physically removed; a remove tombstones the entry at
/// a fresh timestamp so concurrent re-inserts can be resolved against it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub(crate) struct OrCore<A: Ord + Clone, K: Ord + Clone, P: Clone + PartialEq> {
    pub(crate) timestamp: LamportTimestamp<A>,
    pub(crate) entries: BTreeMap<K, EntryMeta<A, P>>,
}

impl<A, K, P> OrCore<A, K, P>
where
    A: Ord + Clone,
    K: Ord + Clone,
    P: Clone + PartialEq,
{
    pub(crate) fn new(actor: A) -> Self {
        Self::with_clock(actor, 0)
    }

    pub(crate) fn with_clock(actor: A, clock: u64) -> Self {
        Self {
            timestamp: LamportTimestamp::new(clock, actor),
            entries: BTreeMap::new(),
        }
    }

    pub(crate) fn actor(&self) -> &A {
        &self.timestamp.actor
    }

    /// Write `payload` under `key` at a fresh timestamp.
    ///
    /// Returns the payload that was live under the key before, if any.
    pub(crate) fn upsert(&mut self, key: K, payload: P) -> Option<P> {
        self.timestamp.tick();
        self.entries
            .insert(
                key,
                EntryMeta {
                    deleted: false,
                    ts: self.timestamp.clone(),
                    payload,
                },
            )
            .filter(|prev| !prev.deleted)
            .map(|prev| prev.payload)
    }

    /// Tombstone `key` at a fresh timestamp, keeping its payload.
    ///
    /// Only live entries tick the clock; tombstoning an absent or already
    /// deleted key is a no-op returning `None`.
    pub(crate) fn tombstone(&mut self, key: &K) -> Option<P> {
        match self.entries.get_mut(key) {
            Some(entry) if !entry.deleted => {
                self.timestamp.tick();
                entry.deleted = true;
                entry.ts = self.timestamp.clone();
                Some(entry.payload.clone())
            }
            _ => None,
        }
    }

    pub(crate) fn get(&self, key: &K) -> Option<&P> {
        self.entries
            .get(key)
            .filter(|entry| !entry.deleted)
            .map(|entry| &entry.payload)
    }

    pub(crate) fn is_live(&self, key: &K) -> bool {
        self.entries.get(key).is_some_and(|entry| !entry.deleted)
    }

    pub(crate) fn live_iter(&self) -> impl Iterator<Item = (&K, &P)> {
        self.entries
            .iter()
            .filter(|(_, entry)| !entry.deleted)
            .map(|(key, entry)| (key, &entry.payload))
    }

    pub(crate) fn live_len(&self) -> usize {
        self.entries.values().filter(|entry| !entry.deleted).count()
    }

    /// Highest clock per actor across all metadata, tombstones included.
    pub(crate) fn state(&self) -> VersionVector<A> {
        let mut vv = VersionVector::new();
        for entry in self.entries.values() {
            vv.observe(entry.ts.actor.clone(), entry.ts.clock);
        }
        vv
    }

    /// The sub-map of entries `remote` has not covered, or `None` when the
    /// remote is up to date. A `None` remote summary selects everything.
    pub(crate) fn delta_entries(
        &self,
        remote: Option<&VersionVector<A>>,
    ) -> Option<BTreeMap<K, EntryMeta<A, P>>> {
        let picked: BTreeMap<K, EntryMeta<A, P>> = self
            .entries
            .iter()
            .filter(|(_, entry)| {
                remote.map_or(true, |vv| !vv.covers(&entry.ts.actor, entry.ts.clock))
            })
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect();

        if picked.is_empty() {
            None
        } else {
            trace!(entries = picked.len(), "produced delta");
            Some(picked)
        }
    }

    /// Full-state merge: per key, the higher timestamp wins; an exact tie
    /// keeps the local entry. The local clock advances to cover the other
    /// replica's clock, the actor stays put.
    pub(crate) fn merge(&mut self, other: &Self) {
        for (key, theirs) in &other.entries {
            match self.entries.get(key) {
                Some(ours) if ours.ts >= theirs.ts => {}
                _ => {
                    self.entries.insert(key.clone(), theirs.clone());
                }
            }
        }
        if other.timestamp.clock > self.timestamp.clock {
            self.timestamp.clock = other.timestamp.clock;
        }
    }

    /// Delta merge: the higher timestamp wins, but an exact timestamp tie
    /// with differing metadata is a protocol violation.
    ///
    /// All incoming entries are validated before any is applied, so an
    /// error leaves the store untouched.
    pub(crate) fn merge_entries(
        &mut self,
        incoming: &BTreeMap<K, EntryMeta<A, P>>,
    ) -> Result<(), MergeError> {
        for (key, theirs) in incoming {
            if let Some(ours) = self.entries.get(key) {
                if ours.ts == theirs.ts
                    && (theirs.deleted != ours.deleted || theirs.payload != ours.payload)
                {
                    warn!(
                        clock = ours.ts.clock,
                        "divergent metadata under identical timestamp"
                    );
                    return Err(MergeError::ConflictingHistory(format!(
                        "divergent metadata under identical timestamp (clock {})",
                        ours.ts.clock
                    )));
                }
            }
        }

        for (key, theirs) in incoming {
            match self.entries.get(key) {
                Some(ours) if ours.ts >= theirs.ts => {}
                _ => {
                    self.entries.insert(key.clone(), theirs.clone());
                }
            }
            // Re-absorbing our own history (e.g. after restoring from a
            // peer) must leave the local clock ahead of it.
            if theirs.ts.actor == self.timestamp.actor && theirs.ts.clock > self.timestamp.clock {
                self.timestamp.clock = theirs.ts.clock;
            }
        }
        Ok(())
    }
}
