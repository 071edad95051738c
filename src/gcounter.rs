use std::collections::BTreeMap;

use crate::error::MergeError;
use crate::timestamp::LamportTimestamp;
use crate::version::VersionVector;
use crate::{DeltaCrdt, Replicable};

/// A grow-only counter (G-Counter).
///
/// Each replica maintains its own sub-count, stamped with the Lamport
/// clock of the increment that produced it. The total value is the sum of
/// all sub-counts. This counter can only be incremented, never
/// decremented; arithmetic saturates at `u64::MAX` and never wraps.
///
/// # Example
///
/// ```
/// use deltakit::prelude::*;
///
/// let mut c1 = GCounter::new("node-1");
/// c1.increment();
/// c1.increment();
///
/// let mut c2 = GCounter::new("node-2");
/// c2.increment();
///
/// c1.merge(&c2);
/// assert_eq!(c1.value(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GCounter<A: Ord + Clone> {
    timestamp: LamportTimestamp<A>,
    counts: BTreeMap<A, CounterEntry>,
}

/// One actor's sub-count and the clock at which it was last advanced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub(crate) struct CounterEntry {
    pub(crate) clock: u64,
    pub(crate) count: u64,
}

impl<A: Ord + Clone> GCounter<A> {
    /// Create a new G-Counter for the given actor/replica ID.
    pub fn new(actor: A) -> Self {
        Self::with_clock(actor, 0)
    }

    /// Create a counter whose Lamport clock starts at `clock`.
    pub fn with_clock(actor: A, clock: u64) -> Self {
        Self {
            timestamp: LamportTimestamp::new(clock, actor),
            counts: BTreeMap::new(),
        }
    }

    /// Increment this replica's count by 1.
    pub fn increment(&mut self) {
        self.increment_by(1);
    }

    /// Increment this replica's count by `n`.
    pub fn increment_by(&mut self, n: u64) {
        if n == 0 {
            return;
        }
        self.timestamp.tick();
        let entry = self
            .counts
            .entry(self.timestamp.actor.clone())
            .or_default();
        entry.count = entry.count.saturating_add(n);
        entry.clock = self.timestamp.clock;
    }

    /// Get the total counter value across all replicas.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.counts
            .values()
            .fold(0u64, |sum, entry| sum.saturating_add(entry.count))
    }

    /// Get this replica's actor ID.
    #[must_use]
    pub fn actor(&self) -> &A {
        &self.timestamp.actor
    }

    /// This replica's current Lamport timestamp.
    #[must_use]
    pub fn timestamp(&self) -> &LamportTimestamp<A> {
        &self.timestamp
    }

    /// Get the count for a specific actor.
    #[must_use]
    pub fn count_for(&self, actor: &A) -> u64 {
        self.counts.get(actor).map_or(0, |entry| entry.count)
    }

    /// Fold one actor's entry in, keeping the newer of the two.
    ///
    /// Per actor the higher clock wins; a clock tie keeps the larger
    /// count, which under monotone increments is the same entry.
    fn absorb(&mut self, actor: &A, theirs: CounterEntry) {
        match self.counts.get_mut(actor) {
            Some(ours) => {
                if theirs.clock > ours.clock
                    || (theirs.clock == ours.clock && theirs.count > ours.count)
                {
                    *ours = theirs;
                }
            }
            None => {
                self.counts.insert(actor.clone(), theirs);
            }
        }
    }
}

impl<A: Ord + Clone> Replicable for GCounter<A> {
    fn merge(&mut self, other: &Self) {
        for (actor, &entry) in &other.counts {
            self.absorb(actor, entry);
        }
        if other.timestamp.clock > self.timestamp.clock {
            self.timestamp.clock = other.timestamp.clock;
        }
    }
}

/// Delta for [`GCounter`]: only the per-actor entries the remote summary
/// does not cover.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct GCounterDelta<A: Ord + Clone> {
    counts: BTreeMap<A, CounterEntry>,
}

impl<A: Ord + Clone> DeltaCrdt for GCounter<A> {
    type State = VersionVector<A>;
    type Delta = GCounterDelta<A>;

    fn state(&self) -> VersionVector<A> {
        let mut vv = VersionVector::new();
        for (actor, entry) in &self.counts {
            vv.observe(actor.clone(), entry.clock);
        }
        vv
    }

    fn delta(&self, remote: Option<&VersionVector<A>>) -> Option<GCounterDelta<A>> {
        let counts: BTreeMap<A, CounterEntry> = self
            .counts
            .iter()
            .filter(|(actor, entry)| remote.map_or(true, |vv| !vv.covers(actor, entry.clock)))
            .map(|(actor, &entry)| (actor.clone(), entry))
            .collect();

        if counts.is_empty() {
            None
        } else {
            Some(GCounterDelta { counts })
        }
    }

    fn merge_delta(&mut self, delta: &GCounterDelta<A>) -> Result<(), MergeError> {
        for (actor, &entry) in &delta.counts {
            self.absorb(actor, entry);
            if *actor == self.timestamp.actor && entry.clock > self.timestamp.clock {
                self.timestamp.clock = entry.clock;
            }
        }
        Ok(())
    }
}
