use crate::error::MergeError;
use crate::gcounter::{GCounter, GCounterDelta};
use crate::version::VersionVector;
use crate::{DeltaCrdt, Replicable};

/// A positive-negative counter (PN-Counter).
///
/// Supports both increment and decrement operations by maintaining two
/// internal G-Counters: one for increments and one for decrements.
/// The value is `increments - decrements`.
///
/// # Example
///
/// ```
/// use deltakit::prelude::*;
///
/// let mut c1 = PNCounter::new("node-1");
/// c1.increment();
/// c1.increment();
/// c1.decrement();
/// assert_eq!(c1.value(), 1);
///
/// let mut c2 = PNCounter::new("node-2");
/// c2.decrement();
///
/// c1.merge(&c2);
/// assert_eq!(c1.value(), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PNCounter<A: Ord + Clone> {
    increments: GCounter<A>,
    decrements: GCounter<A>,
}

impl<A: Ord + Clone> PNCounter<A> {
    /// Create a new PN-Counter for the given actor/replica ID.
    pub fn new(actor: A) -> Self {
        Self {
            increments: GCounter::new(actor.clone()),
            decrements: GCounter::new(actor),
        }
    }

    /// Create a counter that starts at `value`.
    pub fn with_value(value: i64, actor: A) -> Self {
        let mut counter = Self::new(actor);
        if value >= 0 {
            counter.increments.increment_by(value as u64);
        } else {
            counter.decrements.increment_by(value.unsigned_abs());
        }
        counter
    }

    /// Increment the counter by 1.
    pub fn increment(&mut self) {
        self.increments.increment();
    }

    /// Decrement the counter by 1.
    pub fn decrement(&mut self) {
        self.decrements.increment();
    }

    /// Get the current counter value (increments - decrements).
    ///
    /// Each component total is clamped to `i64::MAX` before a saturating
    /// subtraction, so the result stays within `i64::MIN..=i64::MAX` and
    /// never wraps. A counter pushed past either bound sticks there.
    #[must_use]
    pub fn value(&self) -> i64 {
        let pos = i64::try_from(self.increments.value()).unwrap_or(i64::MAX);
        let neg = i64::try_from(self.decrements.value()).unwrap_or(i64::MAX);
        pos.saturating_sub(neg)
    }

    /// Get this replica's actor ID.
    #[must_use]
    pub fn actor(&self) -> &A {
        self.increments.actor()
    }
}

impl<A: Ord + Clone> Replicable for PNCounter<A> {
    fn merge(&mut self, other: &Self) {
        self.increments.merge(&other.increments);
        self.decrements.merge(&other.decrements);
    }
}

/// Summary state for [`PNCounter`]: one version vector per component.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PNCounterState<A: Ord> {
    increments: VersionVector<A>,
    decrements: VersionVector<A>,
}

/// Delta for [`PNCounter`]: deltas for both components, either of which
/// may be absent when that side has nothing to send.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PNCounterDelta<A: Ord + Clone> {
    increments: Option<GCounterDelta<A>>,
    decrements: Option<GCounterDelta<A>>,
}

impl<A: Ord + Clone> DeltaCrdt for PNCounter<A> {
    type State = PNCounterState<A>;
    type Delta = PNCounterDelta<A>;

    fn state(&self) -> PNCounterState<A> {
        PNCounterState {
            increments: self.increments.state(),
            decrements: self.decrements.state(),
        }
    }

    fn delta(&self, remote: Option<&PNCounterState<A>>) -> Option<PNCounterDelta<A>> {
        let delta = PNCounterDelta {
            increments: self.increments.delta(remote.map(|s| &s.increments)),
            decrements: self.decrements.delta(remote.map(|s| &s.decrements)),
        };
        if delta.increments.is_none() && delta.decrements.is_none() {
            None
        } else {
            Some(delta)
        }
    }

    fn merge_delta(&mut self, delta: &PNCounterDelta<A>) -> Result<(), MergeError> {
        if let Some(increments) = &delta.increments {
            self.increments.merge_delta(increments)?;
        }
        if let Some(decrements) = &delta.decrements {
            self.decrements.merge_delta(decrements)?;
        }
        Ok(())
    }
}
