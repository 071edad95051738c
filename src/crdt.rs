use crate::error::MergeError;

/// Core trait that all CRDTs in this crate implement.
///
/// A CRDT (Conflict-free Replicated Data Type) guarantees that concurrent
/// updates on different replicas converge to the same state after merging,
/// without requiring coordination.
///
/// # Properties
///
/// All implementations must satisfy:
/// - **Commutativity:** `a.merge(b) == b.merge(a)` by observable value
/// - **Associativity:** `a.merge(b.merge(c)) == a.merge(b).merge(c)`
/// - **Idempotency:** `a.merge(a) == a`
pub trait Replicable {
    /// Merge another replica's full state into this one.
    ///
    /// After merging, `self` contains the least upper bound of both states.
    /// This operation never fails: when two entries carry an identical
    /// timestamp, the local one is kept.
    fn merge(&mut self, other: &Self);

    /// Merge by value, returning the combined state.
    #[must_use]
    fn merged(mut self, other: &Self) -> Self
    where
        Self: Sized,
    {
        self.merge(other);
        self
    }
}

/// Extension trait for delta-state CRDTs.
///
/// Instead of shipping full state on every exchange, a delta-state CRDT
/// summarizes what a replica has already seen ([`state`](Self::state)) and
/// answers with only the entries that summary does not cover
/// ([`delta`](Self::delta)).
///
/// # Relationship to [`Replicable::merge`]
///
/// For well-formed histories, `a.merge_delta(&b.delta(Some(&a.state())))`
/// is observably equivalent to `a.merge(&b)`. The delta path is stricter,
/// though: where `merge` silently resolves an exact timestamp tie by
/// keeping the local entry, [`merge_delta`](Self::merge_delta) reports
/// [`MergeError::ConflictingHistory`] when tied entries carry different
/// metadata, since no single history can produce two distinct events under
/// one `(clock, actor)` pair.
///
/// # Example
///
/// ```
/// use deltakit::prelude::*;
///
/// let mut c1 = GCounter::new("a");
/// c1.increment();
/// c1.increment();
///
/// let mut c2 = GCounter::new("b");
/// c2.increment();
///
/// // Ask c1 for everything c2 has not seen yet.
/// let delta = c1.delta(Some(&c2.state())).expect("c1 is ahead of c2");
/// c2.merge_delta(&delta).unwrap();
/// assert_eq!(c2.value(), 3);
///
/// // Nothing left to send afterwards.
/// assert!(c1.delta(Some(&c2.state())).is_none());
/// ```
pub trait DeltaCrdt: Replicable {
    /// Compact summary of what this replica has observed, derivable in
    /// time linear in the metadata size.
    type State;

    /// The type of delta produced by this CRDT.
    type Delta;

    /// Summarize the local state for a remote replica.
    fn state(&self) -> Self::State;

    /// Produce the entries `remote` cannot have seen yet.
    ///
    /// `None` as input means "send everything". `None` as output means
    /// there is nothing to send.
    fn delta(&self, remote: Option<&Self::State>) -> Option<Self::Delta>;

    /// Fold a remote delta into the local state.
    ///
    /// Fails with [`MergeError::ConflictingHistory`] when an incoming
    /// entry's timestamp equals a local entry's timestamp but their
    /// metadata differs; in that case nothing is applied.
    fn merge_delta(&mut self, delta: &Self::Delta) -> Result<(), MergeError>;
}
