/// Errors surfaced while folding remote deltas into local state.
///
/// Full-state [`merge`](crate::Replicable::merge) never fails: ties are
/// resolved deterministically by timestamp selection. Delta application is
/// stricter, because a delta that disagrees with local metadata under an
/// identical timestamp cannot have come from a well-formed history.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    /// Two replicas produced distinct events under the same
    /// `(clock, actor)` pair, typically because of a duplicated actor id.
    ///
    /// The merge is abandoned without applying any of the delta; the
    /// offending replica should be investigated rather than retried.
    #[error("conflicting history: {0}")]
    ConflictingHistory(String),
}
