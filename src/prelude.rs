//! Convenient re-exports for common usage.
//!
//! ```
//! use deltakit::prelude::*;
//! ```

pub use crate::DeltaCrdt;
pub use crate::GCounter;
pub use crate::GCounterDelta;
pub use crate::LamportTimestamp;
pub use crate::MergeError;
pub use crate::ORMap;
pub use crate::ORMapDelta;
pub use crate::ORSet;
pub use crate::ORSetDelta;
pub use crate::PNCounter;
pub use crate::PNCounterDelta;
pub use crate::PNCounterState;
pub use crate::Replicable;
pub use crate::VersionVector;
