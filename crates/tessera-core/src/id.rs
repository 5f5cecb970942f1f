//! Strongly-typed identifiers for datasets, observers and steps.

use std::fmt;
use std::num::NonZeroU32;

/// Identifies a dataset registered with the registry.
///
/// Assigned by the caller at registration; the registry never generates
/// dataset ids. Stable for the lifetime of the registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DatasetId(pub u32);

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for DatasetId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a registered observer.
///
/// Handed out sequentially by the observer directory. Observers are
/// borrowed trait objects without a usable identity of their own, so
/// this id stands in for one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(pub u32);

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonically increasing simulation step counter.
///
/// Drives observer notification gating and initialization passes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepId(pub u64);

impl StepId {
    /// Whether an observer with the given notification frequency fires
    /// at this step (`step mod frequency == 0`).
    ///
    /// Step zero fires for every frequency.
    pub fn fires_every(self, frequency: NonZeroU32) -> bool {
        self.0 % u64::from(frequency.get()) == 0
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for StepId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}
