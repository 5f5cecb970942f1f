//! Cumulative counters for registry activity.
//!
//! [`RegistryMetrics`] is a by-value snapshot assembled from the counters
//! kept by the dataset table, the observer directory and the registry
//! itself.

/// Cumulative registry counters since construction or the last reset.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegistryMetrics {
    /// Successful `fetch` calls.
    pub fetches: u64,
    /// Payload synchronizations actually performed.
    pub synchronizations: u64,
    /// Synchronizing fetches that found the dataset already valid.
    pub skipped_synchronizations: u64,
    /// Datasets moved from `Valid` to `AutoInvalid`.
    pub invalidations: u64,
    /// `notify` calls issued to observers.
    pub notifications: u64,
    /// Observer visits skipped because the step did not match the frequency.
    pub gated_notifications: u64,
    /// `dispatch_notifications` calls.
    pub dispatch_passes: u64,
    /// `run_initialization_pass` calls.
    pub initialization_passes: u64,
    /// Observer and initializer hook failures.
    pub hook_failures: u64,
    /// `release` calls on a dataset with no outstanding lease.
    pub unbalanced_releases: u64,
}

/// Counters owned by the dataset table.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct DatasetCounters {
    pub fetches: u64,
    pub synchronizations: u64,
    pub skipped_synchronizations: u64,
    pub invalidations: u64,
    pub unbalanced_releases: u64,
}

/// Counters owned by the observer directory.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct DispatchCounters {
    pub notifications: u64,
    pub gated_notifications: u64,
    pub dispatch_passes: u64,
}

impl RegistryMetrics {
    pub(crate) fn collect(
        datasets: DatasetCounters,
        dispatch: DispatchCounters,
        initialization_passes: u64,
        hook_failures: u64,
    ) -> Self {
        Self {
            fetches: datasets.fetches,
            synchronizations: datasets.synchronizations,
            skipped_synchronizations: datasets.skipped_synchronizations,
            invalidations: datasets.invalidations,
            notifications: dispatch.notifications,
            gated_notifications: dispatch.gated_notifications,
            dispatch_passes: dispatch.dispatch_passes,
            initialization_passes,
            hook_failures,
            unbalanced_releases: datasets.unbalanced_releases,
        }
    }
}
