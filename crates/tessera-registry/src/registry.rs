//! The [`DataRegistry`]: one explicit object in place of a process-wide
//! singleton.
//!
//! Composes a [`DatasetTable`] and an [`ObserverDirectory`] and drives
//! the step-level protocols over them: lazy synchronization on fetch,
//! frequency-gated observer dispatch and batch initialization. Every
//! call is synchronous and runs on the caller's thread; there is no
//! internal locking.

use std::num::NonZeroU32;

use indexmap::IndexMap;
use tracing::debug;

use tessera_core::{
    ConfigError, DatasetId, ObserverId, PassError, RegistryError, SimulationData, StepId,
};

use crate::config::RegistryConfig;
use crate::dataset::{DatasetStatus, DatasetTable};
use crate::init::{run_pass, Initializer};
use crate::metrics::RegistryMetrics;
use crate::observer::{Observer, ObserverDirectory};

/// Registry of simulation datasets and their observers.
///
/// Datasets and observers are borrowed for `'a`; the registry owns only
/// the wrappers around them and drops those when it is dropped or
/// [`reset`](Self::reset).
///
/// # Examples
///
/// ```
/// use tessera_core::{DatasetId, SimulationData, StepId};
/// use tessera_registry::{DataRegistry, DatasetStatus};
///
/// struct Density {
///     synced: bool,
/// }
///
/// impl SimulationData for Density {
///     fn synchronize(&mut self) {
///         self.synced = true;
///     }
/// }
///
/// let mut density = Density { synced: false };
/// let mut registry = DataRegistry::new();
/// registry.register_dataset(DatasetId(0), &mut density).unwrap();
/// assert_eq!(registry.status(DatasetId(0)), Ok(DatasetStatus::AutoInvalid));
///
/// let d = registry.fetch::<Density>(DatasetId(0), false).unwrap();
/// assert!(d.synced);
/// registry.release(DatasetId(0)).unwrap();
///
/// registry.invalidate_all();
/// registry.dispatch_notifications(StepId(1)).unwrap();
/// ```
#[derive(Debug)]
pub struct DataRegistry<'a> {
    config: RegistryConfig,
    datasets: DatasetTable<'a>,
    observers: ObserverDirectory<'a>,
    initialization_passes: u64,
    hook_failures: u64,
}

impl<'a> DataRegistry<'a> {
    /// Create an empty registry with the default configuration.
    pub fn new() -> Self {
        Self::build(RegistryConfig::default())
    }

    /// Create an empty registry after validating `config`.
    pub fn with_config(config: RegistryConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: RegistryConfig) -> Self {
        Self {
            datasets: DatasetTable::with_capacity(config.dataset_capacity),
            observers: ObserverDirectory::with_capacity(config.observer_capacity),
            config,
            initialization_passes: 0,
            hook_failures: 0,
        }
    }

    /// The configuration this registry was built with.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // ── Datasets ───────────────────────────────────────────────────

    /// Register `data` under the caller-chosen `id`.
    ///
    /// The dataset starts `AutoInvalid`; nothing is synchronized here.
    /// Fails with [`RegistryError::DuplicateId`] if `id` is taken.
    pub fn register_dataset(
        &mut self,
        id: DatasetId,
        data: &'a mut dyn SimulationData,
    ) -> Result<(), RegistryError> {
        self.datasets.register(id, data)
    }

    /// Whether a dataset is registered under `id`.
    pub fn has_dataset(&self, id: DatasetId) -> bool {
        self.datasets.contains(id)
    }

    /// Synchronization status of the dataset under `id`.
    pub fn status(&self, id: DatasetId) -> Result<DatasetStatus, RegistryError> {
        self.datasets.status(id)
    }

    /// Mark every dataset `AutoInvalid`.
    pub fn invalidate_all(&mut self) {
        self.datasets.invalidate_all();
    }

    /// Mark one dataset `AutoInvalid`.
    pub fn invalidate(&mut self, id: DatasetId) -> Result<(), RegistryError> {
        self.datasets.invalidate(id)
    }

    /// Fetch the payload under `id` as `T`.
    ///
    /// Unless `no_sync` is set the payload is synchronized first if it is
    /// `AutoInvalid`, leaving the dataset `Valid`. Fails with
    /// [`RegistryError::UnknownId`] or [`RegistryError::TypeMismatch`]
    /// without changing anything. Pair every successful fetch with a
    /// [`release`](Self::release).
    pub fn fetch<T: SimulationData>(
        &mut self,
        id: DatasetId,
        no_sync: bool,
    ) -> Result<&mut T, RegistryError> {
        self.datasets.fetch(id, no_sync)
    }

    /// Return the lease taken by a [`fetch`](Self::fetch).
    pub fn release(&mut self, id: DatasetId) -> Result<(), RegistryError> {
        self.datasets.release(id)
    }

    /// Leases on `id` not yet released.
    pub fn outstanding_leases(&self, id: DatasetId) -> Result<u32, RegistryError> {
        self.datasets.outstanding_leases(id)
    }

    /// Registered dataset ids in registration order.
    pub fn dataset_ids(&self) -> impl Iterator<Item = DatasetId> + use<'_, 'a> {
        self.datasets.ids()
    }

    /// Status of every dataset in registration order.
    pub fn status_report(&self) -> IndexMap<DatasetId, DatasetStatus> {
        self.datasets.status_report()
    }

    /// Number of registered datasets.
    pub fn dataset_count(&self) -> usize {
        self.datasets.len()
    }

    /// The dataset table, as handed to observers.
    pub fn datasets(&self) -> &DatasetTable<'a> {
        &self.datasets
    }

    /// Exclusive access to the dataset table.
    pub fn datasets_mut(&mut self) -> &mut DatasetTable<'a> {
        &mut self.datasets
    }

    // ── Observers ──────────────────────────────────────────────────

    /// Register `observer` to be notified every `frequency` steps.
    ///
    /// Returns `None`, storing nothing, when `frequency` is zero.
    pub fn register_observer(
        &mut self,
        observer: &'a mut dyn Observer,
        frequency: u32,
    ) -> Option<ObserverId> {
        self.observers.register(observer, frequency)
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Notification frequency of a registered observer.
    pub fn observer_frequency(&self, id: ObserverId) -> Option<NonZeroU32> {
        self.observers.frequency(id)
    }

    /// Registered observer ids in registration order.
    pub fn observer_ids(&self) -> impl Iterator<Item = ObserverId> + use<'_, 'a> {
        self.observers.ids()
    }

    /// Notify, in registration order, every observer whose frequency
    /// divides `step`.
    ///
    /// Observer failures follow the configured
    /// [`FailurePolicy`](crate::FailurePolicy).
    pub fn dispatch_notifications(&mut self, step: StepId) -> Result<(), PassError> {
        let result = self
            .observers
            .dispatch(step, &mut self.datasets, self.config.failure_policy);
        self.record(&result);
        result
    }

    // ── Initialization ─────────────────────────────────────────────

    /// Run `initializer` over every dataset in registration order.
    ///
    /// `step` is only the caller's notion of the current step; every
    /// `init` receives the step returned by `setup`, which is also
    /// returned on success. Hook failures follow the configured
    /// [`FailurePolicy`](crate::FailurePolicy).
    pub fn run_initialization_pass(
        &mut self,
        initializer: &mut dyn Initializer,
        step: StepId,
    ) -> Result<StepId, PassError> {
        self.initialization_passes += 1;
        let result = run_pass(
            initializer,
            step,
            &mut self.datasets,
            self.config.failure_policy,
        );
        self.record(&result);
        result
    }

    fn record<T>(&mut self, result: &Result<T, PassError>) {
        if let Err(err) = result {
            self.hook_failures += err.failures().len() as u64;
        }
    }

    // ── Lifecycle ──────────────────────────────────────────────────

    /// Cumulative counters since construction or the last reset.
    pub fn metrics(&self) -> RegistryMetrics {
        RegistryMetrics::collect(
            self.datasets.counters(),
            self.observers.counters(),
            self.initialization_passes,
            self.hook_failures,
        )
    }

    /// Drop every dataset and observer wrapper and zero all counters,
    /// keeping the configuration.
    pub fn reset(&mut self) {
        debug!(
            datasets = self.datasets.len(),
            observers = self.observers.len(),
            "resetting registry"
        );
        self.datasets.clear();
        self.observers.clear();
        self.initialization_passes = 0;
        self.hook_failures = 0;
    }
}

impl Default for DataRegistry<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::FailurePolicy;
    use crate::MAX_CAPACITY;
    use tessera_core::HookError;

    struct Grid(u32);

    impl SimulationData for Grid {
        fn synchronize(&mut self) {
            self.0 += 1;
        }
    }

    struct Broken;

    impl Observer for Broken {
        fn notify(&mut self, _: StepId, _: &mut DatasetTable<'_>) -> Result<(), HookError> {
            Err(HookError::new("broken"))
        }
    }

    /// Reads a dataset through the table it is handed.
    struct Probe {
        seen: Vec<u32>,
    }

    impl Observer for Probe {
        fn notify(&mut self, _: StepId, data: &mut DatasetTable<'_>) -> Result<(), HookError> {
            let grid = data
                .fetch::<Grid>(DatasetId(0), false)
                .map_err(|e| HookError::new(e.to_string()))?;
            self.seen.push(grid.0);
            data.release(DatasetId(0))
                .map_err(|e| HookError::new(e.to_string()))
        }
    }

    #[test]
    fn with_config_rejects_invalid() {
        let cfg = RegistryConfig {
            dataset_capacity: MAX_CAPACITY + 1,
            ..Default::default()
        };
        assert!(matches!(
            DataRegistry::with_config(cfg),
            Err(ConfigError::CapacityTooLarge { which: "dataset", .. })
        ));
    }

    #[test]
    fn observers_can_fetch_through_the_table() {
        let mut grid = Grid(0);
        let mut probe = Probe { seen: Vec::new() };
        {
            let mut registry = DataRegistry::new();
            registry.register_dataset(DatasetId(0), &mut grid).unwrap();
            registry.register_observer(&mut probe, 1);
            registry.dispatch_notifications(StepId(1)).unwrap();
            registry.dispatch_notifications(StepId(2)).unwrap();
            registry.invalidate_all();
            registry.dispatch_notifications(StepId(3)).unwrap();
            assert_eq!(registry.outstanding_leases(DatasetId(0)), Ok(0));
            let m = registry.metrics();
            assert_eq!(m.synchronizations, 2);
            assert_eq!(m.skipped_synchronizations, 1);
            assert_eq!(m.notifications, 3);
        }
        assert_eq!(probe.seen, vec![1, 1, 2]);
    }

    #[test]
    fn table_accessors_share_state_with_the_registry() {
        let mut grid = Grid(0);
        {
            let mut registry = DataRegistry::new();
            registry.register_dataset(DatasetId(4), &mut grid).unwrap();
            assert_eq!(registry.datasets().ids().collect::<Vec<_>>(), vec![DatasetId(4)]);
            assert_eq!(registry.datasets().len(), registry.dataset_count());

            let table = registry.datasets_mut();
            assert_eq!(table.fetch::<Grid>(DatasetId(4), false).unwrap().0, 1);
            table.release(DatasetId(4)).unwrap();

            assert_eq!(registry.status(DatasetId(4)), Ok(DatasetStatus::Valid));
            assert_eq!(registry.metrics().fetches, 1);
        }
        assert_eq!(grid.0, 1);
    }

    #[test]
    fn hook_failures_are_counted() {
        let mut broken = Broken;
        let mut registry = DataRegistry::with_config(RegistryConfig {
            failure_policy: FailurePolicy::Continue,
            ..Default::default()
        })
        .unwrap();
        registry.register_observer(&mut broken, 2);
        assert!(registry.dispatch_notifications(StepId(2)).is_err());
        assert!(registry.dispatch_notifications(StepId(3)).is_ok());
        assert_eq!(registry.metrics().hook_failures, 1);
        assert_eq!(registry.metrics().dispatch_passes, 2);
    }

    #[test]
    fn reset_forgets_everything_but_config() {
        let mut grid = Grid(0);
        let mut broken = Broken;
        let mut registry = DataRegistry::with_config(RegistryConfig {
            failure_policy: FailurePolicy::Continue,
            ..Default::default()
        })
        .unwrap();
        registry.register_dataset(DatasetId(1), &mut grid).unwrap();
        registry.register_observer(&mut broken, 1);
        let _ = registry.dispatch_notifications(StepId(0));
        registry.reset();
        assert_eq!(registry.dataset_count(), 0);
        assert_eq!(registry.observer_count(), 0);
        assert!(!registry.has_dataset(DatasetId(1)));
        assert_eq!(registry.metrics(), RegistryMetrics::default());
        assert_eq!(registry.config().failure_policy, FailurePolicy::Continue);
    }
}
