//! Managed datasets and the table that owns them.
//!
//! A [`ManagedDataset`] wraps a borrowed payload with a validity flag and
//! a lease count. [`DatasetTable`] owns every wrapper, keyed by
//! [`DatasetId`] and traversed in registration order. Observers receive
//! the table during dispatch so they can fetch the data they report on.

use std::any::type_name;
use std::fmt;
use std::ops::ControlFlow;

use indexmap::IndexMap;
use tracing::{debug, trace, warn};

use tessera_core::{DatasetId, RegistryError, SimulationData};

use crate::metrics::DatasetCounters;
use crate::ordered::IndexedMapping;

/// Whether a dataset's payload is known to be synchronized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DatasetStatus {
    /// Synchronized since the last invalidation.
    Valid,
    /// Must be synchronized before the next read.
    AutoInvalid,
}

impl fmt::Display for DatasetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => write!(f, "valid"),
            Self::AutoInvalid => write!(f, "auto-invalid"),
        }
    }
}

/// One registered payload and its synchronization state.
///
/// Transitions:
/// - `AutoInvalid --synchronize--> Valid`
/// - `Valid --invalidate--> AutoInvalid`
/// - `AutoInvalid --invalidate--> AutoInvalid`
pub struct ManagedDataset<'a> {
    data: &'a mut dyn SimulationData,
    status: DatasetStatus,
    leases: u32,
}

impl<'a> ManagedDataset<'a> {
    /// Wrap a payload. New datasets always start `AutoInvalid`.
    pub fn new(data: &'a mut dyn SimulationData) -> Self {
        Self {
            data,
            status: DatasetStatus::AutoInvalid,
            leases: 0,
        }
    }

    /// Current synchronization status.
    pub fn status(&self) -> DatasetStatus {
        self.status
    }

    /// Outstanding leases taken by fetches and not yet released.
    pub fn leases(&self) -> u32 {
        self.leases
    }

    /// Shared access to the payload.
    pub fn data(&self) -> &dyn SimulationData {
        &*self.data
    }

    /// Exclusive access to the payload, without synchronizing.
    pub fn data_mut(&mut self) -> &mut dyn SimulationData {
        &mut *self.data
    }

    /// Synchronize the payload if it is not already valid.
    ///
    /// Returns `true` if the payload's `synchronize` was invoked.
    pub fn synchronize(&mut self) -> bool {
        match self.status {
            DatasetStatus::Valid => false,
            DatasetStatus::AutoInvalid => {
                self.data.synchronize();
                self.status = DatasetStatus::Valid;
                true
            }
        }
    }

    /// Mark the payload stale. Returns `true` if it was `Valid`.
    pub fn invalidate(&mut self) -> bool {
        let was_valid = self.status == DatasetStatus::Valid;
        self.status = DatasetStatus::AutoInvalid;
        was_valid
    }

    fn acquire(&mut self) {
        self.leases = self.leases.saturating_add(1);
    }

    /// Returns `false` if there was no lease to release.
    fn release(&mut self) -> bool {
        match self.leases.checked_sub(1) {
            Some(n) => {
                self.leases = n;
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for ManagedDataset<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedDataset")
            .field("payload", &self.data().type_name())
            .field("status", &self.status)
            .field("leases", &self.leases)
            .finish()
    }
}

/// Every registered dataset, keyed by id, in registration order.
#[derive(Debug, Default)]
pub struct DatasetTable<'a> {
    datasets: IndexedMapping<DatasetId, ManagedDataset<'a>>,
    counters: DatasetCounters,
}

impl<'a> DatasetTable<'a> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty table with room for `capacity` datasets.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            datasets: IndexedMapping::with_capacity(capacity),
            counters: DatasetCounters::default(),
        }
    }

    /// Register `data` under `id` in `AutoInvalid` state.
    ///
    /// No synchronization happens at registration. Fails with
    /// [`RegistryError::DuplicateId`] if `id` is taken; the existing
    /// dataset is untouched.
    pub fn register(
        &mut self,
        id: DatasetId,
        data: &'a mut dyn SimulationData,
    ) -> Result<(), RegistryError> {
        let dataset = ManagedDataset::new(data);
        let payload = dataset.data().type_name();
        self.datasets
            .insert(id, dataset)
            .map_err(|_| RegistryError::DuplicateId { id })?;
        debug!(dataset = %id, payload, "registered dataset");
        Ok(())
    }

    /// Whether a dataset is registered under `id`.
    pub fn contains(&self, id: DatasetId) -> bool {
        self.datasets.contains(&id)
    }

    /// The dataset registered under `id`.
    pub fn get(&self, id: DatasetId) -> Result<&ManagedDataset<'a>, RegistryError> {
        self.datasets
            .get(&id)
            .ok_or(RegistryError::UnknownId { id })
    }

    /// Synchronization status of the dataset under `id`.
    pub fn status(&self, id: DatasetId) -> Result<DatasetStatus, RegistryError> {
        self.get(id).map(ManagedDataset::status)
    }

    /// Outstanding leases on the dataset under `id`.
    pub fn outstanding_leases(&self, id: DatasetId) -> Result<u32, RegistryError> {
        self.get(id).map(ManagedDataset::leases)
    }

    /// Fetch the payload under `id` as `T`, synchronizing it first unless
    /// `no_sync` is set.
    ///
    /// The type is checked before anything else happens, so a
    /// [`RegistryError::TypeMismatch`] leaves status, lease count and
    /// payload untouched. Each successful fetch takes one lease, to be
    /// returned with [`release`](Self::release).
    pub fn fetch<T: SimulationData>(
        &mut self,
        id: DatasetId,
        no_sync: bool,
    ) -> Result<&mut T, RegistryError> {
        let dataset = self
            .datasets
            .get_mut(&id)
            .ok_or(RegistryError::UnknownId { id })?;

        let mismatch = |actual| RegistryError::TypeMismatch {
            id,
            expected: type_name::<T>(),
            actual,
        };
        let payload = dataset.data();
        if !payload.as_any().is::<T>() {
            return Err(mismatch(payload.type_name()));
        }

        if !no_sync {
            if dataset.synchronize() {
                trace!(dataset = %id, "synchronized dataset");
                self.counters.synchronizations += 1;
            } else {
                self.counters.skipped_synchronizations += 1;
            }
        }
        dataset.acquire();
        self.counters.fetches += 1;

        let actual = dataset.data().type_name();
        dataset
            .data_mut()
            .as_any_mut()
            .downcast_mut::<T>()
            .ok_or_else(|| mismatch(actual))
    }

    /// Return one lease taken by [`fetch`](Self::fetch).
    ///
    /// Never fails for a registered id: releasing without an outstanding
    /// lease leaves the count at zero and is only logged.
    pub fn release(&mut self, id: DatasetId) -> Result<(), RegistryError> {
        let dataset = self
            .datasets
            .get_mut(&id)
            .ok_or(RegistryError::UnknownId { id })?;
        if !dataset.release() {
            warn!(dataset = %id, "release without outstanding lease");
            self.counters.unbalanced_releases += 1;
        }
        Ok(())
    }

    /// Mark the dataset under `id` as `AutoInvalid`.
    pub fn invalidate(&mut self, id: DatasetId) -> Result<(), RegistryError> {
        let dataset = self
            .datasets
            .get_mut(&id)
            .ok_or(RegistryError::UnknownId { id })?;
        if dataset.invalidate() {
            self.counters.invalidations += 1;
        }
        Ok(())
    }

    /// Mark every dataset as `AutoInvalid`, whatever its current status.
    ///
    /// Payloads are not touched.
    pub fn invalidate_all(&mut self) {
        let mut invalidated = 0;
        for dataset in self.datasets.values_mut() {
            if dataset.invalidate() {
                invalidated += 1;
            }
        }
        self.counters.invalidations += invalidated;
        trace!(invalidated, "invalidated all datasets");
    }

    /// Registered ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = DatasetId> + use<'_, 'a> {
        self.datasets.keys()
    }

    /// Status of every dataset, in registration order.
    pub fn status_report(&self) -> IndexMap<DatasetId, DatasetStatus> {
        self.datasets
            .iter()
            .map(|(id, dataset)| (id, dataset.status()))
            .collect()
    }

    /// Number of registered datasets.
    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    /// Whether no dataset is registered.
    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    /// Visit every payload in registration order without synchronizing.
    ///
    /// Each visited dataset is left `AutoInvalid`: the visitor may have
    /// rewritten its canonical state.
    pub(crate) fn for_each_payload_mut<B>(
        &mut self,
        mut f: impl FnMut(DatasetId, &mut dyn SimulationData) -> ControlFlow<B>,
    ) -> ControlFlow<B> {
        let counters = &mut self.counters;
        self.datasets.for_each_mut(|id, dataset| {
            let flow = f(id, dataset.data_mut());
            if dataset.invalidate() {
                counters.invalidations += 1;
            }
            flow
        })
    }

    pub(crate) fn counters(&self) -> DatasetCounters {
        self.counters
    }

    /// Drop every dataset wrapper and zero the counters.
    pub(crate) fn clear(&mut self) {
        self.datasets.clear();
        self.counters = DatasetCounters::default();
    }
}
