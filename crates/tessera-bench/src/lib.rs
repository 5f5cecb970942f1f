//! Benchmark workloads for the Tessera data registry.
//!
//! - [`ReferenceField`]: a host/device field pair whose synchronization
//!   copies the device buffer, sized like a 100x100 grid by default.
//! - [`ReductionObserver`]: an output plugin that fetches and sums one
//!   field per notification.
//! - [`reference_fields`]: a batch of fields for populating a registry.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use tessera_core::{DatasetId, HookError, SimulationData, StepId};
use tessera_registry::{DatasetTable, Observer};

/// Cells in the reference 100x100 grid.
pub const REFERENCE_CELLS: usize = 100 * 100;

/// Field payload with a host copy refreshed from a device copy.
#[derive(Clone, Debug)]
pub struct ReferenceField {
    /// Consumer-visible copy.
    pub host: Vec<f32>,
    /// Canonical copy.
    pub device: Vec<f32>,
}

impl ReferenceField {
    /// A field of `cells` cells with the device copy set to `value`.
    pub fn new(cells: usize, value: f32) -> Self {
        Self {
            host: vec![0.0; cells],
            device: vec![value; cells],
        }
    }
}

impl SimulationData for ReferenceField {
    fn synchronize(&mut self) {
        self.host.copy_from_slice(&self.device);
    }
}

/// Build `count` reference fields of [`REFERENCE_CELLS`] cells each.
pub fn reference_fields(count: usize) -> Vec<ReferenceField> {
    (0..count)
        .map(|i| ReferenceField::new(REFERENCE_CELLS, i as f32))
        .collect()
}

/// Sums one field on every notification, like a scalar diagnostic.
#[derive(Debug)]
pub struct ReductionObserver {
    /// Dataset to reduce.
    pub target: DatasetId,
    /// Most recent sum.
    pub last: f32,
}

impl ReductionObserver {
    /// Observe `target`.
    pub fn new(target: DatasetId) -> Self {
        Self { target, last: 0.0 }
    }
}

impl Observer for ReductionObserver {
    fn notify(&mut self, _step: StepId, data: &mut DatasetTable<'_>) -> Result<(), HookError> {
        let field = data
            .fetch::<ReferenceField>(self.target, false)
            .map_err(|e| HookError::new(e.to_string()))?;
        self.last = field.host.iter().sum();
        data.release(self.target)
            .map_err(|e| HookError::new(e.to_string()))
    }
}
