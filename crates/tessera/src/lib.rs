//! Tessera: the data-orchestration registry of a simulation framework.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the Tessera sub-crates. For most users, adding `tessera` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use tessera::prelude::*;
//!
//! struct Temperature {
//!     host: Vec<f32>,
//!     device: Vec<f32>,
//! }
//!
//! impl SimulationData for Temperature {
//!     fn synchronize(&mut self) {
//!         self.host.copy_from_slice(&self.device);
//!     }
//! }
//!
//! struct MaxProbe(f32);
//!
//! impl Observer for MaxProbe {
//!     fn notify(&mut self, _step: StepId, data: &mut DatasetTable<'_>) -> Result<(), HookError> {
//!         let t = data
//!             .fetch::<Temperature>(DatasetId(0), false)
//!             .map_err(|e| HookError::new(e.to_string()))?;
//!         self.0 = t.host.iter().copied().fold(f32::MIN, f32::max);
//!         data.release(DatasetId(0)).map_err(|e| HookError::new(e.to_string()))
//!     }
//! }
//!
//! let mut temperature = Temperature { host: vec![0.0; 3], device: vec![1.0, 5.0, 2.0] };
//! let mut probe = MaxProbe(0.0);
//! {
//!     let mut registry = DataRegistry::new();
//!     registry.register_dataset(DatasetId(0), &mut temperature).unwrap();
//!     registry.register_observer(&mut probe, 10);
//!     for step in 0..=20 {
//!         registry.dispatch_notifications(StepId(step)).unwrap();
//!         registry.invalidate_all();
//!     }
//! }
//! assert_eq!(probe.0, 5.0);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `tessera-core` | Ids, the `SimulationData` trait, error types |
//! | [`registry`] | `tessera-registry` | `DataRegistry`, datasets, observers, initializers |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core ids, payload trait and errors (`tessera-core`).
pub use tessera_core as types;

/// Registry, dataset table, observer directory and initialization
/// passes (`tessera-registry`).
pub use tessera_registry as registry;

/// Common imports for typical Tessera usage.
///
/// ```rust
/// use tessera::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use tessera_core::{DatasetId, ObserverId, SimulationData, StepId};

    // Errors
    pub use tessera_core::{HookError, PassError, RegistryError};

    // Registry
    pub use tessera_registry::{
        DataRegistry, DatasetStatus, DatasetTable, FailurePolicy, Initializer, Observer,
        RegistryConfig, RegistryMetrics,
    };
}
