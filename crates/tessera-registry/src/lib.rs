//! Dataset registry for Tessera simulations.
//!
//! The [`DataRegistry`] is where simulation state objects are registered,
//! looked up and kept consistent through lazy synchronization, and where
//! periodic output consumers ([`Observer`]s) are dispatched each step.
//!
//! Leaf-first:
//! - [`OrderedIndex`] / [`IndexedMapping`]: stable insertion-order
//!   traversal over an unordered map.
//! - [`ManagedDataset`] / [`DatasetTable`]: validity tracking, typed fetch
//!   and lease counting for borrowed payloads.
//! - [`ObserverDirectory`]: observers and their notification frequencies.
//! - [`Initializer`]: the setup / per-dataset init / teardown pass.
//! - [`DataRegistry`]: composes the above.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod dataset;
pub mod init;
pub mod metrics;
pub mod observer;
pub mod ordered;
pub mod policy;
pub mod registry;

pub use config::{RegistryConfig, MAX_CAPACITY};
pub use dataset::{DatasetStatus, DatasetTable, ManagedDataset};
pub use init::Initializer;
pub use metrics::RegistryMetrics;
pub use observer::{Observer, ObserverDirectory, ObserverEntry};
pub use ordered::{IndexedMapping, OrderedIndex};
pub use policy::FailurePolicy;
pub use registry::DataRegistry;
