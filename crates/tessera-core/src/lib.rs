//! Core types and traits for the Tessera data registry.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the identifiers, the payload capability ([`SimulationData`]) and the
//! error types shared by the registry and its collaborators.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod traits;

pub use error::{
    ConfigError, HookError, HookFailure, HookFailures, HookSite, PassError, RegistryError,
};
pub use id::{DatasetId, ObserverId, StepId};
pub use traits::{AsAny, SimulationData};
