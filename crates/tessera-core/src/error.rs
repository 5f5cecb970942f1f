//! Error types for the Tessera data registry.
//!
//! Organized by surface: registry lookups ([`RegistryError`]), external
//! hook execution ([`HookError`], [`PassError`]) and configuration
//! ([`ConfigError`]).

use std::error::Error;
use std::fmt;

use smallvec::SmallVec;

use crate::id::{DatasetId, ObserverId, StepId};

/// Errors from dataset registration and lookup.
///
/// Every operation returning this error leaves the registry unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// A dataset with this id is already registered.
    DuplicateId {
        /// The contested id.
        id: DatasetId,
    },
    /// No dataset with this id has been registered.
    UnknownId {
        /// The id that was looked up.
        id: DatasetId,
    },
    /// The dataset's payload is not of the requested type.
    TypeMismatch {
        /// The dataset that was fetched.
        id: DatasetId,
        /// Type requested by the caller.
        expected: &'static str,
        /// Type actually registered under `id`.
        actual: &'static str,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateId { id } => write!(f, "dataset id already exists ({id})"),
            Self::UnknownId { id } => write!(f, "invalid dataset id ({id})"),
            Self::TypeMismatch {
                id,
                expected,
                actual,
            } => write!(f, "dataset {id} holds {actual}, requested as {expected}"),
        }
    }
}

impl Error for RegistryError {}

/// Failure reported by an observer or initializer hook.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HookError {
    /// Human-readable description of the failure.
    pub reason: String,
}

impl HookError {
    /// Build a hook error from any displayable reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for HookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reason)
    }
}

impl Error for HookError {}

/// Which external hook failed during a dispatch or initialization pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookSite {
    /// `Observer::notify` during notification dispatch.
    Notify {
        /// The failing observer.
        observer: ObserverId,
        /// Step being dispatched.
        step: StepId,
    },
    /// `Initializer::setup`.
    Setup,
    /// `Initializer::init` for one dataset.
    Init {
        /// Dataset being initialized.
        dataset: DatasetId,
        /// Effective step returned by `setup`.
        step: StepId,
    },
    /// `Initializer::teardown`.
    Teardown,
}

impl fmt::Display for HookSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Notify { observer, step } => {
                write!(f, "notify(observer {observer}, step {step})")
            }
            Self::Setup => write!(f, "setup"),
            Self::Init { dataset, step } => write!(f, "init(dataset {dataset}, step {step})"),
            Self::Teardown => write!(f, "teardown"),
        }
    }
}

/// A hook failure tagged with where it happened.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HookFailure {
    /// The hook that failed.
    pub site: HookSite,
    /// The error it returned.
    pub error: HookError,
}

impl fmt::Display for HookFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.site, self.error)
    }
}

/// Failures collected over one pass. Passes rarely see more than a few.
pub type HookFailures = SmallVec<[HookFailure; 4]>;

/// Errors from a notification dispatch or initialization pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PassError {
    /// The pass stopped at the first failing hook.
    Aborted(HookFailure),
    /// The pass ran to completion but one or more hooks failed.
    Failed(HookFailures),
}

impl PassError {
    /// All failures carried by this error, in the order they occurred.
    pub fn failures(&self) -> &[HookFailure] {
        match self {
            Self::Aborted(failure) => std::slice::from_ref(failure),
            Self::Failed(failures) => failures.as_slice(),
        }
    }
}

impl fmt::Display for PassError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aborted(failure) => write!(f, "pass aborted: {failure}"),
            Self::Failed(failures) => {
                write!(f, "{} hook(s) failed: ", failures.len())?;
                for (i, failure) in failures.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{failure}")?;
                }
                Ok(())
            }
        }
    }
}

impl Error for PassError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Aborted(failure) => Some(&failure.error),
            Self::Failed(_) => None,
        }
    }
}

/// Errors detected while validating a registry configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A pre-allocation hint exceeds the supported maximum.
    CapacityTooLarge {
        /// Which capacity was out of range.
        which: &'static str,
        /// The configured value.
        configured: usize,
        /// The largest accepted value.
        max: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityTooLarge {
                which,
                configured,
                max,
            } => write!(f, "{which} capacity {configured} exceeds maximum {max}"),
        }
    }
}

impl Error for ConfigError {}
