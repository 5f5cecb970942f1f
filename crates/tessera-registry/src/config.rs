//! Registry configuration and validation.
//!
//! [`RegistryConfig`] is the construction input for a
//! [`DataRegistry`](crate::DataRegistry). [`validate()`](RegistryConfig::validate)
//! is run by [`DataRegistry::with_config`](crate::DataRegistry::with_config).

use tessera_core::ConfigError;

use crate::policy::FailurePolicy;

/// Upper bound on the pre-allocation hints.
pub const MAX_CAPACITY: usize = 1 << 20;

/// Construction-time settings for a registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Reaction to failing observer and initializer hooks. Default: `Abort`.
    pub failure_policy: FailurePolicy,
    /// Number of datasets to pre-allocate room for. Default: 16.
    pub dataset_capacity: usize,
    /// Number of observers to pre-allocate room for. Default: 8.
    pub observer_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::Abort,
            dataset_capacity: 16,
            observer_capacity: 8,
        }
    }
}

impl RegistryConfig {
    /// Check the capacity hints against [`MAX_CAPACITY`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (which, configured) in [
            ("dataset", self.dataset_capacity),
            ("observer", self.observer_capacity),
        ] {
            if configured > MAX_CAPACITY {
                return Err(ConfigError::CapacityTooLarge {
                    which,
                    configured,
                    max: MAX_CAPACITY,
                });
            }
        }
        Ok(())
    }
}
