//! Observer registration and frequency-gated notification dispatch.

use std::fmt;
use std::num::NonZeroU32;
use std::ops::ControlFlow;

use tracing::{debug, trace, warn};

use tessera_core::{HookError, HookFailure, HookFailures, HookSite, ObserverId, PassError, StepId};

use crate::dataset::DatasetTable;
use crate::metrics::DispatchCounters;
use crate::ordered::IndexedMapping;
use crate::policy::{conclude, FailurePolicy};

/// A periodic consumer of registry data, such as an output writer or a
/// diagnostic.
///
/// The registry hands over its dataset table on every notification in
/// place of a global accessor.
///
/// # Examples
///
/// ```
/// use tessera_core::{HookError, StepId};
/// use tessera_registry::{DatasetTable, Observer};
///
/// struct StepLogger(Vec<StepId>);
///
/// impl Observer for StepLogger {
///     fn notify(&mut self, step: StepId, _data: &mut DatasetTable<'_>) -> Result<(), HookError> {
///         self.0.push(step);
///         Ok(())
///     }
/// }
/// ```
pub trait Observer {
    /// Called at every step that is a multiple of this observer's
    /// notification frequency.
    fn notify(&mut self, step: StepId, data: &mut DatasetTable<'_>) -> Result<(), HookError>;
}

/// A registered observer and its notification frequency.
pub struct ObserverEntry<'a> {
    observer: &'a mut dyn Observer,
    frequency: NonZeroU32,
}

impl ObserverEntry<'_> {
    /// Notification frequency in steps.
    pub fn frequency(&self) -> NonZeroU32 {
        self.frequency
    }
}

impl fmt::Debug for ObserverEntry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverEntry")
            .field("frequency", &self.frequency)
            .finish_non_exhaustive()
    }
}

/// Registered observers in registration order.
#[derive(Debug, Default)]
pub struct ObserverDirectory<'a> {
    entries: IndexedMapping<ObserverId, ObserverEntry<'a>>,
    next_id: u32,
    counters: DispatchCounters,
}

impl<'a> ObserverDirectory<'a> {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty directory with room for `capacity` observers.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexedMapping::with_capacity(capacity),
            next_id: 0,
            counters: DispatchCounters::default(),
        }
    }

    /// Register `observer` to be notified every `frequency` steps.
    ///
    /// A frequency of zero is silently ignored and returns `None`. Ids are
    /// never reused: once `u32::MAX` ids have been handed out, further
    /// registrations are refused with a warning and also return `None`.
    pub fn register(
        &mut self,
        observer: &'a mut dyn Observer,
        frequency: u32,
    ) -> Option<ObserverId> {
        let Some(frequency) = NonZeroU32::new(frequency) else {
            debug!("skipping observer with zero frequency");
            return None;
        };
        let Some(next_id) = self.next_id.checked_add(1) else {
            warn!(frequency = frequency.get(), "observer ids exhausted; skipping observer");
            return None;
        };
        let id = ObserverId(self.next_id);
        let inserted = self.entries.insert(
            id,
            ObserverEntry {
                observer,
                frequency,
            },
        );
        // Ids are never reused, so the insert cannot collide.
        debug_assert!(inserted.is_ok(), "observer id {id} reused");
        self.next_id = next_id;
        debug!(observer = %id, frequency = frequency.get(), "registered observer");
        Some(id)
    }

    /// Notification frequency of a registered observer.
    pub fn frequency(&self, id: ObserverId) -> Option<NonZeroU32> {
        self.entries.get(&id).map(ObserverEntry::frequency)
    }

    /// Registered observer ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = ObserverId> + use<'_, 'a> {
        self.entries.keys()
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no observer is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Notify, in registration order, every observer whose frequency
    /// divides `step`.
    ///
    /// Each registered observer is visited exactly once. Failing
    /// observers are handled according to `policy`.
    pub fn dispatch(
        &mut self,
        step: StepId,
        data: &mut DatasetTable<'_>,
        policy: FailurePolicy,
    ) -> Result<(), PassError> {
        let counters = &mut self.counters;
        counters.dispatch_passes += 1;
        let mut failures = HookFailures::new();

        let flow = self.entries.for_each_mut(|id, entry| {
            if !step.fires_every(entry.frequency) {
                counters.gated_notifications += 1;
                return ControlFlow::Continue(());
            }
            counters.notifications += 1;
            trace!(observer = %id, %step, "notifying observer");
            match entry.observer.notify(step, &mut *data) {
                Ok(()) => ControlFlow::Continue(()),
                Err(error) => {
                    let failure = HookFailure {
                        site: HookSite::Notify { observer: id, step },
                        error,
                    };
                    warn!(%failure, "observer failed");
                    policy.absorb(failure, &mut failures)
                }
            }
        });
        conclude(flow, failures)
    }

    pub(crate) fn counters(&self) -> DispatchCounters {
        self.counters
    }

    /// Drop every observer entry, restart id allocation and zero the counters.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.next_id = 0;
        self.counters = DispatchCounters::default();
    }
}
