//! Two-phase batch initialization over every registered dataset.
//!
//! An [`Initializer`] is driven through `setup`, one `init` per dataset in
//! registration order, and `teardown`. The step returned by `setup`
//! replaces the caller's step for every `init`.

use std::ops::ControlFlow;

use tracing::{debug, warn};

use tessera_core::{
    DatasetId, HookError, HookFailure, HookFailures, HookSite, PassError, SimulationData, StepId,
};

use crate::dataset::DatasetTable;
use crate::policy::{conclude, FailurePolicy};

/// Batch initializer applied uniformly to every registered dataset,
/// e.g. loading a checkpoint or seeding initial conditions.
pub trait Initializer {
    /// Prepare the pass and return the effective step for every `init`.
    fn setup(&mut self) -> Result<StepId, HookError>;

    /// Initialize one dataset's payload.
    ///
    /// The payload is not synchronized beforehand and is left
    /// `AutoInvalid` afterwards.
    fn init(
        &mut self,
        id: DatasetId,
        data: &mut dyn SimulationData,
        step: StepId,
    ) -> Result<(), HookError>;

    /// Finish the pass. Called once after every `init`, even when no
    /// dataset is registered.
    fn teardown(&mut self) -> Result<(), HookError>;
}

/// Drive `initializer` over `datasets`.
///
/// A failing `setup` always aborts: without an effective step there is
/// nothing to initialize. Failures in `init` and `teardown` follow
/// `policy`. Returns the effective step on success.
pub(crate) fn run_pass(
    initializer: &mut dyn Initializer,
    requested: StepId,
    datasets: &mut DatasetTable<'_>,
    policy: FailurePolicy,
) -> Result<StepId, PassError> {
    let step = initializer.setup().map_err(|error| {
        let failure = HookFailure {
            site: HookSite::Setup,
            error,
        };
        warn!(%failure, "initializer failed");
        PassError::Aborted(failure)
    })?;
    debug!(%requested, effective = %step, datasets = datasets.len(), "initialization pass");

    let mut failures = HookFailures::new();
    let flow = datasets.for_each_payload_mut(|id, data| {
        match initializer.init(id, data, step) {
            Ok(()) => ControlFlow::Continue(()),
            Err(error) => {
                let failure = HookFailure {
                    site: HookSite::Init { dataset: id, step },
                    error,
                };
                warn!(%failure, "initializer failed");
                policy.absorb(failure, &mut failures)
            }
        }
    });
    if let ControlFlow::Break(failure) = flow {
        return Err(PassError::Aborted(failure));
    }

    let flow = match initializer.teardown() {
        Ok(()) => ControlFlow::Continue(()),
        Err(error) => {
            let failure = HookFailure {
                site: HookSite::Teardown,
                error,
            };
            warn!(%failure, "initializer failed");
            policy.absorb(failure, &mut failures)
        }
    };
    conclude(flow, failures).map(|()| step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DatasetStatus;

    struct Cell(f64);

    impl SimulationData for Cell {
        fn synchronize(&mut self) {}
    }

    #[derive(Default)]
    struct Trace {
        calls: Vec<String>,
        fail_init: Option<DatasetId>,
        fail_teardown: bool,
    }

    impl Initializer for Trace {
        fn setup(&mut self) -> Result<StepId, HookError> {
            self.calls.push("setup".into());
            Ok(StepId(100))
        }

        fn init(
            &mut self,
            id: DatasetId,
            data: &mut dyn SimulationData,
            step: StepId,
        ) -> Result<(), HookError> {
            self.calls.push(format!("init {id}@{step}"));
            if let Some(cell) = data.as_any_mut().downcast_mut::<Cell>() {
                cell.0 = step.0 as f64;
            }
            if self.fail_init == Some(id) {
                return Err(HookError::new("bad checkpoint"));
            }
            Ok(())
        }

        fn teardown(&mut self) -> Result<(), HookError> {
            self.calls.push("teardown".into());
            if self.fail_teardown {
                return Err(HookError::new("close failed"));
            }
            Ok(())
        }
    }

    #[test]
    fn empty_table_still_runs_setup_and_teardown() {
        let mut init = Trace::default();
        let mut table = DatasetTable::new();
        let step = run_pass(&mut init, StepId(1), &mut table, FailurePolicy::Abort).unwrap();
        assert_eq!(step, StepId(100));
        assert_eq!(init.calls, vec!["setup", "teardown"]);
    }

    #[test]
    fn init_writes_payload_with_effective_step() {
        let mut cell = Cell(0.0);
        {
            let mut init = Trace::default();
            let mut table = DatasetTable::new();
            table.register(DatasetId(4), &mut cell).unwrap();
            table.fetch::<Cell>(DatasetId(4), false).unwrap();
            run_pass(&mut init, StepId(7), &mut table, FailurePolicy::Abort).unwrap();
            assert_eq!(table.status(DatasetId(4)), Ok(DatasetStatus::AutoInvalid));
            assert_eq!(init.calls, vec!["setup", "init 4@100", "teardown"]);
        }
        assert_eq!(cell.0, 100.0);
    }

    #[test]
    fn abort_skips_remaining_init_and_teardown() {
        let (mut a, mut b) = (Cell(0.0), Cell(0.0));
        let mut init = Trace {
            fail_init: Some(DatasetId(1)),
            ..Default::default()
        };
        let mut table = DatasetTable::new();
        table.register(DatasetId(1), &mut a).unwrap();
        table.register(DatasetId(2), &mut b).unwrap();
        let err = run_pass(&mut init, StepId(0), &mut table, FailurePolicy::Abort).unwrap_err();
        assert!(matches!(err, PassError::Aborted(ref f) if f.site == HookSite::Init {
            dataset: DatasetId(1),
            step: StepId(100),
        }));
        assert_eq!(init.calls, vec!["setup", "init 1@100"]);
    }

    #[test]
    fn continue_runs_everything_and_collects() {
        let (mut a, mut b) = (Cell(0.0), Cell(0.0));
        let mut init = Trace {
            fail_init: Some(DatasetId(1)),
            fail_teardown: true,
            ..Default::default()
        };
        let mut table = DatasetTable::new();
        table.register(DatasetId(1), &mut a).unwrap();
        table.register(DatasetId(2), &mut b).unwrap();
        let err = run_pass(&mut init, StepId(0), &mut table, FailurePolicy::Continue).unwrap_err();
        let sites: Vec<_> = err.failures().iter().map(|f| f.site).collect();
        assert_eq!(
            sites,
            vec![
                HookSite::Init {
                    dataset: DatasetId(1),
                    step: StepId(100),
                },
                HookSite::Teardown,
            ]
        );
        assert_eq!(init.calls, vec!["setup", "init 1@100", "init 2@100", "teardown"]);
    }

    #[test]
    fn failing_setup_aborts_under_every_policy() {
        struct NoSetup;
        impl Initializer for NoSetup {
            fn setup(&mut self) -> Result<StepId, HookError> {
                Err(HookError::new("no checkpoint"))
            }
            fn init(
                &mut self,
                _: DatasetId,
                _: &mut dyn SimulationData,
                _: StepId,
            ) -> Result<(), HookError> {
                panic!("init must not run");
            }
            fn teardown(&mut self) -> Result<(), HookError> {
                panic!("teardown must not run");
            }
        }

        for policy in [FailurePolicy::Abort, FailurePolicy::Continue] {
            let mut table = DatasetTable::new();
            let err = run_pass(&mut NoSetup, StepId(3), &mut table, policy).unwrap_err();
            assert!(matches!(err, PassError::Aborted(ref f) if f.site == HookSite::Setup));
        }
    }
}
