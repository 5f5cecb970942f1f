//! How a pass reacts when an external hook fails.
//!
//! One [`FailurePolicy`] governs both notification dispatch and
//! initialization passes so the two behave identically.

use std::ops::ControlFlow;

use tessera_core::{HookFailure, HookFailures, PassError};

/// Reaction to a failing observer or initializer hook.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop at the first failure. Remaining hooks, including an
    /// initializer's `teardown`, are not run.
    #[default]
    Abort,
    /// Keep going, run every remaining hook (including `teardown`), and
    /// report all failures once the pass completes.
    Continue,
}

impl FailurePolicy {
    /// Route a failure: break the traversal or record it and continue.
    pub(crate) fn absorb(
        self,
        failure: HookFailure,
        collected: &mut HookFailures,
    ) -> ControlFlow<HookFailure> {
        match self {
            Self::Abort => ControlFlow::Break(failure),
            Self::Continue => {
                collected.push(failure);
                ControlFlow::Continue(())
            }
        }
    }
}

/// Turn the outcome of a traversal into the pass result.
pub(crate) fn conclude(
    flow: ControlFlow<HookFailure>,
    collected: HookFailures,
) -> Result<(), PassError> {
    match flow {
        ControlFlow::Break(failure) => Err(PassError::Aborted(failure)),
        ControlFlow::Continue(()) if collected.is_empty() => Ok(()),
        ControlFlow::Continue(()) => Err(PassError::Failed(collected)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::{HookError, HookSite};

    fn failure(reason: &str) -> HookFailure {
        HookFailure {
            site: HookSite::Teardown,
            error: HookError::new(reason),
        }
    }

    #[test]
    fn abort_breaks_without_collecting() {
        let mut collected = HookFailures::new();
        let flow = FailurePolicy::Abort.absorb(failure("x"), &mut collected);
        assert_eq!(flow, ControlFlow::Break(failure("x")));
        assert!(collected.is_empty());
        assert_eq!(conclude(flow, collected), Err(PassError::Aborted(failure("x"))));
    }

    #[test]
    fn continue_collects_and_reports_at_end() {
        let mut collected = HookFailures::new();
        let a = FailurePolicy::Continue.absorb(failure("a"), &mut collected);
        let b = FailurePolicy::Continue.absorb(failure("b"), &mut collected);
        assert!(a.is_continue() && b.is_continue());
        let err = conclude(ControlFlow::Continue(()), collected).unwrap_err();
        assert_eq!(err.failures(), &[failure("a"), failure("b")]);
    }

    #[test]
    fn clean_pass_is_ok() {
        assert_eq!(conclude(ControlFlow::Continue(()), HookFailures::new()), Ok(()));
    }

    #[test]
    fn default_policy_is_abort() {
        assert_eq!(FailurePolicy::default(), FailurePolicy::Abort);
    }
}
