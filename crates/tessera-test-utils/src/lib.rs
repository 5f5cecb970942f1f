//! Test utilities and mock types for Tessera development.
//!
//! Provides mock payloads ([`MockField`], [`MockParticles`]), a shared
//! [`EventLog`], and recording implementations of [`Observer`] and
//! [`Initializer`] that append to it, so tests can assert on the exact
//! interleaving of hook calls across several collaborators.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use tessera_core::{DatasetId, HookError, SimulationData, StepId};
use tessera_registry::{DatasetTable, Initializer, Observer};

/// One recorded hook call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Notified { observer: &'static str, step: StepId },
    Setup { initializer: &'static str },
    Init { id: DatasetId, step: StepId },
    Teardown { initializer: &'static str },
    Synchronized { payload: &'static str },
}

/// Shared, append-only record of hook calls.
///
/// Cloning yields another handle to the same log.
#[derive(Clone, Debug, Default)]
pub struct EventLog(Rc<RefCell<Vec<Event>>>);

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    /// Copy of every event recorded so far.
    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    /// Steps at which the named observer was notified.
    pub fn notified_steps(&self, observer: &str) -> Vec<StepId> {
        self.0
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Notified { observer: o, step } if *o == observer => Some(*step),
                _ => None,
            })
            .collect()
    }

    /// Names of observers notified, in call order.
    pub fn notified_observers(&self) -> Vec<&'static str> {
        self.0
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Notified { observer, .. } => Some(*observer),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

/// Mock field payload counting its synchronizations.
///
/// `device` stands for the canonical state; `synchronize` copies it into
/// `host`.
#[derive(Clone, Debug, Default)]
pub struct MockField {
    pub host: Vec<f32>,
    pub device: Vec<f32>,
    pub sync_count: u32,
    log: Option<EventLog>,
}

impl MockField {
    pub fn new(len: usize) -> Self {
        Self {
            host: vec![0.0; len],
            device: vec![0.0; len],
            ..Default::default()
        }
    }

    /// Record each synchronization into `log` as well.
    pub fn logged(mut self, log: &EventLog) -> Self {
        self.log = Some(log.clone());
        self
    }
}

impl SimulationData for MockField {
    fn synchronize(&mut self) {
        self.host.clone_from(&self.device);
        self.sync_count += 1;
        if let Some(log) = &self.log {
            log.push(Event::Synchronized {
                payload: "MockField",
            });
        }
    }
}

/// A second payload type for type-mismatch tests.
#[derive(Clone, Debug, Default)]
pub struct MockParticles {
    pub count: usize,
    pub sync_count: u32,
}

impl SimulationData for MockParticles {
    fn synchronize(&mut self) {
        self.sync_count += 1;
    }
}

/// Observer that records each notification under its name.
#[derive(Debug)]
pub struct RecordingObserver {
    name: &'static str,
    log: EventLog,
    fail_at: HashSet<StepId>,
}

impl RecordingObserver {
    pub fn new(name: &'static str, log: &EventLog) -> Self {
        Self {
            name,
            log: log.clone(),
            fail_at: HashSet::new(),
        }
    }

    /// Fail (after recording) when notified at `step`.
    pub fn failing_at(mut self, step: StepId) -> Self {
        self.fail_at.insert(step);
        self
    }
}

impl Observer for RecordingObserver {
    fn notify(&mut self, step: StepId, _data: &mut DatasetTable<'_>) -> Result<(), HookError> {
        self.log.push(Event::Notified {
            observer: self.name,
            step,
        });
        if self.fail_at.contains(&step) {
            return Err(HookError::new(format!("{} failed at {step}", self.name)));
        }
        Ok(())
    }
}

/// Initializer that records every hook and writes the effective step
/// into [`MockField`] payloads.
#[derive(Debug)]
pub struct RecordingInitializer {
    name: &'static str,
    log: EventLog,
    effective_step: StepId,
    fail_init: HashSet<DatasetId>,
    fail_teardown: bool,
}

impl RecordingInitializer {
    pub fn new(name: &'static str, log: &EventLog, effective_step: StepId) -> Self {
        Self {
            name,
            log: log.clone(),
            effective_step,
            fail_init: HashSet::new(),
            fail_teardown: false,
        }
    }

    pub fn failing_init(mut self, id: DatasetId) -> Self {
        self.fail_init.insert(id);
        self
    }

    pub fn failing_teardown(mut self) -> Self {
        self.fail_teardown = true;
        self
    }
}

impl Initializer for RecordingInitializer {
    fn setup(&mut self) -> Result<StepId, HookError> {
        self.log.push(Event::Setup {
            initializer: self.name,
        });
        Ok(self.effective_step)
    }

    fn init(
        &mut self,
        id: DatasetId,
        data: &mut dyn SimulationData,
        step: StepId,
    ) -> Result<(), HookError> {
        self.log.push(Event::Init { id, step });
        if let Some(field) = data.as_any_mut().downcast_mut::<MockField>() {
            field.device.fill(step.0 as f32);
        }
        if self.fail_init.contains(&id) {
            return Err(HookError::new(format!("init of dataset {id} failed")));
        }
        Ok(())
    }

    fn teardown(&mut self) -> Result<(), HookError> {
        self.log.push(Event::Teardown {
            initializer: self.name,
        });
        if self.fail_teardown {
            return Err(HookError::new("teardown failed"));
        }
        Ok(())
    }
}
