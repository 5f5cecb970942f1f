//! Tessera quickstart: a registry driving a tiny simulation loop.
//!
//! Demonstrates:
//!   1. Registering field and particle datasets
//!   2. Seeding them with an initialization pass
//!   3. Advancing the simulation and invalidating datasets each step
//!   4. Periodic observers reading data through the registry
//!   5. Reading registry metrics
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example quickstart

use tessera::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

// ─── Dataset ids ────────────────────────────────────────────────

const DENSITY: DatasetId = DatasetId(0);
const PARTICLES: DatasetId = DatasetId(1);

const CELLS: usize = 16;
const STEPS: u64 = 12;

// ─── Payloads ───────────────────────────────────────────────────
//
// `device` stands in for the canonical (e.g. GPU-resident) state that
// the numerical code advances; `host` is what consumers read after a
// synchronization.

struct DensityField {
    host: Vec<f32>,
    device: Vec<f32>,
}

impl SimulationData for DensityField {
    fn synchronize(&mut self) {
        self.host.copy_from_slice(&self.device);
    }
}

struct ParticleBuffer {
    host_count: usize,
    device_count: usize,
}

impl SimulationData for ParticleBuffer {
    fn synchronize(&mut self) {
        self.host_count = self.device_count;
    }
}

// ─── Initializer: seed initial conditions ───────────────────────

struct Seed;

impl Initializer for Seed {
    fn setup(&mut self) -> Result<StepId, HookError> {
        Ok(StepId(0))
    }

    fn init(
        &mut self,
        id: DatasetId,
        data: &mut dyn SimulationData,
        _step: StepId,
    ) -> Result<(), HookError> {
        let any = data.as_any_mut();
        if let Some(field) = any.downcast_mut::<DensityField>() {
            field.device.fill(1.0);
        } else if let Some(particles) = any.downcast_mut::<ParticleBuffer>() {
            particles.device_count = 100;
        } else {
            return Err(HookError::new(format!("dataset {id} has no seed")));
        }
        Ok(())
    }

    fn teardown(&mut self) -> Result<(), HookError> {
        Ok(())
    }
}

// ─── Observers: periodic diagnostics ────────────────────────────

struct TotalMass;

impl Observer for TotalMass {
    fn notify(&mut self, step: StepId, data: &mut DatasetTable<'_>) -> Result<(), HookError> {
        let field = data
            .fetch::<DensityField>(DENSITY, false)
            .map_err(|e| HookError::new(e.to_string()))?;
        let mass: f32 = field.host.iter().sum();
        info!(%step, mass, "total mass");
        data.release(DENSITY).map_err(|e| HookError::new(e.to_string()))
    }
}

struct ParticleCount;

impl Observer for ParticleCount {
    fn notify(&mut self, step: StepId, data: &mut DatasetTable<'_>) -> Result<(), HookError> {
        let particles = data
            .fetch::<ParticleBuffer>(PARTICLES, false)
            .map_err(|e| HookError::new(e.to_string()))?;
        info!(%step, count = particles.host_count, "particle count");
        data.release(PARTICLES).map_err(|e| HookError::new(e.to_string()))
    }
}

// ─── Main ───────────────────────────────────────────────────────

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut density = DensityField {
        host: vec![0.0; CELLS],
        device: vec![0.0; CELLS],
    };
    let mut particles = ParticleBuffer {
        host_count: 0,
        device_count: 0,
    };
    let mut mass = TotalMass;
    let mut count = ParticleCount;

    let mut registry = DataRegistry::with_config(RegistryConfig {
        failure_policy: FailurePolicy::Continue,
        ..Default::default()
    })?;
    registry.register_dataset(DENSITY, &mut density)?;
    registry.register_dataset(PARTICLES, &mut particles)?;
    registry.register_observer(&mut mass, 4);
    registry.register_observer(&mut count, 3);

    let start = registry.run_initialization_pass(&mut Seed, StepId(0))?;

    for step in start.0..=STEPS {
        // Advance the canonical state without going through the registry.
        {
            let field = registry.fetch::<DensityField>(DENSITY, true)?;
            for v in field.device.iter_mut() {
                *v *= 1.01;
            }
            registry.release(DENSITY)?;
            let p = registry.fetch::<ParticleBuffer>(PARTICLES, true)?;
            p.device_count += 5;
            registry.release(PARTICLES)?;
        }
        registry.invalidate_all();
        registry.dispatch_notifications(StepId(step))?;
    }

    let m = registry.metrics();
    info!(
        fetches = m.fetches,
        synchronizations = m.synchronizations,
        notifications = m.notifications,
        "done"
    );
    Ok(())
}
