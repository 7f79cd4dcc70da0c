//! Time-stepping driver.
//!
//! The solver owns the particle store and advances it with the two-stage
//! integrator, evaluating the equation pipeline before each stage. Output is
//! handed to a [`SnapshotWriter`] between steps, never inside the physics
//! loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::equation::{EquationGroup, StepContext};
use crate::error::Error;
use crate::integrator::Integrator;
use crate::kernel::Kernel;
use crate::neighbor::NeighborFinder;
use crate::particle::ParticleStore;

/// Step-size policy.
pub enum TimeStep {
    /// The same dt every step.
    Fixed(f64),
    /// CFL-style bound recomputed from the current fields each step:
    /// `dt = safety * min(h_min/(c + v_max), h_min^2/nu, dt_force)`, with the
    /// viscous bound dropped when `nu` is zero. `v_max` ranges over the
    /// integrated species only.
    Adaptive {
        /// Multiplier on the stability bound, in (0, 1].
        safety: f64,
        /// Artificial sound speed entering the acoustic bound.
        sound_speed: f64,
        /// Kinematic viscosity entering the diffusive bound.
        nu: f64,
        /// Hard ceiling on the step size.
        dt_force: f64,
    },
}

/// Run-length parameters for [`Solver::new`].
pub struct SolverConfig {
    /// Step-size policy.
    pub time_step: TimeStep,
    /// Simulated time at which the run stops.
    pub t_final: f64,
    /// Times at which the store is handed to the snapshot writer. Need not
    /// be sorted; each entry triggers one write when first crossed.
    pub output_times: Vec<f64>,
}

/// Sink for solver output.
pub trait SnapshotWriter {
    /// Persist the store's state at simulated time `t`.
    fn write(&mut self, t: f64, store: &ParticleStore) -> Result<(), Error>;
}

/// Discards every snapshot.
pub struct NullWriter;

impl SnapshotWriter for NullWriter {
    fn write(&mut self, _t: f64, _store: &ParticleStore) -> Result<(), Error> {
        Ok(())
    }
}

/// Advances a particle store through the equation pipeline.
pub struct Solver {
    store: ParticleStore,
    kernel: Kernel,
    groups: Vec<EquationGroup>,
    group_dests: Vec<Vec<usize>>,
    integrator: Integrator,
    finder: Box<dyn NeighborFinder>,
    time_step: TimeStep,
    t_final: f64,
    output_times: Vec<f64>,
    next_output: usize,
    t: f64,
    steps: u64,
    stop: Arc<AtomicBool>,
}

impl Solver {
    /// Wire a solver together, validating everything fatal up front: the dt
    /// policy, the presence of a real group, and the species wiring of every
    /// equation and stepper.
    pub fn new(
        store: ParticleStore,
        kernel: Kernel,
        mut groups: Vec<EquationGroup>,
        mut integrator: Integrator,
        finder: Box<dyn NeighborFinder>,
        config: SolverConfig,
    ) -> Result<Self, Error> {
        match &config.time_step {
            TimeStep::Fixed(dt) => {
                if !dt.is_finite() || *dt <= 0.0 {
                    return Err(Error::Configuration(format!(
                        "fixed time step must be positive and finite, got {dt}"
                    )));
                }
            }
            TimeStep::Adaptive {
                safety,
                sound_speed,
                nu,
                dt_force,
            } => {
                if !safety.is_finite() || *safety <= 0.0 || *safety > 1.0 {
                    return Err(Error::Configuration(format!(
                        "dt safety factor must lie in (0, 1], got {safety}"
                    )));
                }
                if !sound_speed.is_finite() || *sound_speed <= 0.0 {
                    return Err(Error::Configuration(format!(
                        "sound speed must be positive, got {sound_speed}"
                    )));
                }
                if !nu.is_finite() || *nu < 0.0 {
                    return Err(Error::Configuration(format!(
                        "viscosity must be non-negative, got {nu}"
                    )));
                }
                if !dt_force.is_finite() || *dt_force <= 0.0 {
                    return Err(Error::Configuration(format!(
                        "dt ceiling must be positive, got {dt_force}"
                    )));
                }
            }
        }
        if !config.t_final.is_finite() || config.t_final <= 0.0 {
            return Err(Error::Configuration(format!(
                "final time must be positive and finite, got {}",
                config.t_final
            )));
        }
        if config.output_times.iter().any(|t| !t.is_finite()) {
            return Err(Error::Configuration(
                "output times must be finite".to_string(),
            ));
        }
        if !groups.iter().any(|g| g.is_real()) {
            return Err(Error::Configuration(
                "equation pipeline needs at least one real group".to_string(),
            ));
        }

        let mut group_dests = Vec::with_capacity(groups.len());
        for group in &mut groups {
            group.bind(&store)?;
            let mut dests = Vec::new();
            for eq in group.equations() {
                let id = store.index_of(eq.dest())?;
                if !dests.contains(&id) {
                    dests.push(id);
                }
            }
            group_dests.push(dests);
        }
        integrator.bind(&store)?;

        let mut output_times = config.output_times;
        output_times.sort_unstable_by(f64::total_cmp);

        Ok(Self {
            store,
            kernel,
            groups,
            group_dests,
            integrator,
            finder,
            time_step: config.time_step,
            t_final: config.t_final,
            output_times,
            next_output: 0,
            t: 0.0,
            steps: 0,
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Current simulated time.
    pub fn time(&self) -> f64 {
        self.t
    }

    /// Number of completed steps.
    pub fn step_count(&self) -> u64 {
        self.steps
    }

    /// The particle store being advanced.
    pub fn store(&self) -> &ParticleStore {
        &self.store
    }

    /// Mutable access to the store, for seeding or inspection between steps.
    /// Structural changes are picked up by the rebuild at the next step.
    pub fn store_mut(&mut self) -> &mut ParticleStore {
        &mut self.store
    }

    /// Shared flag that cancels [`Self::run`] at the next step boundary.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Advance the store by one step of size `dt`.
    pub fn step(&mut self, dt: f64) -> Result<(), Error> {
        self.finder.rebuild(&self.store, self.max_support());
        self.integrator.initialize(&mut self.store);

        // Both evaluations see the start-of-step time.
        let ctx = StepContext { t: self.t, dt };
        self.evaluate_groups(&ctx)?;
        self.integrator.stage1(&mut self.store, dt);
        self.evaluate_groups(&ctx)?;
        self.integrator.stage2(&mut self.store, dt);

        self.t += dt;
        self.steps += 1;
        Ok(())
    }

    /// Run until `t_final` or until the stop flag is raised, handing the
    /// store to `writer` at every crossed output time.
    pub fn run(&mut self, writer: &mut dyn SnapshotWriter) -> Result<(), Error> {
        info!(
            t_final = self.t_final,
            species = self.store.species_count(),
            groups = self.groups.len(),
            "starting run"
        );
        while self.t < self.t_final {
            if self.stop.load(Ordering::Relaxed) {
                info!(t = self.t, steps = self.steps, "stop requested");
                break;
            }
            let dt = self.next_dt();
            self.step(dt)?;

            while self.next_output < self.output_times.len()
                && self.t >= self.output_times[self.next_output]
            {
                writer.write(self.t, &self.store)?;
                self.next_output += 1;
            }

            if self.steps % 100 == 0 {
                debug!(step = self.steps, t = self.t, dt, "advanced");
            }
        }
        info!(t = self.t, steps = self.steps, "run complete");
        Ok(())
    }

    fn evaluate_groups(&mut self, ctx: &StepContext) -> Result<(), Error> {
        for (gi, group) in self.groups.iter().enumerate() {
            if !self.finder.in_sync(&self.store) {
                return Err(Error::StaleIndex);
            }
            group.evaluate(&mut self.store, self.finder.as_ref(), &self.kernel, ctx);
            for &dest in &self.group_dests[gi] {
                let set = self.store.set(dest);
                if let Some(field) = set.first_non_finite() {
                    return Err(Error::NumericalInstability {
                        species: set.name().to_string(),
                        field,
                        step: self.steps,
                    });
                }
            }
        }
        Ok(())
    }

    fn next_dt(&self) -> f64 {
        match &self.time_step {
            TimeStep::Fixed(dt) => *dt,
            TimeStep::Adaptive {
                safety,
                sound_speed,
                nu,
                dt_force,
            } => {
                let h_min = self
                    .store
                    .sets()
                    .iter()
                    .flat_map(|set| set.h.iter().copied())
                    .fold(f64::INFINITY, f64::min);
                let mut v_max: f64 = 0.0;
                for &idx in self.integrator.bound_species() {
                    let set = self.store.set(idx);
                    for i in 0..set.len() {
                        let v2 = set.vx[i] * set.vx[i]
                            + set.vy[i] * set.vy[i]
                            + set.vz[i] * set.vz[i];
                        v_max = v_max.max(v2);
                    }
                }
                v_max = v_max.sqrt();

                let mut dt = (h_min / (sound_speed + v_max)).min(*dt_force);
                if *nu > 0.0 {
                    dt = dt.min(h_min * h_min / nu);
                }
                safety * dt
            }
        }
    }

    fn max_support(&self) -> f64 {
        let h_max = self
            .store
            .sets()
            .iter()
            .flat_map(|set| set.h.iter().copied())
            .fold(0.0, f64::max);
        self.kernel.radius_scale() * h_max
    }
}
