//! Two-stage predictor-corrector integration.
//!
//! The solver evaluates the equation pipeline between the stages, so a step
//! runs as initialize, evaluate, stage 1, evaluate, stage 2. Species without
//! a registered stepper are never touched and act as static geometry.

use crate::error::Error;
use crate::particle::{ParticleSet, ParticleStore};

/// Per-species stepping scheme.
///
/// `initialize` runs once per step before any equation evaluation; the two
/// stages bracket the second evaluation.
pub trait IntegratorStep: Send {
    /// Capture whatever step-start state the scheme needs.
    fn initialize(&self, _set: &mut ParticleSet) {}

    /// Predictor half-step.
    fn stage1(&self, set: &mut ParticleSet, dt: f64);

    /// Corrector half-step.
    fn stage2(&self, set: &mut ParticleSet, dt: f64);
}

/// Kick-drift-kick stepping of the transport-velocity formulation.
///
/// The momentum velocity receives two half kicks from the physical
/// acceleration; positions drift with the transport velocity, which adds the
/// background-pressure acceleration on top of the freshly kicked momentum
/// velocity.
pub struct TransportVelocityStep;

impl IntegratorStep for TransportVelocityStep {
    fn stage1(&self, set: &mut ParticleSet, dt: f64) {
        let dtb2 = 0.5 * dt;
        for i in 0..set.len() {
            set.vx[i] += dtb2 * set.ax[i];
            set.vy[i] += dtb2 * set.ay[i];
            set.vz[i] += dtb2 * set.az[i];

            set.tvx[i] = set.vx[i] + dtb2 * set.tax[i];
            set.tvy[i] = set.vy[i] + dtb2 * set.tay[i];
            set.tvz[i] = set.vz[i] + dtb2 * set.taz[i];

            set.x[i] += dt * set.tvx[i];
            set.y[i] += dt * set.tvy[i];
            set.z[i] += dt * set.tvz[i];
        }
    }

    fn stage2(&self, set: &mut ParticleSet, dt: f64) {
        let dtb2 = 0.5 * dt;
        for i in 0..set.len() {
            set.vx[i] += dtb2 * set.ax[i];
            set.vy[i] += dtb2 * set.ay[i];
            set.vz[i] += dtb2 * set.az[i];
        }
    }
}

/// Two-stage stepping for a rigidly driven body.
///
/// Both stages restart from the state captured at `initialize` and apply the
/// drive acceleration, so the body's path depends only on the prescribed
/// profile and never drifts with intermediate evaluations.
pub struct RigidBodyStep;

impl IntegratorStep for RigidBodyStep {
    fn initialize(&self, set: &mut ParticleSet) {
        for i in 0..set.len() {
            set.x0[i] = set.x[i];
            set.y0[i] = set.y[i];
            set.z0[i] = set.z[i];
            set.vx0[i] = set.vx[i];
            set.vy0[i] = set.vy[i];
            set.vz0[i] = set.vz[i];
        }
    }

    fn stage1(&self, set: &mut ParticleSet, dt: f64) {
        let dtb2 = 0.5 * dt;
        for i in 0..set.len() {
            set.vx[i] = set.vx0[i] + dtb2 * set.dax[i];
            set.vy[i] = set.vy0[i] + dtb2 * set.day[i];
            set.vz[i] = set.vz0[i] + dtb2 * set.daz[i];

            set.x[i] = set.x0[i] + dtb2 * set.vx[i];
            set.y[i] = set.y0[i] + dtb2 * set.vy[i];
            set.z[i] = set.z0[i] + dtb2 * set.vz[i];
        }
    }

    fn stage2(&self, set: &mut ParticleSet, dt: f64) {
        for i in 0..set.len() {
            set.vx[i] = set.vx0[i] + dt * set.dax[i];
            set.vy[i] = set.vy0[i] + dt * set.day[i];
            set.vz[i] = set.vz0[i] + dt * set.daz[i];

            set.x[i] = set.x0[i] + dt * set.vx[i];
            set.y[i] = set.y0[i] + dt * set.vy[i];
            set.z[i] = set.z0[i] + dt * set.vz[i];
        }
    }
}

/// Maps species to their stepping schemes.
pub struct Integrator {
    steps: Vec<(String, Box<dyn IntegratorStep>)>,
    bound: Vec<usize>,
}

impl Integrator {
    /// An integrator with no steppers; add species with [`Self::with_step`].
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            bound: Vec::new(),
        }
    }

    /// Register `step` for the species `name`.
    pub fn with_step(mut self, name: &str, step: Box<dyn IntegratorStep>) -> Self {
        self.steps.push((name.to_string(), step));
        self
    }

    /// Resolve species names against `store`. Must be called before stepping.
    pub fn bind(&mut self, store: &ParticleStore) -> Result<(), Error> {
        self.bound = self
            .steps
            .iter()
            .map(|(name, _)| store.index_of(name))
            .collect::<Result<_, _>>()?;
        Ok(())
    }

    /// Species indices that have a stepper, in registration order.
    pub(crate) fn bound_species(&self) -> &[usize] {
        &self.bound
    }

    pub(crate) fn initialize(&self, store: &mut ParticleStore) {
        for (k, (_, step)) in self.steps.iter().enumerate() {
            step.initialize(store.set_mut(self.bound[k]));
        }
    }

    pub(crate) fn stage1(&self, store: &mut ParticleStore, dt: f64) {
        for (k, (_, step)) in self.steps.iter().enumerate() {
            step.stage1(store.set_mut(self.bound[k]), dt);
        }
    }

    pub(crate) fn stage2(&self, store: &mut ParticleStore, dt: f64) {
        for (k, (_, step)) in self.steps.iter().enumerate() {
            step.stage2(store.set_mut(self.bound[k]), dt);
        }
    }
}

impl Default for Integrator {
    fn default() -> Self {
        Self::new()
    }
}
