//! Prescribed rigid-body forcing.

use crate::equation::{Binding, Equation, StepContext};
use crate::error::Error;
use crate::kernel::Kernel;
use crate::neighbor::NeighborFinder;
use crate::particle::ParticleStore;

/// Time-dependent acceleration profile for a rigidly driven species.
pub type AccelerationProfile = Box<dyn Fn(f64) -> [f64; 3] + Send>;

/// Drives every particle of a species with the same acceleration `f(t)`.
///
/// The profile writes the drive fields `dax/day/daz`, which the rigid-body
/// integrator and the wall pressure extrapolation both read. No neighbor
/// traversal is involved.
pub struct PrescribedAcceleration {
    dest: String,
    sources: Vec<String>,
    ids: Binding,
    profile: AccelerationProfile,
}

impl PrescribedAcceleration {
    /// Prescribe `profile(t)` as the drive acceleration of `dest`.
    pub fn new(dest: &str, profile: AccelerationProfile) -> Self {
        Self {
            dest: dest.to_string(),
            sources: Vec::new(),
            ids: Binding::default(),
            profile,
        }
    }
}

impl Equation for PrescribedAcceleration {
    fn name(&self) -> &'static str {
        "PrescribedAcceleration"
    }

    fn dest(&self) -> &str {
        &self.dest
    }

    fn sources(&self) -> &[String] {
        &self.sources
    }

    fn bind(&mut self, store: &ParticleStore) -> Result<(), Error> {
        self.ids.resolve(store, &self.dest, &self.sources)
    }

    fn accumulate(
        &self,
        store: &mut ParticleStore,
        _finder: &dyn NeighborFinder,
        _kernel: &Kernel,
        ctx: &StepContext,
    ) {
        let [ax, ay, az] = (self.profile)(ctx.t);
        let dest = store.set_mut(self.ids.dest());
        dest.dax.fill(ax);
        dest.day.fill(ay);
        dest.daz.fill(az);
    }
}
