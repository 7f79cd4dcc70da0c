//! Weakly compressible equation of state.

use crate::equation::{Binding, Equation, StepContext};
use crate::error::Error;
use crate::kernel::Kernel;
use crate::neighbor::NeighborFinder;
use crate::particle::ParticleStore;

/// Tait-style state equation with a constant background offset.
///
/// ```text
/// p = p0 * ((rho/rho0)^gamma - 1) + b * p0
/// ```
///
/// At the reference density the pressure is exactly `b * p0`; the offset
/// keeps wall extrapolation positive and cancels out of the physical
/// pressure force, which subtracts the same background. No sources: this is
/// a destination-local transform.
pub struct StateEquation {
    dest: String,
    sources: Vec<String>,
    ids: Binding,
    p0: f64,
    rho0: f64,
    b: f64,
    gamma: f64,
}

impl StateEquation {
    /// State equation on `dest` with reference pressure `p0`, reference
    /// density `rho0` and background factor `b`. The exponent defaults to 1.
    pub fn new(dest: &str, p0: f64, rho0: f64, b: f64) -> Self {
        Self {
            dest: dest.to_string(),
            sources: Vec::new(),
            ids: Binding::default(),
            p0,
            rho0,
            b,
            gamma: 1.0,
        }
    }

    /// Override the exponent.
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }
}

impl Equation for StateEquation {
    fn name(&self) -> &'static str {
        "StateEquation"
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
        _ctx: &StepContext,
    ) {
        let dest = store.set_mut(self.ids.dest());
        for i in 0..dest.len() {
            let ratio = dest.density[i] / self.rho0;
            let compressed = if self.gamma == 1.0 {
                ratio
            } else {
                ratio.powf(self.gamma)
            };
            dest.pressure[i] = self.p0 * (compressed - 1.0) + self.b * self.p0;
        }
    }
}
