//! Equation pipeline.
//!
//! A step evaluates an ordered list of [`EquationGroup`]s. Within a group,
//! every equation's `initialize` runs first, then every `accumulate`, then
//! every `finalize`; a later group sees all writes of an earlier group fully
//! committed. Equations in the same group must write disjoint destination
//! fields or accumulate additively into shared ones, which is what makes
//! their order within the group immaterial.
//!
//! Accumulation over zero pairs is not an error: the destination field simply
//! keeps the value `initialize` gave it.

use crate::error::Error;
use crate::kernel::Kernel;
use crate::neighbor::NeighborFinder;
use crate::particle::ParticleStore;

/// Simulation clock handed to every equation evaluation. Both evaluations of
/// a step see the step's start time.
#[derive(Debug, Clone, Copy)]
pub struct StepContext {
    /// Current simulation time.
    pub t: f64,
    /// Step size.
    pub dt: f64,
}

/// Precomputed geometry of one destination-source pair.
///
/// `xij = x_i - x_j`; weight and gradient use the destination's smoothing
/// length. A self-pair (same particle as destination and source) has r = 0
/// and a zero gradient.
#[derive(Debug, Clone, Copy)]
pub struct Pair {
    /// Source particle index.
    pub j: usize,
    /// Kernel weight W(r, h_i).
    pub w: f64,
    /// Kernel gradient with respect to the destination position.
    pub grad: [f64; 3],
    /// Separation vector x_i - x_j.
    pub xij: [f64; 3],
    /// Squared separation.
    pub r2: f64,
}

/// One SPH equation: a destination species, its source species, and the
/// accumulation it performs.
///
/// The pipeline only ever sees this interface, so drivers can add their own
/// variants. Implementations are stateless across steps; per-step scratch
/// lives on the stack of `accumulate` (accumulate into local buffers, commit
/// once the reads are done, so a set can be its own source).
pub trait Equation: Send {
    /// Short name for logs and error messages.
    fn name(&self) -> &'static str;

    /// Destination species name.
    fn dest(&self) -> &str;

    /// Source species names. Empty means a destination-local transform with
    /// no neighbor iteration.
    fn sources(&self) -> &[String];

    /// Resolve species names against the store. Runs once, at solver
    /// construction; an unknown name is a configuration error.
    fn bind(&mut self, store: &ParticleStore) -> Result<(), Error>;

    /// Zero or seed the destination fields this equation owns exclusively.
    fn initialize(&self, _store: &mut ParticleStore) {}

    /// Accumulate pair contributions, or apply the destination-local
    /// transform when there are no sources.
    fn accumulate(
        &self,
        _store: &mut ParticleStore,
        _finder: &dyn NeighborFinder,
        _kernel: &Kernel,
        _ctx: &StepContext,
    ) {
    }

    /// Destination-local normalization after all accumulation in the group.
    fn finalize(&self, _store: &mut ParticleStore, _ctx: &StepContext) {}
}

/// Resolved destination and source indices, shared by the equation variants.
#[derive(Debug, Clone, Default)]
pub struct Binding {
    dest: usize,
    srcs: Vec<usize>,
}

impl Binding {
    /// Resolve `dest` and `sources` to store indices.
    pub fn resolve(
        &mut self,
        store: &ParticleStore,
        dest: &str,
        sources: &[String],
    ) -> Result<(), Error> {
        self.dest = store.index_of(dest)?;
        self.srcs = sources
            .iter()
            .map(|name| store.index_of(name))
            .collect::<Result<_, _>>()?;
        Ok(())
    }

    /// Resolved destination index.
    pub fn dest(&self) -> usize {
        self.dest
    }

    /// Resolved source indices, in declaration order.
    pub fn srcs(&self) -> &[usize] {
        &self.srcs
    }
}

/// Drive `f(i, pair)` over every (destination, source) pair within the
/// kernel cutoff of the destination's smoothing length.
pub fn for_each_pair<F>(
    store: &ParticleStore,
    finder: &dyn NeighborFinder,
    kernel: &Kernel,
    dest: usize,
    src: usize,
    mut f: F,
) where
    F: FnMut(usize, Pair),
{
    let d = store.set(dest);
    let s = store.set(src);
    let scale = kernel.radius_scale();
    for i in 0..d.len() {
        let pos = [d.x[i], d.y[i], d.z[i]];
        let hi = d.h[i];
        finder.query(store, src, pos, scale * hi, &mut |j| {
            let xij = [pos[0] - s.x[j], pos[1] - s.y[j], pos[2] - s.z[j]];
            let r2 = xij[0] * xij[0] + xij[1] * xij[1] + xij[2] * xij[2];
            let r = r2.sqrt();
            f(
                i,
                Pair {
                    j,
                    w: kernel.weight(r, hi),
                    grad: kernel.gradient(xij, r, hi),
                    xij,
                    r2,
                },
            );
        });
    }
}

/// An ordered batch of equations evaluated between commit barriers.
pub struct EquationGroup {
    equations: Vec<Box<dyn Equation>>,
    real: bool,
}

impl EquationGroup {
    /// Auxiliary bookkeeping group (density summation, boundary mirroring,
    /// prescribed forcing).
    pub fn aux(equations: Vec<Box<dyn Equation>>) -> Self {
        Self {
            equations,
            real: false,
        }
    }

    /// Acceleration-producing group; its outputs are what the integrator
    /// consumes. A solver needs at least one.
    pub fn real(equations: Vec<Box<dyn Equation>>) -> Self {
        Self {
            equations,
            real: true,
        }
    }

    /// Whether this group produces the integrated accelerations.
    pub fn is_real(&self) -> bool {
        self.real
    }

    /// The group's equations, in evaluation order.
    pub fn equations(&self) -> &[Box<dyn Equation>] {
        &self.equations
    }

    pub(crate) fn bind(&mut self, store: &ParticleStore) -> Result<(), Error> {
        if self.equations.is_empty() {
            return Err(Error::Configuration(
                "equation group has no equations".to_string(),
            ));
        }
        for eq in &mut self.equations {
            eq.bind(store)?;
        }
        Ok(())
    }

    pub(crate) fn evaluate(
        &self,
        store: &mut ParticleStore,
        finder: &dyn NeighborFinder,
        kernel: &Kernel,
        ctx: &StepContext,
    ) {
        for eq in &self.equations {
            eq.initialize(store);
        }
        for eq in &self.equations {
            eq.accumulate(store, finder, kernel, ctx);
        }
        for eq in &self.equations {
            eq.finalize(store, ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::KernelFamily;
    use crate::neighbor::UniformGrid;
    use crate::particle::ParticleSet;

    #[test]
    fn pair_loop_includes_the_self_pair_with_zero_gradient() {
        let mut set = ParticleSet::new("fluid");
        set.push(0.0, 0.0, 0.0, 1.0, 1.0, 0.1);
        let store = ParticleStore::new(vec![set]).unwrap();
        let kernel = Kernel::new(KernelFamily::QuinticSpline, 2).unwrap();
        let mut grid = UniformGrid::new();
        grid.rebuild(&store, kernel.radius_scale() * 0.1);

        let mut pairs = Vec::new();
        for_each_pair(&store, &grid, &kernel, 0, 0, |i, pair| pairs.push((i, pair)));
        assert_eq!(pairs.len(), 1);
        let (i, pair) = pairs[0];
        assert_eq!((i, pair.j), (0, 0));
        assert!(pair.w > 0.0, "self weight is W(0)");
        assert_eq!(pair.grad, [0.0, 0.0, 0.0]);
        assert_eq!(pair.r2, 0.0);
    }

    #[test]
    fn pair_loop_visits_each_ordered_pair_once() {
        let mut set = ParticleSet::new("fluid");
        set.push(0.0, 0.0, 0.0, 1.0, 1.0, 0.1);
        set.push(0.1, 0.0, 0.0, 1.0, 1.0, 0.1);
        let store = ParticleStore::new(vec![set]).unwrap();
        let kernel = Kernel::new(KernelFamily::QuinticSpline, 2).unwrap();
        let mut grid = UniformGrid::new();
        grid.rebuild(&store, kernel.radius_scale() * 0.1);

        let mut seen = Vec::new();
        for_each_pair(&store, &grid, &kernel, 0, 0, |i, pair| seen.push((i, pair.j)));
        seen.sort_unstable();
        assert_eq!(seen, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn binding_rejects_unknown_species() {
        let store = ParticleStore::new(vec![ParticleSet::new("fluid")]).unwrap();
        let mut ids = Binding::default();
        let err = ids.resolve(&store, "fluid", &["ghost".to_string()]);
        assert!(err.is_err(), "unknown source species must fail to bind");
    }
}
