//! Kernel-interpolation sums: density and the Shepard velocity filter.

use crate::equation::{for_each_pair, Binding, Equation, StepContext};
use crate::equations::WEIGHT_EPS;
use crate::error::Error;
use crate::kernel::Kernel;
use crate::neighbor::NeighborFinder;
use crate::particle::ParticleStore;

/// Summation density.
///
/// ```text
/// rho_i  = sum_j m_j W_ij        (mass density)
/// nden_i = sum_j W_ij            (number density, 1/volume)
/// ```
///
/// Sums run over every source species, the destination itself included when
/// listed, so an isolated particle keeps its own W(0) contribution. A
/// destination with no neighbors in any source keeps the initialized zero.
pub struct SummationDensity {
    dest: String,
    sources: Vec<String>,
    ids: Binding,
}

impl SummationDensity {
    /// Sum density on `dest` over the given source species.
    pub fn new(dest: &str, sources: &[&str]) -> Self {
        Self {
            dest: dest.to_string(),
            sources: sources.iter().map(|s| s.to_string()).collect(),
            ids: Binding::default(),
        }
    }
}

impl Equation for SummationDensity {
    fn name(&self) -> &'static str {
        "SummationDensity"
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

    fn initialize(&self, store: &mut ParticleStore) {
        let dest = store.set_mut(self.ids.dest());
        dest.density.fill(0.0);
        dest.nden.fill(0.0);
    }

    fn accumulate(
        &self,
        store: &mut ParticleStore,
        finder: &dyn NeighborFinder,
        kernel: &Kernel,
        _ctx: &StepContext,
    ) {
        let n = store.set(self.ids.dest()).len();
        let mut rho = vec![0.0; n];
        let mut nden = vec![0.0; n];
        for &src in self.ids.srcs() {
            let s = store.set(src);
            for_each_pair(store, finder, kernel, self.ids.dest(), src, |i, pair| {
                rho[i] += s.mass[pair.j] * pair.w;
                nden[i] += pair.w;
            });
        }
        let dest = store.set_mut(self.ids.dest());
        for i in 0..n {
            dest.density[i] += rho[i];
            dest.nden[i] += nden[i];
        }
    }
}

/// Shepard-filtered (smoothed) velocity.
///
/// ```text
/// sv_i = sum_j v_j W_ij / nden_j
/// ```
///
/// The filtered field feeds the no-slip wall condition's ghost velocity;
/// sources must already carry a current number density. Source particles
/// with an empty neighborhood of their own (nden ~ 0) are skipped.
pub struct ShepardFilteredVelocity {
    dest: String,
    sources: Vec<String>,
    ids: Binding,
}

impl ShepardFilteredVelocity {
    /// Filter the velocity of `dest` over the given source species.
    pub fn new(dest: &str, sources: &[&str]) -> Self {
        Self {
            dest: dest.to_string(),
            sources: sources.iter().map(|s| s.to_string()).collect(),
            ids: Binding::default(),
        }
    }
}

impl Equation for ShepardFilteredVelocity {
    fn name(&self) -> &'static str {
        "ShepardFilteredVelocity"
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

    fn initialize(&self, store: &mut ParticleStore) {
        let dest = store.set_mut(self.ids.dest());
        dest.svx.fill(0.0);
        dest.svy.fill(0.0);
        dest.svz.fill(0.0);
    }

    fn accumulate(
        &self,
        store: &mut ParticleStore,
        finder: &dyn NeighborFinder,
        kernel: &Kernel,
        _ctx: &StepContext,
    ) {
        let n = store.set(self.ids.dest()).len();
        let mut svx = vec![0.0; n];
        let mut svy = vec![0.0; n];
        let mut svz = vec![0.0; n];
        for &src in self.ids.srcs() {
            let s = store.set(src);
            for_each_pair(store, finder, kernel, self.ids.dest(), src, |i, pair| {
                let nden = s.nden[pair.j];
                if nden > WEIGHT_EPS {
                    let wn = pair.w / nden;
                    svx[i] += s.vx[pair.j] * wn;
                    svy[i] += s.vy[pair.j] * wn;
                    svz[i] += s.vz[pair.j] * wn;
                }
            });
        }
        let dest = store.set_mut(self.ids.dest());
        for i in 0..n {
            dest.svx[i] += svx[i];
            dest.svy[i] += svy[i];
            dest.svz[i] += svz[i];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::KernelFamily;
    use crate::neighbor::UniformGrid;
    use crate::particle::ParticleSet;

    const H: f64 = 0.12;

    fn fluid_pair() -> ParticleStore {
        let mut fluid = ParticleSet::new("fluid");
        fluid.push(0.0, 0.0, 0.0, 2.0, 0.0, H);
        fluid.push(0.1, 0.0, 0.0, 2.0, 0.0, H);
        ParticleStore::new(vec![fluid]).unwrap()
    }

    fn grid_for(store: &ParticleStore, kernel: &Kernel) -> UniformGrid {
        let mut grid = UniformGrid::new();
        grid.rebuild(store, kernel.radius_scale() * H);
        grid
    }

    fn ctx() -> StepContext {
        StepContext { t: 0.0, dt: 1.0e-3 }
    }

    #[test]
    fn density_sums_self_and_neighbor() {
        let mut store = fluid_pair();
        let kernel = Kernel::new(KernelFamily::QuinticSpline, 2).unwrap();
        let grid = grid_for(&store, &kernel);
        let mut eq = SummationDensity::new("fluid", &["fluid"]);
        eq.bind(&store).unwrap();
        eq.initialize(&mut store);
        eq.accumulate(&mut store, &grid, &kernel, &ctx());

        let w0 = kernel.weight(0.0, H);
        let wr = kernel.weight(0.1, H);
        let expected = 2.0 * (w0 + wr);
        let fluid = store.by_name("fluid").unwrap();
        assert!((fluid.density[0] - expected).abs() < 1e-12);
        assert!((fluid.density[1] - expected).abs() < 1e-12, "symmetric pair");
        assert!((fluid.nden[0] - (w0 + wr)).abs() < 1e-12);
    }

    #[test]
    fn density_with_empty_source_stays_zero() {
        let mut fluid = ParticleSet::new("fluid");
        fluid.push(0.0, 0.0, 0.0, 2.0, 7.0, H);
        let ghost = ParticleSet::new("ghost");
        let mut store = ParticleStore::new(vec![fluid, ghost]).unwrap();
        let kernel = Kernel::new(KernelFamily::QuinticSpline, 2).unwrap();
        let grid = grid_for(&store, &kernel);

        let mut eq = SummationDensity::new("fluid", &["ghost"]);
        eq.bind(&store).unwrap();
        eq.initialize(&mut store);
        eq.accumulate(&mut store, &grid, &kernel, &ctx());
        assert_eq!(
            store.by_name("fluid").unwrap().density[0],
            0.0,
            "no neighbors leaves the initialized value"
        );
    }

    #[test]
    fn shepard_filter_reproduces_a_uniform_velocity() {
        let mut store = fluid_pair();
        {
            let fluid = store.set_mut(0);
            fluid.vx[0] = 0.7;
            fluid.vx[1] = 0.7;
            fluid.vy[0] = -0.2;
            fluid.vy[1] = -0.2;
        }
        let kernel = Kernel::new(KernelFamily::QuinticSpline, 2).unwrap();
        let grid = grid_for(&store, &kernel);

        let mut density = SummationDensity::new("fluid", &["fluid"]);
        density.bind(&store).unwrap();
        density.initialize(&mut store);
        density.accumulate(&mut store, &grid, &kernel, &ctx());

        let mut shepard = ShepardFilteredVelocity::new("fluid", &["fluid"]);
        shepard.bind(&store).unwrap();
        shepard.initialize(&mut store);
        shepard.accumulate(&mut store, &grid, &kernel, &ctx());

        let fluid = store.by_name("fluid").unwrap();
        for i in 0..2 {
            assert!(
                (fluid.svx[i] - 0.7).abs() < 1e-12,
                "uniform field must filter to itself, got {}",
                fluid.svx[i]
            );
            assert!((fluid.svy[i] + 0.2).abs() < 1e-12);
        }
    }
}
