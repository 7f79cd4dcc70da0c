//! Momentum equations of the transport-velocity formulation (Adami, Hu &
//! Adams 2013).
//!
//! The physical acceleration `a` integrates the momentum velocity; the
//! transport acceleration `ta` integrates the transport velocity that
//! actually advects positions. The constant background pressure appears only
//! in the transport part: it is subtracted from both pressures in the
//! physical pair term, so it exerts no net physical force and instead keeps
//! the particle distribution regular.

use crate::equation::{for_each_pair, Binding, Equation, StepContext};
use crate::error::Error;
use crate::kernel::Kernel;
use crate::neighbor::NeighborFinder;
use crate::particle::ParticleStore;

/// Pressure-gradient acceleration with the background-pressure split.
///
/// ```text
/// a_i  += -m_j ((p_i - pb)/rho_i^2 + (p_j - pb)/rho_j^2) grad W_ij
/// ta_i += -pb m_j (1/rho_i^2 + 1/rho_j^2) grad W_ij
/// ```
///
/// Owns (and zeroes) both acceleration fields of its destination, so the
/// other momentum equations can run in the same group in any order.
pub struct MomentumEquationPressureGradient {
    dest: String,
    sources: Vec<String>,
    ids: Binding,
    pb: f64,
    body_force: [f64; 3],
}

impl MomentumEquationPressureGradient {
    /// Pressure force on `dest` from `sources` with background pressure `pb`.
    pub fn new(dest: &str, sources: &[&str], pb: f64) -> Self {
        Self {
            dest: dest.to_string(),
            sources: sources.iter().map(|s| s.to_string()).collect(),
            ids: Binding::default(),
            pb,
            body_force: [0.0, 0.0, 0.0],
        }
    }

    /// Add a constant body force (applied after accumulation).
    pub fn with_body_force(mut self, g: [f64; 3]) -> Self {
        self.body_force = g;
        self
    }
}

impl Equation for MomentumEquationPressureGradient {
    fn name(&self) -> &'static str {
        "MomentumEquationPressureGradient"
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
        dest.ax.fill(0.0);
        dest.ay.fill(0.0);
        dest.az.fill(0.0);
        dest.tax.fill(0.0);
        dest.tay.fill(0.0);
        dest.taz.fill(0.0);
    }

    fn accumulate(
        &self,
        store: &mut ParticleStore,
        finder: &dyn NeighborFinder,
        kernel: &Kernel,
        _ctx: &StepContext,
    ) {
        let dest_id = self.ids.dest();
        let n = store.set(dest_id).len();
        let mut ax = vec![0.0; n];
        let mut ay = vec![0.0; n];
        let mut az = vec![0.0; n];
        let mut tax = vec![0.0; n];
        let mut tay = vec![0.0; n];
        let mut taz = vec![0.0; n];

        let d = store.set(dest_id);
        for &src in self.ids.srcs() {
            let s = store.set(src);
            for_each_pair(store, finder, kernel, dest_id, src, |i, pair| {
                let rhoi2 = d.density[i] * d.density[i];
                let rhoj2 = s.density[pair.j] * s.density[pair.j];
                let mj = s.mass[pair.j];
                let phys = -mj
                    * ((d.pressure[i] - self.pb) / rhoi2
                        + (s.pressure[pair.j] - self.pb) / rhoj2);
                let trans = -self.pb * mj * (1.0 / rhoi2 + 1.0 / rhoj2);
                ax[i] += phys * pair.grad[0];
                ay[i] += phys * pair.grad[1];
                az[i] += phys * pair.grad[2];
                tax[i] += trans * pair.grad[0];
                tay[i] += trans * pair.grad[1];
                taz[i] += trans * pair.grad[2];
            });
        }

        let dest = store.set_mut(dest_id);
        for i in 0..n {
            dest.ax[i] += ax[i];
            dest.ay[i] += ay[i];
            dest.az[i] += az[i];
            dest.tax[i] += tax[i];
            dest.tay[i] += tay[i];
            dest.taz[i] += taz[i];
        }
    }

    fn finalize(&self, store: &mut ParticleStore, _ctx: &StepContext) {
        let [gx, gy, gz] = self.body_force;
        if gx == 0.0 && gy == 0.0 && gz == 0.0 {
            return;
        }
        let dest = store.set_mut(self.ids.dest());
        for i in 0..dest.len() {
            dest.ax[i] += gx;
            dest.ay[i] += gy;
            dest.az[i] += gz;
        }
    }
}

/// Laminar viscosity after Morris et al. (1997), with the inter-particle
/// viscosity taken as the harmonic mean.
///
/// ```text
/// eta_i  = nu rho_i
/// eta_ij = 2 eta_i eta_j / (eta_i + eta_j)
/// F_ij   = x_ij . grad W_ij / (r^2 + 0.01 h_i^2)
/// a_i   += m_j eta_ij (1/rho_i^2 + 1/rho_j^2) F_ij (v_i - v_j)
/// ```
pub struct MomentumEquationViscosity {
    dest: String,
    sources: Vec<String>,
    ids: Binding,
    nu: f64,
}

impl MomentumEquationViscosity {
    /// Viscous force on `dest` from `sources` with kinematic viscosity `nu`.
    pub fn new(dest: &str, sources: &[&str], nu: f64) -> Self {
        Self {
            dest: dest.to_string(),
            sources: sources.iter().map(|s| s.to_string()).collect(),
            ids: Binding::default(),
            nu,
        }
    }
}

impl Equation for MomentumEquationViscosity {
    fn name(&self) -> &'static str {
        "MomentumEquationViscosity"
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
        finder: &dyn NeighborFinder,
        kernel: &Kernel,
        _ctx: &StepContext,
    ) {
        let dest_id = self.ids.dest();
        let n = store.set(dest_id).len();
        let mut ax = vec![0.0; n];
        let mut ay = vec![0.0; n];
        let mut az = vec![0.0; n];

        let d = store.set(dest_id);
        for &src in self.ids.srcs() {
            let s = store.set(src);
            for_each_pair(store, finder, kernel, dest_id, src, |i, pair| {
                let eta_i = self.nu * d.density[i];
                let eta_j = self.nu * s.density[pair.j];
                let denom = eta_i + eta_j;
                if denom <= 1.0e-30 {
                    return;
                }
                let eta = 2.0 * eta_i * eta_j / denom;
                let fij = pair.xij[0] * pair.grad[0]
                    + pair.xij[1] * pair.grad[1]
                    + pair.xij[2] * pair.grad[2];
                let eps = 0.01 * d.h[i] * d.h[i];
                let rhoi2 = d.density[i] * d.density[i];
                let rhoj2 = s.density[pair.j] * s.density[pair.j];
                let fac = s.mass[pair.j] * eta * (1.0 / rhoi2 + 1.0 / rhoj2) * fij
                    / (pair.r2 + eps);
                ax[i] += fac * (d.vx[i] - s.vx[pair.j]);
                ay[i] += fac * (d.vy[i] - s.vy[pair.j]);
                az[i] += fac * (d.vz[i] - s.vz[pair.j]);
            });
        }

        let dest = store.set_mut(dest_id);
        for i in 0..n {
            dest.ax[i] += ax[i];
            dest.ay[i] += ay[i];
            dest.az[i] += az[i];
        }
    }
}

/// Artificial stress correction of the transport-velocity formulation.
///
/// Each particle carries the tensor `A = rho v (x) (tv - v)`; the pair term
/// contracts the arithmetic mean of the two tensors with the kernel
/// gradient:
///
/// ```text
/// a_i += m_j (1/rho_i^2 + 1/rho_j^2) * 1/2 (A_i + A_j) . grad W_ij
/// ```
///
/// Vanishes identically while transport and momentum velocities agree.
pub struct MomentumEquationArtificialStress {
    dest: String,
    sources: Vec<String>,
    ids: Binding,
}

impl MomentumEquationArtificialStress {
    /// Artificial stress on `dest` from `sources`.
    pub fn new(dest: &str, sources: &[&str]) -> Self {
        Self {
            dest: dest.to_string(),
            sources: sources.iter().map(|s| s.to_string()).collect(),
            ids: Binding::default(),
        }
    }
}

impl Equation for MomentumEquationArtificialStress {
    fn name(&self) -> &'static str {
        "MomentumEquationArtificialStress"
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
        finder: &dyn NeighborFinder,
        kernel: &Kernel,
        _ctx: &StepContext,
    ) {
        let dest_id = self.ids.dest();
        let n = store.set(dest_id).len();
        let mut ax = vec![0.0; n];
        let mut ay = vec![0.0; n];
        let mut az = vec![0.0; n];

        let d = store.set(dest_id);
        for &src in self.ids.srcs() {
            let s = store.set(src);
            for_each_pair(store, finder, kernel, dest_id, src, |i, pair| {
                let j = pair.j;
                let rhoi = d.density[i];
                let rhoj = s.density[j];
                let fac = s.mass[j] * (1.0 / (rhoi * rhoi) + 1.0 / (rhoj * rhoj));
                let vi = [d.vx[i], d.vy[i], d.vz[i]];
                let dvi = [d.tvx[i] - vi[0], d.tvy[i] - vi[1], d.tvz[i] - vi[2]];
                let vj = [s.vx[j], s.vy[j], s.vz[j]];
                let dvj = [s.tvx[j] - vj[0], s.tvy[j] - vj[1], s.tvz[j] - vj[2]];
                let mut acc = [0.0; 3];
                for row in 0..3 {
                    let mut t = 0.0;
                    for col in 0..3 {
                        let a_i = rhoi * vi[row] * dvi[col];
                        let a_j = rhoj * vj[row] * dvj[col];
                        t += 0.5 * (a_i + a_j) * pair.grad[col];
                    }
                    acc[row] = fac * t;
                }
                ax[i] += acc[0];
                ay[i] += acc[1];
                az[i] += acc[2];
            });
        }

        let dest = store.set_mut(dest_id);
        for i in 0..n {
            dest.ax[i] += ax[i];
            dest.ay[i] += ay[i];
            dest.az[i] += az[i];
        }
    }
}
