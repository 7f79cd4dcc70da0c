//! Built-in equation variants.
//!
//! The transport-velocity set of Adami, Hu & Adams (2013): summation
//! density, the weakly compressible state equation, momentum equations
//! (pressure gradient with background-pressure split, Morris-type viscosity,
//! artificial stress), the generalized wall boundary conditions of Adami et
//! al. (2012), a Shepard velocity filter, and prescribed rigid-body forcing.
//!
//! All pair terms share one symmetric discretization,
//! `m_j * (1/rho_i^2 + 1/rho_j^2)`, applied to the destination's kernel
//! gradient.

mod boundary;
mod density;
mod eos;
mod forcing;
mod momentum;

pub use boundary::{SolidWallNoSlipBC, SolidWallPressureBC};
pub use density::{ShepardFilteredVelocity, SummationDensity};
pub use eos::StateEquation;
pub use forcing::PrescribedAcceleration;
pub use momentum::{
    MomentumEquationArtificialStress, MomentumEquationPressureGradient,
    MomentumEquationViscosity,
};

/// Weight sums at or below this threshold are treated as empty
/// neighborhoods: the equation emits its defined fallback instead of
/// dividing.
pub(crate) const WEIGHT_EPS: f64 = 1.0e-14;
