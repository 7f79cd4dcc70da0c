//! Smoothing kernels.
//!
//! Four interchangeable families behind one contract: the weight is
//! non-negative, normalized over its compact support, and exactly zero at and
//! beyond the cutoff radius; the gradient is colinear with the separation
//! vector and vanishes both at zero separation and at the cutoff. The cutoff
//! is `radius_scale() * h`, so two particles separated by exactly that
//! distance contribute nothing to each other.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Kernel family selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelFamily {
    /// Truncated Gaussian, support 3h.
    Gaussian,
    /// Cubic B-spline (Monaghan 1992), support 2h.
    CubicSpline,
    /// Quintic B-spline, support 3h.
    QuinticSpline,
    /// Wendland C2 quintic, support 2h.
    WendlandQuintic,
}

/// A smoothing kernel bound to a spatial dimension.
///
/// With q = r/h, the weight has the form
///
/// ```text
/// W(r, h) = sigma / h^dim * f(q)
/// ```
///
/// where `f` is the family's compactly supported profile and `sigma` its
/// normalization constant in `dim` dimensions.
#[derive(Debug, Clone, Copy)]
pub struct Kernel {
    family: KernelFamily,
    dim: usize,
}

impl Kernel {
    /// Create a kernel. `dim` must be 2 or 3.
    pub fn new(family: KernelFamily, dim: usize) -> Result<Self, Error> {
        if dim != 2 && dim != 3 {
            return Err(Error::Configuration(format!(
                "kernel dimension must be 2 or 3, got {dim}"
            )));
        }
        Ok(Self { family, dim })
    }

    /// Kernel family.
    pub fn family(&self) -> KernelFamily {
        self.family
    }

    /// Spatial dimension (2 or 3).
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Support radius as a multiple of the smoothing length.
    pub fn radius_scale(&self) -> f64 {
        match self.family {
            KernelFamily::Gaussian | KernelFamily::QuinticSpline => 3.0,
            KernelFamily::CubicSpline | KernelFamily::WendlandQuintic => 2.0,
        }
    }

    /// Kernel weight W(r, h). Exactly zero for r at or beyond the cutoff.
    pub fn weight(&self, r: f64, h: f64) -> f64 {
        let q = r / h;
        if q >= self.radius_scale() {
            return 0.0;
        }
        let fac = self.sigma() / h.powi(self.dim as i32);
        let profile = match self.family {
            KernelFamily::Gaussian => (-q * q).exp(),
            KernelFamily::CubicSpline => {
                if q <= 1.0 {
                    1.0 - 1.5 * q * q * (1.0 - 0.5 * q)
                } else {
                    0.25 * (2.0 - q).powi(3)
                }
            }
            KernelFamily::QuinticSpline => {
                let t3 = (3.0 - q).powi(5);
                if q <= 1.0 {
                    t3 - 6.0 * (2.0 - q).powi(5) + 15.0 * (1.0 - q).powi(5)
                } else if q <= 2.0 {
                    t3 - 6.0 * (2.0 - q).powi(5)
                } else {
                    t3
                }
            }
            KernelFamily::WendlandQuintic => {
                let t = 1.0 - 0.5 * q;
                t.powi(4) * (2.0 * q + 1.0)
            }
        };
        fac * profile
    }

    /// Kernel gradient with respect to the first particle's position,
    /// for separation `xij = x_i - x_j` with `r = |xij|`.
    ///
    /// Returns zero when the particles coincide (self-pairs exert nothing)
    /// and at or beyond the cutoff.
    pub fn gradient(&self, xij: [f64; 3], r: f64, h: f64) -> [f64; 3] {
        let q = r / h;
        if r < 1.0e-12 || q >= self.radius_scale() {
            return [0.0, 0.0, 0.0];
        }
        let fac = self.sigma() / h.powi(self.dim as i32);
        let dwdq = match self.family {
            KernelFamily::Gaussian => -2.0 * q * (-q * q).exp(),
            KernelFamily::CubicSpline => {
                if q <= 1.0 {
                    -3.0 * q + 2.25 * q * q
                } else {
                    -0.75 * (2.0 - q).powi(2)
                }
            }
            KernelFamily::QuinticSpline => {
                let t3 = -5.0 * (3.0 - q).powi(4);
                if q <= 1.0 {
                    t3 + 30.0 * (2.0 - q).powi(4) - 75.0 * (1.0 - q).powi(4)
                } else if q <= 2.0 {
                    t3 + 30.0 * (2.0 - q).powi(4)
                } else {
                    t3
                }
            }
            KernelFamily::WendlandQuintic => {
                let t = 1.0 - 0.5 * q;
                -5.0 * q * t.powi(3)
            }
        };
        // dW/dr = (dW/dq)/h, applied along the unit separation vector.
        let c = fac * dwdq / (h * r);
        [c * xij[0], c * xij[1], c * xij[2]]
    }

    /// Normalization constant for the family in `dim` dimensions.
    fn sigma(&self) -> f64 {
        use std::f64::consts::PI;
        if self.dim == 2 {
            match self.family {
                KernelFamily::Gaussian => 1.0 / PI,
                KernelFamily::CubicSpline => 10.0 / (7.0 * PI),
                KernelFamily::QuinticSpline => 7.0 / (478.0 * PI),
                KernelFamily::WendlandQuintic => 7.0 / (4.0 * PI),
            }
        } else {
            match self.family {
                KernelFamily::Gaussian => 1.0 / PI.powf(1.5),
                KernelFamily::CubicSpline => 1.0 / PI,
                KernelFamily::QuinticSpline => 3.0 / (359.0 * PI),
                KernelFamily::WendlandQuintic => 21.0 / (16.0 * PI),
            }
        }
    }
}

/// All families, for tests and sweeps.
pub const ALL_FAMILIES: [KernelFamily; 4] = [
    KernelFamily::Gaussian,
    KernelFamily::CubicSpline,
    KernelFamily::QuinticSpline,
    KernelFamily::WendlandQuintic,
];
