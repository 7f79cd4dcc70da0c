//! Particle lattice generation.
//!
//! Both generators place points at cell centers so that no point ever lands
//! on a region boundary; region membership tests in the case assembly can
//! then use closed comparisons without ties.

use sph::Kernel;

/// A generated point set plus the area each site occupies.
pub struct Lattice {
    /// Site x coordinates.
    pub x: Vec<f64>,
    /// Site y coordinates.
    pub y: Vec<f64>,
    /// Area per site of the ideal infinite lattice.
    pub cell_volume: f64,
}

impl Lattice {
    /// Number of sites.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Whether the lattice has no sites.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Square lattice over `[x0, x1) x [y0, y1)` with spacing `dx`, sites at
/// `(i + 1/2) dx` offsets.
pub fn cubic(dx: f64, x0: f64, x1: f64, y0: f64, y1: f64) -> Lattice {
    let mut x = Vec::new();
    let mut y = Vec::new();
    let mut j = 0u64;
    loop {
        let py = y0 + (0.5 + j as f64) * dx;
        if py >= y1 {
            break;
        }
        let mut i = 0u64;
        loop {
            let px = x0 + (0.5 + i as f64) * dx;
            if px >= x1 {
                break;
            }
            x.push(px);
            y.push(py);
            i += 1;
        }
        j += 1;
    }
    Lattice {
        x,
        y,
        cell_volume: dx * dx,
    }
}

/// Hexagonal close packing over `[x0, x1) x [y0, y1)`: rows at pitch
/// `sqrt(3)/2 dx`, every other row shifted by `dx/2`.
pub fn hcp(dx: f64, x0: f64, x1: f64, y0: f64, y1: f64) -> Lattice {
    let dy = 0.5 * 3.0_f64.sqrt() * dx;
    let mut x = Vec::new();
    let mut y = Vec::new();
    let mut j = 0u64;
    loop {
        let py = y0 + (0.5 + j as f64) * dy;
        if py >= y1 {
            break;
        }
        let shift = if j % 2 == 1 { 0.5 * dx } else { 0.0 };
        let mut i = 0u64;
        loop {
            let px = x0 + (0.5 + i as f64) * dx + shift;
            if px >= x1 {
                break;
            }
            x.push(px);
            y.push(py);
            i += 1;
        }
        j += 1;
    }
    Lattice {
        x,
        y,
        cell_volume: dx * dy,
    }
}

/// Kernel sum over the ideal infinite lattice around one site.
///
/// The reciprocal is the consistent particle volume for the given packing
/// and smoothing length; for HCP spacing it differs slightly from the
/// geometric cell area, which matters for an exactly density-consistent
/// initialization.
pub fn number_density(kernel: &Kernel, h: f64, dx: f64, dy: f64, hcp: bool) -> f64 {
    let reach_x = (kernel.radius_scale() * h / dx).ceil() as i64 + 1;
    let reach_y = (kernel.radius_scale() * h / dy).ceil() as i64 + 1;
    let mut sum = 0.0;
    for j in -reach_y..=reach_y {
        let shift = if hcp && j.rem_euclid(2) == 1 {
            0.5 * dx
        } else {
            0.0
        };
        for i in -reach_x..=reach_x {
            let x = i as f64 * dx + shift;
            let y = j as f64 * dy;
            sum += kernel.weight((x * x + y * y).sqrt(), h);
        }
    }
    sum
}
