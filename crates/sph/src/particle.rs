//! Columnar particle storage.
//!
//! Each species ("fluid", "solid", "obstacle", ...) lives in one
//! [`ParticleSet`]: a struct of parallel `Vec<f64>` columns. All columns of a
//! set always have the same length, and structural edits (push, append,
//! remove) resize every column together and bump a generation counter, which
//! lets the solver detect neighbor indices captured before the edit and
//! refuse to use them. `extract` copies rows out into a new set, leaving the
//! source untouched.

use crate::error::Error;

/// Number of columns in a [`ParticleSet`].
const COLUMN_COUNT: usize = 33;

/// Column names, in the order `columns()` and `columns_mut()` return them.
const COLUMN_NAMES: [&str; COLUMN_COUNT] = [
    "x", "y", "z", "vx", "vy", "vz", "ax", "ay", "az", "tvx", "tvy", "tvz",
    "tax", "tay", "taz", "svx", "svy", "svz", "dax", "day", "daz", "x0", "y0",
    "z0", "vx0", "vy0", "vz0", "mass", "density", "pressure", "h", "nden",
    "wsum",
];

/// Structure-of-arrays storage for one particle species.
///
/// Columns are public: equations and integrators read and write them
/// directly. Structural changes must go through the methods below so the
/// uniform-length invariant holds.
#[derive(Debug, Clone, Default)]
pub struct ParticleSet {
    name: String,
    generation: u64,
    /// X positions
    pub x: Vec<f64>,
    /// Y positions
    pub y: Vec<f64>,
    /// Z positions
    pub z: Vec<f64>,
    /// X momentum velocities
    pub vx: Vec<f64>,
    /// Y momentum velocities
    pub vy: Vec<f64>,
    /// Z momentum velocities
    pub vz: Vec<f64>,
    /// X physical accelerations (pressure + viscous + stress)
    pub ax: Vec<f64>,
    /// Y physical accelerations
    pub ay: Vec<f64>,
    /// Z physical accelerations
    pub az: Vec<f64>,
    /// X transport velocities (positions advect with these)
    pub tvx: Vec<f64>,
    /// Y transport velocities
    pub tvy: Vec<f64>,
    /// Z transport velocities
    pub tvz: Vec<f64>,
    /// X transport accelerations (background-pressure contribution)
    pub tax: Vec<f64>,
    /// Y transport accelerations
    pub tay: Vec<f64>,
    /// Z transport accelerations
    pub taz: Vec<f64>,
    /// X Shepard-filtered velocities
    pub svx: Vec<f64>,
    /// Y Shepard-filtered velocities
    pub svy: Vec<f64>,
    /// Z Shepard-filtered velocities
    pub svz: Vec<f64>,
    /// X prescribed drive accelerations (rigid bodies)
    pub dax: Vec<f64>,
    /// Y prescribed drive accelerations
    pub day: Vec<f64>,
    /// Z prescribed drive accelerations
    pub daz: Vec<f64>,
    /// X positions at the start of the current step (rigid predictor)
    pub x0: Vec<f64>,
    /// Y positions at the start of the current step
    pub y0: Vec<f64>,
    /// Z positions at the start of the current step
    pub z0: Vec<f64>,
    /// X velocities at the start of the current step; also the wall velocity
    /// seen by the no-slip boundary condition
    pub vx0: Vec<f64>,
    /// Y velocities at the start of the current step
    pub vy0: Vec<f64>,
    /// Z velocities at the start of the current step
    pub vz0: Vec<f64>,
    /// Particle masses
    pub mass: Vec<f64>,
    /// Mass densities
    pub density: Vec<f64>,
    /// Pressures
    pub pressure: Vec<f64>,
    /// Smoothing lengths
    pub h: Vec<f64>,
    /// Number densities (sum of kernel weights over neighbors)
    pub nden: Vec<f64>,
    /// Wall-pressure extrapolation weight sums
    pub wsum: Vec<f64>,
}

impl ParticleSet {
    /// Create an empty set for the given species name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Species name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Structural generation. Bumped by every push/append/remove/extract,
    /// so indices captured under an older generation are stale.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of particles.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// True if the set holds no particles.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Append one particle. Position, mass, density and smoothing length are
    /// set; every other column gets zero.
    pub fn push(&mut self, x: f64, y: f64, z: f64, mass: f64, density: f64, h: f64) {
        for col in self.columns_mut() {
            col.push(0.0);
        }
        let i = self.x.len() - 1;
        self.x[i] = x;
        self.y[i] = y;
        self.z[i] = z;
        self.mass[i] = mass;
        self.density[i] = density;
        self.h[i] = h;
        self.generation += 1;
    }

    /// Append every particle of `donor`, column by column.
    pub fn append(&mut self, donor: &ParticleSet) {
        for (dst, src) in self.columns_mut().into_iter().zip(donor.columns()) {
            dst.extend_from_slice(src);
        }
        self.generation += 1;
    }

    /// Remove the particles at `indices`, compacting the survivors in their
    /// original relative order. Out-of-range entries are ignored.
    pub fn remove(&mut self, indices: &[usize]) {
        let n = self.len();
        let mut keep = vec![true; n];
        for &i in indices {
            if i < n {
                keep[i] = false;
            }
        }
        for col in self.columns_mut() {
            let mut w = 0;
            for r in 0..n {
                if keep[r] {
                    col[w] = col[r];
                    w += 1;
                }
            }
            col.truncate(w);
        }
        self.generation += 1;
    }

    /// Copy the particles at `indices` (in the given order) into a new set
    /// named `name`. The source set is left unchanged; pair with [`remove`]
    /// to split one set into two.
    ///
    /// # Panics
    /// Panics if an index is out of range.
    ///
    /// [`remove`]: ParticleSet::remove
    pub fn extract(&self, indices: &[usize], name: &str) -> ParticleSet {
        let mut out = ParticleSet::new(name);
        for (dst, src) in out.columns_mut().into_iter().zip(self.columns()) {
            dst.reserve(indices.len());
            for &i in indices {
                dst.push(src[i]);
            }
        }
        out
    }

    /// Column slice by name, for output layers that select fields at run
    /// time. Returns `None` for unknown names.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        COLUMN_NAMES
            .iter()
            .position(|&n| n == name)
            .map(|i| self.columns()[i].as_slice())
    }

    /// Name of the first column holding a non-finite value, if any.
    pub(crate) fn first_non_finite(&self) -> Option<&'static str> {
        for (&name, col) in COLUMN_NAMES.iter().zip(self.columns()) {
            if col.iter().any(|v| !v.is_finite()) {
                return Some(name);
            }
        }
        None
    }

    /// All columns, in `COLUMN_NAMES` order. Keep the name list and the two
    /// accessors aligned when adding a column.
    fn columns(&self) -> [&Vec<f64>; COLUMN_COUNT] {
        [
            &self.x, &self.y, &self.z, &self.vx, &self.vy, &self.vz, &self.ax,
            &self.ay, &self.az, &self.tvx, &self.tvy, &self.tvz, &self.tax,
            &self.tay, &self.taz, &self.svx, &self.svy, &self.svz, &self.dax,
            &self.day, &self.daz, &self.x0, &self.y0, &self.z0, &self.vx0,
            &self.vy0, &self.vz0, &self.mass, &self.density, &self.pressure,
            &self.h, &self.nden, &self.wsum,
        ]
    }

    fn columns_mut(&mut self) -> [&mut Vec<f64>; COLUMN_COUNT] {
        [
            &mut self.x, &mut self.y, &mut self.z, &mut self.vx, &mut self.vy,
            &mut self.vz, &mut self.ax, &mut self.ay, &mut self.az,
            &mut self.tvx, &mut self.tvy, &mut self.tvz, &mut self.tax,
            &mut self.tay, &mut self.taz, &mut self.svx, &mut self.svy,
            &mut self.svz, &mut self.dax, &mut self.day, &mut self.daz,
            &mut self.x0, &mut self.y0, &mut self.z0, &mut self.vx0,
            &mut self.vy0, &mut self.vz0, &mut self.mass, &mut self.density,
            &mut self.pressure, &mut self.h, &mut self.nden, &mut self.wsum,
        ]
    }
}

/// All particle sets of one run, addressed by species name.
///
/// Names resolve to indices once, when equations and steppers are bound;
/// after that the hot path works with plain indices.
#[derive(Debug, Default)]
pub struct ParticleStore {
    sets: Vec<ParticleSet>,
}

impl ParticleStore {
    /// Build a store from the given sets. Species names must be unique and
    /// non-empty.
    pub fn new(sets: Vec<ParticleSet>) -> Result<Self, Error> {
        for (i, set) in sets.iter().enumerate() {
            if set.name().is_empty() {
                return Err(Error::Configuration(format!(
                    "particle set {i} has an empty species name"
                )));
            }
            if sets[..i].iter().any(|other| other.name() == set.name()) {
                return Err(Error::Configuration(format!(
                    "duplicate species name `{}`",
                    set.name()
                )));
            }
        }
        Ok(Self { sets })
    }

    /// Number of species.
    pub fn species_count(&self) -> usize {
        self.sets.len()
    }

    /// All sets, in insertion order.
    pub fn sets(&self) -> &[ParticleSet] {
        &self.sets
    }

    /// Resolve a species name to its index.
    pub fn index_of(&self, name: &str) -> Result<usize, Error> {
        self.sets
            .iter()
            .position(|s| s.name() == name)
            .ok_or_else(|| Error::Configuration(format!("unknown species `{name}`")))
    }

    /// Set at a resolved index.
    ///
    /// # Panics
    /// Panics if `index` was not obtained from [`index_of`].
    ///
    /// [`index_of`]: ParticleStore::index_of
    pub fn set(&self, index: usize) -> &ParticleSet {
        &self.sets[index]
    }

    /// Mutable set at a resolved index.
    ///
    /// # Panics
    /// Panics if `index` was not obtained from [`index_of`].
    ///
    /// [`index_of`]: ParticleStore::index_of
    pub fn set_mut(&mut self, index: usize) -> &mut ParticleSet {
        &mut self.sets[index]
    }

    /// Set by species name, if present.
    pub fn by_name(&self, name: &str) -> Option<&ParticleSet> {
        self.sets.iter().find(|s| s.name() == name)
    }

    /// Generation of every set, in index order.
    pub fn generations(&self) -> Vec<u64> {
        self.sets.iter().map(|s| s.generation()).collect()
    }
}
