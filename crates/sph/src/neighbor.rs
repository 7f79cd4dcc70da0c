//! Neighbor search.
//!
//! The solver consumes spatial indexing through the [`NeighborFinder`] trait
//! and ships one implementation, [`UniformGrid`]: a counting-sort uniform
//! grid with one section per species. Queries are by position, so a particle
//! found at the query point itself is reported too (a self-pair has r = 0 and
//! a zero kernel gradient, which the equations rely on).
//!
//! The index is rebuilt once per step. Between rebuild and use, structural
//! edits to the particle sets are detected through the sets' generation
//! counters and refused by the solver.

use crate::particle::ParticleStore;

/// Spatial index contract.
pub trait NeighborFinder: Send {
    /// Rebuild the index over every set in the store. `max_support` is the
    /// largest kernel cutoff any query will use.
    fn rebuild(&mut self, store: &ParticleStore, max_support: f64);

    /// Visit the index of every particle of `species` within `radius` of
    /// `pos` (inclusive: a particle at exactly `radius` is visited).
    fn query(
        &self,
        store: &ParticleStore,
        species: usize,
        pos: [f64; 3],
        radius: f64,
        visit: &mut dyn FnMut(usize),
    );

    /// True if the index still matches the store (same species, same
    /// structural generations) since the last rebuild.
    fn in_sync(&self, store: &ParticleStore) -> bool;
}

/// Per-species counting-sort data.
#[derive(Debug, Default)]
struct GridSection {
    /// Flat cell index of each particle, in particle order.
    cell_of: Vec<u32>,
    /// Particle indices grouped by cell.
    sorted: Vec<u32>,
    /// Per cell: offset of its group in `sorted`.
    starts: Vec<u32>,
    /// Per cell: group length.
    counts: Vec<u32>,
}

/// Uniform background grid over all particle sets.
///
/// Cell size equals the maximum support radius, so a query within that
/// radius only has to walk the 3x3 (2D) or 3x3x3 (3D) cell neighborhood;
/// larger query radii walk a correspondingly wider ring. Grid bounds are
/// derived from the live particle positions at every rebuild.
#[derive(Debug, Default)]
pub struct UniformGrid {
    cell_size: f64,
    grid_min: [f64; 3],
    dims: [usize; 3],
    sections: Vec<GridSection>,
    generations: Vec<u64>,
}

impl UniformGrid {
    /// Create an empty grid; call [`NeighborFinder::rebuild`] before use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cell coordinate of a position, clamped onto the grid.
    fn cell_coord(&self, pos: [f64; 3]) -> [usize; 3] {
        let mut coord = [0usize; 3];
        for axis in 0..3 {
            let rel = (pos[axis] - self.grid_min[axis]) / self.cell_size;
            coord[axis] = (rel.max(0.0) as usize).min(self.dims[axis] - 1);
        }
        coord
    }

    /// Flat index of a cell coordinate.
    fn cell_index(&self, coord: [usize; 3]) -> usize {
        (coord[2] * self.dims[1] + coord[1]) * self.dims[0] + coord[0]
    }
}

impl NeighborFinder for UniformGrid {
    fn rebuild(&mut self, store: &ParticleStore, max_support: f64) {
        self.cell_size = max_support.max(1.0e-12);

        // Bounds over every particle of every set.
        let mut min = [f64::INFINITY; 3];
        let mut max = [f64::NEG_INFINITY; 3];
        for set in store.sets() {
            for i in 0..set.len() {
                let p = [set.x[i], set.y[i], set.z[i]];
                for axis in 0..3 {
                    min[axis] = min[axis].min(p[axis]);
                    max[axis] = max[axis].max(p[axis]);
                }
            }
        }
        if min[0] > max[0] {
            // No particles anywhere; keep a single-cell grid.
            min = [0.0; 3];
            max = [0.0; 3];
        }
        self.grid_min = min;
        for axis in 0..3 {
            let extent = max[axis] - min[axis];
            self.dims[axis] = ((extent / self.cell_size).ceil() as usize).max(1);
        }
        let dims = self.dims;
        let cell_size = self.cell_size;
        let n_cells = dims[0] * dims[1] * dims[2];

        self.sections
            .resize_with(store.species_count(), GridSection::default);
        for (section, set) in self.sections.iter_mut().zip(store.sets()) {
            let n = set.len();
            section.counts.clear();
            section.counts.resize(n_cells, 0);
            section.cell_of.clear();
            section.cell_of.reserve(n);
            for i in 0..n {
                let mut coord = [0usize; 3];
                for axis in 0..3 {
                    let rel = ([set.x[i], set.y[i], set.z[i]][axis] - min[axis]) / cell_size;
                    coord[axis] = (rel.max(0.0) as usize).min(dims[axis] - 1);
                }
                let cell = ((coord[2] * dims[1] + coord[1]) * dims[0] + coord[0]) as u32;
                section.cell_of.push(cell);
                section.counts[cell as usize] += 1;
            }
            // Exclusive prefix sum, then scatter with a moving cursor.
            section.starts.clear();
            section.starts.resize(n_cells, 0);
            let mut running = 0u32;
            for cell in 0..n_cells {
                section.starts[cell] = running;
                running += section.counts[cell];
            }
            section.sorted.clear();
            section.sorted.resize(n, 0);
            let mut cursor = section.starts.clone();
            for i in 0..n {
                let cell = section.cell_of[i] as usize;
                section.sorted[cursor[cell] as usize] = i as u32;
                cursor[cell] += 1;
            }
        }
        self.generations = store.generations();
    }

    fn query(
        &self,
        store: &ParticleStore,
        species: usize,
        pos: [f64; 3],
        radius: f64,
        visit: &mut dyn FnMut(usize),
    ) {
        let section = &self.sections[species];
        if section.cell_of.is_empty() {
            return;
        }
        let set = store.set(species);
        let r2 = radius * radius;
        let ring = (radius / self.cell_size).ceil() as usize;
        let center = self.cell_coord(pos);

        let lo = |c: usize| c.saturating_sub(ring);
        let hi = |c: usize, dim: usize| (c + ring).min(dim - 1);
        for cz in lo(center[2])..=hi(center[2], self.dims[2]) {
            for cy in lo(center[1])..=hi(center[1], self.dims[1]) {
                for cx in lo(center[0])..=hi(center[0], self.dims[0]) {
                    let cell = self.cell_index([cx, cy, cz]);
                    let start = section.starts[cell] as usize;
                    let count = section.counts[cell] as usize;
                    for &j in &section.sorted[start..start + count] {
                        let j = j as usize;
                        let dx = pos[0] - set.x[j];
                        let dy = pos[1] - set.y[j];
                        let dz = pos[2] - set.z[j];
                        if dx * dx + dy * dy + dz * dz <= r2 {
                            visit(j);
                        }
                    }
                }
            }
        }
    }

    fn in_sync(&self, store: &ParticleStore) -> bool {
        self.generations == store.generations()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::ParticleSet;

    fn store_with(positions: &[(f64, f64)]) -> ParticleStore {
        let mut set = ParticleSet::new("fluid");
        for &(x, y) in positions {
            set.push(x, y, 0.0, 1.0, 1.0, 0.1);
        }
        ParticleStore::new(vec![set]).unwrap()
    }

    fn collect(grid: &UniformGrid, store: &ParticleStore, pos: [f64; 3], r: f64) -> Vec<usize> {
        let mut out = Vec::new();
        grid.query(store, 0, pos, r, &mut |j| out.push(j));
        out.sort_unstable();
        out
    }

    #[test]
    fn point_query_finds_the_particle_itself() {
        let store = store_with(&[(0.5, 0.5)]);
        let mut grid = UniformGrid::new();
        grid.rebuild(&store, 0.3);
        assert_eq!(collect(&grid, &store, [0.5, 0.5, 0.0], 0.3), vec![0]);
    }

    #[test]
    fn finds_neighbors_across_cell_boundaries() {
        let store = store_with(&[(0.0, 0.0), (0.25, 0.0), (2.0, 2.0)]);
        let mut grid = UniformGrid::new();
        grid.rebuild(&store, 0.3);
        assert_eq!(
            collect(&grid, &store, [0.0, 0.0, 0.0], 0.3),
            vec![0, 1],
            "close pair must be found, far particle excluded"
        );
    }

    #[test]
    fn exact_radius_separation_is_included() {
        let store = store_with(&[(0.0, 0.0), (0.3, 0.0)]);
        let mut grid = UniformGrid::new();
        grid.rebuild(&store, 0.3);
        assert_eq!(
            collect(&grid, &store, [0.0, 0.0, 0.0], 0.3),
            vec![0, 1],
            "distance filter is inclusive at exactly the radius"
        );
    }

    #[test]
    fn query_radius_may_exceed_the_cell_size() {
        let store = store_with(&[(0.0, 0.0), (0.65, 0.0)]);
        let mut grid = UniformGrid::new();
        grid.rebuild(&store, 0.3);
        assert_eq!(
            collect(&grid, &store, [0.0, 0.0, 0.0], 0.7),
            vec![0, 1],
            "wide queries must walk a wider cell ring"
        );
    }

    #[test]
    fn queries_are_per_species() {
        let mut fluid = ParticleSet::new("fluid");
        fluid.push(0.0, 0.0, 0.0, 1.0, 1.0, 0.1);
        let mut solid = ParticleSet::new("solid");
        solid.push(0.1, 0.0, 0.0, 1.0, 1.0, 0.1);
        solid.push(5.0, 5.0, 0.0, 1.0, 1.0, 0.1);
        let store = ParticleStore::new(vec![fluid, solid]).unwrap();
        let mut grid = UniformGrid::new();
        grid.rebuild(&store, 0.3);
        assert_eq!(collect(&grid, &store, [0.0, 0.0, 0.0], 0.3), vec![0]);
        let mut solids = Vec::new();
        grid.query(&store, 1, [0.0, 0.0, 0.0], 0.3, &mut |j| solids.push(j));
        assert_eq!(solids, vec![0], "only the nearby solid particle");
    }

    #[test]
    fn structural_edit_desyncs_the_index() {
        let mut store = store_with(&[(0.0, 0.0)]);
        let mut grid = UniformGrid::new();
        grid.rebuild(&store, 0.3);
        assert!(grid.in_sync(&store));

        store.set_mut(0).push(1.0, 0.0, 0.0, 1.0, 1.0, 0.1);
        assert!(
            !grid.in_sync(&store),
            "a structural edit after rebuild must be reported stale"
        );
    }

    #[test]
    fn empty_store_rebuild_is_harmless() {
        let store = ParticleStore::new(vec![ParticleSet::new("fluid")]).unwrap();
        let mut grid = UniformGrid::new();
        grid.rebuild(&store, 0.3);
        assert_eq!(collect(&grid, &store, [0.0, 0.0, 0.0], 0.3), Vec::<usize>::new());
    }
}
