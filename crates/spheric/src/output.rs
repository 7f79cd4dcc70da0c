//! JSON snapshot output.
//!
//! One pretty-printed JSON file per requested output time, holding the time
//! stamp and a per-species map of column name to value array. Column-oriented
//! output keeps the files trivially loadable for plotting without a custom
//! reader.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::Serialize;
use sph::{Error, ParticleStore, SnapshotWriter};
use tracing::info;

/// Fluid columns kept for post-processing.
const FLUID_COLUMNS: [&str; 9] = [
    "x", "y", "vx", "vy", "density", "pressure", "nden", "mass", "h",
];

/// Wall columns: geometry, wall velocity and the extrapolated state.
const WALL_COLUMNS: [&str; 6] = ["x", "y", "vx0", "vy0", "density", "pressure"];

#[derive(Serialize)]
struct Snapshot<'a> {
    t: f64,
    species: BTreeMap<&'a str, BTreeMap<&'a str, &'a [f64]>>,
}

/// Snapshot writer emitting `snapshot_0000.json`, `snapshot_0001.json`, ...
/// into one directory, numbered in the order they are written.
pub struct JsonSnapshotWriter {
    dir: PathBuf,
    columns: Vec<(String, Vec<&'static str>)>,
    count: u32,
}

impl JsonSnapshotWriter {
    /// Create a writer emitting the given columns per species into `dir`,
    /// creating the directory if it is missing.
    pub fn new(
        dir: impl Into<PathBuf>,
        columns: Vec<(String, Vec<&'static str>)>,
    ) -> Result<Self, Error> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| Error::Output(format!("cannot create `{}`: {e}", dir.display())))?;
        Ok(Self {
            dir,
            columns,
            count: 0,
        })
    }

    /// Writer preconfigured for the moving-square species layout.
    pub fn benchmark(dir: impl Into<PathBuf>) -> Result<Self, Error> {
        Self::new(
            dir,
            vec![
                ("fluid".to_string(), FLUID_COLUMNS.to_vec()),
                ("solid".to_string(), WALL_COLUMNS.to_vec()),
                ("obstacle".to_string(), WALL_COLUMNS.to_vec()),
            ],
        )
    }
}

impl SnapshotWriter for JsonSnapshotWriter {
    fn write(&mut self, t: f64, store: &ParticleStore) -> Result<(), Error> {
        let mut species = BTreeMap::new();
        for (name, wanted) in &self.columns {
            let set = store
                .by_name(name)
                .ok_or_else(|| Error::Output(format!("unknown species `{name}`")))?;
            let mut fields = BTreeMap::new();
            for &column in wanted {
                let values = set.column(column).ok_or_else(|| {
                    Error::Output(format!("unknown column `{column}` on `{name}`"))
                })?;
                fields.insert(column, values);
            }
            species.insert(name.as_str(), fields);
        }

        let body = serde_json::to_string_pretty(&Snapshot { t, species })
            .map_err(|e| Error::Output(format!("cannot serialize snapshot: {e}")))?;
        let path = self.dir.join(format!("snapshot_{:04}.json", self.count));
        fs::write(&path, body)
            .map_err(|e| Error::Output(format!("cannot write `{}`: {e}", path.display())))?;

        info!(path = %path.display(), t, "wrote snapshot");
        self.count += 1;
        Ok(())
    }
}
