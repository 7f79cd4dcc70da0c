//! End-to-end runs of the benchmark case on a coarse lattice.
//!
//! nx = 5 keeps the particle count in the hundreds so the full pipeline
//! (seeding, equation groups, integration, snapshots) stays fast enough for
//! a unit-test run while exercising exactly the production wiring.

use std::fs;
use std::path::PathBuf;

use spheric::{build_solver, CaseConfig, JsonSnapshotWriter};

fn scratch_dir(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!("spheric-smoke-{label}-{}", std::process::id()))
}

fn coarse_config(label: &str) -> CaseConfig {
    let mut config = CaseConfig::default();
    config.nx = 5;
    config.t_final = 0.05;
    config.output_times = vec![0.025];
    config.output_dir = scratch_dir(label).to_string_lossy().into_owned();
    config.validate().expect("coarse config must validate");
    config
}

#[test]
fn coarse_case_runs_to_t_final_and_writes_snapshots() {
    let config = coarse_config("run");
    let mut solver = build_solver(&config).expect("solver assembly failed");
    let mut writer =
        JsonSnapshotWriter::benchmark(&config.output_dir).expect("writer setup failed");

    solver.run(&mut writer).expect("run failed before t_final");

    assert!(solver.time() >= config.t_final);
    assert!(solver.step_count() > 0);

    let path = PathBuf::from(&config.output_dir).join("snapshot_0000.json");
    let body = fs::read_to_string(&path).expect("first snapshot missing");
    let value: serde_json::Value = serde_json::from_str(&body).expect("snapshot must parse");
    assert!(
        value["t"].as_f64().expect("snapshot time stamp") >= 0.025,
        "snapshot fired before its output time"
    );

    let fluid = solver.store().by_name("fluid").expect("fluid species");
    let written = value["species"]["fluid"]["x"]
        .as_array()
        .expect("fluid x column")
        .len();
    assert_eq!(written, fluid.len(), "snapshot row count");

    let _ = fs::remove_dir_all(&config.output_dir);
}

#[test]
fn the_square_starts_moving_and_the_walls_do_not() {
    let config = coarse_config("motion");
    let mut solver = build_solver(&config).expect("solver assembly failed");

    let start_x = solver.store().by_name("obstacle").expect("obstacle").x[0];
    let dt = config.fixed_dt();
    for _ in 0..20 {
        solver.step(dt).expect("step failed");
    }

    let store = solver.store();
    let obstacle = store.by_name("obstacle").expect("obstacle species");
    assert!(
        obstacle.vx[0] > 0.0,
        "the drive must accelerate the square in +x"
    );
    assert!(
        obstacle.vx[0] < 0.1,
        "the ramp has barely started at t = {}",
        solver.time()
    );
    assert!(obstacle.x[0] > start_x, "the square must have moved");
    // Rigid motion: every square particle carries the same velocity.
    for k in 0..obstacle.len() {
        assert_eq!(obstacle.vx[k], obstacle.vx[0]);
        assert_eq!(obstacle.vy[k], 0.0);
    }

    let solid = store.by_name("solid").expect("solid species");
    for k in 0..solid.len() {
        assert_eq!(solid.vx[k], 0.0, "tank walls must not move");
        assert_eq!(solid.vy[k], 0.0);
        assert_eq!(solid.ax[k], 0.0);
    }

    let fluid = store.by_name("fluid").expect("fluid species");
    for k in 0..fluid.len() {
        assert!(
            (fluid.density[k] - config.rho0).abs() < 0.05,
            "density drifted to {} at site {k} by t = {}",
            fluid.density[k],
            solver.time()
        );
    }
}
