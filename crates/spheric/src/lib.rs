//! SPHERIC benchmark test 6: flow around a moving square
//!
//! This crate assembles the `sph` engine into the benchmark case, including:
//! - JSON case configuration with validation and derived constants
//! - Particle lattice generation and species splitting
//! - The transport-velocity equation wiring and the prescribed square drive
//! - JSON snapshot output at the requested times
//!
//! The binary loads a configuration (or uses the published defaults), builds
//! the solver and runs it to `t_final`.

#![warn(missing_docs)]

pub mod config;
pub mod lattice;
pub mod moving_square;
pub mod output;

pub use config::CaseConfig;
pub use moving_square::{benchmark_acceleration, build_solver, build_store, case_groups};
pub use output::JsonSnapshotWriter;
