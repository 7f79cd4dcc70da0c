//! Weakly-compressible SPH engine
//!
//! This crate provides the building blocks for transport-velocity SPH
//! simulations (Adami, Hu & Adams 2013), including:
//! - Named particle sets with structure-of-arrays field storage
//! - Smoothing kernels with compact support
//! - Uniform-grid neighbor search rebuilt once per step
//! - An open equation pipeline evaluated in ordered groups
//! - Two-stage predictor-corrector integration
//! - A solver loop with adaptive stepping, instability detection and
//!   snapshot output
//!
//! The crate is case-agnostic: geometry, equation wiring and output live in
//! the driver that assembles a [`Solver`].

#![warn(missing_docs)]

pub mod equation;
pub mod equations;
pub mod error;
pub mod integrator;
pub mod kernel;
pub mod neighbor;
pub mod particle;
pub mod solver;

pub use equation::{for_each_pair, Binding, Equation, EquationGroup, Pair, StepContext};
pub use error::Error;
pub use integrator::{Integrator, IntegratorStep, RigidBodyStep, TransportVelocityStep};
pub use kernel::{Kernel, KernelFamily};
pub use neighbor::{NeighborFinder, UniformGrid};
pub use particle::{ParticleSet, ParticleStore};
pub use solver::{NullWriter, SnapshotWriter, Solver, SolverConfig, TimeStep};
