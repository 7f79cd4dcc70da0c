//! An isolated particle must not move.
//!
//! Self-pairs contribute to kernel sums (the W(0) term in the density) but
//! the kernel gradient vanishes at zero separation, so every pair force is
//! zero. Running the full equation pipeline, including wall equations over
//! empty wall species, must leave a lone fluid particle exactly where it is.

use sph::equations::{
    MomentumEquationArtificialStress, MomentumEquationPressureGradient,
    MomentumEquationViscosity, PrescribedAcceleration, ShepardFilteredVelocity,
    SolidWallNoSlipBC, SolidWallPressureBC, StateEquation, SummationDensity,
};
use sph::{
    EquationGroup, Integrator, Kernel, KernelFamily, ParticleSet, ParticleStore, RigidBodyStep,
    Solver, SolverConfig, TimeStep, TransportVelocityStep, UniformGrid,
};

const H: f64 = 0.048;
const RHO0: f64 = 1.0;
const P0: f64 = 625.0;
const NU: f64 = 0.01;

fn case_groups() -> Vec<EquationGroup> {
    let all = &["fluid", "solid", "obstacle"];
    let walls = &["solid", "obstacle"];
    vec![
        EquationGroup::aux(vec![Box::new(PrescribedAcceleration::new(
            "obstacle",
            Box::new(|_t| [0.0, 0.0, 0.0]),
        ))]),
        EquationGroup::aux(vec![Box::new(SummationDensity::new("fluid", all))]),
        EquationGroup::aux(vec![
            Box::new(StateEquation::new("fluid", P0, RHO0, 1.0)),
            Box::new(ShepardFilteredVelocity::new("fluid", &["fluid"])),
        ]),
        EquationGroup::aux(vec![
            Box::new(SolidWallPressureBC::new("solid", &["fluid"], RHO0, P0, 1.0)),
            Box::new(SolidWallPressureBC::new(
                "obstacle",
                &["fluid"],
                RHO0,
                P0,
                1.0,
            )),
        ]),
        EquationGroup::real(vec![
            Box::new(MomentumEquationPressureGradient::new("fluid", all, P0)),
            Box::new(MomentumEquationViscosity::new("fluid", &["fluid"], NU)),
            Box::new(SolidWallNoSlipBC::new("fluid", walls, NU)),
            Box::new(MomentumEquationArtificialStress::new("fluid", &["fluid"])),
        ]),
    ]
}

#[test]
fn lone_particle_survives_the_full_pipeline_unmoved() {
    let mut fluid = ParticleSet::new("fluid");
    fluid.push(1.0, 2.0, 0.0, 1.6e-3, RHO0, H);
    let solid = ParticleSet::new("solid");
    let obstacle = ParticleSet::new("obstacle");
    let store = ParticleStore::new(vec![fluid, solid, obstacle]).unwrap();

    let mut solver = Solver::new(
        store,
        Kernel::new(KernelFamily::QuinticSpline, 2).unwrap(),
        case_groups(),
        Integrator::new()
            .with_step("fluid", Box::new(TransportVelocityStep))
            .with_step("obstacle", Box::new(RigidBodyStep)),
        Box::new(UniformGrid::new()),
        SolverConfig {
            time_step: TimeStep::Fixed(1.0e-3),
            t_final: 1.0,
            output_times: vec![],
        },
    )
    .unwrap();

    for _ in 0..5 {
        solver.step(1.0e-3).unwrap();
    }

    let fluid = solver.store().by_name("fluid").unwrap();
    assert_eq!(fluid.x[0], 1.0, "position must not drift");
    assert_eq!(fluid.y[0], 2.0);
    assert_eq!(fluid.vx[0], 0.0, "no force, no velocity");
    assert_eq!(fluid.vy[0], 0.0);

    // The self-term is all the density an isolated particle has.
    let kernel = Kernel::new(KernelFamily::QuinticSpline, 2).unwrap();
    let expected = 1.6e-3 * kernel.weight(0.0, H);
    assert_eq!(fluid.density[0], expected);
    assert!(fluid.pressure[0].is_finite());
}

#[test]
fn empty_wall_species_are_harmless() {
    // Same wiring, two interacting fluid particles, still no walls. The run
    // must stay finite and the wall sets untouched.
    let mut fluid = ParticleSet::new("fluid");
    fluid.push(0.0, 0.0, 0.0, 1.6e-3, RHO0, H);
    fluid.push(0.04, 0.0, 0.0, 1.6e-3, RHO0, H);
    let solid = ParticleSet::new("solid");
    let obstacle = ParticleSet::new("obstacle");
    let store = ParticleStore::new(vec![fluid, solid, obstacle]).unwrap();

    let mut solver = Solver::new(
        store,
        Kernel::new(KernelFamily::QuinticSpline, 2).unwrap(),
        case_groups(),
        Integrator::new()
            .with_step("fluid", Box::new(TransportVelocityStep))
            .with_step("obstacle", Box::new(RigidBodyStep)),
        Box::new(UniformGrid::new()),
        SolverConfig {
            time_step: TimeStep::Fixed(1.0e-4),
            t_final: 1.0,
            output_times: vec![],
        },
    )
    .unwrap();

    for _ in 0..5 {
        solver.step(1.0e-4).unwrap();
    }

    let fluid = solver.store().by_name("fluid").unwrap();
    for i in 0..fluid.len() {
        assert!(fluid.x[i].is_finite() && fluid.vx[i].is_finite());
        assert!(fluid.density[i] > 0.0);
    }
    assert!(solver.store().by_name("solid").unwrap().is_empty());
    assert!(solver.store().by_name("obstacle").unwrap().is_empty());
}
