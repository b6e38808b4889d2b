use std::path::{Path, PathBuf};
use std::sync::Arc;

use approx::assert_relative_eq;
use flight_simulation::telemetry_system::log_format::{read_log, write_log};
use flight_simulation::trajectory_system::aerodynamics::prepare_many;
use flight_simulation::control::guidance::PolicyContext;
use flight_simulation::{
    join, load_scenario, AeroSettings, AerodynamicsModel, BallisticsCalculationResult,
    CoefficientTable, ConstraintEvaluator, FeasibilityFlags, FlightEvent, FlightState,
    GeometryModel, Mission, PitchPolicy, PropulsionLaw, PropulsionProfile, Rocket, ScenarioConfig,
    SimulationError, TerminationReason, TrajectoryIntegrator, ViolationKind,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn reference_scenario_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios").join("reference.toml")
}

// Prepare the coefficient table in `dir` and fly the scenario once.
fn fly(
    scenario: &ScenarioConfig,
    dir: &Path,
) -> (GeometryModel, Result<BallisticsCalculationResult, SimulationError>) {
    let rocket = scenario.rocket().expect("reference rocket should be valid");
    let mission = scenario.mission().expect("reference mission should be valid");
    let mut aerodynamics = scenario.aerodynamics_model().unwrap();
    aerodynamics
        .prepare(&rocket.geometry, &dir.join(&scenario.coefficient_resource))
        .expect("coefficient table should be written");

    let geometry = rocket.geometry.clone();
    let run = TrajectoryIntegrator::new(rocket, &aerodynamics, mission, scenario.integration)
        .unwrap()
        .with_policy(scenario.policy.build())
        .run();
    (geometry, run)
}

#[test]
fn test_reference_pipeline_end_to_end() {
    println!("INTEGRATION TEST: prepare -> integrate -> join -> evaluate");
    let dir = tempfile::tempdir().unwrap();
    let scenario = load_scenario(reference_scenario_path()).unwrap();

    let (geometry, run) = fly(&scenario, dir.path());
    let result = run.as_ref().expect("reference run should not diverge");
    println!("{}", result.log.summary());

    assert_eq!(
        result.termination,
        TerminationReason::TargetReached,
        "reference target sits on the launch line and should be reached"
    );
    assert!(result.x_final >= scenario.target.x);
    assert!(result.m_final < scenario.launch.m_0, "motor should have burned propellant");
    assert!(matches!(result.events.first(), Some(FlightEvent::Launch { .. })));
    assert!(matches!(result.events.last(), Some(FlightEvent::Terminated { .. })));

    let joined = join(&result.log.kinematic, &result.log.force, &result.log.auxiliary);
    assert_eq!(joined.dropped, 0, "integrator logs every step in all three streams");
    assert_eq!(joined.points.len(), result.log.len());

    let report = scenario.evaluator().evaluate_run(&run, &geometry);
    println!("{}", report.summary());
    assert!(report.total().is_finite());
    assert!(report.total() >= 0.0);
    assert_eq!(report.count(ViolationKind::BallisticsFailure), 0);
    assert_eq!(report.count(ViolationKind::NoPoints), 0);
    assert_eq!(report.count(ViolationKind::MissingPoint), 0);
    assert_eq!(report.count(ViolationKind::NonFiniteData), 0);

    // the target is reached with the motor still burning
    assert!(result.mdot_final < 0.0);
    assert_eq!(report.count(ViolationKind::TerminalMassFlow), 0);
    assert!(FeasibilityFlags::from_result(result, scenario.evaluator().config()).mdot_ok);
}

#[test]
fn test_coefficient_table_reused_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let resource = dir.path().join("3.ad.csv");
    let rocket = Rocket::reference().unwrap();

    let mut first = AerodynamicsModel::new(AeroSettings::default()).unwrap();
    let built = first.prepare(&rocket.geometry, &resource).unwrap();
    assert_eq!(CoefficientTable::stored_hash(&resource), Some(rocket.geometry.fingerprint()));

    let mut second = AerodynamicsModel::new(AeroSettings::default()).unwrap();
    let reused = second.prepare(&rocket.geometry, &resource).unwrap();
    assert_eq!(reused.geometry_hash(), built.geometry_hash());
    assert_eq!(reused.rows().len(), built.rows().len());

    let mut loaded = AerodynamicsModel::default();
    loaded.load(&resource).unwrap();
    for (alpha, mach) in [(0.05, 0.9), (0.12, 1.76), (-0.08, 2.4)] {
        let a = built.evaluate(alpha, mach);
        let b = loaded.evaluate(alpha, mach).unwrap();
        assert_relative_eq!(a.c_y, b.c_y, epsilon = 1e-9);
        assert_relative_eq!(a.c_x, b.c_x, epsilon = 1e-9);
        assert_relative_eq!(a.m_z, b.m_z, epsilon = 1e-9);
    }
}

#[test]
fn test_changed_geometry_rebuilds_table() {
    let dir = tempfile::tempdir().unwrap();
    let resource = dir.path().join("3.ad.csv");
    let rocket = Rocket::reference().unwrap();
    let mut model = AerodynamicsModel::new(AeroSettings::default()).unwrap();
    model.prepare(&rocket.geometry, &resource).unwrap();

    let mut descriptor = GeometryModel::reference_descriptor();
    descriptor.wing.span *= 1.1;
    let wider = GeometryModel::new(descriptor).unwrap();
    let rebuilt = model.prepare(&wider, &resource).unwrap();

    assert_eq!(rebuilt.geometry_hash(), wider.fingerprint());
    assert_eq!(CoefficientTable::stored_hash(&resource), Some(wider.fingerprint()));
}

#[test]
fn test_mass_never_increases_with_burned_fraction() {
    let mut rng = StdRng::seed_from_u64(7);
    let rocket = Rocket::reference().unwrap();
    let mut fractions: Vec<f64> = (0..200).map(|_| rng.gen_range(0.0..=1.0)).collect();
    fractions.sort_by(f64::total_cmp);

    let masses: Vec<f64> = fractions
        .iter()
        .map(|&f| rocket.mass_budget.compute(f).unwrap().mass)
        .collect();
    assert!(masses.windows(2).all(|w| w[1] <= w[0]));
    assert!(masses.iter().all(|&m| m >= rocket.mass_budget.empty_mass() - 1e-9));
}

#[test]
fn test_propulsion_silent_outside_burn_window() {
    let mut rng = StdRng::seed_from_u64(11);
    let profile = PropulsionProfile::new(PropulsionLaw::reference()).unwrap();
    let burn = profile.burn_duration();

    for _ in 0..200 {
        let before = -rng.gen_range(1e-6..100.0);
        let after = burn + rng.gen_range(1e-6..100.0);
        for t in [before, after] {
            let state = profile.at(t);
            assert_eq!(state.mass_flow_rate, 0.0, "no mass flow at t = {t}");
            assert_eq!(state.thrust, 0.0, "no thrust at t = {t}");
        }
        let inside = rng.gen_range(0.0..=burn);
        assert!(profile.at(inside).mass_flow_rate < 0.0);
    }
}

#[test]
fn test_aerodynamic_lookup_is_deterministic() {
    let mut rng = StdRng::seed_from_u64(23);
    let rocket = Rocket::reference().unwrap();
    let settings = AeroSettings::default();
    let tables = prepare_many(&[rocket.geometry.clone(), rocket.geometry.clone()], &settings);
    let sequential = CoefficientTable::build(&rocket.geometry, &settings);

    for _ in 0..200 {
        let alpha = rng.gen_range(-0.4..0.4);
        let mach = rng.gen_range(0.1..5.0);
        let reference = sequential.evaluate(alpha, mach);
        assert_eq!(tables[0].evaluate(alpha, mach), reference);
        assert_eq!(tables[1].evaluate(alpha, mach), reference);
        assert_eq!(sequential.evaluate(alpha, mach), reference);
    }
}

#[test]
fn test_joiner_drops_steps_missing_from_any_stream() {
    let dir = tempfile::tempdir().unwrap();
    let (_, run) = fly(&ScenarioConfig::reference(), dir.path());
    let mut log = run.unwrap().log;
    let total = log.len();

    let mut rng = StdRng::seed_from_u64(5);
    let mut removed = 0;
    log.force.retain(|_| {
        let keep = rng.gen_bool(0.9);
        if !keep {
            removed += 1;
        }
        keep
    });

    let joined = join(&log.kinematic, &log.force, &log.auxiliary);
    assert_eq!(joined.dropped, removed);
    assert_eq!(joined.points.len(), total - removed);
    assert!(joined.points.windows(2).all(|w| w[1].step > w[0].step));
}

#[test]
fn test_persisted_logs_score_like_in_memory() {
    let dir = tempfile::tempdir().unwrap();
    let scenario = ScenarioConfig::reference();
    let (geometry, run) = fly(&scenario, dir.path());
    let evaluator = scenario.evaluator();
    let in_memory = evaluator.evaluate_run(&run, &geometry);

    let result = run.unwrap();
    let paths = write_log(&result.log, dir.path(), "reference").unwrap();
    assert!(paths.iter().all(|p| p.exists()));

    let restored = read_log(dir.path(), "reference").unwrap();
    assert_eq!(restored.len(), result.log.len());
    let joined = join(&restored.kinematic, &restored.force, &restored.auxiliary);
    let from_disk = evaluator.evaluate_joined(&joined, &geometry);

    assert_eq!(from_disk.violations().len(), in_memory.violations().len());
    assert_relative_eq!(
        from_disk.total(),
        in_memory.total(),
        epsilon = 1e-9,
        max_relative = 1e-12
    );
}

#[derive(Debug)]
struct UndefinedAttack;

impl PitchPolicy for UndefinedAttack {
    fn angle_of_attack(&self, _: &FlightState, _: &PolicyContext) -> f64 {
        f64::NAN
    }

    fn name(&self) -> &'static str {
        "undefined"
    }
}

#[test]
fn test_failed_runs_still_get_a_score() {
    let rocket = Rocket::reference().unwrap();
    let geometry = rocket.geometry.clone();
    let table = Arc::new(CoefficientTable::build(&geometry, &AeroSettings::default()));

    let mission = Mission::reference();
    let run = TrajectoryIntegrator::with_table(rocket, table, mission, Default::default())
        .unwrap()
        .with_policy(Box::new(UndefinedAttack))
        .run();
    assert!(matches!(run, Err(SimulationError::IntegrationDiverged { .. })));

    let evaluator = ConstraintEvaluator::new(Default::default());
    let report = evaluator.evaluate_run(&run, &geometry);
    assert_eq!(report.total(), 1000.0);
    assert_eq!(report.count(ViolationKind::BallisticsFailure), 1);

    let empty = evaluator.evaluate(&[], &geometry);
    assert_eq!(empty.total(), 1000.0);
    assert_eq!(empty.violations().len(), 1);
    assert_eq!(empty.count(ViolationKind::NoPoints), 1);
}
