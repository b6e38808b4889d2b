use std::path::Path;

use flight_simulation::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let scenario = match std::env::args().nth(1) {
        Some(path) => load_scenario(path)?,
        None => ScenarioConfig::reference(),
    };

    let rocket = scenario.rocket()?;
    let mission = scenario.mission()?;

    let mut aerodynamics = scenario.aerodynamics_model()?;
    aerodynamics.prepare(&rocket.geometry, Path::new(&scenario.coefficient_resource))?;

    let geometry = rocket.geometry.clone();
    let integrator =
        TrajectoryIntegrator::new(rocket, &aerodynamics, mission, scenario.integration)?
            .with_policy(scenario.policy.build());

    let run = integrator.run();
    let evaluator = scenario.evaluator();
    let report = evaluator.evaluate_run(&run, &geometry);

    match &run {
        Ok(result) => {
            println!("{}", result.log.summary());
            println!("Termination: {}", result.termination);
            for event in &result.events {
                println!("  {:>8.3} s  {:?}", event.time(), event);
            }
            println!(
                "Final state: V = {:.2} m/s, theta = {:.2} deg, m = {:.2} kg, \
                 x = {:.1} m, y = {:.1} m",
                result.v_final,
                result.theta_final.to_degrees(),
                result.m_final,
                result.x_final,
                result.y_final
            );
            let flags = FeasibilityFlags::from_result(result, evaluator.config());
            println!("Feasibility: {:?} (ok = {})", flags, flags.ok());
        }
        Err(e) => {
            println!("Error during simulation: {}", e);
            if let Some(partial) = e.partial_log() {
                println!("{}", partial.summary());
            }
        }
    }

    println!("Constraints: {}", report.summary());

    Ok(())
}
