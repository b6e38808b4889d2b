use std::sync::Arc;

use rayon::prelude::*;

use super::constraints::ConstraintEvaluator;
use super::feasibility::FeasibilityFlags;
use super::report::ViolationReport;
use crate::control::guidance::PitchPolicyConfig;
use crate::control::mission::{IntegrationSettings, Mission};
use crate::control::propulsion::PropulsionLaw;
use crate::control::rocket::Rocket;
use crate::errors::SimulationResult;
use crate::trajectory_system::coefficient_table::CoefficientTable;
use crate::trajectory_system::flight_phase::TerminationReason;
use crate::trajectory_system::kinematics::{BallisticsCalculationResult, TrajectoryIntegrator};

/// One launch/motor variant of a fixed airframe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub mission: Mission,
    pub propulsion: PropulsionLaw,
    pub policy: PitchPolicyConfig,
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub candidate: usize,
    pub report: ViolationReport,
    pub termination: Option<TerminationReason>,
    pub flags: Option<FeasibilityFlags>,
}

impl BatchOutcome {
    pub fn score(&self) -> f64 {
        self.report.total()
    }
}

fn run_candidate(
    rocket: &Rocket,
    table: &Arc<CoefficientTable>,
    candidate: &Candidate,
    settings: &IntegrationSettings,
) -> SimulationResult<BallisticsCalculationResult> {
    let variant = rocket.with_propulsion(candidate.propulsion)?;
    TrajectoryIntegrator::with_table(variant, Arc::clone(table), candidate.mission, *settings)?
        .with_policy(candidate.policy.build())
        .run()
}

/// Integrate and score every candidate in parallel against one shared table.
pub fn evaluate_batch(
    rocket: &Rocket,
    table: Arc<CoefficientTable>,
    candidates: &[Candidate],
    settings: &IntegrationSettings,
    evaluator: &ConstraintEvaluator,
) -> Vec<BatchOutcome> {
    log::debug!("scoring {} candidates", candidates.len());
    candidates
        .par_iter()
        .enumerate()
        .map(|(index, candidate)| {
            let run = run_candidate(rocket, &table, candidate, settings);
            let report = evaluator.evaluate_run(&run, &rocket.geometry);
            let (termination, flags) = match &run {
                Ok(result) => (
                    Some(result.termination),
                    Some(FeasibilityFlags::from_result(result, evaluator.config())),
                ),
                Err(_) => (None, None),
            };
            BatchOutcome {
                candidate: index,
                report,
                termination,
                flags,
            }
        })
        .collect()
}

/// Lowest-scoring outcome; ties go to the earlier candidate.
pub fn best(outcomes: &[BatchOutcome]) -> Option<&BatchOutcome> {
    outcomes
        .iter()
        .min_by(|a, b| a.score().total_cmp(&b.score()).then(a.candidate.cmp(&b.candidate)))
}
