use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::control::geometry::{GeometryDescriptor, GeometryModel};
use crate::control::guidance::PitchPolicyConfig;
use crate::control::mass_budget::MassInputs;
use crate::control::mission::{IntegrationSettings, LaunchConditions, Mission, TargetInfo};
use crate::control::propulsion::PropulsionLaw;
use crate::control::rocket::Rocket;
use crate::errors::SimulationResult;
use crate::evaluation::constraints::{ConstraintConfig, ConstraintEvaluator};
use crate::trajectory_system::aerodynamics::{AeroSettings, AerodynamicsModel};

fn default_resource() -> String {
    "3.ad.csv".to_string()
}

/// Everything needed to fly and score one vehicle, as read from a scenario file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    #[serde(default = "default_resource")]
    pub coefficient_resource: String,
    pub geometry: GeometryDescriptor,
    pub mass: MassInputs,
    pub propulsion: PropulsionLaw,
    pub launch: LaunchConditions,
    pub target: TargetInfo,
    #[serde(default)]
    pub integration: IntegrationSettings,
    #[serde(default)]
    pub aerodynamics: AeroSettings,
    #[serde(default)]
    pub policy: PitchPolicyConfig,
    #[serde(default)]
    pub constraints: ConstraintConfig,
}

impl ScenarioConfig {
    pub fn reference() -> Self {
        let mission = Mission::reference();
        ScenarioConfig {
            coefficient_resource: default_resource(),
            geometry: GeometryModel::reference_descriptor(),
            mass: MassInputs::reference(),
            propulsion: PropulsionLaw::reference(),
            launch: mission.launch,
            target: mission.target,
            integration: IntegrationSettings::default(),
            aerodynamics: AeroSettings::default(),
            policy: PitchPolicyConfig::default(),
            constraints: ConstraintConfig::default(),
        }
    }

    pub fn from_toml_str(contents: &str) -> SimulationResult<Self> {
        let scenario: ScenarioConfig = toml::from_str(contents)?;
        scenario.integration.validate()?;
        Ok(scenario)
    }

    pub fn rocket(&self) -> SimulationResult<Rocket> {
        Rocket::new(self.geometry, self.mass, self.propulsion)
    }

    pub fn mission(&self) -> SimulationResult<Mission> {
        Mission::new(self.launch, self.target)
    }

    pub fn aerodynamics_model(&self) -> SimulationResult<AerodynamicsModel> {
        AerodynamicsModel::new(self.aerodynamics)
    }

    pub fn evaluator(&self) -> ConstraintEvaluator {
        ConstraintEvaluator::new(self.constraints)
    }
}

/// Read a TOML scenario file.
pub fn load_scenario<P: AsRef<Path>>(path: P) -> SimulationResult<ScenarioConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)?;
    let scenario = ScenarioConfig::from_toml_str(&contents)?;
    log::debug!("loaded scenario from {}", path.display());
    Ok(scenario)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SimulationError;
    use approx::assert_relative_eq;

    const REFERENCE_TOML: &str = include_str!("../scenarios/reference.toml");

    #[test]
    fn test_bundled_scenario_matches_reference() {
        let parsed = ScenarioConfig::from_toml_str(REFERENCE_TOML).unwrap();
        let reference = ScenarioConfig::reference();

        assert_eq!(parsed.coefficient_resource, "3.ad.csv");
        assert_eq!(parsed.geometry, reference.geometry);
        assert_eq!(parsed.mass, reference.mass);
        assert_eq!(parsed.propulsion, reference.propulsion);
        assert_eq!(parsed.policy, reference.policy);
        assert_eq!(parsed.integration, reference.integration);
        assert_eq!(parsed.aerodynamics, reference.aerodynamics);
        assert_relative_eq!(parsed.launch.theta_0, reference.launch.theta_0, epsilon = 1e-12);
        assert_relative_eq!(parsed.target.x, reference.target.x, epsilon = 1e-9);
        assert_eq!(parsed.target.y, reference.target.y);

        assert_eq!(parsed.constraints.n_ymax, 12.0);
        assert_eq!(parsed.constraints.velocity_band, (1.5, 2.5));
        assert_relative_eq!(parsed.constraints.m_empty, 390.816, epsilon = 1e-9);
    }

    #[test]
    fn test_optional_sections_fall_back_to_defaults() {
        let mut trimmed = String::new();
        for line in REFERENCE_TOML.lines() {
            if line.starts_with("[policy]") {
                break;
            }
            trimmed.push_str(line);
            trimmed.push('\n');
        }
        let trimmed = trimmed.replace("coefficient_resource = \"3.ad.csv\"\n", "");
        let parsed = ScenarioConfig::from_toml_str(&trimmed).unwrap();
        assert_eq!(parsed.coefficient_resource, "3.ad.csv");
        assert_eq!(parsed.policy, PitchPolicyConfig::default());
        assert_eq!(parsed.constraints, ConstraintConfig::default());
    }

    #[test]
    fn test_scenario_builds_runnable_parts() {
        let scenario = ScenarioConfig::reference();
        let rocket = scenario.rocket().unwrap();
        assert_relative_eq!(rocket.fuel_mass(), 315.0);
        assert!(scenario.mission().is_ok());
        assert!(scenario.aerodynamics_model().is_ok());
        assert_eq!(scenario.evaluator().config(), &scenario.constraints);
    }

    #[test]
    fn test_malformed_scenario_is_a_parse_error() {
        let err =
            ScenarioConfig::from_toml_str("[geometry]\nbody_length = \"long\"\n").unwrap_err();
        assert!(matches!(err, SimulationError::Toml(_)));
    }

    #[test]
    fn test_bad_time_step_rejected() {
        let broken = REFERENCE_TOML.replace("time_step = 0.01", "time_step = 0.0");
        let err = ScenarioConfig::from_toml_str(&broken).unwrap_err();
        assert!(matches!(err, SimulationError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_scenario(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, SimulationError::Io(_)));
    }
}
