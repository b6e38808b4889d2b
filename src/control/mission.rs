use serde::{Deserialize, Serialize};

use crate::constants::{MAX_SIMULATION_TIME, SPEED_OF_SOUND_SEA_LEVEL, STALL_VELOCITY, TIME_STEP};
use crate::errors::{SimulationError, SimulationResult};
use crate::utils::vector2d::Vector2D;

/// Point the vehicle flies towards and the speed it should arrive with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetInfo {
    pub velocity: f64, // m/s
    pub x: f64,        // m downrange
    pub y: f64,        // m altitude
}

impl TargetInfo {
    /// Target at `altitude` on the launch line of sight.
    pub fn on_launch_line(velocity: f64, altitude: f64, theta_0: f64) -> Self {
        TargetInfo {
            velocity,
            x: altitude / theta_0.tan(),
            y: altitude,
        }
    }

    pub fn position(&self) -> Vector2D {
        Vector2D::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaunchConditions {
    pub m_0: f64,      // kg
    pub velocity: f64, // m/s, leaving the launcher
    pub theta_0: f64,  // rad
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationSettings {
    pub time_step: f64,
    pub max_time: f64,
    pub stall_velocity: f64,
    pub speed_of_sound: f64,
}

impl Default for IntegrationSettings {
    fn default() -> Self {
        IntegrationSettings {
            time_step: TIME_STEP,
            max_time: MAX_SIMULATION_TIME,
            stall_velocity: STALL_VELOCITY,
            speed_of_sound: SPEED_OF_SOUND_SEA_LEVEL,
        }
    }
}

impl IntegrationSettings {
    pub fn validate(&self) -> SimulationResult<()> {
        if !(self.time_step > 0.0) || !(self.max_time > 0.0) || !(self.speed_of_sound > 0.0) {
            return Err(SimulationError::InvalidConfiguration(format!(
                "time step {}, max time {} and speed of sound {} must be positive",
                self.time_step, self.max_time, self.speed_of_sound
            )));
        }
        if !(self.stall_velocity >= 0.0) {
            return Err(SimulationError::InvalidConfiguration(format!(
                "stall velocity must be non-negative, got {}",
                self.stall_velocity
            )));
        }
        Ok(())
    }
}

/// Launch and target pairing for one trajectory run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mission {
    pub launch: LaunchConditions,
    pub target: TargetInfo,
}

impl Mission {
    pub fn new(launch: LaunchConditions, target: TargetInfo) -> SimulationResult<Self> {
        if !(launch.m_0 > 0.0) || !launch.velocity.is_finite() || !launch.theta_0.is_finite() {
            return Err(SimulationError::InvalidConfiguration(format!(
                "launch mass {} must be positive and launch velocity {} / angle {} finite",
                launch.m_0, launch.velocity, launch.theta_0
            )));
        }
        if !(target.velocity > 0.0) || !target.x.is_finite() || !target.y.is_finite() {
            return Err(SimulationError::InvalidConfiguration(format!(
                "target ({}, {}) at {} m/s is not usable",
                target.x, target.y, target.velocity
            )));
        }
        Ok(Mission { launch, target })
    }

    pub fn reference() -> Self {
        let theta_0 = 12.0_f64.to_radians();
        Mission {
            launch: LaunchConditions {
                m_0: 705.816,
                velocity: 375.0,
                theta_0,
            },
            target: TargetInfo::on_launch_line(340.0, 900.0, theta_0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_reference_target_on_launch_line() {
        let mission = Mission::reference();
        let target = mission.target;
        assert_relative_eq!(target.y / target.x, mission.launch.theta_0.tan(), epsilon = 1e-12);
        assert_relative_eq!(target.x, 4234.167, epsilon = 1e-3);
    }

    #[test]
    fn test_rejects_massless_launch() {
        let mut mission = Mission::reference();
        mission.launch.m_0 = 0.0;
        assert!(Mission::new(mission.launch, mission.target).is_err());
    }

    #[test]
    fn test_default_integration_settings_valid() {
        assert!(IntegrationSettings::default().validate().is_ok());
        let bad = IntegrationSettings {
            time_step: 0.0,
            ..IntegrationSettings::default()
        };
        assert!(bad.validate().is_err());
    }
}
