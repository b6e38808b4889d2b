use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::constants::SEA_LEVEL_PRESSURE;
use crate::errors::{SimulationError, SimulationResult};

fn default_nozzle_pressure() -> f64 {
    SEA_LEVEL_PRESSURE
}

/// Linear mass-flow law `mdot(t) = mdot_a + mdot_b * t`, signed so that a
/// burning motor has a negative rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropulsionLaw {
    pub mdot_a: f64,            // kg/s
    pub mdot_b: f64,            // kg/s²
    pub burn_duration: f64,     // s
    pub specific_impulse: f64,  // m/s, sea-level effective exhaust velocity
    pub nozzle_diameter: f64,   // m, exit diameter
    #[serde(default = "default_nozzle_pressure")]
    pub nozzle_pressure: f64,   // Pa, exit pressure
}

impl PropulsionLaw {
    pub fn reference() -> Self {
        PropulsionLaw {
            mdot_a: -13.404203,
            mdot_b: 0.294651,
            burn_duration: 43.864219,
            specific_impulse: 2100.0,
            nozzle_diameter: 0.25,
            nozzle_pressure: SEA_LEVEL_PRESSURE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PropulsionState {
    pub mass_flow_rate: f64,
    pub thrust: f64,
}

#[derive(Debug, Clone)]
pub struct PropulsionProfile {
    law: PropulsionLaw,
    exit_area: f64,
}

impl PropulsionProfile {
    pub fn new(law: PropulsionLaw) -> SimulationResult<Self> {
        let positive = law.burn_duration >= 0.0
            && law.specific_impulse > 0.0
            && law.nozzle_diameter >= 0.0;
        if !positive {
            return Err(SimulationError::InvalidConfiguration(format!(
                "burn duration {}, specific impulse {} and nozzle diameter {} must be positive",
                law.burn_duration, law.specific_impulse, law.nozzle_diameter
            )));
        }
        let start = law.mdot_a;
        let end = law.mdot_a + law.mdot_b * law.burn_duration;
        if start > 0.0 || end > 0.0 {
            return Err(SimulationError::InvalidConfiguration(format!(
                "mass-flow law must not add mass during the burn \
                 (mdot(0) = {start}, mdot(end) = {end})"
            )));
        }
        Ok(PropulsionProfile {
            law,
            exit_area: PI * law.nozzle_diameter.powi(2) / 4.0,
        })
    }

    pub fn law(&self) -> &PropulsionLaw {
        &self.law
    }

    pub fn burn_duration(&self) -> f64 {
        self.law.burn_duration
    }

    pub fn is_burning(&self, elapsed: f64) -> bool {
        (0.0..=self.law.burn_duration).contains(&elapsed)
    }

    /// Mass flow and thrust with the nozzle exhausting at its design pressure.
    pub fn at(&self, elapsed: f64) -> PropulsionState {
        self.at_pressure(elapsed, self.law.nozzle_pressure)
    }

    /// Mass flow and thrust against an ambient pressure `ambient` (Pa).
    pub fn at_pressure(&self, elapsed: f64, ambient: f64) -> PropulsionState {
        if !self.is_burning(elapsed) {
            return PropulsionState::default();
        }
        let mass_flow_rate = self.law.mdot_a + self.law.mdot_b * elapsed;
        let thrust = -mass_flow_rate * self.law.specific_impulse
            + self.exit_area * (self.law.nozzle_pressure - ambient);
        PropulsionState {
            mass_flow_rate,
            thrust: thrust.max(0.0),
        }
    }

    /// Effective exhaust velocity at `elapsed` against `ambient` pressure.
    pub fn effective_exhaust_velocity(&self, elapsed: f64, ambient: f64) -> f64 {
        let state = self.at_pressure(elapsed, ambient);
        if state.mass_flow_rate.abs() < f64::EPSILON {
            self.law.specific_impulse
        } else {
            state.thrust / -state.mass_flow_rate
        }
    }

    /// Propellant consumed between ignition and `elapsed` (kg, positive).
    pub fn propellant_consumed(&self, elapsed: f64) -> f64 {
        let t = elapsed.clamp(0.0, self.law.burn_duration);
        -(self.law.mdot_a * t + 0.5 * self.law.mdot_b * t * t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn profile() -> PropulsionProfile {
        PropulsionProfile::new(PropulsionLaw::reference()).unwrap()
    }

    #[test]
    fn test_zero_outside_burn() {
        let p = profile();
        for t in [-1.0, -1e-9, 43.864220, 60.0, 1e6] {
            let state = p.at(t);
            assert_eq!(state.mass_flow_rate, 0.0);
            assert_eq!(state.thrust, 0.0);
        }
    }

    #[test]
    fn test_linear_law_inside_burn() {
        let p = profile();
        for t in [0.0, 1.0, 10.0, 25.5, 43.864219] {
            let state = p.at(t);
            assert_relative_eq!(state.mass_flow_rate, -13.404203 + 0.294651 * t, epsilon = 1e-12);
            assert_relative_eq!(state.thrust, -state.mass_flow_rate * 2100.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_thrust_gains_with_altitude() {
        let p = profile();
        let sea_level = p.at_pressure(10.0, SEA_LEVEL_PRESSURE);
        let high = p.at_pressure(10.0, 50_000.0);
        assert!(high.thrust > sea_level.thrust);
        assert!(p.effective_exhaust_velocity(10.0, 50_000.0) > 2100.0);
    }

    #[test]
    fn test_propellant_consumed_matches_integral() {
        let p = profile();
        let t = 43.864219;
        let expected = 13.404203 * t - 0.5 * 0.294651 * t * t;
        assert_relative_eq!(p.propellant_consumed(100.0), expected, epsilon = 1e-9);
        assert!(expected < 315.0);
    }

    #[test]
    fn test_rejects_mass_gaining_law() {
        let mut law = PropulsionLaw::reference();
        law.mdot_a = 13.404203;
        assert!(PropulsionProfile::new(law).is_err());
    }
}
