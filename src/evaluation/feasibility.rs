use crate::trajectory_system::kinematics::BallisticsCalculationResult;

use super::constraints::ConstraintConfig;

/// Pass/fail view of a run's terminal state. Mass flow is signed: a burning
/// motor reports a negative rate, so only a positive one fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeasibilityFlags {
    pub mdot_ok: bool,
    pub theta_ok: bool,
    pub mass_ok: bool,
    pub velocity_ok: bool,
}

impl FeasibilityFlags {
    pub fn from_result(result: &BallisticsCalculationResult, config: &ConstraintConfig) -> Self {
        let (v_low, v_high) = config.velocity_bounds();
        FeasibilityFlags {
            mdot_ok: result.mdot_final <= 0.0,
            theta_ok: result.theta_final >= 0.0,
            mass_ok: result.m_final >= config.m_empty,
            velocity_ok: (v_low..=v_high).contains(&result.v_final),
        }
    }

    pub fn ok(&self) -> bool {
        self.mdot_ok && self.theta_ok && self.mass_ok && self.velocity_ok
    }
}
