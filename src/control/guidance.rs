use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use super::mission::TargetInfo;
use crate::constants::{DENOMINATOR_EPSILON, GRAVITY};
use crate::trajectory_system::kinematics::FlightState;

/// Quantities a pitch policy may use besides the flight state itself.
#[derive(Debug, Clone, Copy)]
pub struct PolicyContext<'a> {
    pub target: &'a TargetInfo,
    pub thrust: f64,
    pub dynamic_pressure: f64,
    pub reference_area: f64,
    /// c_yα (per rad) at the current Mach number.
    pub lift_slope: f64,
}

impl PolicyContext<'_> {
    /// Angle of attack producing `normal_acceleration` from thrust and lift together.
    fn alpha_for(&self, mass: f64, normal_acceleration: f64) -> f64 {
        let per_radian =
            self.thrust + self.dynamic_pressure * self.reference_area * self.lift_slope;
        if per_radian.abs() < DENOMINATOR_EPSILON {
            0.0
        } else {
            mass * normal_acceleration / per_radian
        }
    }
}

/// Angle-of-attack law evaluated once per integration step.
pub trait PitchPolicy: Debug + Send + Sync {
    fn angle_of_attack(&self, state: &FlightState, ctx: &PolicyContext) -> f64;

    fn name(&self) -> &'static str;
}

/// Flies a pure gravity turn.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroLift;

impl PitchPolicy for ZeroLift {
    fn angle_of_attack(&self, _state: &FlightState, _ctx: &PolicyContext) -> f64 {
        0.0
    }

    fn name(&self) -> &'static str {
        "zero-lift"
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ConstantAttack {
    pub alpha: f64,
}

impl PitchPolicy for ConstantAttack {
    fn angle_of_attack(&self, _state: &FlightState, _ctx: &PolicyContext) -> f64 {
        self.alpha
    }

    fn name(&self) -> &'static str {
        "constant-attack"
    }
}

/// Trims so the normal force cancels the cross-path weight component.
#[derive(Debug, Clone, Copy)]
pub struct GravityCompensation {
    pub alpha_limit: f64,
}

impl PitchPolicy for GravityCompensation {
    fn angle_of_attack(&self, state: &FlightState, ctx: &PolicyContext) -> f64 {
        ctx.alpha_for(state.mass, GRAVITY * state.theta.cos())
            .clamp(-self.alpha_limit, self.alpha_limit)
    }

    fn name(&self) -> &'static str {
        "gravity-compensation"
    }
}

/// Turns the flight path towards the line of sight to the target.
///
/// The commanded turn rate is `gain * (lambda - theta)`, where `lambda` is
/// the line-of-sight angle; gravity is compensated on top of it and the
/// resulting angle of attack is limited to `alpha_limit`.
#[derive(Debug, Clone, Copy)]
pub struct TargetPursuit {
    pub gain: f64,
    pub alpha_limit: f64,
}

impl Default for TargetPursuit {
    fn default() -> Self {
        TargetPursuit {
            gain: 1.0,
            alpha_limit: 10.0_f64.to_radians(),
        }
    }
}

impl PitchPolicy for TargetPursuit {
    fn angle_of_attack(&self, state: &FlightState, ctx: &PolicyContext) -> f64 {
        let line_of_sight = ctx.target.position() - state.position;
        if line_of_sight.magnitude() < DENOMINATOR_EPSILON || line_of_sight.x <= 0.0 {
            return ctx
                .alpha_for(state.mass, GRAVITY * state.theta.cos())
                .clamp(-self.alpha_limit, self.alpha_limit);
        }

        let turn_rate = self.gain * (line_of_sight.angle() - state.theta);
        let normal_acceleration = state.velocity * turn_rate + GRAVITY * state.theta.cos();
        ctx.alpha_for(state.mass, normal_acceleration)
            .clamp(-self.alpha_limit, self.alpha_limit)
    }

    fn name(&self) -> &'static str {
        "target-pursuit"
    }
}

/// Serializable choice of pitch policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PitchPolicyConfig {
    ZeroLift,
    ConstantAttack { alpha_deg: f64 },
    GravityCompensation { alpha_limit_deg: f64 },
    TargetPursuit { gain: f64, alpha_limit_deg: f64 },
}

impl Default for PitchPolicyConfig {
    fn default() -> Self {
        let pursuit = TargetPursuit::default();
        PitchPolicyConfig::TargetPursuit {
            gain: pursuit.gain,
            alpha_limit_deg: pursuit.alpha_limit.to_degrees(),
        }
    }
}

impl PitchPolicyConfig {
    pub fn build(&self) -> Box<dyn PitchPolicy> {
        match *self {
            PitchPolicyConfig::ZeroLift => Box::new(ZeroLift),
            PitchPolicyConfig::ConstantAttack { alpha_deg } => Box::new(ConstantAttack {
                alpha: alpha_deg.to_radians(),
            }),
            PitchPolicyConfig::GravityCompensation { alpha_limit_deg } => {
                Box::new(GravityCompensation {
                    alpha_limit: alpha_limit_deg.to_radians().abs(),
                })
            }
            PitchPolicyConfig::TargetPursuit { gain, alpha_limit_deg } => Box::new(TargetPursuit {
                gain,
                alpha_limit: alpha_limit_deg.to_radians().abs(),
            }),
        }
    }
}
