use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::report::{ReportBuilder, ViolationKind, ViolationReport};
use crate::constants::{DENOMINATOR_EPSILON, GRAVITY};
use crate::control::geometry::GeometryModel;
use crate::errors::SimulationResult;
use crate::telemetry_system::log_joiner::{join, JoinResult, JoinedPoint};
use crate::trajectory_system::aerodynamics::AeroDerivatives;
use crate::trajectory_system::kinematics::BallisticsCalculationResult;

/// Limits, scales and fixed penalties for scoring one trajectory.
///
/// Angles are in radians except the `_deg` limits, which mirror how the
/// reference configuration is written down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintConfig {
    pub m_0inp: f64,
    pub m_empty: f64,
    pub l_warhead_start: f64,
    pub v_target: f64,
    pub velocity_band: (f64, f64),
    pub n_ymax: f64,
    pub j_n_max: f64,
    pub alpha_max_deg: f64,
    pub delta_st_max_deg: f64,
    pub static_margin_min: f64,

    pub s_l: f64,
    pub s_m: f64,
    pub s_v: f64,
    pub s_theta: f64,
    pub s_mdot: f64,
    pub s_alpha: f64,
    pub s_ny: f64,
    pub s_cya: f64,
    pub s_r: f64,

    pub penalty_ballistics_fail: f64,
    pub penalty_no_points: f64,
    pub penalty_bad_denom: f64,
    pub penalty_div0_mz: f64,
    pub penalty_missing_point: f64,
    pub penalty_non_finite: f64,
}

impl Default for ConstraintConfig {
    fn default() -> Self {
        ConstraintConfig {
            m_0inp: 700.0,
            m_empty: 705.816 - 315.0,
            l_warhead_start: 1.2,
            v_target: 340.0,
            velocity_band: (1.5, 2.5),
            n_ymax: 12.0,
            j_n_max: 117.72,
            alpha_max_deg: 13.0,
            delta_st_max_deg: 20.0,
            static_margin_min: 0.02,

            s_l: 0.1,
            s_m: 1.0,
            s_v: 10.0,
            s_theta: 1.0_f64.to_radians(),
            s_mdot: 0.1,
            s_alpha: 1.0_f64.to_radians(),
            s_ny: 1.0,
            s_cya: 0.1,
            s_r: 0.01,

            penalty_ballistics_fail: 1e3,
            penalty_no_points: 1e3,
            penalty_bad_denom: 1e3,
            penalty_div0_mz: 1e3,
            penalty_missing_point: 1e3,
            penalty_non_finite: 1e3,
        }
    }
}

impl ConstraintConfig {
    pub fn alpha_max(&self) -> f64 {
        self.alpha_max_deg.to_radians()
    }

    pub fn delta_st_max(&self) -> f64 {
        self.delta_st_max_deg.to_radians()
    }

    pub fn velocity_bounds(&self) -> (f64, f64) {
        (self.velocity_band.0 * self.v_target, self.velocity_band.1 * self.v_target)
    }
}

/// Selects which joined points get the per-point checks.
#[derive(Clone)]
pub enum PointFilter {
    All,
    DownrangeBeyond(f64),
    AltitudeAbove(f64),
    Custom(Arc<dyn Fn(&JoinedPoint) -> bool + Send + Sync>),
}

impl PointFilter {
    pub fn accepts(&self, point: &JoinedPoint) -> bool {
        match self {
            PointFilter::All => true,
            PointFilter::DownrangeBeyond(x) => point.x > *x,
            PointFilter::AltitudeAbove(y) => point.y > *y,
            PointFilter::Custom(predicate) => predicate(point),
        }
    }
}

impl fmt::Debug for PointFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointFilter::All => f.write_str("All"),
            PointFilter::DownrangeBeyond(x) => write!(f, "DownrangeBeyond({x})"),
            PointFilter::AltitudeAbove(y) => write!(f, "AltitudeAbove({y})"),
            PointFilter::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Turns a trajectory into a penalty score. Never fails: degenerate data
/// becomes a fixed-penalty violation.
#[derive(Debug, Clone)]
pub struct ConstraintEvaluator {
    config: ConstraintConfig,
    filter: PointFilter,
}

impl ConstraintEvaluator {
    pub fn new(config: ConstraintConfig) -> Self {
        ConstraintEvaluator {
            filter: PointFilter::DownrangeBeyond(config.l_warhead_start),
            config,
        }
    }

    pub fn with_filter(mut self, filter: PointFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn config(&self) -> &ConstraintConfig {
        &self.config
    }

    pub fn evaluate(&self, points: &[JoinedPoint], geometry: &GeometryModel) -> ViolationReport {
        let mut report = ReportBuilder::new(self.config.penalty_non_finite);
        self.check_sequence(&mut report, points, geometry);
        report.finish()
    }

    /// Like [`evaluate`](Self::evaluate), also charging for steps the join dropped.
    pub fn evaluate_joined(
        &self,
        joined: &JoinResult,
        geometry: &GeometryModel,
    ) -> ViolationReport {
        let mut report = ReportBuilder::new(self.config.penalty_non_finite);
        if !joined.points.is_empty() {
            for _ in 0..joined.dropped {
                report.fixed(None, ViolationKind::MissingPoint, self.config.penalty_missing_point);
            }
        }
        self.check_sequence(&mut report, &joined.points, geometry);
        report.finish()
    }

    pub fn evaluate_run(
        &self,
        run: &SimulationResult<BallisticsCalculationResult>,
        geometry: &GeometryModel,
    ) -> ViolationReport {
        match run {
            Ok(result) => {
                let log = &result.log;
                let joined = join(&log.kinematic, &log.force, &log.auxiliary);
                self.evaluate_joined(&joined, geometry)
            }
            Err(e) => {
                log::warn!("scoring failed run as ballistics failure: {e}");
                let mut report = ReportBuilder::new(self.config.penalty_non_finite);
                let penalty = self.config.penalty_ballistics_fail;
                report.fixed(None, ViolationKind::BallisticsFailure, penalty);
                report.finish()
            }
        }
    }

    fn check_sequence(
        &self,
        report: &mut ReportBuilder,
        points: &[JoinedPoint],
        geometry: &GeometryModel,
    ) {
        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            log::warn!("no trajectory points to evaluate");
            report.fixed(None, ViolationKind::NoPoints, self.config.penalty_no_points);
            return;
        };
        let c = &self.config;

        let body_length = geometry.reference_length();
        let outside_body = (-c.l_warhead_start).max(c.l_warhead_start - body_length);
        report.excess(None, ViolationKind::StructuralThreshold, outside_body, c.s_l);
        if first.is_finite() {
            report.excess(Some(0), ViolationKind::LaunchMass, first.mass - c.m_0inp, c.s_m);
        }

        let mut non_finite = 0;
        for (index, point) in points.iter().enumerate() {
            if !point.is_finite() {
                non_finite += 1;
                report.fixed(Some(index), ViolationKind::NonFiniteData, c.penalty_non_finite);
            } else if self.filter.accepts(point) {
                self.check_point(report, index, point, geometry);
            }
        }
        if non_finite > 0 {
            log::warn!("{non_finite} of {} trajectory points carry non-finite data", points.len());
        }
        if !last.is_finite() {
            return;
        }

        // a burning motor has a negative rate; a positive one would be gaining mass
        let end = Some(points.len() - 1);
        report.excess(end, ViolationKind::TerminalMassFlow, last.mass_flow_rate, c.s_mdot);
        report.excess(end, ViolationKind::TerminalTheta, -last.theta, c.s_theta);
        report.excess(end, ViolationKind::TerminalMass, c.m_empty - last.mass, c.s_m);

        let (v_low, v_high) = c.velocity_bounds();
        let velocity_excess = (v_low - last.velocity).max(last.velocity - v_high);
        report.excess(end, ViolationKind::TerminalVelocity, velocity_excess, c.s_v);
    }

    fn check_point(
        &self,
        report: &mut ReportBuilder,
        index: usize,
        p: &JoinedPoint,
        geometry: &GeometryModel,
    ) {
        let c = &self.config;
        let at = Some(index);
        let alpha_max = c.alpha_max();

        let weight = p.mass * GRAVITY;
        if weight.abs() < DENOMINATOR_EPSILON {
            report.fixed(at, ViolationKind::BadDenominator, c.penalty_bad_denom);
        } else {
            let n_y = (p.lift + p.thrust * p.alpha.sin()) / weight;
            report.excess(at, ViolationKind::LoadFactor, n_y.abs() - c.n_ymax, c.s_ny);
        }

        report.excess(at, ViolationKind::AngleOfAttack, p.alpha.abs() - alpha_max, c.s_alpha);

        let derivatives = AeroDerivatives::at(geometry, p.mach);
        let lift_capacity = alpha_max * p.dynamic_pressure * geometry.reference_area();
        if lift_capacity.abs() < DENOMINATOR_EPSILON {
            report.fixed(at, ViolationKind::BadDenominator, c.penalty_bad_denom);
        } else {
            let required = (c.j_n_max * p.mass - p.thrust * alpha_max.sin()) / lift_capacity;
            let shortfall = required - derivatives.c_y_alpha;
            report.excess(at, ViolationKind::ManeuverReserve, shortfall, c.s_cya);
        }

        let m_z_alpha = derivatives.m_z_alpha_about(geometry, p.center_of_mass);
        if m_z_alpha.abs() < DENOMINATOR_EPSILON {
            report.fixed(at, ViolationKind::DivisionByZeroMz, c.penalty_div0_mz);
        } else {
            let m_z_delta = derivatives.m_z_delta_about(geometry, p.center_of_mass);
            let alpha_trim_max = (m_z_delta / m_z_alpha).abs() * c.delta_st_max();
            let beyond_trim = p.alpha.abs() - alpha_trim_max;
            report.excess(at, ViolationKind::TrimAuthority, beyond_trim, c.s_alpha);
        }

        if derivatives.c_y_alpha.abs() < DENOMINATOR_EPSILON {
            report.fixed(at, ViolationKind::BadDenominator, c.penalty_bad_denom);
        } else {
            let margin = -m_z_alpha / derivatives.c_y_alpha;
            report.excess(at, ViolationKind::StaticMargin, c.static_margin_min - margin, c.s_r);
        }
    }
}
