use std::f64::consts::PI;
use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::coefficient_table::CoefficientTable;
use crate::constants::{
    KINEMATIC_VISCOSITY_SEA_LEVEL, SPEED_OF_SOUND_SEA_LEVEL, STALL_ALPHA_DEG,
    TABLE_ALPHA_MAX_DEG, TABLE_ALPHA_STEP_DEG, TABLE_MACH_MAX, TABLE_MACH_MIN, TABLE_MACH_STEP,
    TABLE_MAX_NODES,
};
use crate::control::geometry::{GeometryModel, SurfaceKind};
use crate::errors::{SimulationError, SimulationResult};
use crate::utils::interpolation::lerp;

// Transonic blending band for the lifting-surface and wave-drag relations.
const SUBSONIC_LIMIT: f64 = 0.8;
const SUPERSONIC_ONSET: f64 = 1.2;

// Fraction of the slender-body boattail lift loss realised with viscous flow.
const BOATTAIL_EFFICIENCY: f64 = 0.3;
// Lift of a deflected steering surface relative to the same surface at incidence.
const STEERING_DEFLECTION_EFFICIENCY: f64 = 0.9;
const MIN_REYNOLDS: f64 = 1e5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AeroSettings {
    pub alpha_max_deg: f64,
    pub alpha_step_deg: f64,
    pub mach_min: f64,
    pub mach_max: f64,
    pub mach_step: f64,
    pub stall_alpha_deg: f64,
}

impl Default for AeroSettings {
    fn default() -> Self {
        AeroSettings {
            alpha_max_deg: TABLE_ALPHA_MAX_DEG,
            alpha_step_deg: TABLE_ALPHA_STEP_DEG,
            mach_min: TABLE_MACH_MIN,
            mach_max: TABLE_MACH_MAX,
            mach_step: TABLE_MACH_STEP,
            stall_alpha_deg: STALL_ALPHA_DEG,
        }
    }
}

impl AeroSettings {
    /// Number of (α, M) nodes the grid would hold.
    pub fn node_count(&self) -> f64 {
        let alphas = (self.alpha_max_deg / self.alpha_step_deg).round() + 1.0;
        let machs = ((self.mach_max - self.mach_min) / self.mach_step).round() + 1.0;
        alphas * machs
    }

    fn validate(&self) -> SimulationResult<()> {
        let ok = self.alpha_step_deg > 0.0
            && self.alpha_max_deg >= 2.0 * self.alpha_step_deg
            && self.mach_step > 0.0
            && self.mach_min > 0.0
            && self.mach_max >= self.mach_min + self.mach_step
            && self.stall_alpha_deg > 0.0;
        if !ok {
            return Err(SimulationError::InvalidConfiguration(format!(
                "aerodynamic table grid is degenerate: {self:?}"
            )));
        }
        let nodes = self.node_count();
        if !nodes.is_finite() || nodes > TABLE_MAX_NODES {
            return Err(SimulationError::InvalidConfiguration(format!(
                "aerodynamic table grid has {nodes} nodes, limit is {TABLE_MAX_NODES}"
            )));
        }
        Ok(())
    }
}

/// Force and moment coefficients referenced to the mid-body cross-section and
/// body length; `m_z` is taken about the geometry's centre-of-mass reference.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AeroCoefficients {
    pub c_y: f64,
    pub c_x: f64,
    pub m_z: f64,
}

impl AeroCoefficients {
    /// Pitching moment transferred to a centre of mass at `x_cm`.
    pub fn m_z_about(&self, geometry: &GeometryModel, x_cm: f64) -> f64 {
        let x_ref = geometry.descriptor().cm_reference;
        self.m_z + self.c_y * (x_cm - x_ref) / geometry.reference_length()
    }
}

/// Linear aerodynamic derivatives at one Mach number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AeroDerivatives {
    pub mach: f64,
    pub c_y_alpha: f64,
    pub c_x0: f64,
    pub m_z_alpha: f64,
    pub c_y_delta: f64,
    pub m_z_delta: f64,
    pub x_focus: f64,
}

#[derive(Debug, Clone, Copy)]
struct LiftContribution {
    slope: f64,
    station: f64,
}

impl AeroDerivatives {
    pub fn at(geometry: &GeometryModel, mach: f64) -> Self {
        let d = geometry.descriptor();
        let s_ref = geometry.reference_area();
        let length = geometry.reference_length();
        let x_ref = d.cm_reference;

        let nose = LiftContribution {
            slope: 2.0,
            station: 2.0 / 3.0 * d.nose_length,
        };
        let tail = LiftContribution {
            slope: -2.0 * (1.0 - geometry.tail_taper().powi(2)) * BOATTAIL_EFFICIENCY,
            station: d.body_length - 0.5 * d.tail_length,
        };
        let steering = surface_contribution(geometry, SurfaceKind::Steering, mach, s_ref);
        let wing = surface_contribution(geometry, SurfaceKind::Wing, mach, s_ref);

        let parts = [nose, tail, steering, wing];
        let c_y_alpha: f64 = parts.iter().map(|p| p.slope).sum();
        let moment_arm_sum: f64 = parts.iter().map(|p| p.slope * (p.station - x_ref)).sum();
        let m_z_alpha = -moment_arm_sum / length;
        let x_focus = if c_y_alpha.abs() > f64::EPSILON {
            x_ref - m_z_alpha * length / c_y_alpha
        } else {
            x_ref
        };
        let c_y_delta = STEERING_DEFLECTION_EFFICIENCY * steering.slope;
        let m_z_delta = -c_y_delta * (steering.station - x_ref) / length;

        AeroDerivatives {
            mach,
            c_y_alpha,
            c_x0: zero_lift_drag(geometry, mach, s_ref),
            m_z_alpha,
            c_y_delta,
            m_z_delta,
            x_focus,
        }
    }

    /// Coefficients at angle of attack `alpha` (rad), linear in alpha.
    pub fn coefficients(&self, alpha: f64) -> AeroCoefficients {
        let c_y = self.c_y_alpha * alpha;
        AeroCoefficients {
            c_y,
            c_x: self.c_x0 + c_y * alpha.tan(),
            m_z: self.m_z_alpha * alpha,
        }
    }

    /// Static stability derivative about a centre of mass at `x_cm`.
    pub fn m_z_alpha_about(&self, geometry: &GeometryModel, x_cm: f64) -> f64 {
        let x_ref = geometry.descriptor().cm_reference;
        self.m_z_alpha + self.c_y_alpha * (x_cm - x_ref) / geometry.reference_length()
    }

    /// Steering effectiveness about a centre of mass at `x_cm`.
    pub fn m_z_delta_about(&self, geometry: &GeometryModel, x_cm: f64) -> f64 {
        let x_ref = geometry.descriptor().cm_reference;
        self.m_z_delta + self.c_y_delta * (x_cm - x_ref) / geometry.reference_length()
    }
}

/// Lift-curve slope of an isolated surface per unit of its own area.
fn surface_slope(aspect_ratio: f64, mach: f64) -> f64 {
    let subsonic = |m: f64| {
        2.0 * PI * aspect_ratio / (2.0 + (4.0 + aspect_ratio.powi(2) * (1.0 - m * m)).sqrt())
    };
    let supersonic = |m: f64| {
        let beta = (m * m - 1.0).sqrt();
        4.0 / beta * (1.0 - 1.0 / (2.0 * aspect_ratio * beta)).max(0.5)
    };

    if mach <= SUBSONIC_LIMIT {
        subsonic(mach)
    } else if mach >= SUPERSONIC_ONSET {
        supersonic(mach)
    } else {
        let t = (mach - SUBSONIC_LIMIT) / (SUPERSONIC_ONSET - SUBSONIC_LIMIT);
        lerp(subsonic(SUBSONIC_LIMIT), supersonic(SUPERSONIC_ONSET), t)
    }
}

fn surface_contribution(
    geometry: &GeometryModel,
    kind: SurfaceKind,
    mach: f64,
    s_ref: f64,
) -> LiftContribution {
    let surface = geometry.surface(kind);
    let interference = (1.0 + geometry.descriptor().mid_diameter / surface.span).powi(2);
    let slope = surface_slope(geometry.aspect_ratio(kind), mach) * interference
        * geometry.plane_area(kind)
        / s_ref;

    let chord_fraction = if mach <= SUBSONIC_LIMIT {
        0.25
    } else if mach >= SUPERSONIC_ONSET {
        0.5
    } else {
        lerp(0.25, 0.5, (mach - SUBSONIC_LIMIT) / (SUPERSONIC_ONSET - SUBSONIC_LIMIT))
    };

    LiftContribution {
        slope,
        station: surface.position + chord_fraction * geometry.mean_chord(kind),
    }
}

/// Turbulent flat-plate skin friction with a compressibility correction.
fn skin_friction(mach: f64, length: f64) -> f64 {
    let velocity = mach * SPEED_OF_SOUND_SEA_LEVEL;
    let reynolds = (velocity * length / KINEMATIC_VISCOSITY_SEA_LEVEL).max(MIN_REYNOLDS);
    0.455 / reynolds.log10().powf(2.58) * (1.0 + 0.144 * mach * mach).powf(-0.65)
}

fn supersonic_share(mach: f64) -> f64 {
    ((mach - SUBSONIC_LIMIT) / (SUPERSONIC_ONSET - SUBSONIC_LIMIT)).clamp(0.0, 1.0)
}

fn zero_lift_drag(geometry: &GeometryModel, mach: f64, s_ref: f64) -> f64 {
    let d = geometry.descriptor();

    let body_friction = skin_friction(mach, d.body_length) * geometry.body_wetted_area() / s_ref;
    let surface_friction: f64 = [SurfaceKind::Steering, SurfaceKind::Wing]
        .iter()
        .map(|&kind| {
            let wetted = 2.0 * geometry.surface_area(kind);
            skin_friction(mach, geometry.mean_chord(kind)) * wetted / s_ref
        })
        .sum();

    let wave_mach = mach.max(SUPERSONIC_ONSET);
    let beta = (wave_mach * wave_mach - 1.0).sqrt();
    let cone_angle_deg = geometry.nose_half_angle().to_degrees();
    let nose_wave = (0.083 + 0.096 / wave_mach.powi(2)) * (cone_angle_deg / 10.0).powf(1.69);
    let surface_wave: f64 = [SurfaceKind::Steering, SurfaceKind::Wing]
        .iter()
        .map(|&kind| {
            let thickness = geometry.surface(kind).delta;
            16.0 / 3.0 * thickness.powi(2) / beta * geometry.surface_area(kind) / s_ref
        })
        .sum();
    let wave = supersonic_share(mach) * (nose_wave + surface_wave);

    let base_pressure = if mach < 1.0 {
        0.12 + 0.13 * mach * mach
    } else {
        0.25 / mach
    };
    let base = base_pressure * geometry.tail_taper().powi(2);

    body_friction + surface_friction + wave + base
}

/// Owner of the prepared coefficient table for one vehicle configuration.
#[derive(Debug, Clone, Default)]
pub struct AerodynamicsModel {
    settings: AeroSettings,
    table: Option<Arc<CoefficientTable>>,
}

impl AerodynamicsModel {
    pub fn new(settings: AeroSettings) -> SimulationResult<Self> {
        settings.validate()?;
        Ok(AerodynamicsModel { settings, table: None })
    }

    pub fn settings(&self) -> &AeroSettings {
        &self.settings
    }

    /// Build the table for `geometry` and persist it at `resource`, reusing an
    /// existing resource whose stored geometry hash matches.
    pub fn prepare(
        &mut self,
        geometry: &GeometryModel,
        resource: &Path,
    ) -> SimulationResult<Arc<CoefficientTable>> {
        let hash = geometry.fingerprint();
        if CoefficientTable::stored_hash(resource) == Some(hash) {
            match CoefficientTable::load(resource) {
                Ok(table) => {
                    log::debug!("reusing coefficient table {} ({hash:016x})", resource.display());
                    return Ok(self.install(table));
                }
                Err(e) => {
                    let path = resource.display();
                    log::warn!("coefficient table {path} unreadable, rebuilding: {e}")
                }
            }
        }

        log::debug!("building coefficient table {} ({hash:016x})", resource.display());
        let table = CoefficientTable::build(geometry, &self.settings);
        table.save(resource)?;
        Ok(self.install(table))
    }

    /// Build the table without persisting it.
    pub fn prepare_in_memory(&mut self, geometry: &GeometryModel) -> Arc<CoefficientTable> {
        let table = CoefficientTable::build(geometry, &self.settings);
        self.install(table)
    }

    /// Adopt an existing resource as-is, without checking which geometry produced it.
    pub fn load(&mut self, resource: &Path) -> SimulationResult<Arc<CoefficientTable>> {
        let table = CoefficientTable::load(resource)?;
        Ok(self.install(table))
    }

    fn install(&mut self, table: CoefficientTable) -> Arc<CoefficientTable> {
        let table = Arc::new(table);
        self.table = Some(Arc::clone(&table));
        table
    }

    pub fn table(&self) -> SimulationResult<Arc<CoefficientTable>> {
        self.table.clone().ok_or(SimulationError::AerodynamicsUnavailable)
    }

    pub fn evaluate(&self, alpha: f64, mach: f64) -> SimulationResult<AeroCoefficients> {
        self.table
            .as_ref()
            .map(|table| table.evaluate(alpha, mach))
            .ok_or(SimulationError::AerodynamicsUnavailable)
    }
}

/// Build tables for several geometries concurrently.
pub fn prepare_many(
    geometries: &[GeometryModel],
    settings: &AeroSettings,
) -> Vec<Arc<CoefficientTable>> {
    geometries
        .par_iter()
        .map(|geometry| Arc::new(CoefficientTable::build(geometry, settings)))
        .collect()
}
