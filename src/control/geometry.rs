use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::errors::{SimulationError, SimulationResult};

fn default_planes() -> u32 {
    2
}

/// Planform of one set of lifting surfaces. Stations are measured from the nose tip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceDescriptor {
    pub position: f64,       // m, leading-edge station
    pub span: f64,           // m, tip to tip
    pub chord: f64,          // m, root chord
    pub straight_chord: f64, // m, chord of the straight-edge section
    pub delta: f64,          // rad, section edge angle (≈ relative thickness)
    #[serde(default = "default_planes")]
    pub planes: u32, // 2 for a cruciform set
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometryDescriptor {
    pub body_length: f64,
    pub nose_length: f64,
    pub tail_length: f64,
    pub mid_diameter: f64,
    pub tail_diameter: f64,
    pub cm_reference: f64,
    pub steering: SurfaceDescriptor,
    pub wing: SurfaceDescriptor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    Steering,
    Wing,
}

/// Validated, immutable vehicle geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryModel {
    descriptor: GeometryDescriptor,
}

impl GeometryModel {
    pub fn new(descriptor: GeometryDescriptor) -> SimulationResult<Self> {
        Self::validate(&descriptor)?;
        Ok(GeometryModel { descriptor })
    }

    fn validate(d: &GeometryDescriptor) -> SimulationResult<()> {
        let lengths = [
            ("body length", d.body_length),
            ("nose length", d.nose_length),
            ("tail length", d.tail_length),
            ("mid-body diameter", d.mid_diameter),
            ("tail diameter", d.tail_diameter),
        ];
        for (name, value) in lengths {
            if !(value.is_finite() && value > 0.0) {
                return Err(SimulationError::InvalidGeometry(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if d.tail_diameter > d.mid_diameter {
            return Err(SimulationError::InvalidGeometry(format!(
                "tail diameter {} exceeds mid-body diameter {}",
                d.tail_diameter, d.mid_diameter
            )));
        }
        if d.nose_length + d.tail_length > d.body_length {
            return Err(SimulationError::InvalidGeometry(format!(
                "nose ({}) and tail ({}) are longer than the body ({})",
                d.nose_length, d.tail_length, d.body_length
            )));
        }
        if !d.cm_reference.is_finite() || d.cm_reference < 0.0 || d.cm_reference > d.body_length {
            return Err(SimulationError::InvalidGeometry(format!(
                "centre-of-mass reference {} lies outside the body",
                d.cm_reference
            )));
        }
        for (name, s) in [("steering", &d.steering), ("wing", &d.wing)] {
            Self::validate_surface(name, s, d.body_length)?;
        }
        Ok(())
    }

    fn validate_surface(
        name: &str,
        s: &SurfaceDescriptor,
        body_length: f64,
    ) -> SimulationResult<()> {
        let lengths = [("span", s.span), ("chord", s.chord), ("straight chord", s.straight_chord)];
        for (field, value) in lengths {
            if !(value.is_finite() && value > 0.0) {
                return Err(SimulationError::InvalidGeometry(format!(
                    "{name} {field} must be positive, got {value}"
                )));
            }
        }
        if !s.position.is_finite() || s.position < 0.0 || s.position > body_length {
            return Err(SimulationError::InvalidGeometry(format!(
                "{name} station {} lies outside body length {body_length}",
                s.position
            )));
        }
        if !s.delta.is_finite() || s.delta < 0.0 {
            return Err(SimulationError::InvalidGeometry(format!(
                "{name} edge angle must be non-negative, got {}",
                s.delta
            )));
        }
        if s.planes == 0 {
            return Err(SimulationError::InvalidGeometry(format!(
                "{name} must have at least one plane"
            )));
        }
        Ok(())
    }

    pub fn descriptor(&self) -> &GeometryDescriptor {
        &self.descriptor
    }

    pub fn surface(&self, kind: SurfaceKind) -> &SurfaceDescriptor {
        match kind {
            SurfaceKind::Steering => &self.descriptor.steering,
            SurfaceKind::Wing => &self.descriptor.wing,
        }
    }

    /// Mid-body cross-section area, the reference area for every coefficient.
    pub fn reference_area(&self) -> f64 {
        PI * self.descriptor.mid_diameter.powi(2) / 4.0
    }

    pub fn reference_length(&self) -> f64 {
        self.descriptor.body_length
    }

    pub fn moment_arm(&self, kind: SurfaceKind) -> f64 {
        self.surface(kind).position - self.descriptor.cm_reference
    }

    pub fn mean_chord(&self, kind: SurfaceKind) -> f64 {
        let s = self.surface(kind);
        0.5 * (s.chord + s.straight_chord)
    }

    /// Planform area of one plane of the surface set.
    pub fn plane_area(&self, kind: SurfaceKind) -> f64 {
        self.surface(kind).span * self.mean_chord(kind)
    }

    pub fn surface_area(&self, kind: SurfaceKind) -> f64 {
        self.plane_area(kind) * self.surface(kind).planes as f64
    }

    pub fn aspect_ratio(&self, kind: SurfaceKind) -> f64 {
        self.surface(kind).span.powi(2) / self.plane_area(kind)
    }

    /// Station of the surface's mean-chord midpoint.
    pub fn surface_centroid(&self, kind: SurfaceKind) -> f64 {
        self.surface(kind).position + 0.5 * self.mean_chord(kind)
    }

    pub fn body_fineness(&self) -> f64 {
        self.descriptor.body_length / self.descriptor.mid_diameter
    }

    pub fn nose_fineness(&self) -> f64 {
        self.descriptor.nose_length / self.descriptor.mid_diameter
    }

    pub fn tail_taper(&self) -> f64 {
        self.descriptor.tail_diameter / self.descriptor.mid_diameter
    }

    /// Half-angle of the equivalent nose cone.
    pub fn nose_half_angle(&self) -> f64 {
        (0.5 * self.descriptor.mid_diameter / self.descriptor.nose_length).atan()
    }

    /// Wetted area of the body, nose treated as a cone and tail as a frustum.
    pub fn body_wetted_area(&self) -> f64 {
        let d = &self.descriptor;
        let r = 0.5 * d.mid_diameter;
        let r_tail = 0.5 * d.tail_diameter;
        let cylinder = d.body_length - d.nose_length - d.tail_length;
        let nose = PI * r * (r.powi(2) + d.nose_length.powi(2)).sqrt();
        let tail = PI * (r + r_tail) * ((r - r_tail).powi(2) + d.tail_length.powi(2)).sqrt();
        nose + 2.0 * PI * r * cylinder + tail
    }

    /// Stable FNV-1a digest of every geometric input, used to key persisted tables.
    pub fn fingerprint(&self) -> u64 {
        let d = &self.descriptor;
        let mut values = vec![
            d.body_length,
            d.nose_length,
            d.tail_length,
            d.mid_diameter,
            d.tail_diameter,
            d.cm_reference,
        ];
        for s in [&d.steering, &d.wing] {
            let planes = s.planes as f64;
            values.extend([s.position, s.span, s.chord, s.straight_chord, s.delta, planes]);
        }

        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in values.iter().flat_map(|v| v.to_bits().to_le_bytes()) {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        hash
    }

    /// Reference vehicle used by the bundled scenario.
    pub fn reference_descriptor() -> GeometryDescriptor {
        GeometryDescriptor {
            body_length: 5.3351,
            nose_length: 0.9000,
            tail_length: 0.7296,
            mid_diameter: 0.4,
            tail_diameter: 0.3,
            cm_reference: 0.0,
            steering: SurfaceDescriptor {
                position: 0.983100570703258,
                span: 1.3194249254574384,
                chord: 0.0626025063978535,
                straight_chord: 0.07916421500336057,
                delta: 0.02133966836451949,
                planes: 2,
            },
            wing: SurfaceDescriptor {
                position: 4.651368704733642,
                span: 1.9256349277294273,
                chord: 0.30038120257225964,
                straight_chord: 0.29261611495574114,
                delta: 0.03092507039939902,
                planes: 2,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn reference() -> GeometryModel {
        GeometryModel::new(GeometryModel::reference_descriptor()).unwrap()
    }

    #[test]
    fn test_reference_area_and_length() {
        let g = reference();
        assert_relative_eq!(g.reference_area(), PI * 0.04, epsilon = 1e-12);
        assert_relative_eq!(g.reference_length(), 5.3351);
    }

    #[test]
    fn test_moment_arm_relative_to_reference() {
        let mut d = GeometryModel::reference_descriptor();
        d.cm_reference = 2.0;
        let g = GeometryModel::new(d).unwrap();
        assert_relative_eq!(g.moment_arm(SurfaceKind::Wing), 4.651368704733642 - 2.0);
        assert!(g.moment_arm(SurfaceKind::Steering) < 0.0);
    }

    #[test]
    fn test_rejects_non_positive_length() {
        let mut d = GeometryModel::reference_descriptor();
        d.nose_length = 0.0;
        assert!(matches!(GeometryModel::new(d), Err(SimulationError::InvalidGeometry(_))));
    }

    #[test]
    fn test_rejects_tail_wider_than_body() {
        let mut d = GeometryModel::reference_descriptor();
        d.tail_diameter = 0.5;
        assert!(matches!(GeometryModel::new(d), Err(SimulationError::InvalidGeometry(_))));
    }

    #[test]
    fn test_rejects_surface_outside_body() {
        let mut d = GeometryModel::reference_descriptor();
        d.wing.position = 6.0;
        assert!(matches!(GeometryModel::new(d), Err(SimulationError::InvalidGeometry(_))));
    }

    #[test]
    fn test_fingerprint_tracks_geometry() {
        let a = reference();
        let b = reference();
        assert_eq!(a.fingerprint(), b.fingerprint());

        let mut d = GeometryModel::reference_descriptor();
        d.wing.span += 1e-9;
        let c = GeometryModel::new(d).unwrap();
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_wetted_area_exceeds_cylinder_shell_of_core() {
        let g = reference();
        let core = PI * 0.4 * (5.3351 - 0.9 - 0.7296);
        assert!(g.body_wetted_area() > core);
    }
}
