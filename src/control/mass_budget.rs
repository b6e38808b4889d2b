use serde::{Deserialize, Serialize};

use super::geometry::{GeometryModel, SurfaceKind};
use crate::constants::MASS_TOLERANCE;
use crate::errors::{SimulationError, SimulationResult};

/// Fill factor of a thin biconvex section relative to its bounding box.
const SURFACE_PROFILE_FILL: f64 = 2.0 / 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MassInputs {
    pub body_mass: f64,          // kg, empty body without surfaces
    pub body_static_moment: f64, // kg·m about the nose tip
    pub fuel_mass: f64,          // kg
    pub fuel_cm: f64,            // m, station of the fuel centre
    pub wing_density: f64,       // kg/m³
    pub steering_density: f64,   // kg/m³
}

impl MassInputs {
    pub fn reference() -> Self {
        MassInputs {
            body_mass: 310.8413,
            body_static_moment: 665.0554,
            fuel_mass: 315.0,
            fuel_cm: 3.7036,
            wing_density: 2600.0,
            steering_density: 2600.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassState {
    pub burned_fraction: f64,
    pub mass: f64,
    pub center_of_mass: f64,
    pub axial_inertia: f64,
    pub transverse_inertia: f64,
}

#[derive(Debug, Clone, Copy)]
struct Component {
    mass: f64,
    station: f64,
    own_transverse: f64,
    own_axial: f64,
}

#[derive(Debug, Clone)]
pub struct MassBudget {
    inputs: MassInputs,
    radius: f64,
    body_length: f64,
    grain_length: f64,
    surfaces: [Component; 2],
    equipment: Component,
}

impl MassBudget {
    pub fn new(inputs: MassInputs, geometry: &GeometryModel) -> SimulationResult<Self> {
        let body_length = geometry.reference_length();
        if !(inputs.body_mass > 0.0) || !(inputs.fuel_mass >= 0.0) {
            return Err(SimulationError::InvalidConfiguration(format!(
                "body mass {} and fuel mass {} must be positive",
                inputs.body_mass, inputs.fuel_mass
            )));
        }
        if !(inputs.wing_density >= 0.0) || !(inputs.steering_density >= 0.0) {
            return Err(SimulationError::InvalidConfiguration(
                "surface material densities must be non-negative".to_string(),
            ));
        }
        let body_cm = inputs.body_static_moment / inputs.body_mass;
        for (name, station) in [("body", body_cm), ("fuel", inputs.fuel_cm)] {
            if !(0.0..=body_length).contains(&station) {
                return Err(SimulationError::InvalidConfiguration(format!(
                    "{name} centre of mass {station} lies outside the body"
                )));
            }
        }

        let d = geometry.descriptor();
        let surfaces = [
            Self::surface_component(geometry, SurfaceKind::Steering, inputs.steering_density),
            Self::surface_component(geometry, SurfaceKind::Wing, inputs.wing_density),
        ];

        Ok(MassBudget {
            inputs,
            radius: 0.5 * d.mid_diameter,
            body_length: d.body_length,
            grain_length: d.body_length - d.nose_length - d.tail_length,
            surfaces,
            equipment: Component {
                mass: 0.0,
                station: body_cm,
                own_transverse: 0.0,
                own_axial: 0.0,
            },
        })
    }

    /// Budget topped up with unlisted equipment, placed at the body centre of
    /// mass, so that the fuelled vehicle weighs exactly `launch_mass`.
    ///
    /// Fails if `launch_mass` is lighter than the listed components.
    pub fn reconciled(&self, launch_mass: f64) -> SimulationResult<Self> {
        let listed = self.launch_mass() - self.equipment.mass;
        let extra = launch_mass - listed;
        if !extra.is_finite() || extra < -MASS_TOLERANCE {
            return Err(SimulationError::InvalidConfiguration(format!(
                "launch mass {launch_mass} kg is below the {listed:.3} kg of listed components"
            )));
        }
        let extra = extra.max(0.0);
        if extra > MASS_TOLERANCE {
            log::debug!(
                "adding {extra:.3} kg of unlisted equipment to reach launch mass {launch_mass} kg"
            );
        }
        let mut budget = self.clone();
        budget.equipment.mass = extra;
        Ok(budget)
    }

    fn surface_component(geometry: &GeometryModel, kind: SurfaceKind, density: f64) -> Component {
        let surface = geometry.surface(kind);
        let thickness = surface.delta * geometry.mean_chord(kind);
        let mass = geometry.surface_area(kind) * thickness * SURFACE_PROFILE_FILL * density;
        let half_span = 0.5 * surface.span;
        Component {
            mass,
            station: geometry.surface_centroid(kind),
            own_transverse: mass * geometry.mean_chord(kind).powi(2) / 12.0,
            own_axial: mass * half_span.powi(2) / 3.0,
        }
    }

    pub fn inputs(&self) -> &MassInputs {
        &self.inputs
    }

    /// Mass of the vehicle with all fuel burned.
    pub fn empty_mass(&self) -> f64 {
        let surfaces: f64 = self.surfaces.iter().map(|c| c.mass).sum();
        self.inputs.body_mass + self.equipment.mass + surfaces
    }

    pub fn equipment_mass(&self) -> f64 {
        self.equipment.mass
    }

    pub fn surface_mass(&self, kind: SurfaceKind) -> f64 {
        match kind {
            SurfaceKind::Steering => self.surfaces[0].mass,
            SurfaceKind::Wing => self.surfaces[1].mass,
        }
    }

    pub fn launch_mass(&self) -> f64 {
        self.empty_mass() + self.inputs.fuel_mass
    }

    /// Burned fraction corresponding to an integrated vehicle mass. Not
    /// clamped: a vehicle lighter than its empty mass gives a fraction above 1.
    pub fn fraction_for_mass(&self, mass: f64, launch_mass: f64) -> f64 {
        if self.inputs.fuel_mass <= 0.0 {
            return 0.0;
        }
        (launch_mass - mass) / self.inputs.fuel_mass
    }

    pub fn compute(&self, burned_fraction: f64) -> SimulationResult<MassState> {
        let remaining = self.inputs.fuel_mass * (1.0 - burned_fraction);
        let floor = self.empty_mass();
        let mass = floor + remaining;
        if !(0.0..=1.0).contains(&burned_fraction) || mass < floor - MASS_TOLERANCE {
            return Err(SimulationError::InfeasibleMass {
                fraction: burned_fraction,
                mass,
                floor,
            });
        }

        let r2 = self.radius.powi(2);
        let body_cm = self.inputs.body_static_moment / self.inputs.body_mass;
        let grain = self.grain_length * (1.0 - burned_fraction);
        let body = Component {
            mass: self.inputs.body_mass,
            station: body_cm,
            own_transverse: self.inputs.body_mass * (r2 / 4.0 + self.body_length.powi(2) / 12.0),
            own_axial: 0.5 * self.inputs.body_mass * r2,
        };
        let fuel = Component {
            mass: remaining,
            station: self.inputs.fuel_cm,
            own_transverse: remaining * (r2 / 4.0 + grain.powi(2) / 12.0),
            own_axial: 0.5 * remaining * r2,
        };

        let components = [body, fuel, self.equipment, self.surfaces[0], self.surfaces[1]];
        let moment: f64 = components.iter().map(|c| c.mass * c.station).sum();
        let center_of_mass = moment / mass;

        let transverse_inertia = components
            .iter()
            .map(|c| c.own_transverse + c.mass * (c.station - center_of_mass).powi(2))
            .sum();
        let axial_inertia = components.iter().map(|c| c.own_axial).sum();

        Ok(MassState {
            burned_fraction,
            mass,
            center_of_mass,
            axial_inertia,
            transverse_inertia,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn budget() -> MassBudget {
        let geometry = GeometryModel::new(GeometryModel::reference_descriptor()).unwrap();
        MassBudget::new(MassInputs::reference(), &geometry).unwrap()
    }

    #[test]
    fn test_full_and_empty_mass() {
        let b = budget();
        let full = b.compute(0.0).unwrap();
        let empty = b.compute(1.0).unwrap();
        assert_relative_eq!(full.mass - empty.mass, 315.0, epsilon = 1e-9);
        assert_relative_eq!(empty.mass, b.empty_mass(), epsilon = 1e-9);
        assert!(b.surface_mass(SurfaceKind::Wing) > b.surface_mass(SurfaceKind::Steering));
    }

    #[test]
    fn test_center_of_mass_moves_towards_body_centre_as_fuel_burns() {
        let b = budget();
        let body_cm = 665.0554 / 310.8413;
        let full = b.compute(0.0).unwrap();
        let empty = b.compute(1.0).unwrap();
        // fuel sits aft of the body centre, so burning it moves the CoM forward
        assert!(full.center_of_mass > empty.center_of_mass);
        assert!(empty.center_of_mass > body_cm);
    }

    #[test]
    fn test_inertia_positive_and_decreasing() {
        let b = budget();
        let mut previous = f64::INFINITY;
        for i in 0..=10 {
            let state = b.compute(i as f64 / 10.0).unwrap();
            assert!(state.transverse_inertia > 0.0);
            assert!(state.axial_inertia > 0.0);
            assert!(state.transverse_inertia <= previous + 1e-9);
            previous = state.transverse_inertia;
        }
    }

    #[test]
    fn test_rejects_fraction_outside_unit_interval() {
        let b = budget();
        assert!(matches!(b.compute(1.5), Err(SimulationError::InfeasibleMass { .. })));
        assert!(matches!(b.compute(-0.1), Err(SimulationError::InfeasibleMass { .. })));
        assert!(b.compute(f64::NAN).is_err());
    }

    #[test]
    fn test_fraction_for_mass() {
        let b = budget();
        let launch = b.launch_mass();
        assert_relative_eq!(b.fraction_for_mass(launch, launch), 0.0);
        assert_relative_eq!(b.fraction_for_mass(launch - 157.5, launch), 0.5, epsilon = 1e-12);
        // burning past the empty mass is reported, not hidden
        let overburnt = b.fraction_for_mass(launch - 400.0, launch);
        assert!(overburnt > 1.0);
        assert!(matches!(b.compute(overburnt), Err(SimulationError::InfeasibleMass { .. })));
    }

    #[test]
    fn test_reconciled_budget_matches_launch_mass() {
        let b = budget();
        assert_eq!(b.equipment_mass(), 0.0);
        let reconciled = b.reconciled(705.816).unwrap();

        assert_relative_eq!(reconciled.launch_mass(), 705.816, epsilon = 1e-9);
        assert_relative_eq!(reconciled.empty_mass(), 705.816 - 315.0, epsilon = 1e-9);
        assert_relative_eq!(reconciled.compute(0.0).unwrap().mass, 705.816, epsilon = 1e-9);
        assert_relative_eq!(reconciled.equipment_mass(), 705.816 - b.launch_mass(), epsilon = 1e-9);
        // the extra mass sits at the body centre, forward of the fuel
        let shifted = reconciled.compute(0.0).unwrap().center_of_mass;
        assert!(shifted < b.compute(0.0).unwrap().center_of_mass);

        // reconciling again replaces rather than stacks the equipment
        let again = reconciled.reconciled(705.816).unwrap();
        assert_relative_eq!(again.equipment_mass(), reconciled.equipment_mass(), epsilon = 1e-12);
    }

    #[test]
    fn test_launch_mass_below_components_rejected() {
        let b = budget();
        assert!(matches!(
            b.reconciled(b.launch_mass() - 10.0),
            Err(SimulationError::InvalidConfiguration(_))
        ));
        assert!(b.reconciled(f64::NAN).is_err());
    }
}
