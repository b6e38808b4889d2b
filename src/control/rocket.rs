use super::geometry::{GeometryDescriptor, GeometryModel};
use super::mass_budget::{MassBudget, MassInputs};
use super::propulsion::{PropulsionLaw, PropulsionProfile};
use crate::errors::SimulationResult;

/// One vehicle configuration: geometry plus the models derived from it.
#[derive(Debug, Clone)]
pub struct Rocket {
    pub geometry: GeometryModel,
    pub mass_budget: MassBudget,
    pub propulsion: PropulsionProfile,
}

impl Rocket {
    pub fn new(
        geometry: GeometryDescriptor,
        mass: MassInputs,
        propulsion: PropulsionLaw,
    ) -> SimulationResult<Self> {
        let geometry = GeometryModel::new(geometry)?;
        let mass_budget = MassBudget::new(mass, &geometry)?;
        let propulsion = PropulsionProfile::new(propulsion)?;
        Ok(Rocket {
            geometry,
            mass_budget,
            propulsion,
        })
    }

    pub fn reference() -> SimulationResult<Self> {
        Self::new(
            GeometryModel::reference_descriptor(),
            MassInputs::reference(),
            PropulsionLaw::reference(),
        )
    }

    /// Same airframe with a different motor.
    pub fn with_propulsion(&self, law: PropulsionLaw) -> SimulationResult<Self> {
        Ok(Rocket {
            geometry: self.geometry.clone(),
            mass_budget: self.mass_budget.clone(),
            propulsion: PropulsionProfile::new(law)?,
        })
    }

    /// Same vehicle with its mass budget reconciled to a launch mass.
    pub fn for_launch_mass(&self, launch_mass: f64) -> SimulationResult<Self> {
        Ok(Rocket {
            geometry: self.geometry.clone(),
            mass_budget: self.mass_budget.reconciled(launch_mass)?,
            propulsion: self.propulsion.clone(),
        })
    }

    pub fn fuel_mass(&self) -> f64 {
        self.mass_budget.inputs().fuel_mass
    }
}
