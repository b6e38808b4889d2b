pub mod config;
pub mod constants;
pub mod control;
pub mod errors;
pub mod evaluation;
pub mod telemetry_system;
pub mod trajectory_system;
pub mod utils;

pub use constants::*;
pub use config::{load_scenario, ScenarioConfig};
pub use control::environment::Atmosphere;
pub use control::geometry::{GeometryDescriptor, GeometryModel, SurfaceDescriptor};
pub use control::guidance::{PitchPolicy, PitchPolicyConfig};
pub use control::mass_budget::{MassBudget, MassInputs, MassState};
pub use control::mission::{IntegrationSettings, LaunchConditions, Mission, TargetInfo};
pub use control::propulsion::{PropulsionLaw, PropulsionProfile, PropulsionState};
pub use control::rocket::Rocket;
pub use errors::{SimulationError, SimulationResult};

// Re-export commonly used items from trajectory_system
pub use trajectory_system::aerodynamics::{
    AeroCoefficients, AeroDerivatives, AeroSettings, AerodynamicsModel,
};
pub use trajectory_system::coefficient_table::CoefficientTable;
pub use trajectory_system::flight_phase::{FlightEvent, FlightPhase, TerminationReason};
pub use trajectory_system::kinematics::{
    BallisticsCalculationResult, FlightState, TrajectoryIntegrator,
};

// Re-export commonly used items from telemetry_system
pub use telemetry_system::log_joiner::{join, JoinResult, JoinedPoint};
pub use telemetry_system::telemetry::TrajectoryLog;

pub use evaluation::constraints::{ConstraintConfig, ConstraintEvaluator, PointFilter};
pub use evaluation::feasibility::FeasibilityFlags;
pub use evaluation::report::{Violation, ViolationKind, ViolationReport};

// Re-export commonly used utilities
pub use utils::vector2d::Vector2D;
