use thiserror::Error;

use crate::telemetry_system::telemetry::TrajectoryLog;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Infeasible mass: burned fraction {fraction} gives {mass} kg, below floor {floor} kg")]
    InfeasibleMass { fraction: f64, mass: f64, floor: f64 },

    #[error("Aerodynamics unavailable: coefficient table has not been prepared")]
    AerodynamicsUnavailable,

    #[error("Integration diverged at t = {time:.4} s: {reason}")]
    IntegrationDiverged {
        time: f64,
        reason: String,
        partial: Box<TrajectoryLog>,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Resource error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Table format error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl SimulationError {
    /// Partial trajectory accumulated before a divergence, if any.
    pub fn partial_log(&self) -> Option<&TrajectoryLog> {
        match self {
            SimulationError::IntegrationDiverged { partial, .. } => Some(partial),
            _ => None,
        }
    }
}

pub type SimulationResult<T> = Result<T, SimulationError>;
