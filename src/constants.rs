// Physical Constants
pub const GRAVITY: f64 = 9.81; // m/s²

// Environmental Constants
pub const SEA_LEVEL_TEMPERATURE: f64 = 288.15; // K
pub const TROPOSPHERE_TEMP_GRADIENT: f64 = -6.5 / 1_000.0; // K per meter
pub const TROPOSPHERE_HEIGHT: f64 = 11_000.0; // m
pub const TROPOPAUSE_TEMPERATURE: f64 = 216.65; // K
pub const TROPOPAUSE_PRESSURE: f64 = 22_632.0; // Pa
pub const SEA_LEVEL_PRESSURE: f64 = 101_325.0; // Pa
pub const AIR_GAS_CONSTANT: f64 = 287.05; // J/(kg·K)
pub const AIR_HEAT_RATIO: f64 = 1.4;
pub const KINEMATIC_VISCOSITY_SEA_LEVEL: f64 = 1.46e-5; // m²/s
pub const SPEED_OF_SOUND_SEA_LEVEL: f64 = 340.29; // m/s

// Simulation Parameters
pub const TIME_STEP: f64 = 0.01; // s
pub const MAX_SIMULATION_TIME: f64 = 300.0; // s
pub const STALL_VELOCITY: f64 = 50.0; // m/s

// Aerodynamic table grid
pub const TABLE_ALPHA_MAX_DEG: f64 = 20.0;
pub const TABLE_ALPHA_STEP_DEG: f64 = 1.0;
pub const TABLE_MACH_MIN: f64 = 0.2;
pub const TABLE_MACH_MAX: f64 = 4.0;
pub const TABLE_MACH_STEP: f64 = 0.1;
pub const STALL_ALPHA_DEG: f64 = 16.0;
pub const TABLE_MAX_NODES: f64 = 1_000_000.0;

// Numerical guards
pub const DENOMINATOR_EPSILON: f64 = 1e-9;
pub const MASS_TOLERANCE: f64 = 1e-6; // kg
