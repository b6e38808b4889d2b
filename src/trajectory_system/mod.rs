pub mod aerodynamics;
pub mod coefficient_table;
pub mod flight_phase;
pub mod kinematics;
