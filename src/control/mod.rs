pub mod environment;
pub mod geometry;
pub mod guidance;
pub mod mass_budget;
pub mod mission;
pub mod propulsion;
pub mod rocket;
