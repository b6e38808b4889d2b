pub mod log_format;
pub mod log_joiner;
pub mod telemetry;
