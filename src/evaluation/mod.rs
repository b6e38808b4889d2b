pub mod batch;
pub mod constraints;
pub mod feasibility;
pub mod report;
