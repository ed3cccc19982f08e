pub mod batch;
pub mod telemetry;
