pub mod api;
pub mod telemetry;
