pub mod config;
pub mod error;
pub mod rules;
pub mod telemetry;
pub mod workflows;
