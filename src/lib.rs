pub mod api;
pub mod config;
pub mod dashboard;
pub mod domain;
pub mod forecast;
pub mod ml;
pub mod state;
pub mod telemetry;
