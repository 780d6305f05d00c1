//! Emissions-aware refrigerator duty-cycle simulator.

pub mod config;
pub mod devices;
pub mod error;
pub mod forecast;
pub mod io;
pub mod reporting;
/// Simulation engine, objective, search, and controller modules.
pub mod sim;
