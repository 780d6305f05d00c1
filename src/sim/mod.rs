pub mod baseline;
/// Simulation clock for cadence ticks.
pub mod clock;
pub mod controller;
pub mod engine;
pub mod kpi;
/// Emissions objective with the safe-band sentinel.
pub mod objective;
pub mod record;
pub mod search;
pub mod types;
