//! Rolling-horizon simulation engine.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::devices::Refrigerator;
use crate::error::SimError;
use crate::forecast::EmissionsSeries;

use super::clock::Clock;
use super::controller::{BlockInput, Controller};
use super::objective::emissions_cost;
use super::record::SimulationRecord;
use super::types::{BlockResult, SimConfig, SimulationRun};

/// Rolling-horizon engine that owns the refrigerator and a controller.
///
/// Generic over `C: Controller` so each policy is statically dispatched.
/// At every cadence tick the engine reads the MOER forecast window, asks
/// the controller for a sequence, drives the refrigerator through the
/// committed prefix and records each committed step.
pub struct Engine<C: Controller> {
    config: SimConfig,
    fridge: Refrigerator,
    controller: C,
    series: EmissionsSeries,
}

impl<C: Controller> Engine<C> {
    /// Creates a new simulation engine.
    ///
    /// # Arguments
    ///
    /// * `config` - Run timing and horizon
    /// * `fridge` - Configured refrigerator; its temperature carries across blocks
    /// * `controller` - Block decision policy
    /// * `series` - MOER series covering every window the run will request
    pub fn new(config: SimConfig, fridge: Refrigerator, controller: C, series: EmissionsSeries) -> Self {
        Self {
            config,
            fridge,
            controller,
            series,
        }
    }

    /// Decides and applies one block at `timestamp`.
    ///
    /// # Errors
    ///
    /// * [`SimError::MissingTimestamp`] / [`SimError::WindowUnavailable`] if
    ///   the series cannot supply the forecast window
    /// * [`SimError::Unconfigured`] if the refrigerator has no lapse rates
    /// * [`SimError::AlreadyRecorded`] if this block overlaps an earlier one
    pub fn step(
        &mut self,
        timestamp: DateTime<Utc>,
        record: &mut SimulationRecord,
    ) -> Result<BlockResult, SimError> {
        // 1. Forecast window, resolved before anything mutates
        let window = self
            .series
            .forecast_window(timestamp, self.config.forecast_length)?;
        let moer = self.series.rates_for(&window);
        let lapse = self.fridge.rates()?;
        let window_indices = window.indices();
        let commit = self.config.commit_length.min(window_indices.len());
        record.check_writable(&window_indices[..commit])?;
        let start_temperature = self.fridge.current_temperature();

        // 2. Controller decision over the whole horizon
        let input = BlockInput {
            timestamp,
            temperature: start_temperature,
            lapse,
            moer: &moer,
        };
        let decision = self.controller.decide(&input)?;

        // 3. Apply and record the committed prefix
        let commit = commit.min(decision.sequence.len());
        let committed = &decision.sequence[..commit];
        let indices = &window_indices[..commit];
        let temperatures = self.fridge.trace(committed)?;
        record.record(indices, committed, &temperatures)?;

        let result = BlockResult {
            timestamp,
            start_temperature,
            end_temperature: self.fridge.current_temperature(),
            committed_emissions: emissions_cost(committed, &moer[..commit]),
            window_moer_sum: moer.iter().sum(),
            feasible: decision.is_feasible(),
            sequence: decision.sequence,
            cost: decision.cost,
            iterations: decision.iterations,
        };

        info!(
            policy = self.controller.name(),
            timestamp = %result.timestamp,
            temperature = result.end_temperature,
            sequence = ?result.sequence,
            cost = result.cost,
            window_moer = result.window_moer_sum,
            iterations = result.iterations,
            "block"
        );
        if !result.feasible {
            warn!(
                policy = self.controller.name(),
                timestamp = %result.timestamp,
                "chosen sequence leaves the safe temperature band"
            );
        }
        Ok(result)
    }

    /// Runs every cadence tick from `start` to `end` inclusive.
    ///
    /// # Errors
    ///
    /// Stops at the first block error; see [`Engine::step`].
    pub fn run(&mut self) -> Result<SimulationRun, SimError> {
        let mut record = SimulationRecord::from_series(&self.series);
        let mut blocks = Vec::with_capacity(self.config.block_count());
        let clock = Clock::new(self.config.start, self.config.end, self.config.cadence);
        for timestamp in clock {
            blocks.push(self.step(timestamp, &mut record)?);
        }
        Ok(SimulationRun {
            record,
            blocks,
            run_time_minutes: self.fridge.cumulative_run_time(),
            watts: self.fridge.watts,
            step_minutes: self.fridge.step_minutes(),
        })
    }

    /// Returns a reference to the refrigerator.
    pub fn refrigerator(&self) -> &Refrigerator {
        &self.fridge
    }

    /// Returns a reference to the simulation configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }
}
