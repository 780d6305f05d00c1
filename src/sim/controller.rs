//! Block controllers: the naive baseline and the search-based optimizer.

use chrono::{DateTime, Utc};
use rand::{SeedableRng, rngs::StdRng};
use tracing::{debug, warn};

use crate::devices::types::LapseRates;
use crate::error::SimError;

use super::baseline::baseline_decision;
use super::objective::{evaluate, is_infeasible};
use super::search::{Budget, DiscreteSearch, Problem, SearchOutcome, initial_state};

/// Everything a controller sees when deciding one block.
#[derive(Debug, Clone)]
pub struct BlockInput<'a> {
    pub timestamp: DateTime<Utc>,
    /// Cabinet temperature at the start of the block.
    pub temperature: f64,
    pub lapse: LapseRates,
    /// MOER forecast, one value per step of the horizon.
    pub moer: &'a [f64],
}

/// A controller's chosen sequence for one block.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockDecision {
    pub sequence: Vec<u8>,
    /// Objective value of `sequence` over the whole horizon.
    pub cost: f64,
    /// Search iterations spent (0 for the baseline).
    pub iterations: usize,
}

impl BlockDecision {
    pub fn is_feasible(&self) -> bool {
        !is_infeasible(self.cost)
    }
}

/// Decides an on/off sequence for each rolling-horizon block.
pub trait Controller {
    /// Chooses a sequence as long as `input.moer`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::MalformedInput`] for an empty horizon.
    fn decide(&mut self, input: &BlockInput<'_>) -> Result<BlockDecision, SimError>;

    /// Short identifier for logs and reports.
    fn name(&self) -> &'static str;
}

/// Thermostat lookup table; ignores the MOER forecast.
#[derive(Debug, Default, Clone, Copy)]
pub struct BaselineController;

impl Controller for BaselineController {
    fn decide(&mut self, input: &BlockInput<'_>) -> Result<BlockDecision, SimError> {
        let sequence = baseline_decision(input.temperature, input.moer.len());
        let cost = evaluate(
            &sequence,
            input.moer,
            input.temperature,
            input.lapse.heat,
            input.lapse.cool,
        )?;
        Ok(BlockDecision {
            sequence,
            cost,
            iterations: 0,
        })
    }

    fn name(&self) -> &'static str {
        "baseline"
    }
}

/// Minimizes emissions over each block with a [`DiscreteSearch`].
///
/// Owns one seeded RNG for the whole run, so a run is reproducible from
/// its seed.
pub struct OptimizingController<S: DiscreteSearch> {
    search: S,
    budget: Budget,
    rng: StdRng,
}

impl<S: DiscreteSearch> OptimizingController<S> {
    pub fn new(search: S, budget: Budget, seed: u64) -> Self {
        Self {
            search,
            budget,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Runs the search for one block and returns the full outcome.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::MalformedInput`] for an empty horizon.
    pub fn optimize(&mut self, input: &BlockInput<'_>) -> Result<SearchOutcome, SimError> {
        let problem = Problem::new(input.moer.to_vec(), input.temperature, input.lapse)?;
        let seed = initial_state(input.temperature, problem.len());
        let outcome = self
            .search
            .search(&problem, seed.as_deref(), &self.budget, &mut self.rng);

        debug!(
            timestamp = %input.timestamp,
            algorithm = self.search.name(),
            seeded = seed.is_some(),
            iterations = outcome.iterations(),
            best_cost = outcome.best_cost,
            "block optimized"
        );
        if !outcome.is_feasible() {
            warn!(
                timestamp = %input.timestamp,
                temperature = input.temperature,
                "no feasible sequence found within the search budget"
            );
        }
        Ok(outcome)
    }
}

impl<S: DiscreteSearch> Controller for OptimizingController<S> {
    fn decide(&mut self, input: &BlockInput<'_>) -> Result<BlockDecision, SimError> {
        let outcome = self.optimize(input)?;
        let iterations = outcome.iterations();
        Ok(BlockDecision {
            sequence: outcome.best_sequence,
            cost: outcome.best_cost,
            iterations,
        })
    }

    fn name(&self) -> &'static str {
        "optimized"
    }
}
