//! Core simulation types: run timing, per-block results, and run output.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};

use super::record::SimulationRecord;

/// Rolling-horizon timing for one run.
///
/// The engine reads this for the clock range, the forecast horizon `L`
/// and how many of the `L` decisions are committed per block.
///
/// # Examples
///
/// ```
/// use chrono::{TimeDelta, TimeZone, Utc};
/// use fridge_sim::sim::types::SimConfig;
///
/// let start = Utc.with_ymd_and_hms(2019, 3, 1, 0, 0, 0).unwrap();
/// let end = Utc.with_ymd_and_hms(2019, 3, 1, 23, 0, 0).unwrap();
/// let cfg = SimConfig::new(start, end, TimeDelta::hours(1), 12, 12);
/// assert_eq!(cfg.block_count(), 24);
/// ```
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// First decision timestamp (inclusive).
    pub start: DateTime<Utc>,
    /// Last decision timestamp (inclusive).
    pub end: DateTime<Utc>,
    /// Time between decision blocks.
    pub cadence: TimeDelta,
    /// Number of steps each block optimizes over.
    pub forecast_length: usize,
    /// Number of leading decisions applied per block.
    pub commit_length: usize,
}

impl SimConfig {
    /// Creates a new run configuration.
    ///
    /// # Arguments
    ///
    /// * `start` - First decision timestamp
    /// * `end` - Last decision timestamp (inclusive)
    /// * `cadence` - Time between blocks (must be positive)
    /// * `forecast_length` - Horizon length in steps (must be > 0)
    /// * `commit_length` - Committed prefix length (`1..=forecast_length`)
    ///
    /// # Panics
    ///
    /// Panics if `cadence` is not positive, `forecast_length` is zero, or
    /// `commit_length` is outside `1..=forecast_length`.
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        cadence: TimeDelta,
        forecast_length: usize,
        commit_length: usize,
    ) -> Self {
        assert!(cadence > TimeDelta::zero(), "cadence must be positive");
        assert!(forecast_length > 0, "forecast_length must be > 0");
        assert!(
            (1..=forecast_length).contains(&commit_length),
            "commit_length must be in 1..=forecast_length"
        );
        Self {
            start,
            end,
            cadence,
            forecast_length,
            commit_length,
        }
    }

    /// Number of cadence ticks in `[start, end]`.
    pub fn block_count(&self) -> usize {
        if self.end < self.start {
            return 0;
        }
        let span = (self.end - self.start).num_seconds();
        (span / self.cadence.num_seconds().max(1)) as usize + 1
    }
}

/// Outcome of one rolling-horizon block.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockResult {
    /// Cadence tick the block was decided at.
    pub timestamp: DateTime<Utc>,
    pub start_temperature: f64,
    /// Temperature after the committed prefix.
    pub end_temperature: f64,
    /// Full chosen sequence over the horizon.
    pub sequence: Vec<u8>,
    /// Objective value of `sequence` (sentinel when infeasible).
    pub cost: f64,
    /// Emissions rate summed over the committed "on" steps.
    pub committed_emissions: f64,
    /// Sum of the forecast window's MOER values.
    pub window_moer_sum: f64,
    pub iterations: usize,
    pub feasible: bool,
}

impl fmt::Display for BlockResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bits: String = self
            .sequence
            .iter()
            .map(|b| if *b == 1 { '1' } else { '0' })
            .collect();
        write!(
            f,
            "{} temp={:.2}->{:.2} seq={} cost={:.1} window_moer={:.1} iters={}{}",
            self.timestamp.format("%Y-%m-%d %H:%M"),
            self.start_temperature,
            self.end_temperature,
            bits,
            self.cost,
            self.window_moer_sum,
            self.iterations,
            if self.feasible { "" } else { " INFEASIBLE" }
        )
    }
}

/// Everything a completed run produced.
#[derive(Debug, Clone)]
pub struct SimulationRun {
    /// Per-step committed decisions and temperatures.
    pub record: SimulationRecord,
    /// One entry per cadence tick.
    pub blocks: Vec<BlockResult>,
    /// Total compressor run time (minutes).
    pub run_time_minutes: f64,
    pub watts: f64,
    pub step_minutes: f64,
}

impl SimulationRun {
    /// Number of blocks whose chosen sequence left the safe band.
    pub fn infeasible_blocks(&self) -> usize {
        self.blocks.iter().filter(|b| !b.feasible).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2019, 3, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn block_count_is_inclusive() {
        let cfg = SimConfig::new(at(0), at(2), TimeDelta::hours(1), 12, 12);
        assert_eq!(cfg.block_count(), 3);
        let cfg = SimConfig::new(at(0), at(0), TimeDelta::hours(1), 12, 12);
        assert_eq!(cfg.block_count(), 1);
    }

    #[test]
    #[should_panic(expected = "commit_length")]
    fn commit_longer_than_horizon_panics() {
        SimConfig::new(at(0), at(1), TimeDelta::hours(1), 4, 5);
    }

    #[test]
    #[should_panic(expected = "forecast_length")]
    fn zero_horizon_panics() {
        SimConfig::new(at(0), at(1), TimeDelta::hours(1), 0, 0);
    }

    #[test]
    fn block_display_marks_infeasible() {
        let block = BlockResult {
            timestamp: at(5),
            start_temperature: 33.0,
            end_temperature: 38.0,
            sequence: vec![0, 1, 0],
            cost: 12.0,
            committed_emissions: 12.0,
            window_moer_sum: 30.0,
            iterations: 4,
            feasible: false,
        };
        let line = block.to_string();
        assert!(line.starts_with("2019-03-01 05:00"));
        assert!(line.contains("seq=010"));
        assert!(line.ends_with("INFEASIBLE"));
    }
}
