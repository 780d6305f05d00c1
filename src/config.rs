//! TOML-based scenario configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::devices::Refrigerator;
use crate::devices::types::LapseRates;
use crate::error::SimError;
use crate::forecast::{EmissionsSeries, SyntheticMoer};
use crate::io::import::read_moer_csv_path;
use crate::sim::search::{
    Budget, DecaySchedule, DiscreteSearch, Exhaustive, HillClimb, MAX_EXHAUSTIVE_HORIZON,
    SimulatedAnnealing,
};
use crate::sim::types::SimConfig;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the reference scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::reference`] for the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Run window, cadence and seed.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Thermal model parameters.
    #[serde(default)]
    pub refrigerator: RefrigeratorConfig,
    /// Forecast horizon and committed prefix.
    #[serde(default)]
    pub forecast: ForecastConfig,
    /// Search algorithm and budget.
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    /// MOER source.
    #[serde(default)]
    pub moer: MoerConfig,
}

/// Run window, cadence and seed.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// First decision timestamp (RFC 3339 string).
    pub start: DateTime<Utc>,
    /// Last decision timestamp, inclusive (RFC 3339 string).
    pub end: DateTime<Utc>,
    /// Minutes between decision blocks (must be > 0).
    pub cadence_minutes: u32,
    /// Master random seed for the optimizer and the synthetic MOER series.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            start: Utc.with_ymd_and_hms(2019, 3, 1, 0, 0, 0).single().unwrap_or_default(),
            end: Utc.with_ymd_and_hms(2019, 3, 1, 23, 0, 0).single().unwrap_or_default(),
            cadence_minutes: 60,
            seed: 1,
        }
    }
}

/// Thermal model parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RefrigeratorConfig {
    /// Temperature at the start of the run.
    pub starting_temp: f64,
    /// Degrees gained per hour while off.
    pub heat_rate_per_hour: f64,
    /// Degrees lost per hour while on.
    pub cool_rate_per_hour: f64,
    /// Minutes per simulation step; also the MOER row spacing.
    pub step_minutes: u32,
    /// Power draw while running (W).
    pub watts: f64,
}

impl Default for RefrigeratorConfig {
    fn default() -> Self {
        Self {
            starting_temp: 33.0,
            heat_rate_per_hour: 5.0,
            cool_rate_per_hour: 10.0,
            step_minutes: 5,
            watts: 200.0,
        }
    }
}

/// Forecast horizon and committed prefix.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastConfig {
    /// Steps optimized per block.
    pub length: usize,
    /// Leading steps applied per block; defaults to `length`.
    pub commit_length: Option<usize>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            length: 12,
            commit_length: None,
        }
    }
}

/// Search algorithm selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    #[default]
    SimulatedAnnealing,
    HillClimb,
    Exhaustive,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SimulatedAnnealing => "simulated_annealing",
            Self::HillClimb => "hill_climb",
            Self::Exhaustive => "exhaustive",
        })
    }
}

/// Annealing temperature schedule, tagged by `kind`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum ScheduleConfig {
    Exponential {
        init_temp: f64,
        exp_const: f64,
        min_temp: f64,
    },
    Geometric {
        init_temp: f64,
        decay: f64,
        min_temp: f64,
    },
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self::Exponential {
            init_temp: 1.0,
            exp_const: 0.005,
            min_temp: 0.001,
        }
    }
}

impl From<ScheduleConfig> for DecaySchedule {
    fn from(cfg: ScheduleConfig) -> Self {
        match cfg {
            ScheduleConfig::Exponential {
                init_temp,
                exp_const,
                min_temp,
            } => Self::Exponential {
                init_temp,
                exp_const,
                min_temp,
            },
            ScheduleConfig::Geometric {
                init_temp,
                decay,
                min_temp,
            } => Self::Geometric {
                init_temp,
                decay,
                min_temp,
            },
        }
    }
}

/// Search algorithm and budget.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizerConfig {
    pub algorithm: Algorithm,
    /// Consecutive rejected moves before a search gives up.
    pub max_attempts: usize,
    /// Iteration cap per search (per restart for hill climbing).
    pub max_iters: usize,
    /// Extra random restarts for hill climbing.
    pub restarts: usize,
    pub schedule: ScheduleConfig,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::SimulatedAnnealing,
            max_attempts: 10,
            max_iters: 10,
            restarts: 0,
            schedule: ScheduleConfig::default(),
        }
    }
}

/// MOER source: a CSV file, or a seeded synthetic daily profile.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MoerConfig {
    /// CSV with `timestamp` and `MOER` columns; synthetic data when absent.
    pub csv_path: Option<PathBuf>,
    /// Mean synthetic emissions rate (lbs/MWh).
    pub base: f64,
    /// Daily swing of the synthetic profile (lbs/MWh).
    pub amplitude: f64,
    /// Phase offset of the synthetic profile (radians).
    pub phase_rad: f64,
    /// Per-sample noise standard deviation (lbs/MWh).
    pub noise_std: f64,
}

impl Default for MoerConfig {
    fn default() -> Self {
        Self {
            csv_path: None,
            base: 950.0,
            amplitude: 250.0,
            phase_rad: 0.0,
            noise_std: 40.0,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"forecast.length"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl ScenarioConfig {
    /// Returns the reference scenario: one day, hourly blocks, 12-step horizon.
    pub fn reference() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            refrigerator: RefrigeratorConfig::default(),
            forecast: ForecastConfig::default(),
            optimizer: OptimizerConfig::default(),
            moer: MoerConfig::default(),
        }
    }

    /// Returns the warm-start preset: a warm cabinet and hill climbing with restarts.
    pub fn warm_start() -> Self {
        Self {
            refrigerator: RefrigeratorConfig {
                starting_temp: 41.0,
                ..RefrigeratorConfig::default()
            },
            optimizer: OptimizerConfig {
                algorithm: Algorithm::HillClimb,
                max_iters: 50,
                restarts: 5,
                ..OptimizerConfig::default()
            },
            ..Self::reference()
        }
    }

    /// Returns the long-horizon preset: 24-step lookahead, half committed per block.
    pub fn long_horizon() -> Self {
        Self {
            forecast: ForecastConfig {
                length: 24,
                commit_length: Some(12),
            },
            optimizer: OptimizerConfig {
                max_attempts: 50,
                max_iters: 500,
                schedule: ScheduleConfig::Geometric {
                    init_temp: 50.0,
                    decay: 0.99,
                    min_temp: 0.001,
                },
                ..OptimizerConfig::default()
            },
            moer: MoerConfig {
                amplitude: 400.0,
                ..MoerConfig::default()
            },
            ..Self::reference()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["reference", "warm_start", "long_horizon"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "reference" => Ok(Self::reference()),
            "warm_start" => Ok(Self::warm_start()),
            "long_horizon" => Ok(Self::long_horizon()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Committed prefix length, defaulting to the full horizon.
    pub fn commit_length(&self) -> usize {
        self.forecast.commit_length.unwrap_or(self.forecast.length)
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid. A committed prefix
    /// shorter than the cadence is allowed but logged.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let s = &self.simulation;
        if s.cadence_minutes == 0 {
            errors.push(ConfigError::new("simulation.cadence_minutes", "must be > 0"));
        }
        if s.start > s.end {
            errors.push(ConfigError::new(
                "simulation.start",
                "must be <= simulation.end",
            ));
        }

        let r = &self.refrigerator;
        if !(r.heat_rate_per_hour > 0.0) {
            errors.push(ConfigError::new("refrigerator.heat_rate_per_hour", "must be > 0"));
        }
        if !(r.cool_rate_per_hour > 0.0) {
            errors.push(ConfigError::new("refrigerator.cool_rate_per_hour", "must be > 0"));
        }
        if r.step_minutes == 0 {
            errors.push(ConfigError::new("refrigerator.step_minutes", "must be > 0"));
        } else {
            let rates = LapseRates::from_hourly(
                r.heat_rate_per_hour,
                r.cool_rate_per_hour,
                f64::from(r.step_minutes),
            );
            if r.heat_rate_per_hour > 0.0 && !(rates.heat > 0.0) {
                errors.push(ConfigError::new(
                    "refrigerator.heat_rate_per_hour",
                    "rounds to 0 degrees per step",
                ));
            }
            if r.cool_rate_per_hour > 0.0 && !(rates.cool > 0.0) {
                errors.push(ConfigError::new(
                    "refrigerator.cool_rate_per_hour",
                    "rounds to 0 degrees per step",
                ));
            }
        }
        if !(r.watts > 0.0) {
            errors.push(ConfigError::new("refrigerator.watts", "must be > 0"));
        }
        if !r.starting_temp.is_finite() {
            errors.push(ConfigError::new("refrigerator.starting_temp", "must be finite"));
        }

        let fc = &self.forecast;
        let commit = self.commit_length();
        if fc.length == 0 {
            errors.push(ConfigError::new("forecast.length", "must be >= 1"));
        }
        if commit == 0 || commit > fc.length {
            errors.push(ConfigError::new(
                "forecast.commit_length",
                "must be in 1..=forecast.length",
            ));
        }
        let committed_minutes = commit as u64 * u64::from(r.step_minutes);
        let cadence = u64::from(s.cadence_minutes);
        if committed_minutes > cadence {
            errors.push(ConfigError::new(
                "forecast.commit_length",
                format!(
                    "commit_length * step_minutes ({committed_minutes} min) must be <= \
                     simulation.cadence_minutes ({cadence} min)"
                ),
            ));
        } else if committed_minutes > 0 && committed_minutes < cadence {
            warn!(
                committed_minutes,
                cadence_minutes = cadence,
                "committed prefix is shorter than the cadence; some steps will not be recorded"
            );
        }

        let o = &self.optimizer;
        if o.max_attempts == 0 {
            errors.push(ConfigError::new("optimizer.max_attempts", "must be >= 1"));
        }
        if o.max_iters == 0 {
            errors.push(ConfigError::new("optimizer.max_iters", "must be >= 1"));
        }
        if o.algorithm == Algorithm::Exhaustive && fc.length > MAX_EXHAUSTIVE_HORIZON {
            errors.push(ConfigError::new(
                "optimizer.algorithm",
                format!("exhaustive search requires forecast.length <= {MAX_EXHAUSTIVE_HORIZON}"),
            ));
        }
        match o.schedule {
            ScheduleConfig::Exponential {
                init_temp,
                exp_const,
                min_temp,
            } => {
                if !(init_temp > 0.0) {
                    errors.push(ConfigError::new("optimizer.schedule.init_temp", "must be > 0"));
                }
                if !(exp_const > 0.0) {
                    errors.push(ConfigError::new("optimizer.schedule.exp_const", "must be > 0"));
                }
                if !(min_temp > 0.0) {
                    errors.push(ConfigError::new("optimizer.schedule.min_temp", "must be > 0"));
                }
            }
            ScheduleConfig::Geometric {
                init_temp,
                decay,
                min_temp,
            } => {
                if !(init_temp > 0.0) {
                    errors.push(ConfigError::new("optimizer.schedule.init_temp", "must be > 0"));
                }
                if !(decay > 0.0 && decay <= 1.0) {
                    errors.push(ConfigError::new("optimizer.schedule.decay", "must be in (0, 1]"));
                }
                if !(min_temp > 0.0) {
                    errors.push(ConfigError::new("optimizer.schedule.min_temp", "must be > 0"));
                }
            }
        }

        if !(self.moer.noise_std >= 0.0) {
            errors.push(ConfigError::new("moer.noise_std", "must be >= 0"));
        }

        errors
    }

    /// Builds the run timing.
    ///
    /// # Panics
    ///
    /// Panics if the scenario does not pass [`ScenarioConfig::validate`].
    pub fn sim_config(&self) -> SimConfig {
        SimConfig::new(
            self.simulation.start,
            self.simulation.end,
            TimeDelta::minutes(i64::from(self.simulation.cadence_minutes)),
            self.forecast.length,
            self.commit_length(),
        )
    }

    /// Builds a configured refrigerator at the starting temperature.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::MalformedInput`] if a rate rounds to zero per step.
    pub fn refrigerator(&self) -> Result<Refrigerator, SimError> {
        let r = &self.refrigerator;
        let mut fridge = Refrigerator::with_watts(r.starting_temp, r.watts);
        fridge.configure(
            r.heat_rate_per_hour,
            r.cool_rate_per_hour,
            f64::from(r.step_minutes),
        )?;
        Ok(fridge)
    }

    pub fn budget(&self) -> Budget {
        Budget {
            max_attempts: self.optimizer.max_attempts,
            max_iters: self.optimizer.max_iters,
            restarts: self.optimizer.restarts,
        }
    }

    /// Builds the configured search algorithm.
    pub fn build_search(&self) -> Box<dyn DiscreteSearch> {
        match self.optimizer.algorithm {
            Algorithm::SimulatedAnnealing => {
                Box::new(SimulatedAnnealing::new(self.optimizer.schedule.into()))
            }
            Algorithm::HillClimb => Box::new(HillClimb),
            Algorithm::Exhaustive => Box::new(Exhaustive),
        }
    }

    /// Last MOER timestamp any block of the run reads.
    ///
    /// The final block's window starts at `end` and spans the larger of
    /// the cadence and the forecast horizon.
    pub fn series_end(&self) -> DateTime<Utc> {
        let step = TimeDelta::minutes(i64::from(self.refrigerator.step_minutes));
        let cadence = TimeDelta::minutes(i64::from(self.simulation.cadence_minutes));
        let horizon = step * self.forecast.length as i32;
        self.simulation.end + cadence.max(horizon) - step
    }

    /// Loads the MOER series for the run, clipped to the span blocks read.
    ///
    /// `csv_override` takes priority over `moer.csv_path`; with neither, a
    /// synthetic series is generated from `moer` and `simulation.seed`.
    ///
    /// # Errors
    ///
    /// Returns a [`SimError`] if the CSV cannot be read or parsed, or if
    /// its row spacing differs from `refrigerator.step_minutes`.
    pub fn load_series(&self, csv_override: Option<&Path>) -> Result<EmissionsSeries, SimError> {
        let start = self.simulation.start;
        let end = self.series_end();
        let csv = csv_override.or(self.moer.csv_path.as_deref());
        if let Some(path) = csv {
            return self.fit_series(&read_moer_csv_path(path)?);
        }

        let step = TimeDelta::minutes(i64::from(self.refrigerator.step_minutes.max(1)));
        let count = if end < start {
            0
        } else {
            ((end - start).num_minutes() / step.num_minutes()) as usize + 1
        };
        let m = &self.moer;
        let mut generator =
            SyntheticMoer::new(m.base, m.amplitude, m.phase_rad, m.noise_std, self.simulation.seed);
        Ok(generator.generate(start, step, count))
    }

    /// Clips a loaded series to the run span and checks its step.
    fn fit_series(&self, series: &EmissionsSeries) -> Result<EmissionsSeries, SimError> {
        let expected = TimeDelta::minutes(i64::from(self.refrigerator.step_minutes));
        match series.step() {
            Some(step) if step != expected => Err(SimError::malformed(format!(
                "MOER rows are {} minutes apart but refrigerator.step_minutes is {}",
                step.num_minutes(),
                self.refrigerator.step_minutes
            ))),
            _ => Ok(series.clip(self.simulation.start, self.series_end())),
        }
    }
}
