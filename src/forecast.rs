//! Emissions-rate series and forecast windows over it.

use chrono::{DateTime, TimeDelta, Utc};
use rand::{SeedableRng, rngs::StdRng};

use crate::devices::types::gaussian_noise;
use crate::error::SimError;

/// One sample of the marginal operating emissions rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmissionsRow {
    pub timestamp: DateTime<Utc>,
    /// Emissions rate in lbs CO2 per MWh.
    pub moer: f64,
}

/// Ordered, fixed-step MOER samples.
///
/// Timestamps are strictly increasing. The series is read-only to the
/// simulation; [`SimulationRecord`](crate::sim::record::SimulationRecord)
/// carries the mutable per-row columns.
#[derive(Debug, Clone, Default)]
pub struct EmissionsSeries {
    rows: Vec<EmissionsRow>,
}

/// Consecutive row positions of a forecast window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastWindow {
    pub start: usize,
    pub len: usize,
}

impl ForecastWindow {
    /// Row indices covered by the window, in order.
    pub fn indices(&self) -> Vec<usize> {
        (self.start..self.start + self.len).collect()
    }
}

impl EmissionsSeries {
    /// Builds a series from rows.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::MalformedInput`] if timestamps are not strictly
    /// increasing, the spacing between rows is not constant, or a rate is
    /// not finite.
    pub fn from_rows(rows: Vec<EmissionsRow>) -> Result<Self, SimError> {
        for pair in rows.windows(2) {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(SimError::malformed(format!(
                    "emissions timestamps must be strictly increasing ({} follows {})",
                    pair[1].timestamp, pair[0].timestamp
                )));
            }
        }
        if let [first, second, ..] = rows.as_slice() {
            let spacing = second.timestamp - first.timestamp;
            if let Some(pair) = rows
                .windows(2)
                .find(|pair| pair[1].timestamp - pair[0].timestamp != spacing)
            {
                return Err(SimError::malformed(format!(
                    "emissions rows must be evenly spaced: {} follows {} but the series step is {} minutes",
                    pair[1].timestamp,
                    pair[0].timestamp,
                    spacing.num_minutes()
                )));
            }
        }
        if let Some(row) = rows.iter().find(|r| !r.moer.is_finite()) {
            return Err(SimError::malformed(format!(
                "non-finite MOER value at {}",
                row.timestamp
            )));
        }
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[EmissionsRow] {
        &self.rows
    }

    /// Spacing between consecutive rows, or `None` with fewer than two rows.
    pub fn step(&self) -> Option<TimeDelta> {
        match self.rows.as_slice() {
            [first, second, ..] => Some(second.timestamp - first.timestamp),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keeps only rows with `start <= timestamp <= end`.
    pub fn clip(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            rows: self
                .rows
                .iter()
                .filter(|r| r.timestamp >= start && r.timestamp <= end)
                .copied()
                .collect(),
        }
    }

    /// Position of the row at exactly `timestamp`.
    pub fn position(&self, timestamp: DateTime<Utc>) -> Option<usize> {
        self.rows
            .binary_search_by(|r| r.timestamp.cmp(&timestamp))
            .ok()
    }

    /// Returns `length` consecutive row positions starting at `timestamp`.
    ///
    /// # Errors
    ///
    /// * [`SimError::MissingTimestamp`] if no row matches `timestamp`
    /// * [`SimError::WindowUnavailable`] if the window would run past the end
    pub fn forecast_window(
        &self,
        timestamp: DateTime<Utc>,
        length: usize,
    ) -> Result<ForecastWindow, SimError> {
        let start = self
            .position(timestamp)
            .ok_or(SimError::MissingTimestamp(timestamp))?;
        let available = self.rows.len() - start;
        if length > available {
            return Err(SimError::WindowUnavailable {
                timestamp,
                length,
                available,
            });
        }
        Ok(ForecastWindow { start, len: length })
    }

    /// Materializes the MOER values for a window.
    pub fn rates_for(&self, window: &ForecastWindow) -> Vec<f64> {
        self.rows[window.start..window.start + window.len]
            .iter()
            .map(|r| r.moer)
            .collect()
    }
}

/// Seeded synthetic MOER generator used when no CSV data is supplied.
///
/// Produces a daily sinusoid around `base` with Gaussian noise, clamped at
/// zero. Identical parameters and seed always give the same series.
///
/// # Examples
///
/// ```
/// use chrono::{TimeDelta, TimeZone, Utc};
/// use fridge_sim::forecast::SyntheticMoer;
///
/// let start = Utc.with_ymd_and_hms(2019, 3, 1, 0, 0, 0).unwrap();
/// let mut generator = SyntheticMoer::new(900.0, 250.0, 0.0, 0.0, 42);
/// let series = generator.generate(start, TimeDelta::minutes(5), 12);
/// assert_eq!(series.len(), 12);
/// ```
#[derive(Debug, Clone)]
pub struct SyntheticMoer {
    /// Mean emissions rate (lbs/MWh).
    pub base: f64,
    /// Daily swing around the mean (lbs/MWh).
    pub amplitude: f64,
    /// Phase offset of the daily pattern (radians).
    pub phase_rad: f64,
    /// Standard deviation of the per-sample noise (lbs/MWh).
    pub noise_std: f64,
    rng: StdRng,
}

impl SyntheticMoer {
    pub fn new(base: f64, amplitude: f64, phase_rad: f64, noise_std: f64, seed: u64) -> Self {
        Self {
            base,
            amplitude,
            phase_rad,
            noise_std,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Emissions rate at `timestamp`.
    pub fn sample(&mut self, timestamp: DateTime<Utc>) -> f64 {
        let seconds_into_day = timestamp.timestamp().rem_euclid(86_400) as f64;
        let day_pos = seconds_into_day / 86_400.0;
        let angle = 2.0 * std::f64::consts::PI * day_pos + self.phase_rad;
        let noise = gaussian_noise(&mut self.rng, self.noise_std);
        (self.base + self.amplitude * angle.sin() + noise).max(0.0)
    }

    /// Generates `count` samples spaced `step` apart from `start`.
    pub fn generate(&mut self, start: DateTime<Utc>, step: TimeDelta, count: usize) -> EmissionsSeries {
        let mut rows = Vec::with_capacity(count);
        let mut timestamp = start;
        for _ in 0..count {
            rows.push(EmissionsRow {
                timestamp,
                moer: self.sample(timestamp),
            });
            timestamp += step;
        }
        EmissionsSeries { rows }
    }
}
