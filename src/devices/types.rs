//! Common types and the shared thermal step rule.

use rand::{Rng, rngs::StdRng};

use crate::error::SimError;

/// Decimal places the live refrigerator model rounds to after each step.
pub const MODEL_PRECISION: i32 = 4;

/// Decimal places the objective function rounds to while simulating a
/// hypothetical sequence.
///
/// Kept distinct from [`MODEL_PRECISION`]; see DESIGN.md.
pub const OBJECTIVE_PRECISION: i32 = 3;

/// A single on/off decision for one time step.
///
/// `On` means the compressor runs and the cabinet cools; `Off` means the
/// cabinet passively warms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Off,
    On,
}

impl Decision {
    /// Bit representation used by decision sequences.
    pub fn bit(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::On => 1,
        }
    }
}

impl TryFrom<u8> for Decision {
    type Error = SimError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Off),
            1 => Ok(Self::On),
            other => Err(SimError::malformed(format!(
                "decision values must be 0 or 1, got {other}"
            ))),
        }
    }
}

/// Per-step temperature deltas.
///
/// # Fields
/// * `heat` - Degrees gained per step while off
/// * `cool` - Degrees lost per step while on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LapseRates {
    pub heat: f64,
    pub cool: f64,
}

impl LapseRates {
    /// Derives per-step rates from hourly rates, rounded to [`MODEL_PRECISION`].
    ///
    /// # Arguments
    ///
    /// * `heat_rate_per_hour` - Degrees gained per hour while off
    /// * `cool_rate_per_hour` - Degrees lost per hour while on
    /// * `step_minutes` - Length of one time step in minutes
    pub fn from_hourly(heat_rate_per_hour: f64, cool_rate_per_hour: f64, step_minutes: f64) -> Self {
        Self {
            heat: round_to(heat_rate_per_hour / 60.0 * step_minutes, MODEL_PRECISION),
            cool: round_to(cool_rate_per_hour / 60.0 * step_minutes, MODEL_PRECISION),
        }
    }
}

/// Rounds `value` to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10_f64.powi(decimals);
    (value * scale).round() / scale
}

/// Applies one step of the linear heating/cooling rule.
///
/// Shared by [`Refrigerator`](super::Refrigerator) and the objective
/// function so both advance temperature the same way; only the rounding
/// precision differs between callers.
///
/// # Arguments
///
/// * `temperature` - Temperature before the step
/// * `decision` - Whether the compressor runs during the step
/// * `rates` - Per-step heating and cooling deltas
/// * `decimals` - Rounding precision applied to the result
///
/// # Returns
///
/// The temperature after the step.
pub fn next_temperature(temperature: f64, decision: Decision, rates: LapseRates, decimals: i32) -> f64 {
    let next = match decision {
        Decision::Off => temperature + rates.heat,
        Decision::On => temperature - rates.cool,
    };
    round_to(next, decimals)
}

/// Utility function to generate Gaussian noise using Box-Muller transform.
///
/// # Arguments
///
/// * `rng` - Random number generator
/// * `std_dev` - Standard deviation of the noise
///
/// # Returns
///
/// Random value from a Gaussian distribution with mean 0 and specified standard deviation
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-9, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn decision_round_trips_through_bits() {
        assert_eq!(Decision::try_from(0).ok(), Some(Decision::Off));
        assert_eq!(Decision::try_from(1).ok(), Some(Decision::On));
        assert_eq!(Decision::On.bit(), 1);
    }

    #[test]
    fn non_binary_decision_is_rejected() {
        let err = Decision::try_from(2);
        assert!(matches!(err, Err(SimError::MalformedInput(_))));
    }

    #[test]
    fn hourly_rates_are_scaled_and_rounded() {
        let rates = LapseRates::from_hourly(5.0, 10.0, 5.0);
        assert_eq!(rates.heat, 0.4167);
        assert_eq!(rates.cool, 0.8333);
    }

    #[test]
    fn step_rule_respects_precision() {
        let rates = LapseRates {
            heat: 0.4167,
            cool: 0.8333,
        };
        assert_eq!(next_temperature(33.0, Decision::Off, rates, 4), 33.4167);
        assert_eq!(next_temperature(33.0, Decision::Off, rates, 3), 33.417);
        assert_eq!(next_temperature(40.0, Decision::On, rates, 4), 39.1667);
    }

    #[test]
    fn gaussian_noise_is_zero_without_spread() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(gaussian_noise(&mut rng, 0.0), 0.0);
    }
}
