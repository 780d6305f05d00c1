//! Emissions-minimizing objective for candidate decision sequences.

use crate::devices::types::{Decision, LapseRates, OBJECTIVE_PRECISION, next_temperature};
use crate::error::SimError;

/// Cost returned for any sequence that leaves the temperature band.
pub const SENTINEL_COST: f64 = 99_999_999_999.0;

/// Lowest safe cabinet temperature (inclusive).
pub const LOWER_BOUND: f64 = 33.0;

/// Highest safe cabinet temperature (inclusive).
pub const UPPER_BOUND: f64 = 43.0;

/// Scores a candidate sequence against a MOER window.
///
/// Returns `Σ rates[i] * sequence[i]` when the simulated temperature stays
/// inside `[LOWER_BOUND, UPPER_BOUND]` after every step, and
/// [`SENTINEL_COST`] as soon as a step leaves the band. The simulation runs
/// on a local copy of the temperature; no model is mutated.
///
/// # Arguments
///
/// * `sequence` - Candidate on/off bits
/// * `rates` - MOER values, one per step
/// * `start_temperature` - Temperature before the first step
/// * `heat_rate` - Degrees gained per step while off
/// * `cool_rate` - Degrees lost per step while on
///
/// # Errors
///
/// Returns [`SimError::MalformedInput`] if the lengths differ or a value is
/// not 0 or 1.
pub fn evaluate(
    sequence: &[u8],
    rates: &[f64],
    start_temperature: f64,
    heat_rate: f64,
    cool_rate: f64,
) -> Result<f64, SimError> {
    validate(sequence, rates)?;
    let lapse = LapseRates {
        heat: heat_rate,
        cool: cool_rate,
    };
    Ok(penalized_cost(sequence, rates, start_temperature, lapse))
}

/// Checks the structural preconditions of [`evaluate`].
///
/// # Errors
///
/// Returns [`SimError::MalformedInput`] on length mismatch or non-binary values.
pub fn validate(sequence: &[u8], rates: &[f64]) -> Result<(), SimError> {
    if sequence.len() != rates.len() {
        return Err(SimError::malformed(format!(
            "decision sequence has {} steps but rate vector has {}",
            sequence.len(),
            rates.len()
        )));
    }
    for &bit in sequence {
        Decision::try_from(bit)?;
    }
    Ok(())
}

/// Emissions cost of the "on" steps, ignoring temperature.
pub fn emissions_cost(sequence: &[u8], rates: &[f64]) -> f64 {
    sequence
        .iter()
        .zip(rates)
        .map(|(&bit, &rate)| rate * f64::from(bit))
        .sum()
}

/// Objective on pre-validated input.
pub(crate) fn penalized_cost(
    sequence: &[u8],
    rates: &[f64],
    start_temperature: f64,
    lapse: LapseRates,
) -> f64 {
    let mut temperature = start_temperature;
    for &bit in sequence {
        let decision = if bit == 0 { Decision::Off } else { Decision::On };
        temperature = next_temperature(temperature, decision, lapse, OBJECTIVE_PRECISION);
        if !(LOWER_BOUND..=UPPER_BOUND).contains(&temperature) {
            return SENTINEL_COST;
        }
    }
    emissions_cost(sequence, rates)
}

/// Whether `cost` marks an infeasible sequence.
pub fn is_infeasible(cost: f64) -> bool {
    cost >= SENTINEL_COST
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feasible_sequence_costs_raw_emissions() {
        // 38 -> 37 -> 38 -> 37, all inside the band
        let cost = evaluate(&[1, 0, 1], &[10.0, 20.0, 30.0], 38.0, 1.0, 1.0);
        assert_eq!(cost.ok(), Some(40.0));
    }

    #[test]
    fn all_off_feasible_sequence_is_free() {
        let cost = evaluate(&[0, 0, 0], &[500.0, 600.0, 700.0], 33.0, 0.4167, 0.8333);
        assert_eq!(cost.ok(), Some(0.0));
    }

    #[test]
    fn overheating_returns_sentinel() {
        let cost = evaluate(&[0, 0], &[1.0, 1.0], 42.5, 1.0, 1.0);
        assert_eq!(cost.ok(), Some(SENTINEL_COST));
    }

    #[test]
    fn overcooling_returns_sentinel() {
        let cost = evaluate(&[1, 1, 1], &[1.0, 1.0, 1.0], 35.0, 1.0, 1.0);
        assert_eq!(cost.ok(), Some(SENTINEL_COST));
    }

    #[test]
    fn early_violation_is_not_rescued_later() {
        // 43.5 after the first step, back to 42.5 after the second
        let cost = evaluate(&[0, 1], &[1.0, 1.0], 42.5, 1.0, 1.0);
        assert_eq!(cost.ok(), Some(SENTINEL_COST));
    }

    #[test]
    fn band_edges_are_feasible() {
        assert_eq!(evaluate(&[0], &[7.0], 42.0, 1.0, 1.0).ok(), Some(0.0));
        assert_eq!(evaluate(&[1], &[7.0], 34.0, 1.0, 1.0).ok(), Some(7.0));
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let err = evaluate(&[1, 0], &[1.0], 38.0, 1.0, 1.0);
        assert!(matches!(err, Err(SimError::MalformedInput(_))));
    }

    #[test]
    fn non_binary_value_is_rejected() {
        let err = evaluate(&[1, 3], &[1.0, 1.0], 38.0, 1.0, 1.0);
        assert!(matches!(err, Err(SimError::MalformedInput(_))));
    }

    #[test]
    fn evaluation_is_deterministic() {
        let seq = [1, 0, 0, 1, 0, 1];
        let rates = [900.0, 850.0, 1010.0, 720.0, 640.0, 800.0];
        let a = evaluate(&seq, &rates, 37.2, 0.4167, 0.8333).ok();
        let b = evaluate(&seq, &rates, 37.2, 0.4167, 0.8333).ok();
        assert_eq!(a, b);
    }
}
