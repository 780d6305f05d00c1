//! Naive thermostat baseline.

/// Returns the baseline on/off sequence for `current_temperature`.
///
/// Looks up the temperature rounded to the nearest integer (ties to even):
/// 33 and 38 switch the compressor off for the whole horizon, everything
/// else (43 included) runs it for the whole horizon.
///
/// # Examples
///
/// ```
/// use fridge_sim::sim::baseline::baseline_decision;
///
/// assert_eq!(baseline_decision(38.2, 3), vec![0, 0, 0]);
/// assert_eq!(baseline_decision(40.0, 3), vec![1, 1, 1]);
/// ```
pub fn baseline_decision(current_temperature: f64, horizon: usize) -> Vec<u8> {
    let rounded = current_temperature.round_ties_even();
    let bit = if rounded == 33.0 || rounded == 38.0 { 0 } else { 1 };
    vec![bit; horizon]
}

#[cfg(test)]
mod tests {
    use super::baseline_decision;

    #[test]
    fn cold_table_entries_switch_off() {
        assert_eq!(baseline_decision(33.0, 12), vec![0; 12]);
        assert_eq!(baseline_decision(38.0, 12), vec![0; 12]);
    }

    #[test]
    fn warm_entries_switch_on() {
        assert_eq!(baseline_decision(43.0, 12), vec![1; 12]);
        assert_eq!(baseline_decision(40.0, 12), vec![1; 12]);
    }

    #[test]
    fn lookup_uses_rounded_temperature() {
        assert_eq!(baseline_decision(37.6, 4), vec![0; 4]);
        assert_eq!(baseline_decision(33.4167, 4), vec![0; 4]);
        assert_eq!(baseline_decision(38.5, 4), vec![0; 4]);
        assert_eq!(baseline_decision(33.5, 4), vec![1; 4]);
    }

    #[test]
    fn out_of_table_values_default_to_on() {
        assert_eq!(baseline_decision(-197.0, 2), vec![1, 1]);
        assert_eq!(baseline_decision(60.0, 2), vec![1, 1]);
        assert_eq!(baseline_decision(f64::NAN, 2), vec![1, 1]);
    }

    #[test]
    fn horizon_sets_length() {
        assert!(baseline_decision(35.0, 0).is_empty());
        assert_eq!(baseline_decision(35.0, 24).len(), 24);
    }
}
