//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use fridge_sim::devices::Refrigerator;
use fridge_sim::forecast::{EmissionsRow, EmissionsSeries};
use fridge_sim::sim::types::SimConfig;

/// First timestamp of every fixture series (2019-03-01 00:00 UTC).
pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2019, 3, 1, 0, 0, 0).unwrap()
}

/// Hourly blocks over `hours` hours with a 12-step horizon, fully committed.
pub fn hourly_config(hours: i64) -> SimConfig {
    SimConfig::new(
        start(),
        start() + TimeDelta::hours(hours - 1),
        TimeDelta::hours(1),
        12,
        12,
    )
}

/// Refrigerator with the reference rates (5/h heating, 10/h cooling, 5-minute steps).
pub fn reference_fridge(starting_temp: f64) -> Refrigerator {
    let mut fridge = Refrigerator::new(starting_temp);
    fridge.configure(5.0, 10.0, 5.0).unwrap();
    fridge
}

/// Deterministic mock MOER series: five-minute rows covering `hours` hours.
///
/// Values follow a daily profile with a clean overnight trough and a dirty
/// evening peak, plus a small within-hour ripple.
pub fn mock_series(hours: usize) -> EmissionsSeries {
    let rows = (0..hours * 12)
        .map(|i| {
            let hour = (i / 12) % 24;
            let daily = match hour {
                0..=5 => 600.0,
                6..=15 => 900.0,
                16..=20 => 1300.0,
                _ => 800.0,
            };
            EmissionsRow {
                timestamp: start() + TimeDelta::minutes(5 * i as i64),
                moer: daily + ((i * 37) % 11) as f64 * 15.0,
            }
        })
        .collect();
    EmissionsSeries::from_rows(rows).unwrap()
}
