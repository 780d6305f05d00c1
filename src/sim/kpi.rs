//! Post-hoc KPI computation from a completed simulation run.

use std::collections::BTreeMap;
use std::fmt;

use super::objective::{LOWER_BOUND, UPPER_BOUND};
use super::record::SimulationRecord;
use super::types::SimulationRun;

/// Energy and emissions attributed to one record row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FootprintRow {
    /// Minutes the compressor ran during the step.
    pub run_minutes: f64,
    /// Energy drawn during the step (MWh).
    pub mwh: f64,
    /// `mwh * moer` (lbs CO2).
    pub emissions: f64,
    /// Running total of `emissions` up to and including this row.
    pub cumulative: f64,
}

/// Converts committed decisions into energy and emissions, row by row.
///
/// Per row: `run_minutes = status * step_minutes`,
/// `mwh = watts / 1e6 * run_minutes / 60`, `emissions = mwh * moer`.
/// Rows no block wrote have status 0 and contribute nothing.
///
/// # Arguments
///
/// * `record` - Simulation record
/// * `watts` - Power draw while running
/// * `step_minutes` - Duration of one record row
pub fn carbon_footprint(record: &SimulationRecord, watts: f64, step_minutes: f64) -> Vec<FootprintRow> {
    let mut cumulative = 0.0;
    record
        .rows()
        .iter()
        .map(|row| {
            let run_minutes = f64::from(row.status) * step_minutes;
            let mwh = watts / 1e6 * run_minutes / 60.0;
            let emissions = mwh * row.moer;
            cumulative += emissions;
            FootprintRow {
                run_minutes,
                mwh,
                emissions,
                cumulative,
            }
        })
        .collect()
}

/// Aggregate indicators for one run.
///
/// Temperature statistics cover written rows only.
#[derive(Debug, Clone, PartialEq)]
pub struct KpiReport {
    /// Total emissions (lbs CO2).
    pub total_emissions_lbs: f64,
    /// Total energy drawn (MWh).
    pub energy_mwh: f64,
    /// Total compressor run time (minutes).
    pub run_minutes: f64,
    /// Mean compressor run time per clock hour that has written rows.
    pub avg_run_minutes_per_hour: f64,
    pub avg_temperature: f64,
    pub min_temperature: f64,
    pub max_temperature: f64,
    /// Written rows outside the safe band.
    pub out_of_band_steps: usize,
    /// Blocks whose chosen sequence was infeasible.
    pub infeasible_blocks: usize,
}

impl KpiReport {
    /// Computes all KPIs from a completed run.
    pub fn from_run(run: &SimulationRun) -> Self {
        let footprint = carbon_footprint(&run.record, run.watts, run.step_minutes);
        let total_emissions_lbs = footprint.last().map_or(0.0, |f| f.cumulative);
        let energy_mwh = footprint.iter().map(|f| f.mwh).sum();
        let run_minutes = footprint.iter().map(|f| f.run_minutes).sum();

        let mut hourly: BTreeMap<i64, f64> = BTreeMap::new();
        let mut temp_sum = 0.0;
        let mut min_temperature = f64::INFINITY;
        let mut max_temperature = f64::NEG_INFINITY;
        let mut written = 0_usize;
        let mut out_of_band_steps = 0_usize;

        for (row, fp) in run.record.rows().iter().zip(&footprint) {
            if !row.written {
                continue;
            }
            *hourly
                .entry(row.timestamp.timestamp().div_euclid(3600))
                .or_default() += fp.run_minutes;
            written += 1;
            temp_sum += row.recorded_temp;
            min_temperature = min_temperature.min(row.recorded_temp);
            max_temperature = max_temperature.max(row.recorded_temp);
            if row.recorded_temp < LOWER_BOUND || row.recorded_temp > UPPER_BOUND {
                out_of_band_steps += 1;
            }
        }

        if written == 0 {
            return Self {
                total_emissions_lbs,
                energy_mwh,
                run_minutes,
                avg_run_minutes_per_hour: 0.0,
                avg_temperature: 0.0,
                min_temperature: 0.0,
                max_temperature: 0.0,
                out_of_band_steps: 0,
                infeasible_blocks: run.infeasible_blocks(),
            };
        }

        Self {
            total_emissions_lbs,
            energy_mwh,
            run_minutes,
            avg_run_minutes_per_hour: hourly.values().sum::<f64>() / hourly.len() as f64,
            avg_temperature: temp_sum / written as f64,
            min_temperature,
            max_temperature,
            out_of_band_steps,
            infeasible_blocks: run.infeasible_blocks(),
        }
    }
}

impl fmt::Display for KpiReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- KPI Report ---")?;
        writeln!(f, "Total emissions:       {:.4} lbs", self.total_emissions_lbs)?;
        writeln!(f, "Energy:                {:.6} MWh", self.energy_mwh)?;
        writeln!(f, "Run time:              {:.1} min", self.run_minutes)?;
        writeln!(
            f,
            "Avg run per hour:      {:.2} min",
            self.avg_run_minutes_per_hour
        )?;
        writeln!(
            f,
            "Temperature:           avg {:.2}, min {:.2}, max {:.2}",
            self.avg_temperature, self.min_temperature, self.max_temperature
        )?;
        writeln!(f, "Out-of-band steps:     {}", self.out_of_band_steps)?;
        write!(f, "Infeasible blocks:     {}", self.infeasible_blocks)
    }
}
