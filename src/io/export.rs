//! CSV export for the simulation record and its carbon footprint.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::kpi::carbon_footprint;
use crate::sim::types::SimulationRun;

/// Column header for record export.
const HEADER: &str = "timestamp,moer,status,recorded_temp,run_minutes,\
                      mwh,emissions_lbs,cumulative_emissions_lbs";

/// Exports a run's record to a CSV file at the given path.
///
/// Writes a header row followed by one data row per series row, including
/// rows no block wrote. Produces deterministic output for identical runs.
///
/// # Arguments
///
/// * `run` - Completed simulation run
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(run: &SimulationRun, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(run, buf)
}

/// Writes a run's record as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(run: &SimulationRun, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(HEADER.split(',').map(str::trim))?;

    let footprint = carbon_footprint(&run.record, run.watts, run.step_minutes);
    for (row, fp) in run.record.rows().iter().zip(&footprint) {
        wtr.write_record(&[
            row.timestamp.to_rfc3339(),
            format!("{:.4}", row.moer),
            row.status.to_string(),
            format!("{:.4}", row.recorded_temp),
            format!("{:.1}", fp.run_minutes),
            format!("{:.8}", fp.mwh),
            format!("{:.6}", fp.emissions),
            format!("{:.6}", fp.cumulative),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
