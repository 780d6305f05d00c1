//! Per-step simulation record.

use chrono::{DateTime, Utc};

use crate::error::SimError;
use crate::forecast::EmissionsSeries;

/// One row of the simulation record, aligned with an emissions series row.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordRow {
    pub timestamp: DateTime<Utc>,
    pub moer: f64,
    /// Committed decision (0 until written).
    pub status: u8,
    /// Temperature after the step (0 until written).
    pub recorded_temp: f64,
    /// Whether a block has written this row.
    pub written: bool,
}

/// Decisions and temperatures committed during a run.
///
/// Starts as a copy of the emissions series with `status` and
/// `recorded_temp` zeroed. Each row may be written at most once per run.
#[derive(Debug, Clone)]
pub struct SimulationRecord {
    rows: Vec<RecordRow>,
}

impl SimulationRecord {
    pub fn from_series(series: &EmissionsSeries) -> Self {
        Self {
            rows: series
                .rows()
                .iter()
                .map(|r| RecordRow {
                    timestamp: r.timestamp,
                    moer: r.moer,
                    status: 0,
                    recorded_temp: 0.0,
                    written: false,
                })
                .collect(),
        }
    }

    pub fn rows(&self) -> &[RecordRow] {
        &self.rows
    }

    /// Rows some block has written, in order.
    pub fn written_rows(&self) -> impl Iterator<Item = &RecordRow> {
        self.rows.iter().filter(|r| r.written)
    }

    /// Checks that every row in `indices` exists and is still unwritten.
    ///
    /// # Errors
    ///
    /// * [`SimError::MalformedInput`] for an out-of-range index
    /// * [`SimError::AlreadyRecorded`] if a row was written earlier in the run
    pub fn check_writable(&self, indices: &[usize]) -> Result<(), SimError> {
        for &index in indices {
            let row = self.rows.get(index).ok_or_else(|| {
                SimError::malformed(format!(
                    "record index {index} out of range ({} rows)",
                    self.rows.len()
                ))
            })?;
            if row.written {
                return Err(SimError::AlreadyRecorded(index));
            }
        }
        Ok(())
    }

    /// Writes decisions and temperatures at `indices`.
    ///
    /// All arguments are checked before any row changes.
    ///
    /// # Errors
    ///
    /// * [`SimError::MalformedInput`] on length mismatch, an out-of-range index
    ///   or a non-binary decision
    /// * [`SimError::AlreadyRecorded`] if a row was written earlier in the run
    pub fn record(&mut self, indices: &[usize], decisions: &[u8], temperatures: &[f64]) -> Result<(), SimError> {
        if indices.len() != decisions.len() || indices.len() != temperatures.len() {
            return Err(SimError::malformed(format!(
                "record lengths differ: {} indices, {} decisions, {} temperatures",
                indices.len(),
                decisions.len(),
                temperatures.len()
            )));
        }
        self.check_writable(indices)?;
        if let Some(&decision) = decisions.iter().find(|&&d| d > 1) {
            return Err(SimError::malformed(format!(
                "decision values must be 0 or 1, got {decision}"
            )));
        }

        for ((&index, &decision), &temperature) in indices.iter().zip(decisions).zip(temperatures) {
            let row = &mut self.rows[index];
            row.status = decision;
            row.recorded_temp = temperature;
            row.written = true;
        }
        Ok(())
    }
}
