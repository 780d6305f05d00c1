//! Side-by-side comparison of a baseline and an optimized run.

use std::fmt;

use crate::sim::kpi::KpiReport;

/// Emissions and energy deltas between two runs over the same scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonReport {
    pub baseline: KpiReport,
    pub optimized: KpiReport,
}

impl ComparisonReport {
    pub fn new(baseline: KpiReport, optimized: KpiReport) -> Self {
        Self {
            baseline,
            optimized,
        }
    }

    /// Emissions avoided by the optimized run (lbs; negative if it emitted more).
    pub fn emissions_saved_lbs(&self) -> f64 {
        self.baseline.total_emissions_lbs - self.optimized.total_emissions_lbs
    }

    /// Percent reduction in emissions relative to the baseline.
    ///
    /// Zero when the baseline emitted nothing.
    pub fn reduction_pct(&self) -> f64 {
        if self.baseline.total_emissions_lbs > 0.0 {
            100.0 * self.emissions_saved_lbs() / self.baseline.total_emissions_lbs
        } else {
            0.0
        }
    }
}

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Comparison ---")?;
        writeln!(
            f,
            "Baseline emissions:    {:.4} lbs",
            self.baseline.total_emissions_lbs
        )?;
        writeln!(
            f,
            "Optimized emissions:   {:.4} lbs",
            self.optimized.total_emissions_lbs
        )?;
        writeln!(
            f,
            "Run time:              {:.1} -> {:.1} min",
            self.baseline.run_minutes, self.optimized.run_minutes
        )?;
        write!(f, "Emission reduction:    {:.1}%", self.reduction_pct())
    }
}
