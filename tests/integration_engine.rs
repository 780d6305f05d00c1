//! Integration tests for full rolling-horizon runs over a mock day.

mod common;

use fridge_sim::error::SimError;
use fridge_sim::reporting::ComparisonReport;
use fridge_sim::sim::controller::{BaselineController, OptimizingController};
use fridge_sim::sim::engine::Engine;
use fridge_sim::sim::kpi::KpiReport;
use fridge_sim::sim::search::{Budget, Exhaustive, SimulatedAnnealing};

#[test]
fn baseline_day_produces_one_block_per_hour() {
    let mut engine = Engine::new(
        common::hourly_config(24),
        common::reference_fridge(33.0),
        BaselineController,
        common::mock_series(24),
    );
    let run = engine.run().unwrap();
    assert_eq!(run.blocks.len(), 24);
    assert_eq!(run.record.written_rows().count(), 288);
    assert_eq!(run.step_minutes, 5.0);
    assert_eq!(run.watts, 200.0);
}

#[test]
fn baseline_cycles_between_table_entries() {
    let mut engine = Engine::new(
        common::hourly_config(3),
        common::reference_fridge(33.0),
        BaselineController,
        common::mock_series(3),
    );
    let run = engine.run().unwrap();
    // 33 -> off (to ~38), 38 -> off (to ~43), 43 -> on (to ~33)
    assert_eq!(run.blocks[0].sequence, vec![0; 12]);
    assert_eq!(run.blocks[1].sequence, vec![0; 12]);
    assert_eq!(run.blocks[2].sequence, vec![1; 12]);
    assert_eq!(run.run_time_minutes, 60.0);
}

#[test]
fn exhaustive_day_stays_in_band_and_beats_baseline() {
    let mut baseline = Engine::new(
        common::hourly_config(24),
        common::reference_fridge(33.0),
        BaselineController,
        common::mock_series(24),
    );
    let mut optimized = Engine::new(
        common::hourly_config(24),
        common::reference_fridge(33.0),
        OptimizingController::new(Exhaustive, Budget::default(), 1),
        common::mock_series(24),
    );
    let baseline_run = baseline.run().unwrap();
    let optimized_run = optimized.run().unwrap();

    assert_eq!(optimized_run.infeasible_blocks(), 0);
    for row in optimized_run.record.written_rows() {
        assert!(
            (32.99..=43.01).contains(&row.recorded_temp),
            "temperature {} left the band at {}",
            row.recorded_temp,
            row.timestamp
        );
    }

    let report = ComparisonReport::new(
        KpiReport::from_run(&baseline_run),
        KpiReport::from_run(&optimized_run),
    );
    assert!(report.optimized.total_emissions_lbs.is_finite());
    assert!(report.optimized.total_emissions_lbs <= report.baseline.total_emissions_lbs);
}

#[test]
fn annealing_runs_are_reproducible() {
    let run = |seed| {
        let mut engine = Engine::new(
            common::hourly_config(6),
            common::reference_fridge(37.0),
            OptimizingController::new(SimulatedAnnealing::default(), Budget::default(), seed),
            common::mock_series(6),
        );
        engine.run().unwrap()
    };
    let a = run(11);
    let b = run(11);
    assert_eq!(a.blocks, b.blocks);
    assert_eq!(a.run_time_minutes, b.run_time_minutes);
}

#[test]
fn kpis_are_finite_for_full_day() {
    let mut engine = Engine::new(
        common::hourly_config(24),
        common::reference_fridge(35.0),
        OptimizingController::new(SimulatedAnnealing::default(), Budget::default(), 3),
        common::mock_series(24),
    );
    let run = engine.run().unwrap();
    let kpi = KpiReport::from_run(&run);
    assert!(kpi.total_emissions_lbs.is_finite());
    assert!(kpi.energy_mwh >= 0.0);
    assert_eq!(kpi.run_minutes, run.run_time_minutes);
    assert!(kpi.avg_run_minutes_per_hour <= 60.0);
    assert!(kpi.min_temperature <= kpi.avg_temperature);
    assert!(kpi.avg_temperature <= kpi.max_temperature);
}

#[test]
fn series_too_short_for_last_window_is_an_error() {
    let mut engine = Engine::new(
        common::hourly_config(24),
        common::reference_fridge(33.0),
        BaselineController,
        common::mock_series(23),
    );
    match engine.run() {
        Err(SimError::MissingTimestamp(ts)) => {
            assert_eq!(ts, common::start() + chrono::TimeDelta::hours(23));
        }
        other => panic!("expected MissingTimestamp, got {other:?}"),
    }
}
