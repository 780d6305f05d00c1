//! Simulator entry point: CLI wiring and config-driven engine construction.

mod cli;

use std::path::Path;

use anyhow::{Context, bail};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fridge_sim::config::ScenarioConfig;
use fridge_sim::forecast::EmissionsSeries;
use fridge_sim::io::export::export_csv;
use fridge_sim::reporting::ComparisonReport;
use fridge_sim::sim::controller::{BaselineController, Controller, OptimizingController};
use fridge_sim::sim::engine::Engine;
use fridge_sim::sim::kpi::KpiReport;
use fridge_sim::sim::types::SimulationRun;

use crate::cli::Args;

/// Runs one policy over the scenario and prints its report.
fn run_policy<C: Controller>(
    label: &str,
    scenario: &ScenarioConfig,
    series: &EmissionsSeries,
    controller: C,
    verbose: bool,
    out: Option<&Path>,
) -> anyhow::Result<KpiReport> {
    let mut engine = Engine::new(
        scenario.sim_config(),
        scenario.refrigerator()?,
        controller,
        series.clone(),
    );
    let run: SimulationRun = engine
        .run()
        .with_context(|| format!("{label} simulation failed"))?;

    if verbose {
        for block in &run.blocks {
            println!("{block}");
        }
    }

    let kpi = KpiReport::from_run(&run);
    println!("\n[{label}]\n{kpi}");

    if let Some(path) = out {
        export_csv(&run, path)
            .with_context(|| format!("failed to write CSV to \"{}\"", path.display()))?;
        eprintln!("{label} record written to {}", path.display());
    }
    Ok(kpi)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .without_time()
        .compact()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // --scenario takes priority, then --preset, then the reference default
    let mut scenario = if let Some(ref path) = args.scenario {
        ScenarioConfig::from_toml_file(path)?
    } else {
        ScenarioConfig::from_preset(args.preset.as_deref().unwrap_or("reference"))?
    };
    if let Some(seed) = args.seed {
        scenario.simulation.seed = seed;
    }

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        bail!("invalid scenario ({} errors)", errors.len());
    }

    let series = scenario
        .load_series(args.moer_csv.as_deref())
        .context("failed to load MOER data")?;
    info!(
        rows = series.len(),
        algorithm = %scenario.optimizer.algorithm,
        seed = scenario.simulation.seed,
        "scenario loaded"
    );

    let baseline = if args.policy.runs_baseline() {
        Some(run_policy(
            "baseline",
            &scenario,
            &series,
            BaselineController,
            args.verbose,
            args.baseline_out.as_deref(),
        )?)
    } else {
        None
    };

    let optimized = if args.policy.runs_optimized() {
        let controller = OptimizingController::new(
            scenario.build_search(),
            scenario.budget(),
            scenario.simulation.seed,
        );
        Some(run_policy(
            "optimized",
            &scenario,
            &series,
            controller,
            args.verbose,
            args.optimized_out.as_deref(),
        )?)
    } else {
        None
    };

    if let (Some(baseline), Some(optimized)) = (baseline, optimized) {
        println!("\n{}", ComparisonReport::new(baseline, optimized));
    }
    Ok(())
}
