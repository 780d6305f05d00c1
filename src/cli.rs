use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Emissions-aware refrigerator duty-cycle simulator.
///
/// With neither `--scenario` nor `--preset`, the `reference` preset is used.
#[derive(Debug, Parser)]
#[command(name = "fridge-sim", version, about)]
pub struct Args {
    /// Load the scenario from a TOML file.
    #[clap(long, conflicts_with = "preset")]
    pub scenario: Option<PathBuf>,

    /// Use a built-in preset (reference, warm_start, long_horizon).
    #[clap(long)]
    pub preset: Option<String>,

    /// Override the scenario seed.
    #[clap(long)]
    pub seed: Option<u64>,

    /// Read MOER data from this CSV instead of the scenario's source.
    #[clap(long = "moer-csv")]
    pub moer_csv: Option<PathBuf>,

    /// Which policy to run.
    #[clap(long, value_enum, default_value_t = Policy::Compare)]
    pub policy: Policy,

    /// Export the baseline run's record to CSV.
    #[clap(long = "baseline-out")]
    pub baseline_out: Option<PathBuf>,

    /// Export the optimized run's record to CSV.
    #[clap(long = "optimized-out")]
    pub optimized_out: Option<PathBuf>,

    /// Print every block.
    #[clap(long, short)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Policy {
    Baseline,
    Optimized,
    Compare,
}

impl Policy {
    pub fn runs_baseline(self) -> bool {
        matches!(self, Self::Baseline | Self::Compare)
    }

    pub fn runs_optimized(self) -> bool {
        matches!(self, Self::Optimized | Self::Compare)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_compare() {
        let args = Args::try_parse_from(["fridge-sim"]).unwrap();
        assert_eq!(args.policy, Policy::Compare);
        assert!(args.scenario.is_none());
        assert!(args.preset.is_none());
        assert!(!args.verbose);
    }

    #[test]
    fn supports_scenario_and_seed() {
        let args =
            Args::try_parse_from(["fridge-sim", "--scenario", "s.toml", "--seed", "9"]).unwrap();
        assert_eq!(args.scenario.as_deref().and_then(|p| p.to_str()), Some("s.toml"));
        assert_eq!(args.seed, Some(9));
    }

    #[test]
    fn scenario_and_preset_are_mutually_exclusive() {
        let result =
            Args::try_parse_from(["fridge-sim", "--scenario", "s.toml", "--preset", "reference"]);
        assert!(result.is_err());
    }

    #[test]
    fn parses_policy_and_outputs() {
        let args = Args::try_parse_from([
            "fridge-sim",
            "--policy",
            "optimized",
            "--optimized-out",
            "opt.csv",
            "--moer-csv",
            "moer.csv",
        ])
        .unwrap();
        assert_eq!(args.policy, Policy::Optimized);
        assert!(args.policy.runs_optimized());
        assert!(!args.policy.runs_baseline());
        assert!(args.optimized_out.is_some());
        assert!(args.moer_csv.is_some());
    }

    #[test]
    fn rejects_unknown_policy() {
        assert!(Args::try_parse_from(["fridge-sim", "--policy", "greedy"]).is_err());
    }
}
