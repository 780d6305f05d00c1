//! Discrete search over on/off sequences.
//!
//! A [`Problem`] wraps one forecast window; a [`DiscreteSearch`]
//! implementation looks for the cheapest bit sequence of the window's
//! length. Infeasible sequences are not errors here, they simply cost
//! [`SENTINEL_COST`](super::objective::SENTINEL_COST).

use rand::{Rng, rngs::StdRng};
use tracing::{debug, warn};

use crate::devices::types::LapseRates;
use crate::error::SimError;

use super::objective::{is_infeasible, penalized_cost};

/// Temperatures below this seed the search with an all-off sequence.
pub const COLD_SEED_BELOW: f64 = 36.0;

/// Temperatures above this seed the search with an all-on sequence.
pub const WARM_SEED_ABOVE: f64 = 40.0;

/// Longest horizon [`Exhaustive`] will enumerate.
pub const MAX_EXHAUSTIVE_HORIZON: usize = 20;

/// One optimization instance: a MOER window plus the thermal state it starts from.
#[derive(Debug, Clone)]
pub struct Problem {
    rates: Vec<f64>,
    start_temperature: f64,
    lapse: LapseRates,
}

impl Problem {
    /// Creates a problem over `rates`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::MalformedInput`] for an empty window.
    pub fn new(rates: Vec<f64>, start_temperature: f64, lapse: LapseRates) -> Result<Self, SimError> {
        if rates.is_empty() {
            return Err(SimError::malformed("optimization horizon must be at least one step"));
        }
        Ok(Self {
            rates,
            start_temperature,
            lapse,
        })
    }

    /// Horizon length.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn rates(&self) -> &[f64] {
        &self.rates
    }

    pub fn start_temperature(&self) -> f64 {
        self.start_temperature
    }

    /// Objective value of `bits`. Bits must be 0 or 1 and match the horizon.
    pub fn cost(&self, bits: &[u8]) -> f64 {
        debug_assert_eq!(bits.len(), self.rates.len());
        penalized_cost(bits, &self.rates, self.start_temperature, self.lapse)
    }

    /// Uniformly random sequence.
    pub fn random_state(&self, rng: &mut StdRng) -> Vec<u8> {
        (0..self.len()).map(|_| u8::from(rng.random_bool(0.5))).collect()
    }

    /// Copy of `bits` with one randomly chosen position flipped.
    pub fn random_neighbor(&self, bits: &[u8], rng: &mut StdRng) -> Vec<u8> {
        let mut neighbor = bits.to_vec();
        let i = rng.random_range(0..neighbor.len());
        neighbor[i] ^= 1;
        neighbor
    }
}

/// Search effort limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
    /// Consecutive non-improving attempts before giving up.
    pub max_attempts: usize,
    /// Hard cap on iterations (per restart for hill climbing).
    pub max_iters: usize,
    /// Extra random restarts (hill climbing only).
    pub restarts: usize,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            max_iters: 10,
            restarts: 0,
        }
    }
}

/// Result of a search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub best_sequence: Vec<u8>,
    pub best_cost: f64,
    /// Best cost seen so far after each iteration; never increases.
    pub curve: Vec<f64>,
}

impl SearchOutcome {
    pub fn is_feasible(&self) -> bool {
        !is_infeasible(self.best_cost)
    }

    /// Number of search iterations performed.
    pub fn iterations(&self) -> usize {
        self.curve.len()
    }
}

/// Best-so-far bookkeeping shared by the search implementations.
struct Incumbent {
    sequence: Vec<u8>,
    cost: f64,
    curve: Vec<f64>,
}

impl Incumbent {
    fn new(sequence: Vec<u8>, cost: f64) -> Self {
        Self {
            sequence,
            cost,
            curve: Vec::new(),
        }
    }

    fn offer(&mut self, sequence: &[u8], cost: f64) {
        if cost < self.cost {
            self.sequence = sequence.to_vec();
            self.cost = cost;
        }
    }

    fn mark(&mut self) {
        self.curve.push(self.cost);
    }

    fn finish(self) -> SearchOutcome {
        SearchOutcome {
            best_sequence: self.sequence,
            best_cost: self.cost,
            curve: self.curve,
        }
    }
}

/// Capability interface for sequence search.
///
/// Implementations must be deterministic for a given RNG state, must never
/// return a worse sequence than `initial` when one is supplied, and signal
/// infeasibility only through the returned cost.
pub trait DiscreteSearch {
    /// Searches `{0,1}^L` for the cheapest sequence of `problem`.
    ///
    /// # Arguments
    ///
    /// * `problem` - The window to optimize
    /// * `initial` - Optional starting sequence; random when `None`
    /// * `budget` - Iteration and attempt caps
    /// * `rng` - Seeded random source
    fn search(
        &self,
        problem: &Problem,
        initial: Option<&[u8]>,
        budget: &Budget,
        rng: &mut StdRng,
    ) -> SearchOutcome;

    /// Short identifier for logs.
    fn name(&self) -> &'static str;
}

impl<S: DiscreteSearch + ?Sized> DiscreteSearch for Box<S> {
    fn search(
        &self,
        problem: &Problem,
        initial: Option<&[u8]>,
        budget: &Budget,
        rng: &mut StdRng,
    ) -> SearchOutcome {
        (**self).search(problem, initial, budget, rng)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Starting sequence heuristic.
///
/// Cold cabinets (< 36) start from all-off, warm ones (> 40) from all-on,
/// and anything in between gets `None` so the search seeds randomly. The
/// seed only affects where the search starts.
pub fn initial_state(temperature: f64, length: usize) -> Option<Vec<u8>> {
    if temperature < COLD_SEED_BELOW {
        Some(vec![0; length])
    } else if temperature > WARM_SEED_ABOVE {
        Some(vec![1; length])
    } else {
        None
    }
}

/// Annealing temperature as a function of the iteration number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecaySchedule {
    /// `max(init_temp * exp(-exp_const * t), min_temp)`
    Exponential {
        init_temp: f64,
        exp_const: f64,
        min_temp: f64,
    },
    /// `max(init_temp * decay^t, min_temp)`
    Geometric {
        init_temp: f64,
        decay: f64,
        min_temp: f64,
    },
}

impl Default for DecaySchedule {
    fn default() -> Self {
        Self::Exponential {
            init_temp: 1.0,
            exp_const: 0.005,
            min_temp: 0.001,
        }
    }
}

impl DecaySchedule {
    pub fn temperature(&self, iteration: usize) -> f64 {
        let t = iteration as f64;
        match *self {
            Self::Exponential {
                init_temp,
                exp_const,
                min_temp,
            } => (init_temp * (-exp_const * t).exp()).max(min_temp),
            Self::Geometric {
                init_temp,
                decay,
                min_temp,
            } => (init_temp * decay.powf(t)).max(min_temp),
        }
    }
}

/// Simulated annealing with single-bit-flip moves.
///
/// An improving neighbor is always accepted; a worsening one with
/// probability `exp(-Δcost / T)`. Accepted moves reset the attempt counter.
/// The best sequence ever visited is returned, not the final one.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedAnnealing {
    pub schedule: DecaySchedule,
}

impl SimulatedAnnealing {
    pub fn new(schedule: DecaySchedule) -> Self {
        Self { schedule }
    }
}

impl DiscreteSearch for SimulatedAnnealing {
    fn search(
        &self,
        problem: &Problem,
        initial: Option<&[u8]>,
        budget: &Budget,
        rng: &mut StdRng,
    ) -> SearchOutcome {
        let mut state = initial.map_or_else(|| problem.random_state(rng), <[u8]>::to_vec);
        let mut cost = problem.cost(&state);
        let mut best = Incumbent::new(state.clone(), cost);

        let mut attempts = 0;
        let mut iters = 0;
        while attempts < budget.max_attempts && iters < budget.max_iters {
            let temperature = self.schedule.temperature(iters);
            iters += 1;
            if temperature <= 0.0 {
                break;
            }

            let neighbor = problem.random_neighbor(&state, rng);
            let neighbor_cost = problem.cost(&neighbor);
            // positive when the neighbor is cheaper
            let delta = cost - neighbor_cost;
            if delta > 0.0 || rng.random::<f64>() < (delta / temperature).exp() {
                state = neighbor;
                cost = neighbor_cost;
                attempts = 0;
            } else {
                attempts += 1;
            }

            best.offer(&state, cost);
            best.mark();
        }

        debug!(iters, best_cost = best.cost, "simulated annealing finished");
        best.finish()
    }

    fn name(&self) -> &'static str {
        "simulated_annealing"
    }
}

/// Random-restart hill climbing.
///
/// Each climb moves only to strictly cheaper neighbors. The first climb
/// starts from `initial` (if given), the others from random sequences.
#[derive(Debug, Clone, Copy, Default)]
pub struct HillClimb;

impl DiscreteSearch for HillClimb {
    fn search(
        &self,
        problem: &Problem,
        initial: Option<&[u8]>,
        budget: &Budget,
        rng: &mut StdRng,
    ) -> SearchOutcome {
        let first = initial.map_or_else(|| problem.random_state(rng), <[u8]>::to_vec);
        let first_cost = problem.cost(&first);
        let mut best = Incumbent::new(first.clone(), first_cost);

        for restart in 0..=budget.restarts {
            let mut state = if restart == 0 {
                first.clone()
            } else {
                problem.random_state(rng)
            };
            let mut cost = problem.cost(&state);
            best.offer(&state, cost);

            let mut attempts = 0;
            let mut iters = 0;
            while attempts < budget.max_attempts && iters < budget.max_iters {
                iters += 1;
                let neighbor = problem.random_neighbor(&state, rng);
                let neighbor_cost = problem.cost(&neighbor);
                if neighbor_cost < cost {
                    state = neighbor;
                    cost = neighbor_cost;
                    attempts = 0;
                } else {
                    attempts += 1;
                }
                best.offer(&state, cost);
                best.mark();
            }
        }

        debug!(restarts = budget.restarts, best_cost = best.cost, "hill climb finished");
        best.finish()
    }

    fn name(&self) -> &'static str {
        "hill_climb"
    }
}

/// Exact search by enumerating every sequence in lexicographic order.
///
/// Ties keep the first sequence found, so among equally cheap sequences the
/// one with the most leading zeros wins. Ignores the budget and the RNG.
/// Horizons longer than [`MAX_EXHAUSTIVE_HORIZON`] fall back to
/// [`SimulatedAnnealing`] with the default schedule.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exhaustive;

impl DiscreteSearch for Exhaustive {
    fn search(
        &self,
        problem: &Problem,
        initial: Option<&[u8]>,
        budget: &Budget,
        rng: &mut StdRng,
    ) -> SearchOutcome {
        let len = problem.len();
        if len > MAX_EXHAUSTIVE_HORIZON {
            warn!(len, "horizon too long to enumerate, annealing instead");
            return SimulatedAnnealing::default().search(problem, initial, budget, rng);
        }
        let mut best: Option<Incumbent> = None;
        for code in 0..(1_u64 << len) {
            let bits: Vec<u8> = (0..len)
                .map(|i| ((code >> (len - 1 - i)) & 1) as u8)
                .collect();
            let cost = problem.cost(&bits);
            let incumbent = best.get_or_insert_with(|| Incumbent::new(bits.clone(), cost));
            incumbent.offer(&bits, cost);
            incumbent.mark();
        }
        best.map_or_else(
            || SearchOutcome {
                best_sequence: Vec::new(),
                best_cost: 0.0,
                curve: Vec::new(),
            },
            Incumbent::finish,
        )
    }

    fn name(&self) -> &'static str {
        "exhaustive"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::objective::{SENTINEL_COST, evaluate};
    use rand::SeedableRng;

    fn unit_rates() -> LapseRates {
        LapseRates {
            heat: 1.0,
            cool: 1.0,
        }
    }

    fn generous() -> Budget {
        Budget {
            max_attempts: 100,
            max_iters: 1000,
            restarts: 3,
        }
    }

    fn searchers() -> Vec<Box<dyn DiscreteSearch>> {
        vec![
            Box::new(SimulatedAnnealing::default()),
            Box::new(HillClimb),
            Box::new(Exhaustive),
        ]
    }

    #[test]
    fn empty_problem_is_rejected() {
        assert!(Problem::new(Vec::new(), 38.0, unit_rates()).is_err());
    }

    #[test]
    fn initial_state_heuristic() {
        assert_eq!(initial_state(35.9, 3), Some(vec![0, 0, 0]));
        assert_eq!(initial_state(40.1, 3), Some(vec![1, 1, 1]));
        assert_eq!(initial_state(36.0, 3), None);
        assert_eq!(initial_state(40.0, 3), None);
    }

    #[test]
    fn neighbor_differs_in_exactly_one_bit() {
        let problem = Problem::new(vec![1.0; 8], 38.0, unit_rates()).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let state = problem.random_state(&mut rng);
        let neighbor = problem.random_neighbor(&state, &mut rng);
        let flips = state.iter().zip(&neighbor).filter(|(a, b)| a != b).count();
        assert_eq!(flips, 1);
        assert!(neighbor.iter().all(|&b| b <= 1));
    }

    #[test]
    fn exponential_schedule_decays_to_floor() {
        let schedule = DecaySchedule::default();
        assert_eq!(schedule.temperature(0), 1.0);
        assert!(schedule.temperature(100) < schedule.temperature(10));
        assert_eq!(schedule.temperature(1_000_000), 0.001);
    }

    #[test]
    fn geometric_schedule_decays_to_floor() {
        let schedule = DecaySchedule::Geometric {
            init_temp: 2.0,
            decay: 0.5,
            min_temp: 0.1,
        };
        assert_eq!(schedule.temperature(1), 1.0);
        assert_eq!(schedule.temperature(10), 0.1);
    }

    #[test]
    fn prefers_idle_when_both_fixed_sequences_are_feasible() {
        let problem = Problem::new(vec![100.0, 100.0], 38.0, unit_rates()).unwrap();
        assert_eq!(evaluate(&[1, 1], problem.rates(), 38.0, 1.0, 1.0).ok(), Some(200.0));
        for searcher in searchers() {
            let mut rng = StdRng::seed_from_u64(1);
            let outcome = searcher.search(&problem, None, &generous(), &mut rng);
            assert_eq!(outcome.best_sequence, vec![0, 0], "{}", searcher.name());
            assert_eq!(outcome.best_cost, 0.0, "{}", searcher.name());
        }
    }

    #[test]
    fn finds_cheapest_feasible_sequence_near_upper_bound() {
        // From 42.5 the first step must cool; [1, 1, 0] is the only way to
        // avoid paying for the expensive last slot.
        let problem = Problem::new(vec![5.0, 1.0, 9.0], 42.5, unit_rates()).unwrap();
        let budget = Budget {
            max_attempts: 500,
            max_iters: 2000,
            restarts: 40,
        };
        for searcher in searchers() {
            let mut rng = StdRng::seed_from_u64(11);
            let init = initial_state(42.5, 3);
            let outcome = searcher.search(&problem, init.as_deref(), &budget, &mut rng);
            assert_eq!(outcome.best_sequence, vec![1, 1, 0], "{}", searcher.name());
            assert_eq!(outcome.best_cost, 6.0, "{}", searcher.name());
        }
    }

    #[test]
    fn same_seed_gives_identical_outcomes() {
        let rates = vec![
            910.0, 880.0, 1020.0, 760.0, 700.0, 650.0, 990.0, 1005.0, 870.0, 720.0, 690.0, 800.0,
        ];
        let problem = Problem::new(rates, 38.0, LapseRates::from_hourly(5.0, 10.0, 5.0)).unwrap();
        let sa = SimulatedAnnealing::default();
        let budget = Budget::default();

        let mut rng_a = StdRng::seed_from_u64(1);
        let mut rng_b = StdRng::seed_from_u64(1);
        let a = sa.search(&problem, None, &budget, &mut rng_a);
        let b = sa.search(&problem, None, &budget, &mut rng_b);
        assert_eq!(a.best_sequence, b.best_sequence);
        assert_eq!(a.best_cost, b.best_cost);
        assert_eq!(a.curve.len(), b.curve.len());
    }

    #[test]
    fn curve_never_increases() {
        let rates = vec![5.0, 3.0, 8.0, 1.0, 9.0, 2.0, 7.0, 4.0];
        let problem = Problem::new(rates, 38.0, unit_rates()).unwrap();
        for searcher in searchers() {
            let mut rng = StdRng::seed_from_u64(5);
            let outcome = searcher.search(&problem, None, &generous(), &mut rng);
            assert!(!outcome.curve.is_empty());
            assert!(
                outcome.curve.windows(2).all(|w| w[1] <= w[0]),
                "{} curve increased",
                searcher.name()
            );
            assert_eq!(outcome.curve.last().copied(), Some(outcome.best_cost));
        }
    }

    #[test]
    fn never_worse_than_feasible_seed() {
        // All-off from 33 with 5 minute steps ends near 38: feasible and free.
        let rates = vec![800.0; 12];
        let problem = Problem::new(rates, 33.0, LapseRates::from_hourly(5.0, 10.0, 5.0)).unwrap();
        let seed = initial_state(33.0, 12);
        let mut rng = StdRng::seed_from_u64(1);
        let outcome = SimulatedAnnealing::default().search(
            &problem,
            seed.as_deref(),
            &Budget::default(),
            &mut rng,
        );
        assert!(outcome.is_feasible());
        assert_eq!(outcome.best_cost, 0.0);
    }

    #[test]
    fn infeasible_everywhere_returns_sentinel_without_error() {
        // Heating and cooling both jump 20 degrees, so every step leaves the band.
        let lapse = LapseRates {
            heat: 20.0,
            cool: 20.0,
        };
        let problem = Problem::new(vec![1.0, 1.0, 1.0], 38.0, lapse).unwrap();
        for searcher in searchers() {
            let mut rng = StdRng::seed_from_u64(2);
            let outcome = searcher.search(&problem, None, &generous(), &mut rng);
            assert_eq!(outcome.best_cost, SENTINEL_COST, "{}", searcher.name());
            assert!(!outcome.is_feasible());
            assert_eq!(outcome.best_sequence.len(), 3);
        }
    }

    #[test]
    fn exhaustive_matches_objective_minimum() {
        let rates = vec![4.0, 2.0, 6.0, 1.0, 3.0];
        let lapse = LapseRates {
            heat: 2.0,
            cool: 3.0,
        };
        let problem = Problem::new(rates.clone(), 41.0, lapse).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let outcome = Exhaustive.search(&problem, None, &Budget::default(), &mut rng);

        let mut brute_min = f64::INFINITY;
        for code in 0..32_u32 {
            let bits: Vec<u8> = (0..5).map(|i| ((code >> (4 - i)) & 1) as u8).collect();
            let cost = evaluate(&bits, &rates, 41.0, 2.0, 3.0).unwrap();
            brute_min = brute_min.min(cost);
        }
        assert_eq!(outcome.best_cost, brute_min);
        assert_eq!(outcome.iterations(), 32);
    }
}
