use crate::devices::types::{Decision, LapseRates, MODEL_PRECISION, next_temperature};
use crate::error::SimError;

/// Default power draw while the compressor runs, in watts.
pub const DEFAULT_WATTS: f64 = 200.0;

/// A thermostatically controlled refrigerator with linear thermal dynamics.
///
/// `Refrigerator` tracks the current cabinet temperature and the cumulative
/// compressor run time. Temperature rises by a fixed amount per step while
/// off and falls by a fixed amount per step while on. The model never
/// enforces temperature bounds; that is the objective function's job.
///
/// # Examples
///
/// ```
/// use fridge_sim::devices::Refrigerator;
///
/// let mut fridge = Refrigerator::new(43.0);
/// fridge.configure(5.0, 10.0, 60.0).unwrap();
///
/// let trace = fridge.trace(&[1, 1]).unwrap();
/// assert_eq!(trace, vec![33.0, 23.0]);
/// assert_eq!(fridge.cumulative_run_time(), 120.0);
/// ```
#[derive(Debug, Clone)]
pub struct Refrigerator {
    /// Temperature at construction time.
    pub starting_temperature: f64,

    /// Power draw while running, in watts.
    pub watts: f64,

    current_temperature: f64,
    cumulative_run_time: f64,
    step_minutes: f64,
    rates: Option<LapseRates>,
}

impl Refrigerator {
    /// Creates an unconfigured refrigerator at `starting_temperature`.
    pub fn new(starting_temperature: f64) -> Self {
        Self::with_watts(starting_temperature, DEFAULT_WATTS)
    }

    /// Creates an unconfigured refrigerator with a custom power draw.
    pub fn with_watts(starting_temperature: f64, watts: f64) -> Self {
        Self {
            starting_temperature,
            watts,
            current_temperature: starting_temperature,
            cumulative_run_time: 0.0,
            step_minutes: 0.0,
            rates: None,
        }
    }

    /// Sets the per-step lapse rates from hourly rates.
    ///
    /// Each rate becomes `round(rate_per_hour / 60 * step_minutes, 4)`.
    /// Calling this again with the same arguments yields the same rates.
    ///
    /// # Arguments
    ///
    /// * `heat_rate_per_hour` - Degrees gained per hour while off
    /// * `cool_rate_per_hour` - Degrees lost per hour while on
    /// * `step_minutes` - Duration of one simulation step
    ///
    /// # Errors
    ///
    /// Returns [`SimError::MalformedInput`] if either per-step rate is not
    /// positive after rounding. The model is left unchanged.
    pub fn configure(
        &mut self,
        heat_rate_per_hour: f64,
        cool_rate_per_hour: f64,
        step_minutes: f64,
    ) -> Result<(), SimError> {
        let rates = LapseRates::from_hourly(heat_rate_per_hour, cool_rate_per_hour, step_minutes);
        if !(rates.heat > 0.0 && rates.cool > 0.0) {
            return Err(SimError::malformed(format!(
                "per-step lapse rates must be positive, got heat={} cool={} for {step_minutes}-minute steps",
                rates.heat, rates.cool
            )));
        }
        self.step_minutes = step_minutes;
        self.rates = Some(rates);
        Ok(())
    }

    /// Returns the configured lapse rates.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Unconfigured`] before [`configure`](Self::configure).
    pub fn rates(&self) -> Result<LapseRates, SimError> {
        self.rates.ok_or(SimError::Unconfigured)
    }

    pub fn current_temperature(&self) -> f64 {
        self.current_temperature
    }

    /// Total minutes the compressor has run.
    pub fn cumulative_run_time(&self) -> f64 {
        self.cumulative_run_time
    }

    pub fn step_minutes(&self) -> f64 {
        self.step_minutes
    }

    /// Advances the model by one step and returns the new temperature.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Unconfigured`] if the rates were never set.
    pub fn step(&mut self, decision: Decision) -> Result<f64, SimError> {
        let rates = self.rates()?;
        self.current_temperature =
            next_temperature(self.current_temperature, decision, rates, MODEL_PRECISION);
        if decision == Decision::On {
            self.cumulative_run_time += self.step_minutes;
        }
        Ok(self.current_temperature)
    }

    /// Applies `sequence` step by step and returns the post-step temperatures.
    ///
    /// The model is left at the last step's temperature. The whole sequence
    /// is validated before the first step, so a malformed sequence never
    /// partially mutates the model.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::MalformedInput`] for a non-binary value and
    /// [`SimError::Unconfigured`] if the rates were never set.
    pub fn trace(&mut self, sequence: &[u8]) -> Result<Vec<f64>, SimError> {
        let decisions = sequence
            .iter()
            .map(|&bit| Decision::try_from(bit))
            .collect::<Result<Vec<_>, _>>()?;
        self.rates()?;

        let mut temperatures = Vec::with_capacity(decisions.len());
        for decision in decisions {
            temperatures.push(self.step(decision)?);
        }
        Ok(temperatures)
    }
}
