use chrono::{DateTime, TimeDelta, Utc};

/// A simulation clock that yields decision timestamps at a fixed cadence.
///
/// Both ends are inclusive: a clock from 00:00 to 02:00 with an hourly
/// cadence ticks at 00:00, 01:00 and 02:00.
///
/// # Examples
///
/// ```
/// use chrono::{TimeDelta, TimeZone, Utc};
/// use fridge_sim::sim::clock::Clock;
///
/// let start = Utc.with_ymd_and_hms(2019, 3, 1, 0, 0, 0).unwrap();
/// let end = Utc.with_ymd_and_hms(2019, 3, 1, 2, 0, 0).unwrap();
/// let ticks: Vec<_> = Clock::new(start, end, TimeDelta::hours(1)).collect();
/// assert_eq!(ticks.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct Clock {
    /// Next timestamp to yield
    current: DateTime<Utc>,
    /// Last timestamp that may be yielded
    end: DateTime<Utc>,
    cadence: TimeDelta,
}

impl Clock {
    /// Creates a clock over `[start, end]`.
    ///
    /// # Panics
    ///
    /// Panics if `cadence` is not positive.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, cadence: TimeDelta) -> Self {
        assert!(cadence > TimeDelta::zero(), "cadence must be positive");
        Self {
            current: start,
            end,
            cadence,
        }
    }

    /// Advances the clock by one tick.
    ///
    /// # Returns
    ///
    /// * `Some(timestamp)` - The tick before advancing
    /// * `None` - Once the clock has passed `end`
    pub fn tick(&mut self) -> Option<DateTime<Utc>> {
        if self.current <= self.end {
            let now = self.current;
            self.current += self.cadence;
            Some(now)
        } else {
            None
        }
    }
}

impl Iterator for Clock {
    type Item = DateTime<Utc>;

    fn next(&mut self) -> Option<Self::Item> {
        self.tick()
    }
}
