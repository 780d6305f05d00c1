//! Structural errors surfaced by the simulation core.
//!
//! Temperature-band violations are not errors: the objective encodes them as
//! [`SENTINEL_COST`](crate::sim::objective::SENTINEL_COST) so the search can
//! treat them as bad candidates.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    /// The refrigerator was stepped before its lapse rates were configured.
    #[error("refrigerator lapse rates are not configured")]
    Unconfigured,

    /// A forecast window would run past the end of the emissions series.
    #[error(
        "forecast window of {length} steps at {timestamp} runs past the end of the series \
         ({available} rows available from that position)"
    )]
    WindowUnavailable {
        timestamp: DateTime<Utc>,
        length: usize,
        available: usize,
    },

    /// The requested timestamp has no row in the emissions series.
    #[error("timestamp {0} is not present in the emissions series")]
    MissingTimestamp(DateTime<Utc>),

    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// A simulation record row was written twice in one run.
    #[error("record row {0} was already written in this run")]
    AlreadyRecorded(usize),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SimError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput(message.into())
    }
}
