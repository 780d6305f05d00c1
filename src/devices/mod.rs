//! Refrigerator thermal model and the shared step rule.

/// Linear thermal refrigerator model.
pub mod refrigerator;
pub mod types;

pub use refrigerator::Refrigerator;
pub use types::{Decision, LapseRates};
