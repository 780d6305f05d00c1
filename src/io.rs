//! MOER CSV import and simulation record export.

pub mod export;
pub mod import;
