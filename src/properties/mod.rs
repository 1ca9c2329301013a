//! Property estimators over finalized group counts.

mod error;
mod joback;
mod unifac;

pub use error::PropertyError;
pub use joback::{Joback, JobackContribution, JobackOptions, JobackProperties, TemperatureProperties};
pub use unifac::UnifacParameters;

/// Gas constant, J/(mol K).
pub const R: f64 = 8.314;
