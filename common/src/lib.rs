pub mod config;
pub mod error;
pub mod matrix;
pub mod plot;
pub mod reconcile;
pub mod scan;
pub mod sections;
pub mod stats;
pub mod table;

/// Seconds to microseconds.
pub const S_TO_US: f64 = 1e6;
/// Seconds to nanoseconds.
pub const S_TO_NS: f64 = 1e9;
