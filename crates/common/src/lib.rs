mod env;
mod tracing_setup;

pub use env::{env_or, EnvVars};
pub use tracing_setup::setup_tracing;

pub fn get_current_timestamp_millis() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

/// Rounds a price to whole cents.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
