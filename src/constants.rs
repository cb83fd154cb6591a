//! Application constants and default values for solarwatch.
//!
//! This module contains the configuration defaults, validation limits,
//! and operational constants used throughout the application.

// ═══ Application Configuration Defaults ═══
// These values are used when config options are not specified by the user

pub const DEFAULT_TIMEZONE: &str = "UTC";
pub const DEFAULT_ACCURACY: u64 = 60; // seconds between checks

// ═══ Validation Limits ═══

// Geographic coordinate limits (degrees)
pub const MINIMUM_LATITUDE: f64 = -90.0;
pub const MAXIMUM_LATITUDE: f64 = 90.0;
pub const MINIMUM_LONGITUDE: f64 = -180.0;
pub const MAXIMUM_LONGITUDE: f64 = 180.0;

// Accuracy limits
pub const MINIMUM_ACCURACY: u64 = 1; // seconds
pub const MAXIMUM_ACCURACY: u64 = 86_400; // one check per day at most

// ═══ Operational Timing Constants ═══

/// Upper bound on a single sunrise/sunset calculation before the tick is abandoned.
pub const CALCULATION_TIMEOUT_MS: u64 = 5_000;

/// Debounce window for configuration file change events.
pub const CONFIG_DEBOUNCE_MS: u64 = 500;

/// A calculated instant further than this from the requested date means the
/// sun never crosses the horizon that day (polar day or night).
pub const MAX_EVENT_DATE_DRIFT_HOURS: i64 = 36;

/// Simulated seconds per real second when `--simulate` gives no multiplier.
pub const DEFAULT_SIMULATION_MULTIPLIER: f64 = 3600.0;

/// Shortest real polling period used while simulating.
pub const MINIMUM_SIMULATED_PERIOD_MS: u64 = 1;

// ═══ Exit Codes ═══

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

// ═══ File Names ═══

pub const CONFIG_DIR_NAME: &str = "solarwatch";
pub const CONFIG_FILE_NAME: &str = "solarwatch.toml";

#[cfg(test)]
pub mod test_constants {
    pub const TEST_AMSTERDAM_LATITUDE: f64 = 52.3676;
    pub const TEST_AMSTERDAM_LONGITUDE: f64 = 4.9041;
    pub const TEST_AMSTERDAM_TIMEZONE: &str = "Europe/Amsterdam";
    pub const TEST_STANDARD_ACCURACY: u64 = 60; // seconds
}
