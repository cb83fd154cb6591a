//! Configuration system for solarwatch.
//!
//! The configuration lives in `solarwatch.toml` under the XDG config
//! directory (`$XDG_CONFIG_HOME/solarwatch/solarwatch.toml`), or under the
//! directory given with `--config`:
//!
//! ```toml
//! latitude = 52.3676             # Geographic latitude (-90 to 90)
//! longitude = 4.9041             # Geographic longitude (-180 to 180)
//! timezone = "Europe/Amsterdam"  # IANA timezone deciding the calendar day
//! accuracy = 60                  # Seconds between checks (1-86400)
//! ```
//!
//! Files are validated on every load. A running service only ever sees
//! configurations that passed validation; a broken edit is reported and the
//! previous configuration keeps running.

pub mod loading;
pub mod validation;
pub mod watcher;

use serde::Deserialize;

use crate::constants::*;
use crate::core::WatchSettings;
use crate::error::{Result, SolarError};
use crate::geo::{Location, parse_timezone};

// Re-export public API
pub use loading::{
    create_default_config, get_config_path, get_custom_config_dir, load, load_from_path,
    private_path, set_config_dir,
};
pub use validation::validate_config;
pub use watcher::{ConfigWatcher, start_config_watcher};

/// Contents of `solarwatch.toml`.
#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Geographic latitude in degrees (-90 to +90)
    pub latitude: Option<f64>,
    /// Geographic longitude in degrees (-180 to +180)
    pub longitude: Option<f64>,
    /// IANA timezone name; defaults to UTC
    pub timezone: Option<String>,
    /// Seconds between checks; defaults to 60
    pub accuracy: Option<u64>,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        load()
    }

    pub fn timezone_name(&self) -> &str {
        self.timezone.as_deref().unwrap_or(DEFAULT_TIMEZONE)
    }

    pub fn accuracy_secs(&self) -> u64 {
        self.accuracy.unwrap_or(DEFAULT_ACCURACY)
    }

    /// Convert into the typed settings the service runs on.
    pub fn settings(&self) -> Result<WatchSettings> {
        let (Some(latitude), Some(longitude)) = (self.latitude, self.longitude) else {
            return Err(SolarError::configuration(
                "latitude and longitude are required",
            ));
        };

        let location = Location::new(latitude, longitude)?;
        let timezone = parse_timezone(self.timezone_name())?;
        let accuracy = self.accuracy_secs();
        if !(MINIMUM_ACCURACY..=MAXIMUM_ACCURACY).contains(&accuracy) {
            return Err(SolarError::configuration(format!(
                "accuracy must be between {MINIMUM_ACCURACY} and {MAXIMUM_ACCURACY} seconds (got {accuracy})"
            )));
        }

        WatchSettings::from_seconds(location, timezone, accuracy as i64)
    }

    pub fn log_config(&self) {
        log_block_start!("Loaded configuration");
        if let (Some(lat), Some(lon)) = (self.latitude, self.longitude) {
            let lat_dir = if lat >= 0.0 { "N" } else { "S" };
            let lon_dir = if lon >= 0.0 { "E" } else { "W" };
            log_indented!(
                "Location: {:.3}°{}, {:.3}°{}",
                lat.abs(),
                lat_dir,
                lon.abs(),
                lon_dir
            );
        } else {
            log_indented!("Location: not configured");
        }
        log_indented!("Timezone: {}", self.timezone_name());
        log_indented!("Accuracy: {}s", self.accuracy_secs());
    }
}

#[cfg(test)]
mod tests;
