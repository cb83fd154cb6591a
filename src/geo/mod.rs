//! Geographic location and sunrise/sunset calculation.
//!
//! The watcher never calculates solar positions itself. It asks a
//! [`SunCalculator`] for the [`DailyInstants`] of a calendar date and caches
//! the answer until the date changes, which is only valid because calculators
//! are pure in date, location and timezone.
//!
//! ## Module Structure
//!
//! - [`solar`]: the production calculator backed by the `sunrise` crate

pub mod solar;

pub use solar::SunriseCalculator;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use std::fmt;

use crate::constants::*;
use crate::error::{Result, SolarError};

#[cfg(test)]
mod tests;

/// A validated pair of geographic coordinates in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    latitude: f64,
    longitude: f64,
}

impl Location {
    /// Create a location, rejecting coordinates outside the valid ranges.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(MINIMUM_LATITUDE..=MAXIMUM_LATITUDE).contains(&latitude) {
            return Err(SolarError::configuration(format!(
                "latitude must be between {MINIMUM_LATITUDE} and {MAXIMUM_LATITUDE} degrees (got {latitude})"
            )));
        }
        if !longitude.is_finite()
            || !(MINIMUM_LONGITUDE..=MAXIMUM_LONGITUDE).contains(&longitude)
        {
            return Err(SolarError::configuration(format!(
                "longitude must be between {MINIMUM_LONGITUDE} and {MAXIMUM_LONGITUDE} degrees (got {longitude})"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lat_dir = if self.latitude >= 0.0 { "N" } else { "S" };
        let lon_dir = if self.longitude >= 0.0 { "E" } else { "W" };
        write!(
            f,
            "{:.4}°{}, {:.4}°{}",
            self.latitude.abs(),
            lat_dir,
            self.longitude.abs(),
            lon_dir
        )
    }
}

/// Parse an IANA timezone identifier such as `Europe/Amsterdam`.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| SolarError::configuration(format!("unknown timezone '{name}'")))
}

/// Sunrise and sunset for one calendar date at the watched location.
///
/// `sunrise < sunset` is a property of the calculator that produced the
/// value; the watcher does not re-check it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyInstants {
    pub date: NaiveDate,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
}

impl DailyInstants {
    pub fn new(date: NaiveDate, sunrise: DateTime<Utc>, sunset: DateTime<Utc>) -> Self {
        Self {
            date,
            sunrise,
            sunset,
        }
    }
}

/// Computes the daily instants for a bound location and timezone.
///
/// Implementations must return the same answer for the same date every time;
/// the watcher caches one result per date.
#[cfg_attr(test, mockall::automock)]
pub trait SunCalculator: Send + Sync {
    /// Timezone whose calendar decides which "day" an instant belongs to.
    fn timezone(&self) -> Tz;

    /// Sunrise and sunset for `date` in the calculator's timezone.
    fn compute(&self, date: NaiveDate) -> Result<DailyInstants>;
}
