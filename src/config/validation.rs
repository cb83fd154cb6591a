//! Configuration validation functionality.
//!
//! Rejects values the service could never run with before they reach it.

use anyhow::Result;

use super::Config;
use crate::constants::*;
use crate::geo::parse_timezone;

/// Validate every field that is present in `config`.
///
/// Missing coordinates are not an error here: a freshly written default file
/// has none, and [`Config::settings`] reports that when the service starts.
pub fn validate_config(config: &Config) -> Result<()> {
    if let Some(lat) = config.latitude
        && !(MINIMUM_LATITUDE..=MAXIMUM_LATITUDE).contains(&lat)
    {
        anyhow::bail!(
            "latitude must be between {} and {} degrees (got {})",
            MINIMUM_LATITUDE,
            MAXIMUM_LATITUDE,
            lat
        );
    }

    if let Some(lon) = config.longitude
        && !(MINIMUM_LONGITUDE..=MAXIMUM_LONGITUDE).contains(&lon)
    {
        anyhow::bail!(
            "longitude must be between {} and {} degrees (got {})",
            MINIMUM_LONGITUDE,
            MAXIMUM_LONGITUDE,
            lon
        );
    }

    if config.latitude.is_some() != config.longitude.is_some() {
        anyhow::bail!("latitude and longitude must be set together");
    }

    if let Some(tz) = &config.timezone {
        parse_timezone(tz)?;
    }

    if let Some(accuracy) = config.accuracy
        && !(MINIMUM_ACCURACY..=MAXIMUM_ACCURACY).contains(&accuracy)
    {
        anyhow::bail!(
            "accuracy ({} s) must be between {} and {} seconds",
            accuracy,
            MINIMUM_ACCURACY,
            MAXIMUM_ACCURACY
        );
    }

    Ok(())
}
