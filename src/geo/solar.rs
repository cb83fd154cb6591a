//! Sunrise/sunset calculation backed by the `sunrise` crate.
//!
//! Uses the official horizon (-0.833°, accounting for refraction and the
//! solar disc radius), which is what `SolarEvent::Sunrise` and
//! `SolarEvent::Sunset` compute.
//!
//! `SolarDay` works in solar days at the given longitude, which do not line
//! up with calendar days in the bound timezone. Near the date line a solar
//! day's crossings land on the next local date, and at high latitudes in
//! summer the sunset drifts past local midnight. [`SunriseCalculator`]
//! therefore looks at the neighbouring solar days too and keeps the crossing
//! that falls on the requested local date.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use sunrise::{Coordinates, SolarDay, SolarEvent as HorizonCrossing};

use super::{DailyInstants, Location, SunCalculator};
use crate::constants::MAX_EVENT_DATE_DRIFT_HOURS;
use crate::error::{Result, SolarError};

/// Production [`SunCalculator`] bound to one location and timezone.
#[derive(Debug, Clone, Copy)]
pub struct SunriseCalculator {
    location: Location,
    timezone: Tz,
}

impl SunriseCalculator {
    pub fn new(location: Location, timezone: Tz) -> Self {
        Self { location, timezone }
    }

    pub fn location(&self) -> Location {
        self.location
    }

    /// The `kind` crossing that happens on the local calendar `date`.
    ///
    /// Candidates come from the solar days `date`, `date - 1` and `date + 1`.
    /// If none of them lands on `date` (a sunset sliding across midnight
    /// skips one local day), the crossing of solar day `date` is returned.
    /// It lies outside the local day, so it can never fire for that day.
    fn crossing_on(
        &self,
        coord: Coordinates,
        date: NaiveDate,
        kind: HorizonCrossing,
        crossing: &str,
    ) -> Result<DateTime<Utc>> {
        let solar_days = [date.pred_opt(), Some(date), date.succ_opt()];
        let candidates: Vec<(NaiveDate, DateTime<Utc>)> = solar_days
            .into_iter()
            .flatten()
            .map(|day| (day, SolarDay::new(coord, day).event_time(kind)))
            .filter(|(day, instant)| is_plausible(*day, *instant))
            .collect();

        if let Some(instant) = pick_on_local_date(&candidates, date, self.timezone) {
            return Ok(instant);
        }

        candidates
            .iter()
            .find(|(day, _)| *day == date)
            .map(|(_, instant)| *instant)
            .ok_or_else(|| {
                SolarError::calculation(
                    date,
                    format!(
                        "no {crossing} at {} on this date (polar day or night)",
                        self.location
                    ),
                )
            })
    }
}

/// Whether `instant` can belong to solar day `day`.
///
/// When the sun never crosses the horizon the hour angle is undefined and
/// the calculation yields a time nowhere near the requested day.
fn is_plausible(day: NaiveDate, instant: DateTime<Utc>) -> bool {
    let reference = day.and_time(NaiveTime::default()).and_utc() + Duration::hours(12);
    (instant - reference).num_hours().abs() <= MAX_EVENT_DATE_DRIFT_HOURS
}

/// First candidate falling on `date` in `timezone`, preferring solar day `date`.
fn pick_on_local_date(
    candidates: &[(NaiveDate, DateTime<Utc>)],
    date: NaiveDate,
    timezone: Tz,
) -> Option<DateTime<Utc>> {
    let on_date = |instant: &DateTime<Utc>| instant.with_timezone(&timezone).date_naive() == date;

    candidates
        .iter()
        .filter(|(day, _)| *day == date)
        .chain(candidates.iter().filter(|(day, _)| *day != date))
        .map(|(_, instant)| *instant)
        .find(on_date)
}

impl SunCalculator for SunriseCalculator {
    fn timezone(&self) -> Tz {
        self.timezone
    }

    fn compute(&self, date: NaiveDate) -> Result<DailyInstants> {
        let coord = Coordinates::new(self.location.latitude(), self.location.longitude())
            .ok_or_else(|| {
                SolarError::calculation(date, format!("invalid coordinates {}", self.location))
            })?;

        let sunrise = self.crossing_on(coord, date, HorizonCrossing::Sunrise, "sunrise")?;
        let sunset = self.crossing_on(coord, date, HorizonCrossing::Sunset, "sunset")?;

        Ok(DailyInstants::new(date, sunrise, sunset))
    }
}
