//! Time source abstraction for supporting both real-time and simulated time.
//!
//! The service reads "now" through a [`TimeSource`] on every tick. Production
//! uses [`RealTimeSource`]; `--simulate` uses [`SimulatedTimeSource`] to watch
//! days pass in seconds; tests drive a [`ManualTimeSource`] by hand.

use chrono::{DateTime, Duration as ChronoDuration, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::constants::{DEFAULT_SIMULATION_MULTIPLIER, MINIMUM_SIMULATED_PERIOD_MS};

/// Trait for abstracting time operations
pub trait TimeSource: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;

    /// Check if this is a simulated time source
    fn is_simulated(&self) -> bool;
}

/// Real-time implementation that uses actual system time
pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn is_simulated(&self) -> bool {
        false
    }
}

/// Accelerated clock: simulated time flows at `multiplier` times real time.
pub struct SimulatedTimeSource {
    /// The starting time for the simulation
    start_time: DateTime<Utc>,
    /// Real instant the simulation started at
    started: Instant,
    /// Time acceleration factor (e.g., 60.0 = 1 minute per second)
    time_multiplier: f64,
}

impl SimulatedTimeSource {
    /// Create a new simulated time source.
    ///
    /// Non-positive multipliers fall back to one simulated hour per second.
    pub fn new(start_time: DateTime<Utc>, multiplier: f64) -> Self {
        Self {
            start_time,
            started: Instant::now(),
            time_multiplier: if multiplier > 0.0 {
                multiplier
            } else {
                DEFAULT_SIMULATION_MULTIPLIER
            },
        }
    }

    pub fn multiplier(&self) -> f64 {
        self.time_multiplier
    }
}

impl TimeSource for SimulatedTimeSource {
    fn now(&self) -> DateTime<Utc> {
        let simulated_secs = self.started.elapsed().as_secs_f64() * self.time_multiplier;
        let elapsed = ChronoDuration::milliseconds((simulated_secs * 1000.0) as i64);
        self.start_time + elapsed
    }

    fn is_simulated(&self) -> bool {
        true
    }
}

/// Clock that only moves when told to.
pub struct ManualTimeSource {
    current: Mutex<DateTime<Utc>>,
}

impl ManualTimeSource {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    pub fn set(&self, time: DateTime<Utc>) {
        *self.current.lock().unwrap() = time;
    }

    pub fn advance(&self, by: ChronoDuration) {
        let mut guard = self.current.lock().unwrap();
        *guard += by;
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock().unwrap()
    }

    fn is_simulated(&self) -> bool {
        true
    }
}

/// Real polling period that keeps `period` of simulated time per tick.
pub fn simulated_period(period: Duration, multiplier: f64) -> Duration {
    if multiplier <= 0.0 || !multiplier.is_finite() {
        return period;
    }
    let scaled = Duration::from_secs_f64(period.as_secs_f64() / multiplier);
    scaled.max(Duration::from_millis(MINIMUM_SIMULATED_PERIOD_MS))
}

/// Parse a datetime string in a specific timezone
pub fn parse_datetime_in_tz(s: &str, tz: Tz) -> Result<DateTime<Tz>, String> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| {
            tz.from_local_datetime(&naive)
                .single()
                .ok_or_else(|| format!("Ambiguous or invalid time in timezone {tz}"))
        })
        .map_err(|e| format!("Invalid datetime format: {e}. Use YYYY-MM-DD HH:MM:SS"))
        .and_then(|r| r)
}
