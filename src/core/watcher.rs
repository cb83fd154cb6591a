//! The sunrise/sunset watcher state machine.
//!
//! Each tick hands the watcher the current time. The watcher keeps the time
//! of the previous successful tick and the cached instants for the current
//! calendar date, and reports the transition (if any) that happened in the
//! half-open window `(last_checked, now]`.
//!
//! The watcher has no internal synchronization; the scheduler guarantees
//! that ticks never overlap.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use crate::constants::CALCULATION_TIMEOUT_MS;
use crate::error::{Result, SolarError};
use crate::events::SolarEvent;
use crate::geo::{DailyInstants, SunCalculator};

/// Coarse lifecycle of a watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherPhase {
    /// No tick has succeeded yet.
    Uninitialized,
    /// At least one tick succeeded; `last_checked` is set.
    Tracking,
}

pub struct Watcher {
    calculator: Arc<dyn SunCalculator>,
    calculation_timeout: Duration,
    last_checked: Option<DateTime<Utc>>,
    cached: Option<DailyInstants>,
}

impl Watcher {
    pub fn new(calculator: Arc<dyn SunCalculator>) -> Self {
        Self {
            calculator,
            calculation_timeout: Duration::from_millis(CALCULATION_TIMEOUT_MS),
            last_checked: None,
            cached: None,
        }
    }

    pub fn with_calculation_timeout(mut self, timeout: Duration) -> Self {
        self.calculation_timeout = timeout;
        self
    }

    pub fn phase(&self) -> WatcherPhase {
        if self.last_checked.is_some() {
            WatcherPhase::Tracking
        } else {
            WatcherPhase::Uninitialized
        }
    }

    pub fn last_checked(&self) -> Option<DateTime<Utc>> {
        self.last_checked
    }

    pub fn cached(&self) -> Option<&DailyInstants> {
        self.cached.as_ref()
    }

    pub fn timezone(&self) -> Tz {
        self.calculator.timezone()
    }

    /// Swap in a calculator for a new location or timezone.
    ///
    /// `last_checked` survives so that the first tick after a reconfiguration
    /// still compares against the previous tick; the cached instants belong
    /// to the old binding and are dropped. Returns the replaced calculator.
    pub fn rebind(&mut self, calculator: Arc<dyn SunCalculator>) -> Arc<dyn SunCalculator> {
        self.cached = None;
        std::mem::replace(&mut self.calculator, calculator)
    }

    /// Run one tick at `now`.
    ///
    /// Returns the event to dispatch, if a sunrise or sunset lies in
    /// `(last_checked, now]`. On a calculation failure nothing is modified,
    /// so the next tick retries with its own date.
    pub fn check(&mut self, now: DateTime<Utc>) -> Result<Option<SolarEvent>> {
        let today = now.with_timezone(&self.calculator.timezone()).date_naive();

        let Some(last_checked) = self.last_checked else {
            // First tick: there is no previous window to compare against
            let instants = self.compute(today)?;
            self.cached = Some(instants);
            self.last_checked = Some(now);
            return Ok(None);
        };

        if now < last_checked {
            log_warning!(
                "Clock moved backwards ({} -> {}), skipping check",
                last_checked.format("%Y-%m-%d %H:%M:%S"),
                now.format("%Y-%m-%d %H:%M:%S")
            );
            return Ok(None);
        }

        let instants = match self.cached {
            Some(cached) if cached.date == today => cached,
            _ => {
                let fresh = self.compute(today)?;
                self.cached = Some(fresh);
                fresh
            }
        };

        let event = if in_window(instants.sunrise, last_checked, now) {
            Some(SolarEvent::sunrise(instants.sunrise))
        } else if in_window(instants.sunset, last_checked, now) {
            Some(SolarEvent::sunset(instants.sunset))
        } else {
            None
        };

        self.last_checked = Some(now);
        Ok(event)
    }

    /// Ask the calculator for `date`, giving up after the configured timeout.
    fn compute(&self, date: NaiveDate) -> Result<DailyInstants> {
        let calculator = Arc::clone(&self.calculator);
        let (tx, rx) = mpsc::channel();

        thread::Builder::new()
            .name("solarwatch-calc".to_string())
            .spawn(move || {
                let _ = tx.send(calculator.compute(date));
            })
            .map_err(|e| {
                SolarError::calculation(date, format!("failed to spawn calculation: {e}"))
            })?;

        let instants = match rx.recv_timeout(self.calculation_timeout) {
            Ok(result) => result?,
            Err(RecvTimeoutError::Timeout) => {
                return Err(SolarError::calculation(
                    date,
                    format!(
                        "timed out after {} ms",
                        self.calculation_timeout.as_millis()
                    ),
                ));
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(SolarError::calculation(date, "calculator panicked"));
            }
        };

        let tz = self.calculator.timezone();
        log_block_start!("Solar times calculated for {}", instants.date);
        log_indented!(
            "Sunrise: {}",
            instants.sunrise.with_timezone(&tz).format("%H:%M:%S %Z")
        );
        log_indented!(
            "Sunset:  {}",
            instants.sunset.with_timezone(&tz).format("%H:%M:%S %Z")
        );

        Ok(instants)
    }
}

/// `instant` lies in the half-open window `(after, until]`.
fn in_window(instant: DateTime<Utc>, after: DateTime<Utc>, until: DateTime<Utc>) -> bool {
    instant > after && instant <= until
}
