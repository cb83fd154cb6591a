//! Core watch loop and the host-facing service.
//!
//! This module ties the pieces of the watch loop together:
//!
//! - [`watcher`]: the per-tick state machine deciding whether a sunrise or
//!   sunset happened since the previous tick
//! - [`scheduler`]: the fixed-rate ticker running on its own thread
//! - [`registry`]: the listener set notified of each event
//!
//! [`SolarEventService`] is the lifecycle surface a host uses: `activate`,
//! `on_configuration_changed`, `deactivate`, and listener registration.
//! Failures inside a tick are logged by [`run_tick`] and never reach the
//! scheduler; only configuration errors are returned to callers.

pub mod registry;
pub mod scheduler;
pub mod watcher;

pub use registry::{ListenerHandle, ListenerRegistry, SolarEventListener};
pub use scheduler::Scheduler;
pub use watcher::{Watcher, WatcherPhase};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::constants::CALCULATION_TIMEOUT_MS;
use crate::error::{Result, SolarError};
use crate::events::SolarEvent;
use crate::geo::{Location, SunCalculator, SunriseCalculator};
use crate::time_source::{RealTimeSource, TimeSource};

/// Validated inputs for one watch binding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatchSettings {
    pub location: Location,
    pub timezone: Tz,
    pub period: Duration,
}

impl WatchSettings {
    pub fn new(location: Location, timezone: Tz, period: Duration) -> Result<Self> {
        if period.is_zero() {
            return Err(SolarError::configuration(
                "accuracy must be greater than zero",
            ));
        }
        Ok(Self {
            location,
            timezone,
            period,
        })
    }

    /// Build settings from a polling accuracy in whole seconds.
    pub fn from_seconds(location: Location, timezone: Tz, period_seconds: i64) -> Result<Self> {
        if period_seconds <= 0 {
            return Err(SolarError::configuration(format!(
                "accuracy must be a positive number of seconds (got {period_seconds})"
            )));
        }
        Self::new(location, timezone, Duration::from_secs(period_seconds as u64))
    }
}

/// What a single tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Nothing happened in the window.
    Idle,
    /// An event was dispatched; `failures` listeners reported an error.
    Fired { event: SolarEvent, failures: usize },
    /// The tick was abandoned and will be retried.
    Failed(SolarError),
}

/// Run one tick: check the watcher at `now` and dispatch any event.
///
/// The watcher lock is released before listeners run, so a listener may
/// call back into the service.
pub fn run_tick(
    watcher: &Mutex<Watcher>,
    registry: &ListenerRegistry,
    now: DateTime<Utc>,
) -> TickOutcome {
    log_debug!("Running check at {}", now.format("%Y-%m-%d %H:%M:%S UTC"));

    let checked = watcher
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .check(now);

    match checked {
        Ok(None) => TickOutcome::Idle,
        Ok(Some(event)) => {
            log_debug!("Dispatching {event} to {} listener(s)", registry.len());
            let failures = registry.notify(&event).len();
            if failures > 0 {
                log_indented!("{failures} listener(s) failed");
            }
            TickOutcome::Fired { event, failures }
        }
        Err(e) => {
            log_pipe!();
            log_error!("{e}");
            log_indented!("Retrying on the next check");
            TickOutcome::Failed(e)
        }
    }
}

type CalculatorFactory = Box<dyn Fn(&WatchSettings) -> Arc<dyn SunCalculator> + Send + Sync>;

#[derive(Default)]
struct ServiceState {
    scheduler: Scheduler,
    watcher: Option<Arc<Mutex<Watcher>>>,
    settings: Option<WatchSettings>,
}

/// Notifies registered listeners of sunrise and sunset at a configured location.
pub struct SolarEventService {
    registry: Arc<ListenerRegistry>,
    time_source: Arc<dyn TimeSource>,
    calculator_factory: CalculatorFactory,
    calculation_timeout: Duration,
    state: Mutex<ServiceState>,
}

impl Default for SolarEventService {
    fn default() -> Self {
        Self::new()
    }
}

impl SolarEventService {
    pub fn new() -> Self {
        Self::with_time_source(Arc::new(RealTimeSource))
    }

    pub fn with_time_source(time_source: Arc<dyn TimeSource>) -> Self {
        Self {
            registry: Arc::new(ListenerRegistry::new()),
            time_source,
            calculator_factory: Box::new(|settings: &WatchSettings| {
                Arc::new(SunriseCalculator::new(settings.location, settings.timezone))
                    as Arc<dyn SunCalculator>
            }),
            calculation_timeout: Duration::from_millis(CALCULATION_TIMEOUT_MS),
            state: Mutex::new(ServiceState::default()),
        }
    }

    /// Replace how calculators are built for a binding.
    pub fn with_calculator_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&WatchSettings) -> Arc<dyn SunCalculator> + Send + Sync + 'static,
    {
        self.calculator_factory = Box::new(factory);
        self
    }

    pub fn with_calculation_timeout(mut self, timeout: Duration) -> Self {
        self.calculation_timeout = timeout;
        self
    }

    /// Bind the calculator and start ticking.
    pub fn activate(&self, settings: WatchSettings) -> Result<()> {
        self.install(settings)?;
        log_block_start!("Activating solarwatch... Done.");
        Ok(())
    }

    /// Rebind to a new location, timezone or accuracy.
    ///
    /// Invalid input is rejected before anything changes, so the running
    /// configuration keeps ticking.
    pub fn on_configuration_changed(
        &self,
        location: Location,
        timezone: Tz,
        period_seconds: i64,
    ) -> Result<()> {
        let settings = WatchSettings::from_seconds(location, timezone, period_seconds)?;
        self.install(settings)
    }

    /// Rebind to already validated settings.
    pub fn reconfigure(&self, settings: WatchSettings) -> Result<()> {
        self.install(settings)
    }

    /// Stop ticking and release the worker. Safe to call repeatedly.
    pub fn deactivate(&self) {
        let scheduler = {
            let mut state = self.lock_state();
            state.watcher = None;
            state.settings = None;
            std::mem::take(&mut state.scheduler)
        };

        let was_running = scheduler.is_running();
        // Joined outside the state lock: a listener on the ticker thread may
        // be calling into the service right now
        drop(scheduler);

        if was_running {
            log_block_start!("Deactivated solarwatch");
        }
    }

    pub fn add_event_listener(&self, listener: ListenerHandle) -> bool {
        self.registry.add(listener)
    }

    pub fn remove_event_listener(&self, listener: &ListenerHandle) -> bool {
        self.registry.remove(listener)
    }

    pub fn registry(&self) -> &Arc<ListenerRegistry> {
        &self.registry
    }

    pub fn is_active(&self) -> bool {
        self.lock_state().scheduler.is_running()
    }

    pub fn settings(&self) -> Option<WatchSettings> {
        self.lock_state().settings
    }

    /// Time of the last successful tick, if the service is active.
    pub fn last_checked(&self) -> Option<DateTime<Utc>> {
        let watcher = self.lock_state().watcher.clone()?;
        let last_checked = watcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last_checked();
        last_checked
    }

    fn install(&self, settings: WatchSettings) -> Result<()> {
        let calculator = (self.calculator_factory)(&settings);

        let previous = std::mem::take(&mut self.lock_state().scheduler);
        drop(previous);

        let mut state = self.lock_state();
        let (watcher, replaced) = match state.watcher.clone() {
            Some(watcher) => {
                let replaced = watcher
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .rebind(calculator);
                (watcher, Some(replaced))
            }
            None => (
                Arc::new(Mutex::new(
                    Watcher::new(calculator).with_calculation_timeout(self.calculation_timeout),
                )),
                None,
            ),
        };

        let scheduler = match self.start_ticker(&watcher, settings.period) {
            Ok(scheduler) => scheduler,
            Err(e) => {
                self.restore(&mut state, replaced);
                return Err(e);
            }
        };

        let displaced = std::mem::replace(&mut state.scheduler, scheduler);
        state.watcher = Some(watcher);
        state.settings = Some(settings);
        drop(state);
        // Only set if another reconfiguration raced this one
        drop(displaced);

        log_block_start!("Watching {}", settings.location);
        log_indented!("Timezone: {}", settings.timezone);
        log_indented!("Accuracy: {:?}", settings.period);
        Ok(())
    }

    /// Put the previous binding back after a failed rebind.
    ///
    /// If it cannot be restarted either, the state is cleared so it never
    /// claims a binding that is not ticking.
    fn restore(&self, state: &mut ServiceState, replaced: Option<Arc<dyn SunCalculator>>) {
        let (Some(watcher), Some(settings), Some(calculator)) =
            (state.watcher.clone(), state.settings, replaced)
        else {
            return;
        };

        watcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .rebind(calculator);

        match self.start_ticker(&watcher, settings.period) {
            Ok(scheduler) => {
                state.scheduler = scheduler;
                log_pipe!();
                log_warning!("Keeping the previous configuration");
            }
            Err(e) => {
                log_pipe!();
                log_error!("Failed to restart the previous configuration: {e}");
                state.watcher = None;
                state.settings = None;
            }
        }
    }

    fn start_ticker(&self, watcher: &Arc<Mutex<Watcher>>, period: Duration) -> Result<Scheduler> {
        let tick = {
            let watcher = Arc::clone(watcher);
            let registry = Arc::clone(&self.registry);
            let time_source = Arc::clone(&self.time_source);
            move || {
                run_tick(&watcher, &registry, time_source.now());
            }
        };

        let mut scheduler = Scheduler::new();
        scheduler.start(period, tick)?;
        Ok(scheduler)
    }

    fn lock_state(&self) -> MutexGuard<'_, ServiceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
