//! Fixed-rate tick scheduler on a single dedicated worker thread.
//!
//! Ticks are scheduled at `start + k * period`. The first tick runs
//! immediately. Because one thread runs every tick, a tick never starts while
//! the previous one is still running; when a tick overruns its slot the
//! schedule drifts forward instead of firing the missed slots back to back.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::{Result, SolarError};

struct Worker {
    stop_tx: Sender<()>,
    thread: JoinHandle<()>,
    period: Duration,
}

#[derive(Default)]
pub struct Scheduler {
    worker: Option<Worker>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start ticking every `period`, replacing any running schedule.
    ///
    /// A zero period is rejected before the current schedule is touched.
    pub fn start<F>(&mut self, period: Duration, tick: F) -> Result<()>
    where
        F: FnMut() + Send + 'static,
    {
        if period.is_zero() {
            return Err(SolarError::configuration(
                "tick period must be greater than zero",
            ));
        }

        self.stop();

        let (stop_tx, stop_rx) = mpsc::channel();
        let thread = thread::Builder::new()
            .name("solarwatch-ticker".to_string())
            .spawn(move || run_fixed_rate(period, stop_rx, tick))
            .map_err(|e| SolarError::configuration(format!("failed to start ticker: {e}")))?;

        self.worker = Some(Worker {
            stop_tx,
            thread,
            period,
        });
        Ok(())
    }

    /// Cancel all future ticks.
    ///
    /// Waits for a tick in progress to finish, unless called from inside that
    /// tick, in which case the worker exits as soon as the tick returns.
    /// Calling it when nothing is scheduled does nothing.
    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };

        let _ = worker.stop_tx.send(());
        if worker.thread.thread().id() != thread::current().id() {
            let _ = worker.thread.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    pub fn period(&self) -> Option<Duration> {
        self.worker.as_ref().map(|w| w.period)
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_fixed_rate<F: FnMut()>(period: Duration, stop_rx: Receiver<()>, mut tick: F) {
    let mut next_tick = Instant::now();

    loop {
        let wait = next_tick.saturating_duration_since(Instant::now());
        match stop_rx.recv_timeout(wait) {
            Err(RecvTimeoutError::Timeout) => {}
            // Stop requested, or the scheduler was dropped
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }

        tick();

        next_tick += period;
        let now = Instant::now();
        if next_tick < now {
            next_tick = now;
        }
    }
}
