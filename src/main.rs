//! Main application entry point and high-level flow coordination.
//!
//! This module orchestrates the application lifecycle after command-line
//! argument parsing is complete:
//!
//! 1. Argument parsing and early exit for help/version
//! 2. Logging setup (file output, debug, JSON mode)
//! 3. Configuration loading and service activation
//! 4. Main loop reacting to reload and shutdown messages
//! 5. Graceful deactivation on shutdown

use anyhow::{Context, Result};
use chrono::Utc;
use chrono_tz::Tz;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use solarwatch::args::{self, CliAction, ParsedArgs, SimulateOptions};
use solarwatch::config::{self, Config};
use solarwatch::constants::EXIT_FAILURE;
use solarwatch::listeners::{JsonLinesListener, LogListener};
use solarwatch::logger::Log;
use solarwatch::signals::{SignalMessage, SignalState, setup_signal_handler};
use solarwatch::time_source::{
    RealTimeSource, SimulatedTimeSource, TimeSource, parse_datetime_in_tz, simulated_period,
};
use solarwatch::{
    ListenerHandle, SolarEventService, WatchSettings, log_block_start, log_debug, log_end,
    log_error_exit, log_indented, log_info, log_pipe, log_version, log_warning,
};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Shut down on request.
    Completed,
    /// The configuration could not be turned into watch settings.
    InvalidConfiguration,
}

impl From<RunOutcome> for ExitCode {
    fn from(outcome: RunOutcome) -> Self {
        match outcome {
            RunOutcome::Completed => ExitCode::SUCCESS,
            RunOutcome::InvalidConfiguration => ExitCode::from(EXIT_FAILURE as u8),
        }
    }
}

/// Builder for configuring and running the solarwatch application.
pub struct ApplicationRunner {
    debug_enabled: bool,
    config_dir: Option<String>,
    json_output: bool,
    log_file: Option<String>,
    simulate: Option<SimulateOptions>,
}

impl ApplicationRunner {
    /// Create a new runner with defaults matching a plain `solarwatch` run
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            debug_enabled,
            config_dir: None,
            json_output: false,
            log_file: None,
            simulate: None,
        }
    }

    pub fn with_config_dir(mut self, dir: Option<String>) -> Self {
        self.config_dir = dir;
        self
    }

    /// Print events as JSON lines instead of log blocks
    pub fn with_json_output(mut self, enabled: bool) -> Self {
        self.json_output = enabled;
        self
    }

    pub fn with_log_file(mut self, path: Option<String>) -> Self {
        self.log_file = path;
        self
    }

    pub fn with_simulation(mut self, simulate: Option<SimulateOptions>) -> Self {
        self.simulate = simulate;
        self
    }

    /// Execute the application
    ///
    /// Every exit path returns through here, so the file log guard is
    /// dropped and flushed before the process ends.
    pub fn run(self) -> Result<RunOutcome> {
        // Keep the guard alive until the very end so the file gets flushed
        let _log_guard = match &self.log_file {
            Some(path) => Some(Log::start_file_logging(path.clone())?),
            None => None,
        };

        // JSON lines own stdout unless the log is going to a file
        if self.json_output && self.log_file.is_none() {
            Log::set_enabled(false);
        }
        Log::set_debug_enabled(self.debug_enabled);

        log_version!();
        if self.debug_enabled {
            log_pipe!();
            log_debug!("Debug mode enabled - showing every check");
        }

        config::set_config_dir(self.config_dir.clone())?;
        let signal_state = setup_signal_handler(self.debug_enabled)?;

        let config = Config::load()?;
        config.log_config();
        let settings = match config.settings() {
            Ok(settings) => settings,
            Err(e) => {
                log_pipe!();
                log_error_exit!("{e}");
                if let Ok(path) = config::get_config_path() {
                    log_indented!("Check {}", config::private_path(&path));
                }
                log_end!();
                return Ok(RunOutcome::InvalidConfiguration);
            }
        };

        let (time_source, multiplier) = self.time_source(settings.timezone)?;
        let service = SolarEventService::with_time_source(time_source);

        let mut listener = self.listener_for(settings.timezone);
        service.add_event_listener(listener.clone());
        service
            .activate(self.effective(settings, multiplier))
            .context("failed to activate solarwatch")?;

        match config::get_config_path() {
            Ok(path) => {
                if let Err(e) = config::start_config_watcher(
                    path,
                    signal_state.signal_sender.clone(),
                    self.debug_enabled,
                ) {
                    log_pipe!();
                    log_warning!("Hot reload disabled: {e:#}");
                }
            }
            Err(e) => {
                log_pipe!();
                log_warning!("Hot reload disabled: {e:#}");
            }
        }

        self.main_loop(&service, &signal_state, &mut listener, multiplier);

        service.deactivate();
        log_end!();
        Ok(RunOutcome::Completed)
    }

    fn main_loop(
        &self,
        service: &SolarEventService,
        signal_state: &SignalState,
        listener: &mut ListenerHandle,
        multiplier: Option<f64>,
    ) {
        while signal_state.running.load(Ordering::SeqCst) {
            match signal_state.signal_receiver.recv() {
                Ok(SignalMessage::Reload) => self.reload(service, listener, multiplier),
                Ok(SignalMessage::Shutdown) | Err(_) => break,
            }
        }
    }

    /// Re-read the configuration and rebind the service.
    ///
    /// Any failure keeps the running configuration.
    fn reload(
        &self,
        service: &SolarEventService,
        listener: &mut ListenerHandle,
        multiplier: Option<f64>,
    ) {
        let settings = match Config::load().map_err(|e| format!("{e:#}")).and_then(|config| {
            let settings = config.settings().map_err(|e| e.to_string())?;
            Ok((config, settings))
        }) {
            Ok((config, settings)) => {
                config.log_config();
                settings
            }
            Err(reason) => {
                log_pipe!();
                log_warning!("Failed to reload configuration: {reason}");
                log_indented!("Keeping the previous configuration");
                return;
            }
        };

        let effective = self.effective(settings, multiplier);
        let previous = service.settings();
        if previous == Some(effective) {
            log_block_start!("Configuration unchanged");
            return;
        }

        if let Err(e) = service.reconfigure(effective) {
            log_pipe!();
            log_warning!("Failed to apply configuration: {e}");
            return;
        }

        if previous.map(|p| p.timezone) != Some(settings.timezone) {
            let replacement = self.listener_for(settings.timezone);
            service.remove_event_listener(listener);
            service.add_event_listener(replacement.clone());
            *listener = replacement;
        }
        log_info!("Configuration reloaded");
    }

    fn time_source(&self, timezone: Tz) -> Result<(Arc<dyn TimeSource>, Option<f64>)> {
        let Some(simulate) = &self.simulate else {
            return Ok((Arc::new(RealTimeSource), None));
        };

        let start = parse_datetime_in_tz(&simulate.start_time, timezone)
            .map_err(|e| anyhow::anyhow!("Invalid --simulate start time: {e}"))?;
        let source: Arc<dyn TimeSource> = Arc::new(SimulatedTimeSource::new(
            start.with_timezone(&Utc),
            simulate.multiplier,
        ));
        Log::set_simulation_clock(source.clone(), timezone);

        log_block_start!("Simulating from {}", start.format("%Y-%m-%d %H:%M:%S %Z"));
        log_indented!("Speed: {}x real time", simulate.multiplier);
        Ok((source, Some(simulate.multiplier)))
    }

    fn listener_for(&self, timezone: Tz) -> ListenerHandle {
        if self.json_output {
            Arc::new(JsonLinesListener::stdout(timezone))
        } else {
            Arc::new(LogListener::new(timezone))
        }
    }

    /// Settings with the polling period scaled for simulated time.
    fn effective(&self, settings: WatchSettings, multiplier: Option<f64>) -> WatchSettings {
        match multiplier {
            Some(m) => WatchSettings {
                period: simulated_period(settings.period, m),
                ..settings
            },
            None => settings,
        }
    }
}

fn main() -> Result<ExitCode> {
    let parsed_args = ParsedArgs::from_env();

    match parsed_args.action {
        CliAction::ShowVersion => {
            args::display_version_info();
            Ok(ExitCode::SUCCESS)
        }
        CliAction::ShowHelp | CliAction::ShowHelpDueToError => {
            args::display_help();
            Ok(ExitCode::SUCCESS)
        }
        CliAction::Run {
            debug_enabled,
            config_dir,
            json_output,
            log_file,
            simulate,
        } => ApplicationRunner::new(debug_enabled)
            .with_config_dir(config_dir)
            .with_json_output(json_output)
            .with_log_file(log_file)
            .with_simulation(simulate)
            .run()
            .map(ExitCode::from),
    }
}
