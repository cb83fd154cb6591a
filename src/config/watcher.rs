//! File watching module for hot config reloading.
//!
//! Watches the directory holding `solarwatch.toml` and sends
//! [`SignalMessage::Reload`] to the main loop when the file changes, so an
//! edited location or accuracy takes effect without a restart.

use anyhow::{Context, Result};
use notify::{
    Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::{Duration, Instant};

use super::loading::private_path;
use crate::constants::CONFIG_DEBOUNCE_MS;
use crate::signals::SignalMessage;

/// Configuration file watcher that monitors for changes and triggers reloads.
pub struct ConfigWatcher {
    config_path: PathBuf,
    /// Channel sender for sending reload signals to the main loop
    signal_sender: Sender<SignalMessage>,
    /// Whether debug logging is enabled
    debug_enabled: bool,
}

impl ConfigWatcher {
    pub fn new(
        config_path: PathBuf,
        signal_sender: Sender<SignalMessage>,
        debug_enabled: bool,
    ) -> Self {
        Self {
            config_path,
            signal_sender,
            debug_enabled,
        }
    }

    /// Start watching the configuration file for changes.
    ///
    /// The parent directory is watched rather than the file itself, which
    /// also catches editors that save by writing a temp file and renaming it.
    pub fn start(self) -> Result<()> {
        let Some(parent) = self.config_path.parent().map(Path::to_path_buf) else {
            anyhow::bail!(
                "Configuration path has no parent directory: {}",
                private_path(&self.config_path)
            );
        };

        let (tx, rx) = std::sync::mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res
                    && matches!(
                        event.kind,
                        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                    )
                {
                    let _ = tx.send(event);
                }
            },
            NotifyConfig::default(),
        )
        .context("Failed to create file watcher")?;

        watcher
            .watch(&parent, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch directory: {}", private_path(&parent)))?;

        if self.debug_enabled {
            log_pipe!();
            log_debug!("Starting config file watcher for hot reload:");
            log_indented!("Watching: {}", private_path(&self.config_path));
        }

        let ConfigWatcher {
            config_path,
            signal_sender,
            debug_enabled,
        } = self;

        thread::Builder::new()
            .name("solarwatch-config-watcher".to_string())
            .spawn(move || {
                // Keep the watcher alive for as long as the thread runs
                let _watcher = watcher;
                let mut debounce = Debouncer::new(Duration::from_millis(CONFIG_DEBOUNCE_MS));

                for event in rx {
                    if !event.paths.iter().any(|p| affects_config(p, &config_path)) {
                        continue;
                    }
                    if !debounce.accept(Instant::now()) {
                        continue;
                    }

                    if debug_enabled {
                        log_pipe!();
                        log_info!("Configuration file change detected");
                    }

                    if signal_sender.send(SignalMessage::Reload).is_err() {
                        // Channel disconnected, main loop is gone
                        break;
                    }
                }
            })
            .context("Failed to start config watcher thread")?;

        Ok(())
    }
}

/// Start the configuration file watcher.
///
/// This is called from the main application to enable hot config reloading.
pub fn start_config_watcher(
    config_path: PathBuf,
    signal_sender: Sender<SignalMessage>,
    debug_enabled: bool,
) -> Result<()> {
    ConfigWatcher::new(config_path, signal_sender, debug_enabled).start()
}

/// Whether a change to `event_path` can alter the file at `config_path`.
///
/// Editors often write `name.toml~`, `.name.toml.swp` or `name.toml.tmp`
/// next to the real file and rename it into place.
fn affects_config(event_path: &Path, config_path: &Path) -> bool {
    if event_path == config_path {
        return true;
    }
    if event_path.parent() != config_path.parent() {
        return false;
    }

    let (Some(event_name), Some(config_name)) = (
        event_path.file_name().and_then(|n| n.to_str()),
        config_path.file_name().and_then(|n| n.to_str()),
    ) else {
        return false;
    };

    event_name.trim_start_matches('.').starts_with(config_name)
}

/// Drops events that arrive within `window` of the last accepted one.
struct Debouncer {
    window: Duration,
    last_accepted: Option<Instant>,
}

impl Debouncer {
    fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: None,
        }
    }

    fn accept(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_accepted
            && now.duration_since(last) < self.window
        {
            return false;
        }
        self.last_accepted = Some(now);
        true
    }
}
