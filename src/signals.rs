//! Signal handling for the `solarwatch` binary.
//!
//! A dedicated thread turns POSIX signals into [`SignalMessage`]s on a
//! channel that the main loop drains. The configuration file watcher feeds
//! the same channel, so reloads from either source go through one path.

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM, SIGUSR2},
    iterator::Signals,
};
use std::{
    sync::Arc,
    sync::atomic::{AtomicBool, Ordering},
    sync::mpsc::{Receiver, Sender, channel},
    thread,
};

/// Message delivered to the main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalMessage {
    /// Re-read the configuration file (SIGUSR2 or a file change)
    Reload,
    /// Stop the service and exit (SIGTERM, SIGINT, SIGHUP)
    Shutdown,
}

/// Signal handling state shared between threads
pub struct SignalState {
    /// Atomic flag indicating if the application should keep running
    pub running: Arc<AtomicBool>,
    /// Channel receiver for signal messages
    pub signal_receiver: Receiver<SignalMessage>,
    /// Channel sender, cloned by the config watcher
    pub signal_sender: Sender<SignalMessage>,
}

/// Map a raw signal number to the message it produces.
pub fn message_for_signal(sig: i32) -> Option<SignalMessage> {
    match sig {
        SIGUSR2 => Some(SignalMessage::Reload),
        SIGINT | SIGTERM | SIGHUP => Some(SignalMessage::Shutdown),
        _ => None,
    }
}

fn shutdown_message(sig: i32, debug_enabled: bool) -> &'static str {
    match sig {
        SIGINT if debug_enabled => "Received SIGINT (Ctrl+C), initiating graceful shutdown...",
        SIGINT => "Received interrupt signal, initiating graceful shutdown...",
        SIGTERM => "Received termination request, initiating graceful shutdown...",
        SIGHUP => "Received hangup signal, initiating graceful shutdown...",
        _ => "Received shutdown signal, initiating graceful shutdown...",
    }
}

/// Set up signal handling and return the shared state.
pub fn setup_signal_handler(debug_enabled: bool) -> Result<SignalState> {
    let running = Arc::new(AtomicBool::new(true));
    let (signal_sender, signal_receiver) = channel::<SignalMessage>();

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP, SIGUSR2])
        .context("failed to register signal handlers")?;

    let running_clone = running.clone();
    let sender = signal_sender.clone();

    thread::Builder::new()
        .name("solarwatch-signals".to_string())
        .spawn(move || {
            for sig in signals.forever() {
                let Some(message) = message_for_signal(sig) else {
                    continue;
                };

                log_pipe!();
                match message {
                    SignalMessage::Reload => {
                        log_info!("Received configuration reload signal");
                    }
                    SignalMessage::Shutdown => {
                        log_info!("{}", shutdown_message(sig, debug_enabled));
                        running_clone.store(false, Ordering::SeqCst);
                    }
                }

                if sender.send(message).is_err() {
                    // Main loop is gone
                    break;
                }
            }
        })
        .context("failed to start signal handler thread")?;

    Ok(SignalState {
        running,
        signal_receiver,
        signal_sender,
    })
}
