//! Structured logging system with visual formatting.
//!
//! This module provides the logging system used for solarwatch's visual output
//! style: box-drawing blocks for the normal flow of events and `[LEVEL]`
//! prefixed lines for diagnostics. Every macro funnels into [`emit`], which
//! applies the enable flag, the simulation timestamp prefix, and routes the
//! line to stdout or the log file.
//!
//! ## Logging Conventions
//!
//! - **`log_block_start!`**: starts a new conceptual block (an event fired,
//!   configuration loaded). Prints an empty `┃` spacer then `┣ message`.
//! - **`log_decorated!`**: a line inside the current block, `┣ message`.
//! - **`log_indented!`**: nested detail, `┃   message`.
//! - **`log_pipe!`**: a lone `┃` spacer, used before a level-prefixed line
//!   that begins its own block.
//! - **`log_version!`** / **`log_end!`**: startup header and final marker.
//! - **`log_info!`, `log_warning!`, `log_error!`, `log_debug!`,
//!   `log_critical!`**: semantic `[LEVEL]` lines. `log_debug!` is dropped
//!   unless debug output was enabled with [`Log::set_debug_enabled`].
//!
//! Diagnostics produced inside a tick (calculation and listener failures) are
//! reported through these macros; nothing inside a tick returns them to the
//! scheduler.

use chrono_tz::Tz;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Sender, channel};
use std::sync::{Arc, Mutex, OnceLock};

use crate::time_source::TimeSource;

// Use an AtomicBool instead of thread_local for thread safety
static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);
static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

// Simulated clock and watched timezone, used for timestamp prefixes
static SIMULATION_CLOCK: OnceLock<(Arc<dyn TimeSource>, Tz)> = OnceLock::new();

// Channel for routing output to file when --log is active
static LOG_CHANNEL: OnceLock<Mutex<Sender<LogMessage>>> = OnceLock::new();

enum LogMessage {
    Formatted(String),
    Shutdown,
}

/// The visual shape of one log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    BlockStart,
    Decorated,
    Indented,
    Info,
    Warning,
    Error,
    ErrorExit,
    Debug,
    Critical,
}

/// Global logger switches.
pub struct Log;

impl Log {
    /// Enable or disable logging temporarily.
    ///
    /// This is useful for quiet operation during automated processes
    /// or testing where log output would interfere with results.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    /// Check if logging is currently enabled.
    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    pub fn set_debug_enabled(enabled: bool) {
        DEBUG_ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn is_debug_enabled() -> bool {
        DEBUG_ENABLED.load(Ordering::SeqCst)
    }

    /// Install the simulated clock used for `[HH:MM:SS]` prefixes.
    ///
    /// Only the first call takes effect.
    pub fn set_simulation_clock(source: Arc<dyn TimeSource>, tz: Tz) {
        let _ = SIMULATION_CLOCK.set((source, tz));
    }

    /// Start file logging to the specified path.
    pub fn start_file_logging(file_path: String) -> anyhow::Result<LoggerGuard> {
        let (tx, rx) = channel();

        LOG_CHANNEL
            .set(Mutex::new(tx.clone()))
            .map_err(|_| anyhow::anyhow!("Logger channel already initialized"))?;

        let handle = std::thread::spawn(move || {
            let mut file = std::fs::File::create(&file_path)?;

            loop {
                match rx.recv() {
                    Ok(LogMessage::Formatted(text)) => {
                        file.write_all(text.as_bytes())?;
                    }
                    Ok(LogMessage::Shutdown) | Err(_) => {
                        file.flush()?;
                        break;
                    }
                }
            }

            Ok::<(), anyhow::Error>(())
        });

        Ok(LoggerGuard {
            tx,
            handle: Some(handle),
        })
    }

    /// Timestamp prefix for simulation mode, `[HH:MM:SS] ` in the watched
    /// timezone. Empty when running on the real clock.
    pub fn timestamp_prefix() -> String {
        match SIMULATION_CLOCK.get() {
            Some((source, tz)) if source.is_simulated() => {
                format!("[{}] ", source.now().with_timezone(tz).format("%H:%M:%S"))
            }
            _ => String::new(),
        }
    }
}

/// Guard for file logging that ensures clean shutdown.
pub struct LoggerGuard {
    tx: Sender<LogMessage>,
    handle: Option<std::thread::JoinHandle<anyhow::Result<()>>>,
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        let _ = self.tx.send(LogMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

// Strip ANSI color codes (ESC [ ... m) for clean file output
fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == 'm' {
                    break;
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}

/// Render one line in the given shape, without routing it anywhere.
pub fn format_line(line: Line, prefix: &str, message: &str) -> String {
    match line {
        Line::BlockStart => format!("{prefix}┃\n{prefix}┣ {message}\n"),
        Line::Decorated => format!("{prefix}┣ {message}\n"),
        Line::Indented => format!("{prefix}┃   {message}\n"),
        Line::Info => format!("{prefix}┣[\x1b[32mINFO\x1b[0m] {message}\n"),
        Line::Warning => format!("{prefix}┣[\x1b[33mWARNING\x1b[0m] {message}\n"),
        Line::Error => format!("{prefix}┣[\x1b[31mERROR\x1b[0m] {message}\n"),
        Line::ErrorExit => format!("{prefix}┃\n{prefix}┗[\x1b[31mERROR\x1b[0m] {message}\n"),
        Line::Debug => format!("{prefix}┣[\x1b[32mDEBUG\x1b[0m] {message}\n"),
        Line::Critical => format!("{prefix}┣[\x1b[31mCRITICAL\x1b[0m] {message}\n"),
    }
}

/// Format and route one log line (needed by macros).
pub fn emit(line: Line, args: std::fmt::Arguments<'_>) {
    if !Log::is_enabled() || (line == Line::Debug && !Log::is_debug_enabled()) {
        return;
    }
    let prefix = Log::timestamp_prefix();
    write_output(&format_line(line, &prefix, &args.to_string()));
}

/// Route raw, already formatted text (needed by macros).
pub fn write_output(text: &str) {
    if let Some(tx) = LOG_CHANNEL.get() {
        let clean_text = strip_ansi_codes(text);
        if let Ok(tx) = tx.lock() {
            let _ = tx.send(LogMessage::Formatted(clean_text));
        }
    } else {
        print!("{text}");
        let _ = std::io::stdout().flush();
    }
}

// # Logging Macros

/// Log a block start message, initiating a new conceptual block of information.
#[macro_export]
macro_rules! log_block_start {
    ($($arg:tt)*) => {
        $crate::logger::emit($crate::logger::Line::BlockStart, format_args!($($arg)*))
    };
}

/// Log a decorated message, typically as part of an existing block.
#[macro_export]
macro_rules! log_decorated {
    ($($arg:tt)*) => {
        $crate::logger::emit($crate::logger::Line::Decorated, format_args!($($arg)*))
    };
}

/// Log an indented message for sub-items or details within a block.
#[macro_export]
macro_rules! log_indented {
    ($($arg:tt)*) => {
        $crate::logger::emit($crate::logger::Line::Indented, format_args!($($arg)*))
    };
}

/// Log a visual pipe separator for vertical spacing.
#[macro_export]
macro_rules! log_pipe {
    () => {{
        if $crate::logger::Log::is_enabled() {
            let prefix = $crate::logger::Log::timestamp_prefix();
            $crate::logger::write_output(&format!("{prefix}┃\n"));
        }
    }};
}

/// Log the application version header.
#[macro_export]
macro_rules! log_version {
    () => {{
        if $crate::logger::Log::is_enabled() {
            let prefix = $crate::logger::Log::timestamp_prefix();
            let version = env!("CARGO_PKG_VERSION");
            $crate::logger::write_output(&format!("{prefix}┏ solarwatch v{version} ━━╸\n"));
        }
    }};
}

/// Log the final termination marker.
#[macro_export]
macro_rules! log_end {
    () => {{
        if $crate::logger::Log::is_enabled() {
            let prefix = $crate::logger::Log::timestamp_prefix();
            $crate::logger::write_output(&format!("{prefix}╹\n"));
        }
    }};
}

/// Log an informational message with pipe prefix and green-colored text.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logger::emit($crate::logger::Line::Info, format_args!($($arg)*))
    };
}

/// Log a warning message with pipe prefix and yellow-colored text.
#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)*) => {
        $crate::logger::emit($crate::logger::Line::Warning, format_args!($($arg)*))
    };
}

/// Log an error message with pipe prefix and red-colored text.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::logger::emit($crate::logger::Line::Error, format_args!($($arg)*))
    };
}

/// Log an error that ends the current flow, closing the block with `┗`.
#[macro_export]
macro_rules! log_error_exit {
    ($($arg:tt)*) => {
        $crate::logger::emit($crate::logger::Line::ErrorExit, format_args!($($arg)*))
    };
}

/// Log a debug message; only printed when debug output is enabled.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::logger::emit($crate::logger::Line::Debug, format_args!($($arg)*))
    };
}

/// Log a critical message with pipe prefix and red-colored text.
#[macro_export]
macro_rules! log_critical {
    ($($arg:tt)*) => {
        $crate::logger::emit($crate::logger::Line::Critical, format_args!($($arg)*))
    };
}
