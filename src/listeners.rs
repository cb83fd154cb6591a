//! Built-in listeners used by the `solarwatch` binary.
//!
//! [`LogListener`] reports events through the logger in the watched
//! timezone. [`JsonLinesListener`] writes one JSON object per event so the
//! output can be piped into other tools.

use chrono_tz::Tz;
use serde::Serialize;
use std::io::Write;
use std::sync::Mutex;

use crate::core::SolarEventListener;
use crate::events::{SolarEvent, SolarEventKind};

/// Logs each event with its local time.
pub struct LogListener {
    timezone: Tz,
}

impl LogListener {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    fn report(&self, event: &SolarEvent) {
        let local = event.local_instant(&self.timezone);
        let label = match event.kind() {
            SolarEventKind::Sunrise => "Sunrise",
            SolarEventKind::Sunset => "Sunset",
        };
        log_block_start!("{label} at {}", local.format("%H:%M:%S %Z"));
    }
}

impl SolarEventListener for LogListener {
    fn on_sunrise(&self, event: &SolarEvent) -> anyhow::Result<()> {
        self.report(event);
        Ok(())
    }

    fn on_sunset(&self, event: &SolarEvent) -> anyhow::Result<()> {
        self.report(event);
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// One line of `--json` output.
#[derive(Debug, Serialize)]
struct EventRecord<'a> {
    kind: SolarEventKind,
    instant: String,
    local: String,
    timezone: &'a str,
}

/// Writes each event as a single JSON line.
pub struct JsonLinesListener<W: Write + Send> {
    timezone: Tz,
    out: Mutex<W>,
}

impl JsonLinesListener<std::io::Stdout> {
    pub fn stdout(timezone: Tz) -> Self {
        Self::new(timezone, std::io::stdout())
    }
}

impl<W: Write + Send> JsonLinesListener<W> {
    pub fn new(timezone: Tz, out: W) -> Self {
        Self {
            timezone,
            out: Mutex::new(out),
        }
    }

    /// Consume the listener and hand back its writer.
    pub fn into_inner(self) -> W {
        self.out
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self, event: &SolarEvent) -> anyhow::Result<()> {
        let record = EventRecord {
            kind: event.kind(),
            instant: event.instant().to_rfc3339(),
            local: event.local_instant(&self.timezone).to_rfc3339(),
            timezone: self.timezone.name(),
        };
        let line = serde_json::to_string(&record)?;

        let mut out = self
            .out
            .lock()
            .map_err(|_| anyhow::anyhow!("output writer poisoned"))?;
        writeln!(out, "{line}")?;
        out.flush()?;
        Ok(())
    }
}

impl<W: Write + Send> SolarEventListener for JsonLinesListener<W> {
    fn on_sunrise(&self, event: &SolarEvent) -> anyhow::Result<()> {
        self.write(event)
    }

    fn on_sunset(&self, event: &SolarEvent) -> anyhow::Result<()> {
        self.write(event)
    }

    fn name(&self) -> &str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_json_line_format() {
        let listener = JsonLinesListener::new(chrono_tz::Europe::Amsterdam, Vec::new());
        let event = SolarEvent::sunrise(Utc.with_ymd_and_hms(2024, 6, 21, 3, 18, 0).unwrap());

        listener.on_sunrise(&event).unwrap();
        let output = String::from_utf8(listener.into_inner()).unwrap();
        assert!(output.ends_with('\n'));

        let value: serde_json::Value = serde_json::from_str(output.trim()).unwrap();
        assert_eq!(value["kind"], "sunrise");
        assert_eq!(value["instant"], "2024-06-21T03:18:00+00:00");
        assert_eq!(value["local"], "2024-06-21T05:18:00+02:00");
        assert_eq!(value["timezone"], "Europe/Amsterdam");
    }

    #[test]
    fn test_json_lines_append() {
        let listener = JsonLinesListener::new(chrono_tz::UTC, Vec::new());
        let day = Utc.with_ymd_and_hms(2024, 1, 1, 7, 45, 0).unwrap();

        listener.on_sunrise(&SolarEvent::sunrise(day)).unwrap();
        listener
            .on_sunset(&SolarEvent::sunset(day + chrono::Duration::hours(8)))
            .unwrap();

        let output = String::from_utf8(listener.into_inner()).unwrap();
        let kinds: Vec<String> = output
            .lines()
            .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap()["kind"].to_string())
            .collect();
        assert_eq!(kinds, vec!["\"sunrise\"", "\"sunset\""]);
    }

    #[test]
    fn test_log_listener_never_fails() {
        let listener = LogListener::new(chrono_tz::UTC);
        let event = SolarEvent::sunset(Utc.with_ymd_and_hms(2024, 1, 1, 16, 0, 0).unwrap());
        assert!(listener.on_sunset(&event).is_ok());
        assert_eq!(listener.name(), "log");
    }
}
