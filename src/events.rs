//! Solar event data delivered to listeners.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which horizon crossing an event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolarEventKind {
    Sunrise,
    Sunset,
}

impl SolarEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolarEventKind::Sunrise => "sunrise",
            SolarEventKind::Sunset => "sunset",
        }
    }
}

impl fmt::Display for SolarEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected sunrise or sunset.
///
/// Events are created by the watcher at the moment a transition is detected
/// and only live for the duration of one notification dispatch. The instant
/// is the calculated astronomical time, not the time of detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolarEvent {
    kind: SolarEventKind,
    instant: DateTime<Utc>,
}

impl SolarEvent {
    pub fn new(kind: SolarEventKind, instant: DateTime<Utc>) -> Self {
        Self { kind, instant }
    }

    pub fn sunrise(instant: DateTime<Utc>) -> Self {
        Self::new(SolarEventKind::Sunrise, instant)
    }

    pub fn sunset(instant: DateTime<Utc>) -> Self {
        Self::new(SolarEventKind::Sunset, instant)
    }

    pub fn kind(&self) -> SolarEventKind {
        self.kind
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }

    /// The event instant expressed in the watched location's timezone.
    pub fn local_instant(&self, tz: &Tz) -> DateTime<Tz> {
        self.instant.with_timezone(tz)
    }
}

impl fmt::Display for SolarEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.kind, self.instant.format("%Y-%m-%d %H:%M:%S UTC"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_event_serialization() {
        let instant = Utc.with_ymd_and_hms(2024, 6, 21, 3, 18, 0).unwrap();
        let event = SolarEvent::sunrise(instant);

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"kind\":\"sunrise\""));
        assert!(json.contains("2024-06-21T03:18:00Z"));

        let parsed: SolarEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_local_instant_uses_location_timezone() {
        let instant = Utc.with_ymd_and_hms(2024, 6, 21, 19, 2, 0).unwrap();
        let event = SolarEvent::sunset(instant);

        let local = event.local_instant(&chrono_tz::Europe::Amsterdam);
        assert_eq!(local.format("%H:%M").to_string(), "21:02");
        assert_eq!(event.kind(), SolarEventKind::Sunset);
    }
}
