//! # Solarwatch Library
//!
//! Sunrise and sunset notifications for a configured location.
//!
//! A [`SolarEventService`] polls at a fixed rate, works out whether the sun
//! rose or set since the previous check, and tells every registered
//! [`SolarEventListener`] exactly once per event.
//!
//! ## Architecture
//!
//! - **Core**: `core` holds the watcher state machine, the fixed-rate
//!   scheduler, the listener registry and the service facade
//! - **Geographic**: `geo` validates locations and computes daily sunrise and
//!   sunset instants with the `sunrise` crate
//! - **Configuration**: `config` for TOML-based settings with hot-reload
//! - **Infrastructure**: signal handling, logging, time sources and the
//!   built-in listeners used by the binary

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod logger;

pub mod args;
pub mod config;
pub mod constants;
pub mod core;
pub mod error;
pub mod events;
pub mod geo;
pub mod listeners;
pub mod signals;
pub mod time_source;

pub use crate::core::{
    ListenerHandle, ListenerRegistry, SolarEventListener, SolarEventService, TickOutcome,
    WatchSettings,
};
pub use error::SolarError;
pub use events::{SolarEvent, SolarEventKind};
pub use geo::{Location, SunCalculator, SunriseCalculator};
