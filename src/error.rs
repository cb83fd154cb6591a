//! Error taxonomy for the solar event core.
//!
//! Only [`SolarError::Configuration`] ever reaches the caller of a
//! configuration entry point. Calculation and listener failures are produced
//! inside a tick and are reported through the logger instead of propagated.

use chrono::NaiveDate;
use thiserror::Error;

use crate::events::SolarEventKind;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolarError {
    /// Invalid location, timezone or period supplied at activation or update.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// The sun calculator could not produce instants for a date.
    #[error("Sunrise/sunset calculation failed for {date}: {reason}")]
    Calculation { date: NaiveDate, reason: String },

    /// A listener returned an error or panicked while handling an event.
    #[error("Listener '{listener}' failed handling {kind}: {reason}")]
    Listener {
        listener: String,
        kind: SolarEventKind,
        reason: String,
    },
}

impl SolarError {
    pub fn configuration(message: impl Into<String>) -> Self {
        SolarError::Configuration(message.into())
    }

    pub fn calculation(date: NaiveDate, reason: impl Into<String>) -> Self {
        SolarError::Calculation {
            date,
            reason: reason.into(),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, SolarError::Configuration(_))
    }
}

pub type Result<T> = std::result::Result<T, SolarError>;
