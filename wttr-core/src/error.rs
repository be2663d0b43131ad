//! Failures a weather fetch can produce.

use thiserror::Error;

/// Why a fetch did not produce a [`WeatherRecord`](crate::WeatherRecord).
///
/// Sources never panic or bubble transport errors up as-is; everything is
/// folded into one of these variants so the worker and the coordinator can
/// keep going.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("city name must not be empty")]
    EmptyCity,

    /// Transport, DNS or HTTP status failure.
    #[error("network error: {0}")]
    Network(String),

    /// The body was not JSON, or lacked the sections a record needs.
    #[error("could not parse weather data: {0}")]
    Parse(String),
}

impl FetchError {
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse(_))
    }
}
