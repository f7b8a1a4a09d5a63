//! Raw historical series: load, solar production, and EV power available for V2G.

pub mod loader;
/// Seeded synthetic series used when no input file is configured.
pub mod synthetic;

use std::fmt;
use std::path::PathBuf;

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use loader::load_series;

/// The three series the planner forecasts.
///
/// Doubles as the variant tag that selects a forecasting model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    /// Residential/grid load demand.
    Load,
    /// Solar production.
    Solar,
    /// Aggregate EV battery power available for vehicle-to-grid discharge.
    V2g,
}

impl SeriesKind {
    /// All kinds in pipeline order.
    pub const ALL: [SeriesKind; 3] = [SeriesKind::Load, SeriesKind::Solar, SeriesKind::V2g];

    /// Stable lowercase name, used in config paths and log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            SeriesKind::Load => "load",
            SeriesKind::Solar => "solar",
            SeriesKind::V2g => "v2g",
        }
    }

    /// Position of this kind in [`SeriesKind::ALL`].
    pub fn index(self) -> usize {
        match self {
            SeriesKind::Load => 0,
            SeriesKind::Solar => 1,
            SeriesKind::V2g => 2,
        }
    }
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while reading or validating a raw series.
#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("cannot read `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid CSV in `{}`: {source}", path.display())]
    Csv { path: PathBuf, source: csv::Error },

    #[error("invalid workbook `{}`: {message}", path.display())]
    Xlsx { path: PathBuf, message: String },

    #[error("unsupported file extension for `{}` (expected .csv or .xlsx)", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("column `{column}` not found in `{}`", path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error("row {row}: {message}")]
    Parse { row: usize, message: String },

    #[error("{series} series has no observations")]
    Empty { series: SeriesKind },

    #[error("{series} series is not strictly increasing in time at observation {index}")]
    Unordered { series: SeriesKind, index: usize },

    #[error("{series} series has a non-finite value at observation {index}")]
    NonFinite { series: SeriesKind, index: usize },
}

/// One observed interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observation {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

impl Observation {
    pub fn new(timestamp: NaiveDateTime, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Ordered observations of one series with unique, strictly increasing timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    kind: SeriesKind,
    observations: Vec<Observation>,
}

impl TimeSeries {
    /// Builds a series after checking ordering and finiteness.
    ///
    /// # Errors
    ///
    /// Returns [`SeriesError::Empty`] for no observations,
    /// [`SeriesError::NonFinite`] for NaN/infinite values, and
    /// [`SeriesError::Unordered`] when a timestamp does not strictly
    /// increase over its predecessor.
    pub fn new(kind: SeriesKind, observations: Vec<Observation>) -> Result<Self, SeriesError> {
        if observations.is_empty() {
            return Err(SeriesError::Empty { series: kind });
        }
        for (index, obs) in observations.iter().enumerate() {
            if !obs.value.is_finite() {
                return Err(SeriesError::NonFinite {
                    series: kind,
                    index,
                });
            }
        }
        for (index, pair) in observations.windows(2).enumerate() {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(SeriesError::Unordered {
                    series: kind,
                    index: index + 1,
                });
            }
        }
        Ok(Self { kind, observations })
    }

    pub fn kind(&self) -> SeriesKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Observed values in time order.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.observations.iter().map(|o| o.value)
    }

    pub fn last(&self) -> Option<&Observation> {
        self.observations.last()
    }

    /// Sampling interval, taken from the last two observations.
    ///
    /// Returns `None` for single-observation series.
    pub fn interval(&self) -> Option<TimeDelta> {
        let n = self.observations.len();
        if n < 2 {
            return None;
        }
        Some(self.observations[n - 1].timestamp - self.observations[n - 2].timestamp)
    }
}

/// The three input series of one planning run.
#[derive(Debug, Clone)]
pub struct SeriesSet {
    pub load: TimeSeries,
    pub solar: TimeSeries,
    pub v2g: TimeSeries,
}

impl SeriesSet {
    pub fn get(&self, kind: SeriesKind) -> &TimeSeries {
        match kind {
            SeriesKind::Load => &self.load,
            SeriesKind::Solar => &self.solar,
            SeriesKind::V2g => &self.v2g,
        }
    }
}
