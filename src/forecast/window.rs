use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::series::{SeriesKind, TimeSeries};

/// Scaling a model was trained with.
///
/// Bounds come from configuration and are never fitted on the window itself.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scaling {
    /// Values pass through unchanged.
    #[default]
    Identity,
    /// Maps `[min, max]` onto `[0, 1]`.
    MinMax { min: f64, max: f64 },
}

impl Scaling {
    pub fn normalize(&self, x: f64) -> f64 {
        match *self {
            Scaling::Identity => x,
            Scaling::MinMax { min, max } => (x - min) / (max - min),
        }
    }

    pub fn denormalize(&self, y: f64) -> f64 {
        match *self {
            Scaling::Identity => y,
            Scaling::MinMax { min, max } => y * (max - min) + min,
        }
    }
}

/// The last `lookback` observations of one series, evenly spaced.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    kind: SeriesKind,
    values: Vec<f64>,
    end: NaiveDateTime,
    interval: Option<TimeDelta>,
}

impl Window {
    /// Takes the trailing `lookback` observations of `series`.
    ///
    /// The sampling interval is the step between the last two observations
    /// of the series; every pair inside the window must be exactly that far
    /// apart. A single-observation series has no interval.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InsufficientHistory`] when the series is
    /// shorter than `lookback` or `lookback` is zero, and
    /// [`PipelineError::WindowGap`] when the window is not evenly spaced.
    pub fn last(series: &TimeSeries, lookback: usize) -> Result<Self, PipelineError> {
        let kind = series.kind();
        let available = series.len();
        let insufficient = PipelineError::InsufficientHistory {
            series: kind,
            required: lookback.max(1),
            available,
        };
        if lookback == 0 || available < lookback {
            return Err(insufficient);
        }

        let slice = &series.observations()[available - lookback..];
        let Some(last) = slice.last() else {
            return Err(insufficient);
        };
        let interval = series.interval();
        if let Some(step) = interval {
            for pair in slice.windows(2) {
                if pair[1].timestamp - pair[0].timestamp != step {
                    return Err(PipelineError::WindowGap {
                        series: kind,
                        at: pair[1].timestamp,
                    });
                }
            }
        }

        Ok(Self {
            kind,
            values: slice.iter().map(|o| o.value).collect(),
            end: last.timestamp,
            interval,
        })
    }

    pub fn kind(&self) -> SeriesKind {
        self.kind
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Timestamp of the last observation.
    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Sampling interval, unknown when the series has one observation.
    pub fn interval(&self) -> Option<TimeDelta> {
        self.interval
    }

    /// Window values mapped through `scaling`.
    pub fn normalized(&self, scaling: &Scaling) -> Vec<f64> {
        self.values.iter().map(|&x| scaling.normalize(x)).collect()
    }
}
