//! Error taxonomy for a pipeline run.
//!
//! Every variant stems from missing or invalid input rather than a transient
//! condition, so none of them is retried. A failure anywhere invalidates the
//! whole weekly run.

use std::path::PathBuf;

use chrono::TimeDelta;
use thiserror::Error;

use crate::config::ConfigError;
use crate::series::{SeriesError, SeriesKind};

/// Errors reported to the caller of the weekly planning pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The series holds fewer observations than the model's lookback.
    #[error("insufficient history for {series}: need {required} observations, have {available}")]
    InsufficientHistory {
        series: SeriesKind,
        required: usize,
        available: usize,
    },

    /// Two consecutive observations inside a window are not one interval apart.
    #[error("gap in {series} window at {at}: observations must be evenly spaced")]
    WindowGap {
        series: SeriesKind,
        at: chrono::NaiveDateTime,
    },

    /// The model artifact is missing, unreadable, or internally inconsistent.
    #[error("model for {series} unavailable at `{}`: {reason}", path.display())]
    ModelUnavailable {
        series: SeriesKind,
        path: PathBuf,
        reason: String,
    },

    /// Window length disagrees with the model's expected input length.
    #[error("shape mismatch for {series}: model expects {expected} inputs, window has {actual}")]
    ShapeMismatch {
        series: SeriesKind,
        expected: usize,
        actual: usize,
    },

    /// The series' sampling interval does not split a day into
    /// `steps_per_day` forecast steps.
    #[error(
        "{series} resolution does not match {steps_per_day} steps per day: {}",
        describe_interval(.interval)
    )]
    ResolutionMismatch {
        series: SeriesKind,
        steps_per_day: usize,
        interval: Option<TimeDelta>,
    },

    /// One of the three daily forecasts is missing or malformed.
    #[error("incomplete forecast for {series}: {reason}")]
    IncompleteForecast { series: SeriesKind, reason: String },

    /// A price parameter is not a positive finite number.
    #[error("invalid price parameters: {0}")]
    InvalidPriceParameters(String),

    #[error(transparent)]
    Series(#[from] SeriesError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn describe_interval(interval: &Option<TimeDelta>) -> String {
    match interval {
        Some(step) => format!("observations are {}s apart", step.num_seconds()),
        None => "sampling interval unknown from a single observation".to_string(),
    }
}
