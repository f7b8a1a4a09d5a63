use chrono::{NaiveDate, TimeDelta};
use serde::Serialize;
use tracing::debug;

use super::model::SequenceModel;
use super::window::{Scaling, Window};
use crate::config::FORECAST_DAYS;
use crate::error::PipelineError;
use crate::series::SeriesKind;

/// Daily totals for the week following a window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    kind: SeriesKind,
    start: NaiveDate,
    daily: Vec<f64>,
}

impl Forecast {
    /// Wraps precomputed daily values. Length and finiteness are checked
    /// by the cost engine, not here.
    pub fn new(kind: SeriesKind, start: NaiveDate, daily: Vec<f64>) -> Self {
        Self { kind, start, daily }
    }

    pub fn kind(&self) -> SeriesKind {
        self.kind
    }

    /// Calendar date of day 1.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn values(&self) -> &[f64] {
        &self.daily
    }
}

/// A sequence model bound to one series and the scaling it was trained with.
///
/// Load, solar, and V2G predictors share this type and differ only by
/// `kind`, model, and scaling.
#[derive(Debug)]
pub struct ForecastPredictor {
    kind: SeriesKind,
    model: Box<dyn SequenceModel>,
    scaling: Scaling,
}

impl ForecastPredictor {
    pub fn new(kind: SeriesKind, model: Box<dyn SequenceModel>, scaling: Scaling) -> Self {
        Self {
            kind,
            model,
            scaling,
        }
    }

    pub fn kind(&self) -> SeriesKind {
        self.kind
    }

    /// Lookback the wrapped model expects.
    pub fn input_len(&self) -> usize {
        self.model.input_len()
    }

    /// Runs the model once on `window`, returning `horizon` denormalized values.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ShapeMismatch`] when the window length differs
    /// from the model's input length.
    pub fn predict_window(&self, window: &Window) -> Result<Vec<f64>, PipelineError> {
        self.check_shape(window)?;
        let input = window.normalized(&self.scaling);
        let output = self.model.predict(&input)?;
        Ok(output
            .into_iter()
            .map(|y| self.scaling.denormalize(y))
            .collect())
    }

    /// Forecasts the 7 days after `window` and aggregates them to daily totals.
    ///
    /// The model is rolled forward autoregressively: each output is appended
    /// to the input and the oldest inputs are dropped until
    /// `7 * steps_per_day` steps exist. Steps are denormalized, clamped to
    /// be non-negative, and summed per block of `steps_per_day`. Day 1 is the
    /// date of the first forecast step.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ShapeMismatch`] for a window of the wrong
    /// length, [`PipelineError::ResolutionMismatch`] when the window's
    /// interval times `steps_per_day` is not one day, and
    /// [`PipelineError::IncompleteForecast`] when the model emits no output
    /// or a non-finite value.
    pub fn forecast_week(
        &self,
        window: &Window,
        steps_per_day: usize,
    ) -> Result<Forecast, PipelineError> {
        self.check_shape(window)?;
        if steps_per_day == 0 {
            return Err(self.incomplete("steps_per_day must be > 0".to_string()));
        }
        let interval = self.check_resolution(window, steps_per_day)?;

        let total = FORECAST_DAYS * steps_per_day;
        let input_len = self.model.input_len();
        let mut input = window.normalized(&self.scaling);
        let mut steps = Vec::with_capacity(total);

        while steps.len() < total {
            let output = self.model.predict(&input)?;
            if output.is_empty() {
                return Err(self.incomplete("model produced no output".to_string()));
            }
            let take = output.len().min(total - steps.len());
            for &y in &output[..take] {
                if !y.is_finite() {
                    return Err(self.incomplete(format!(
                        "model produced a non-finite value at step {}",
                        steps.len()
                    )));
                }
                steps.push(y);
            }
            input.extend_from_slice(&output[..take]);
            let excess = input.len().saturating_sub(input_len);
            input.drain(..excess);
        }

        let daily: Vec<f64> = steps
            .chunks(steps_per_day)
            .map(|day| {
                day.iter()
                    .map(|&y| self.scaling.denormalize(y).max(0.0))
                    .sum()
            })
            .collect();
        let start = (window.end() + interval).date();

        debug!(series = %self.kind, %start, ?daily, "weekly forecast");
        Ok(Forecast::new(self.kind, start, daily))
    }

    fn check_shape(&self, window: &Window) -> Result<(), PipelineError> {
        let expected = self.model.input_len();
        if window.len() != expected {
            return Err(PipelineError::ShapeMismatch {
                series: self.kind,
                expected,
                actual: window.len(),
            });
        }
        Ok(())
    }

    fn check_resolution(
        &self,
        window: &Window,
        steps_per_day: usize,
    ) -> Result<TimeDelta, PipelineError> {
        let day = i32::try_from(steps_per_day)
            .ok()
            .and_then(|n| window.interval()?.checked_mul(n));
        match window.interval() {
            Some(step) if day == Some(TimeDelta::days(1)) => Ok(step),
            interval => Err(PipelineError::ResolutionMismatch {
                series: self.kind,
                steps_per_day,
                interval,
            }),
        }
    }

    fn incomplete(&self, reason: String) -> PipelineError {
        PipelineError::IncompleteForecast {
            series: self.kind,
            reason,
        }
    }
}
