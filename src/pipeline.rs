//! End-to-end weekly run: series -> windows -> forecasts -> plan.

use tracing::{info, warn};

use crate::config::PlannerConfig;
use crate::error::PipelineError;
use crate::forecast::{Forecast, ModelRegistry, Window};
use crate::optimize::{CostEngine, PriceParameters, WeeklyPlan};
use crate::series::{SeriesKind, SeriesSet, TimeSeries, load_series, synthetic};

/// Weekly forecast-to-decision pipeline.
///
/// Owns the model registry, so models are loaded once and reused across
/// runs of the same pipeline. Each run is independent and deterministic.
#[derive(Debug)]
pub struct Pipeline {
    config: PlannerConfig,
    registry: ModelRegistry,
    engine: CostEngine,
}

impl Pipeline {
    /// Builds a pipeline from a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] with the first validation error,
    /// or [`PipelineError::InvalidPriceParameters`].
    pub fn new(config: PlannerConfig) -> Result<Self, PipelineError> {
        let prices = PriceParameters::try_from(&config.prices)?;
        if let Some(first) = config.validate().into_iter().next() {
            return Err(first.into());
        }
        Ok(Self {
            registry: ModelRegistry::from_config(&config),
            engine: CostEngine::new(prices),
            config,
        })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn registry_mut(&mut self) -> &mut ModelRegistry {
        &mut self.registry
    }

    /// Loads the configured series, generating synthetic history for any
    /// series without an input file.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Series`] when a file cannot be read or parsed.
    pub fn load_series(&self) -> Result<SeriesSet, PipelineError> {
        let load = |kind: SeriesKind| -> Result<TimeSeries, PipelineError> {
            let cfg = self.config.series.get(kind);
            let series = match &cfg.path {
                Some(path) => load_series(kind, path, cfg)?,
                None => {
                    warn!(series = %kind, "no input file configured, using synthetic history");
                    synthetic::generate(kind, &self.config.synthetic)?
                }
            };
            info!(series = %kind, observations = series.len(), "series loaded");
            Ok(series)
        };
        Ok(SeriesSet {
            load: load(SeriesKind::Load)?,
            solar: load(SeriesKind::Solar)?,
            v2g: load(SeriesKind::V2g)?,
        })
    }

    /// Produces the three daily forecasts for the week after each series ends.
    ///
    /// # Errors
    ///
    /// Propagates windowing, model-loading, and inference errors.
    pub fn forecast(&mut self, series: &SeriesSet) -> Result<[Forecast; 3], PipelineError> {
        let steps_per_day = self.config.forecast.steps_per_day;
        let mut forecast = |kind: SeriesKind| -> Result<Forecast, PipelineError> {
            let lookback = self.config.series.get(kind).lookback;
            let window = Window::last(series.get(kind), lookback)?;
            self.registry
                .predictor(kind)?
                .forecast_week(&window, steps_per_day)
        };
        Ok([
            forecast(SeriesKind::Load)?,
            forecast(SeriesKind::Solar)?,
            forecast(SeriesKind::V2g)?,
        ])
    }

    /// Forecasts and plans the week following `series`.
    ///
    /// # Errors
    ///
    /// Propagates any forecasting or planning error; no partial plan is returned.
    pub fn plan(&mut self, series: &SeriesSet) -> Result<WeeklyPlan, PipelineError> {
        let [load, solar, v2g] = self.forecast(series)?;
        self.engine.plan(&load, &solar, &v2g)
    }

    /// Loads the series, then forecasts and plans.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`Pipeline::load_series`] or [`Pipeline::plan`].
    pub fn run(&mut self) -> Result<WeeklyPlan, PipelineError> {
        let series = self.load_series()?;
        self.plan(&series)
    }
}
