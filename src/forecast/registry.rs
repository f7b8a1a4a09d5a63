//! Process-scoped model state.
//!
//! Models are loaded at most once per registry, either eagerly through
//! [`ModelRegistry::preload`] or on the first call to
//! [`ModelRegistry::predictor`].

use std::path::PathBuf;

use tracing::info;

use super::model::{ModelArtifact, Persistence, SequenceModel};
use super::predictor::ForecastPredictor;
use super::window::Scaling;
use crate::config::PlannerConfig;
use crate::error::PipelineError;
use crate::series::SeriesKind;

/// Where a predictor's model comes from.
#[derive(Debug, Clone, PartialEq)]
enum ModelSource {
    /// JSON artifact on disk.
    Artifact(PathBuf),
    /// Day-repeating persistence model sized to the configured lookback.
    Persistence { lookback: usize, steps_per_day: usize },
}

impl ModelSource {
    fn load(&self, kind: SeriesKind) -> Result<Box<dyn SequenceModel>, PipelineError> {
        match self {
            ModelSource::Artifact(path) => ModelArtifact::load(kind, path),
            ModelSource::Persistence {
                lookback,
                steps_per_day,
            } => Ok(Box::new(Persistence::new(
                kind,
                *lookback,
                (*steps_per_day).min(*lookback),
                *steps_per_day,
            ))),
        }
    }
}

/// Lazily populated set of the three forecast predictors.
#[derive(Debug)]
pub struct ModelRegistry {
    sources: [(ModelSource, Scaling); 3],
    predictors: [Option<ForecastPredictor>; 3],
}

impl ModelRegistry {
    /// Builds an empty registry from the `[models]` and `[series.*]` sections.
    ///
    /// Nothing is read from disk until a predictor is requested.
    pub fn from_config(config: &PlannerConfig) -> Self {
        let source = |kind: SeriesKind| {
            let series = config.series.get(kind);
            let model = match config.models.get(kind) {
                Some(path) => ModelSource::Artifact(path.to_path_buf()),
                None => ModelSource::Persistence {
                    lookback: series.lookback,
                    steps_per_day: config.forecast.steps_per_day,
                },
            };
            (model, series.scaling)
        };
        Self {
            sources: SeriesKind::ALL.map(source),
            predictors: [None, None, None],
        }
    }

    /// Loads every model now so the first run pays no loading cost.
    ///
    /// # Errors
    ///
    /// Returns the first [`PipelineError::ModelUnavailable`] encountered.
    pub fn preload(&mut self) -> Result<(), PipelineError> {
        for kind in SeriesKind::ALL {
            self.predictor(kind)?;
        }
        Ok(())
    }

    /// Returns the predictor for `kind`, loading its model on first use.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ModelUnavailable`] when the artifact cannot
    /// be loaded. A failed load is retried on the next call.
    pub fn predictor(&mut self, kind: SeriesKind) -> Result<&ForecastPredictor, PipelineError> {
        let slot = kind.index();
        let predictor = match self.predictors[slot].take() {
            Some(predictor) => predictor,
            None => {
                let (source, scaling) = &self.sources[slot];
                let model = source.load(kind)?;
                info!(
                    series = %kind,
                    input_len = model.input_len(),
                    horizon = model.horizon(),
                    "forecast model ready"
                );
                ForecastPredictor::new(kind, model, *scaling)
            }
        };
        Ok(&*self.predictors[slot].insert(predictor))
    }

    /// Whether the model for `kind` has been loaded.
    pub fn is_loaded(&self, kind: SeriesKind) -> bool {
        self.predictors[kind.index()].is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn predictors_load_on_first_use() {
        let mut registry = ModelRegistry::from_config(&PlannerConfig::demo());
        assert!(!registry.is_loaded(SeriesKind::Load));

        let input_len = registry
            .predictor(SeriesKind::Load)
            .map(ForecastPredictor::input_len)
            .expect("persistence model");
        assert_eq!(input_len, 24);
        assert!(registry.is_loaded(SeriesKind::Load));
        assert!(!registry.is_loaded(SeriesKind::Solar));
    }

    #[test]
    fn preload_loads_everything() {
        let mut registry = ModelRegistry::from_config(&PlannerConfig::demo());
        registry.preload().expect("persistence models always load");
        assert!(SeriesKind::ALL.iter().all(|&k| registry.is_loaded(k)));
    }

    #[test]
    fn missing_artifact_fails_and_stays_unloaded() {
        let mut cfg = PlannerConfig::demo();
        cfg.models.solar = Some(Path::new("/nonexistent/solar.json").to_path_buf());
        let mut registry = ModelRegistry::from_config(&cfg);

        let err = registry.preload().unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ModelUnavailable {
                series: SeriesKind::Solar,
                ..
            }
        ));
        assert!(registry.is_loaded(SeriesKind::Load));
        assert!(!registry.is_loaded(SeriesKind::Solar));
    }

    #[test]
    fn predictor_keeps_configured_scaling() {
        let mut cfg = PlannerConfig::demo();
        cfg.series.v2g.scaling = Scaling::MinMax {
            min: 0.0,
            max: 10.0,
        };
        let registry = ModelRegistry::from_config(&cfg);
        assert_eq!(registry.sources[SeriesKind::V2g.index()].1, cfg.series.v2g.scaling);
    }
}
