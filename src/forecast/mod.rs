//! Seven-day-ahead forecasting: windowing, sequence models, and daily aggregation.

pub mod model;
pub mod predictor;
pub mod registry;
pub mod window;

pub use model::{ModelArtifact, SequenceModel};
pub use predictor::{Forecast, ForecastPredictor};
pub use registry::ModelRegistry;
pub use window::{Scaling, Window};
