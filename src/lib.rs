//! Weekly forecast-to-decision planner for V2G versus diesel backup.
//!
//! Raw load, solar, and V2G-availability series are windowed, forecast
//! seven days ahead by pretrained sequence models, and priced day by day.

#[cfg(feature = "api")]
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod forecast;
pub mod io;
pub mod optimize;
pub mod pipeline;
pub mod report;
pub mod series;

pub use error::PipelineError;
