//! Weekly cost optimization: V2G versus diesel for each forecast deficit.

pub mod engine;
pub mod summary;
pub mod types;

pub use engine::{CostEngine, day_record};
pub use summary::{Recommendation, WeeklySummary};
pub use types::{DayRecord, Decision, PriceParameters, WeeklyPlan};
