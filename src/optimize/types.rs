//! Core types of the cost-optimization engine.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::summary::WeeklySummary;
use crate::config::PriceConfig;
use crate::error::PipelineError;

/// Energy prices per kWh, both strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceParameters {
    diesel_price_per_kwh: f64,
    v2g_price_per_kwh: f64,
}

impl PriceParameters {
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidPriceParameters`] unless both prices
    /// are finite and `> 0`.
    pub fn new(diesel_price_per_kwh: f64, v2g_price_per_kwh: f64) -> Result<Self, PipelineError> {
        for (name, price) in [
            ("diesel_price_per_kwh", diesel_price_per_kwh),
            ("v2g_price_per_kwh", v2g_price_per_kwh),
        ] {
            if !price.is_finite() || price <= 0.0 {
                return Err(PipelineError::InvalidPriceParameters(format!(
                    "{name} must be a finite number > 0, got {price}"
                )));
            }
        }
        Ok(Self {
            diesel_price_per_kwh,
            v2g_price_per_kwh,
        })
    }

    pub fn diesel_price_per_kwh(&self) -> f64 {
        self.diesel_price_per_kwh
    }

    pub fn v2g_price_per_kwh(&self) -> f64 {
        self.v2g_price_per_kwh
    }
}

impl TryFrom<&PriceConfig> for PriceParameters {
    type Error = PipelineError;

    fn try_from(cfg: &PriceConfig) -> Result<Self, Self::Error> {
        Self::new(cfg.diesel_price_per_kwh, cfg.v2g_price_per_kwh)
    }
}

/// Energy source recommended for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// V2G covers some or all of the deficit.
    UseV2g,
    /// No V2G capacity; diesel covers the whole deficit.
    UseDiesel,
    /// Solar meets the load.
    NoDeficit,
}

impl Decision {
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::UseV2g => "use_v2g",
            Decision::UseDiesel => "use_diesel",
            Decision::NoDeficit => "no_deficit",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Forecasts, sourcing decision, and costs for one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayRecord {
    pub date: NaiveDate,
    pub load_forecast: f64,
    pub solar_forecast: f64,
    pub v2g_available_forecast: f64,
    /// `max(0, load - solar)`.
    pub net_deficit: f64,
    /// Deficit energy covered by V2G.
    pub v2g_energy: f64,
    /// Deficit energy left for diesel.
    pub diesel_energy: f64,
    /// Cost of `diesel_energy`.
    pub diesel_cost: f64,
    /// Cost of `v2g_energy`.
    pub v2g_cost: f64,
    pub decision: Decision,
    pub total_cost: f64,
}

/// Complete result of one planning run: seven days plus their summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyPlan {
    pub prices: PriceParameters,
    pub days: Vec<DayRecord>,
    pub summary: WeeklySummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_prices() {
        assert!(matches!(
            PriceParameters::new(0.0, 1.0),
            Err(PipelineError::InvalidPriceParameters(_))
        ));
        assert!(PriceParameters::new(2.0, -0.1).is_err());
        assert!(PriceParameters::new(f64::NAN, 1.0).is_err());
        assert!(PriceParameters::new(2.0, 1.0).is_ok());
    }

    #[test]
    fn decision_serializes_snake_case() {
        let json = serde_json::to_string(&Decision::UseV2g).unwrap_or_default();
        assert_eq!(json, "\"use_v2g\"");
        assert_eq!(Decision::NoDeficit.to_string(), "no_deficit");
    }

    #[test]
    fn from_price_config() {
        let prices = PriceParameters::try_from(&PriceConfig::default()).expect("defaults valid");
        assert_eq!(prices.diesel_price_per_kwh(), 2.5);
        assert_eq!(prices.v2g_price_per_kwh(), 0.2);
    }
}
