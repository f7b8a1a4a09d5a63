//! Weekly aggregates derived from the day records.

use std::fmt;

use serde::Serialize;

use super::types::{DayRecord, Decision, PriceParameters};

/// Savings share (percent) above which V2G is called substantial.
const SUBSTANTIAL_SAVINGS_PCT: f64 = 15.0;
/// Savings share (percent) above which V2G is called moderate.
const MODERATE_SAVINGS_PCT: f64 = 5.0;

/// Qualitative verdict on the week's V2G savings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Substantial,
    Moderate,
    Minimal,
}

impl Recommendation {
    pub fn from_savings_pct(savings_pct: f64) -> Self {
        if savings_pct > SUBSTANTIAL_SAVINGS_PCT {
            Recommendation::Substantial
        } else if savings_pct > MODERATE_SAVINGS_PCT {
            Recommendation::Moderate
        } else {
            Recommendation::Minimal
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Recommendation::Substantial => {
                "substantial savings: prioritize V2G integration"
            }
            Recommendation::Moderate => "moderate savings: V2G is worth integrating",
            Recommendation::Minimal => "minimal savings: review V2G pricing or availability",
        })
    }
}

/// Aggregate costs and energies of a planned week.
///
/// Computed post-hoc from the day records so reported totals always agree
/// with the per-day rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklySummary {
    /// Sum of daily `total_cost`.
    pub total_cost: f64,
    /// Cost had diesel covered every deficit: `sum(net_deficit) * diesel_price`.
    pub diesel_only_cost: f64,
    /// `diesel_only_cost - total_cost`.
    pub savings: f64,
    /// Savings as a percentage of `diesel_only_cost` (0 when that is 0).
    pub savings_pct: f64,
    pub total_load: f64,
    pub total_net_deficit: f64,
    pub total_v2g_energy: f64,
    pub total_diesel_energy: f64,
    /// Diesel energy avoided compared with the diesel-only week.
    pub diesel_reduction: f64,
    pub v2g_days: usize,
    pub diesel_days: usize,
    pub no_deficit_days: usize,
    pub recommendation: Recommendation,
}

impl WeeklySummary {
    /// Aggregates `days` priced with `prices`.
    pub fn from_days(days: &[DayRecord], prices: &PriceParameters) -> Self {
        let mut total_cost = 0.0;
        let mut total_load = 0.0;
        let mut total_net_deficit = 0.0;
        let mut total_v2g_energy = 0.0;
        let mut total_diesel_energy = 0.0;
        let mut v2g_days = 0;
        let mut diesel_days = 0;
        let mut no_deficit_days = 0;

        for d in days {
            total_cost += d.total_cost;
            total_load += d.load_forecast;
            total_net_deficit += d.net_deficit;
            total_v2g_energy += d.v2g_energy;
            total_diesel_energy += d.diesel_energy;
            match d.decision {
                Decision::UseV2g => v2g_days += 1,
                Decision::UseDiesel => diesel_days += 1,
                Decision::NoDeficit => no_deficit_days += 1,
            }
        }

        let diesel_only_cost = total_net_deficit * prices.diesel_price_per_kwh();
        let savings = diesel_only_cost - total_cost;
        let savings_pct = if diesel_only_cost > 0.0 {
            100.0 * savings / diesel_only_cost
        } else {
            0.0
        };

        Self {
            total_cost,
            diesel_only_cost,
            savings,
            savings_pct,
            total_load,
            total_net_deficit,
            total_v2g_energy,
            total_diesel_energy,
            diesel_reduction: total_net_deficit - total_diesel_energy,
            v2g_days,
            diesel_days,
            no_deficit_days,
            recommendation: Recommendation::from_savings_pct(savings_pct),
        }
    }
}

impl fmt::Display for WeeklySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Weekly Summary ---")?;
        writeln!(f, "Total cost (with V2G):  {:.2}", self.total_cost)?;
        writeln!(f, "Diesel-only cost:       {:.2}", self.diesel_only_cost)?;
        writeln!(
            f,
            "Savings:                {:.2} ({:.1}%)",
            self.savings, self.savings_pct
        )?;
        writeln!(f, "Total load:             {:.2} kWh", self.total_load)?;
        writeln!(
            f,
            "Energy from V2G:        {:.2} kWh",
            self.total_v2g_energy
        )?;
        writeln!(
            f,
            "Energy from diesel:     {:.2} kWh (-{:.2} kWh vs diesel only)",
            self.total_diesel_energy, self.diesel_reduction
        )?;
        writeln!(
            f,
            "Days:                   {} V2G, {} diesel, {} no deficit",
            self.v2g_days, self.diesel_days, self.no_deficit_days
        )?;
        write!(f, "Recommendation:         {}", self.recommendation)
    }
}
