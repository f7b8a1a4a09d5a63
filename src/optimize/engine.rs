//! Day-by-day sourcing decision: solar first, then V2G, then diesel.

use chrono::{NaiveDate, TimeDelta};
use tracing::info;

use super::summary::WeeklySummary;
use super::types::{DayRecord, Decision, PriceParameters, WeeklyPlan};
use crate::config::FORECAST_DAYS;
use crate::error::PipelineError;
use crate::forecast::Forecast;
use crate::series::SeriesKind;

/// Prices a week of forecasts.
#[derive(Debug, Clone, Copy)]
pub struct CostEngine {
    prices: PriceParameters,
}

impl CostEngine {
    pub fn new(prices: PriceParameters) -> Self {
        Self { prices }
    }

    pub fn prices(&self) -> &PriceParameters {
        &self.prices
    }

    /// Plans the week covered by three parallel daily forecasts.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::IncompleteForecast`] unless every forecast
    /// is of the expected kind, holds exactly 7 finite values, and starts on
    /// the same date as the load forecast. No partial plan is produced.
    pub fn plan(
        &self,
        load: &Forecast,
        solar: &Forecast,
        v2g: &Forecast,
    ) -> Result<WeeklyPlan, PipelineError> {
        let start = load.start();
        check_forecast(SeriesKind::Load, load, start)?;
        check_forecast(SeriesKind::Solar, solar, start)?;
        check_forecast(SeriesKind::V2g, v2g, start)?;

        let days: Vec<DayRecord> = (0..FORECAST_DAYS)
            .map(|d| {
                day_record(
                    start + TimeDelta::days(d as i64),
                    load.values()[d],
                    solar.values()[d],
                    v2g.values()[d],
                    &self.prices,
                )
            })
            .collect();
        let summary = WeeklySummary::from_days(&days, &self.prices);

        info!(
            %start,
            total_cost = summary.total_cost,
            diesel_only_cost = summary.diesel_only_cost,
            v2g_days = summary.v2g_days,
            diesel_days = summary.diesel_days,
            "weekly plan computed"
        );
        Ok(WeeklyPlan {
            prices: self.prices,
            days,
            summary,
        })
    }
}

/// Sources one day's deficit: V2G up to its availability, diesel for the rest.
///
/// Any V2G contribution labels the day [`Decision::UseV2g`], even when
/// diesel covers a remainder. Negative V2G availability counts as none.
pub fn day_record(
    date: NaiveDate,
    load: f64,
    solar: f64,
    v2g_available: f64,
    prices: &PriceParameters,
) -> DayRecord {
    let net_deficit = (load - solar).max(0.0);
    let (v2g_energy, diesel_energy, decision) = if net_deficit == 0.0 {
        (0.0, 0.0, Decision::NoDeficit)
    } else {
        let v2g_energy = net_deficit.min(v2g_available.max(0.0));
        let decision = if v2g_energy > 0.0 {
            Decision::UseV2g
        } else {
            Decision::UseDiesel
        };
        (v2g_energy, net_deficit - v2g_energy, decision)
    };
    let v2g_cost = v2g_energy * prices.v2g_price_per_kwh();
    let diesel_cost = diesel_energy * prices.diesel_price_per_kwh();

    DayRecord {
        date,
        load_forecast: load,
        solar_forecast: solar,
        v2g_available_forecast: v2g_available,
        net_deficit,
        v2g_energy,
        diesel_energy,
        diesel_cost,
        v2g_cost,
        decision,
        total_cost: v2g_cost + diesel_cost,
    }
}

fn check_forecast(
    expected: SeriesKind,
    forecast: &Forecast,
    start: NaiveDate,
) -> Result<(), PipelineError> {
    let incomplete = |reason: String| PipelineError::IncompleteForecast {
        series: expected,
        reason,
    };
    if forecast.kind() != expected {
        return Err(incomplete(format!(
            "expected a {expected} forecast, got {}",
            forecast.kind()
        )));
    }
    let n = forecast.values().len();
    if n != FORECAST_DAYS {
        return Err(incomplete(format!(
            "expected {FORECAST_DAYS} daily values, got {n}"
        )));
    }
    if let Some(day) = forecast.values().iter().position(|v| !v.is_finite()) {
        return Err(incomplete(format!("day {} is not a finite number", day + 1)));
    }
    if forecast.start() != start {
        return Err(incomplete(format!(
            "starts on {}, load forecast starts on {start}",
            forecast.start()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 6, 8).unwrap_or_default()
    }

    fn forecasts(load: [f64; 7], solar: [f64; 7], v2g: [f64; 7]) -> [Forecast; 3] {
        [
            Forecast::new(SeriesKind::Load, start(), load.to_vec()),
            Forecast::new(SeriesKind::Solar, start(), solar.to_vec()),
            Forecast::new(SeriesKind::V2g, start(), v2g.to_vec()),
        ]
    }

    fn engine(diesel: f64, v2g: f64) -> CostEngine {
        CostEngine::new(PriceParameters::new(diesel, v2g).expect("valid prices"))
    }

    #[test]
    fn surplus_day_has_no_deficit_and_no_cost() {
        let prices = PriceParameters::new(2.0, 1.0).expect("valid prices");
        for (load, solar) in [(30.0, 30.0), (10.0, 45.0)] {
            let day = day_record(start(), load, solar, 100.0, &prices);
            assert_eq!(day.decision, Decision::NoDeficit);
            assert_eq!(day.net_deficit, 0.0);
            assert_eq!(day.total_cost, 0.0);
        }
    }

    #[test]
    fn full_v2g_coverage_costs_v2g_price_only() {
        let prices = PriceParameters::new(2.0, 1.0).expect("valid prices");
        let exact = day_record(start(), 100.0, 30.0, 70.0, &prices);
        assert_eq!(exact.decision, Decision::UseV2g);
        assert!((exact.total_cost - 70.0).abs() < EPS);
        assert_eq!(exact.diesel_cost, 0.0);

        let ample = day_record(start(), 100.0, 30.0, 100.0, &prices);
        assert_eq!(ample.decision, Decision::UseV2g);
        assert!((ample.total_cost - 70.0).abs() < EPS);
    }

    #[test]
    fn zero_v2g_uses_diesel() {
        let prices = PriceParameters::new(2.0, 1.0).expect("valid prices");
        let day = day_record(start(), 100.0, 30.0, 0.0, &prices);
        assert_eq!(day.decision, Decision::UseDiesel);
        assert!((day.total_cost - 140.0).abs() < EPS);
    }

    #[test]
    fn negative_v2g_counts_as_none() {
        let prices = PriceParameters::new(2.0, 1.0).expect("valid prices");
        let day = day_record(start(), 100.0, 30.0, -5.0, &prices);
        assert_eq!(day.decision, Decision::UseDiesel);
        assert_eq!(day.v2g_energy, 0.0);
        assert!((day.total_cost - 140.0).abs() < EPS);
    }

    #[test]
    fn partial_coverage_is_labelled_v2g() {
        let [load, solar, v2g] = forecasts(
            [100.0; 7],
            [30.0; 7],
            [50.0, 0.0, 80.0, 20.0, 100.0, 0.0, 10.0],
        );
        let plan = engine(2.0, 1.0).plan(&load, &solar, &v2g).expect("complete week");

        let day1 = &plan.days[0];
        assert_eq!(day1.net_deficit, 70.0);
        assert_eq!(day1.v2g_energy, 50.0);
        assert_eq!(day1.diesel_energy, 20.0);
        assert!((day1.total_cost - 90.0).abs() < EPS);
        assert_eq!(day1.decision, Decision::UseV2g);

        let day2 = &plan.days[1];
        assert!((day2.total_cost - 140.0).abs() < EPS);
        assert_eq!(day2.decision, Decision::UseDiesel);
        assert_eq!(day2.date, start() + TimeDelta::days(1));
    }

    #[test]
    fn counterfactual_is_sum_of_deficits_at_diesel_price() {
        let [load, solar, v2g] = forecasts(
            [12.0, 40.0, 7.5, 100.0, 3.0, 55.5, 20.0],
            [30.0, 10.0, 7.5, 1.0, 0.0, 60.0, 19.0],
            [5.0, 100.0, 0.0, 0.0, 3.0, 2.0, 0.5],
        );
        let plan = engine(2.5, 0.2).plan(&load, &solar, &v2g).expect("complete week");
        let deficit: f64 = plan.days.iter().map(|d| d.net_deficit).sum();
        assert!((plan.summary.diesel_only_cost - deficit * 2.5).abs() < EPS);
        let total: f64 = plan.days.iter().map(|d| d.total_cost).sum();
        assert!((plan.summary.total_cost - total).abs() < EPS);
    }

    #[test]
    fn short_forecast_is_incomplete() {
        let load = Forecast::new(SeriesKind::Load, start(), vec![100.0; 6]);
        let solar = Forecast::new(SeriesKind::Solar, start(), vec![30.0; 7]);
        let v2g = Forecast::new(SeriesKind::V2g, start(), vec![10.0; 7]);
        let err = engine(2.0, 1.0).plan(&load, &solar, &v2g).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::IncompleteForecast {
                series: SeriesKind::Load,
                ..
            }
        ));
    }

    #[test]
    fn nan_or_misaligned_forecast_is_incomplete() {
        let [load, solar, _] = forecasts([100.0; 7], [30.0; 7], [0.0; 7]);
        let mut values = vec![10.0; 7];
        values[3] = f64::NAN;
        let nan = Forecast::new(SeriesKind::V2g, start(), values);
        assert!(engine(2.0, 1.0).plan(&load, &solar, &nan).is_err());

        let shifted = Forecast::new(SeriesKind::V2g, start() + TimeDelta::days(1), vec![1.0; 7]);
        assert!(engine(2.0, 1.0).plan(&load, &solar, &shifted).is_err());

        // Solar forecast passed where V2G belongs.
        assert!(engine(2.0, 1.0).plan(&load, &solar, &solar).is_err());
    }

    #[test]
    fn repeated_runs_are_identical() {
        let [load, solar, v2g] = forecasts(
            [100.0; 7],
            [30.0; 7],
            [50.0, 0.0, 80.0, 20.0, 100.0, 0.0, 10.0],
        );
        let engine = engine(2.0, 1.0);
        let a = engine.plan(&load, &solar, &v2g).expect("first run");
        let b = engine.plan(&load, &solar, &v2g).expect("second run");
        assert_eq!(a, b);
    }
}
