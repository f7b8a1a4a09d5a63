//! Integration tests for the cost engine over a full week.

mod common;

use v2g_planner::PipelineError;
use v2g_planner::io::export::write_csv;
use v2g_planner::optimize::{CostEngine, Decision, PriceParameters, WeeklyPlan};

const EPS: f64 = 1e-9;

fn engine(diesel: f64, v2g: f64) -> CostEngine {
    CostEngine::new(PriceParameters::new(diesel, v2g).expect("valid prices"))
}

fn reference_plan() -> WeeklyPlan {
    let [load, solar, v2g] = common::reference_week();
    engine(2.0, 1.0)
        .plan(&load, &solar, &v2g)
        .expect("complete week")
}

#[test]
fn reference_week_first_two_days() {
    let plan = reference_plan();
    assert_eq!(plan.days.len(), 7);

    let day1 = &plan.days[0];
    assert_eq!(day1.date, common::week_start());
    assert!((day1.net_deficit - 70.0).abs() < EPS);
    assert!((day1.total_cost - 90.0).abs() < EPS);
    assert_eq!(day1.decision, Decision::UseV2g);

    let day2 = &plan.days[1];
    assert!((day2.total_cost - 140.0).abs() < EPS);
    assert_eq!(day2.decision, Decision::UseDiesel);
}

#[test]
fn reference_week_cost_properties_hold_every_day() {
    let plan = reference_plan();
    for d in &plan.days {
        if d.v2g_available_forecast >= d.net_deficit && d.net_deficit > 0.0 {
            assert_eq!(d.decision, Decision::UseV2g);
            assert!((d.total_cost - d.net_deficit * 1.0).abs() < EPS);
        }
        if d.v2g_available_forecast == 0.0 && d.net_deficit > 0.0 {
            assert_eq!(d.decision, Decision::UseDiesel);
            assert!((d.total_cost - d.net_deficit * 2.0).abs() < EPS);
        }
        assert!((d.total_cost - (d.v2g_cost + d.diesel_cost)).abs() < EPS);
    }
}

#[test]
fn reference_week_summary() {
    let plan = reference_plan();
    let s = &plan.summary;
    assert!((s.diesel_only_cost - 980.0).abs() < EPS);
    assert!((s.total_cost - 760.0).abs() < EPS);
    assert!((s.savings - 220.0).abs() < EPS);
    assert_eq!(s.v2g_days, 5);
    assert_eq!(s.diesel_days, 2);
    assert_eq!(s.no_deficit_days, 0);
}

#[test]
fn surplus_days_cost_nothing() {
    let [load, solar, v2g] = common::forecasts(
        &[10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0],
        &[70.0; 7],
        &[5.0; 7],
    );
    let plan = engine(2.5, 0.2).plan(&load, &solar, &v2g).expect("complete week");
    assert!(plan.days.iter().all(|d| d.decision == Decision::NoDeficit));
    assert_eq!(plan.summary.total_cost, 0.0);
    assert_eq!(plan.summary.diesel_only_cost, 0.0);
    assert_eq!(plan.summary.savings_pct, 0.0);
}

#[test]
fn identical_inputs_give_identical_records_and_csv() {
    let a = reference_plan();
    let b = reference_plan();
    assert_eq!(a.days, b.days);

    let mut csv_a = Vec::new();
    let mut csv_b = Vec::new();
    write_csv(&a.days, &mut csv_a).expect("write first");
    write_csv(&b.days, &mut csv_b).expect("write second");
    assert_eq!(csv_a, csv_b);
}

#[test]
fn missing_day_rejects_whole_week() {
    let [load, solar, _] = common::reference_week();
    let [_, _, short_v2g] = common::forecasts(&[], &[], &[1.0; 5]);
    let err = engine(2.0, 1.0).plan(&load, &solar, &short_v2g).unwrap_err();
    assert!(matches!(err, PipelineError::IncompleteForecast { .. }));
}
