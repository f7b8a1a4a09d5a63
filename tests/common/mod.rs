//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use v2g_planner::forecast::Forecast;
use v2g_planner::series::SeriesKind;

/// Day 1 of the fixture week.
pub fn week_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 6, 8).expect("valid date")
}

/// Three aligned daily forecasts starting on [`week_start`].
pub fn forecasts(load: &[f64], solar: &[f64], v2g: &[f64]) -> [Forecast; 3] {
    [
        Forecast::new(SeriesKind::Load, week_start(), load.to_vec()),
        Forecast::new(SeriesKind::Solar, week_start(), solar.to_vec()),
        Forecast::new(SeriesKind::V2g, week_start(), v2g.to_vec()),
    ]
}

/// Flat load of 100 and solar of 30 with uneven V2G availability.
pub fn reference_week() -> [Forecast; 3] {
    forecasts(
        &[100.0; 7],
        &[30.0; 7],
        &[50.0, 0.0, 80.0, 20.0, 100.0, 0.0, 10.0],
    )
}

/// Writes a two-column CSV with a constant value, time given by `time_of(row)`.
pub fn write_constant_csv(
    path: &Path,
    time_column: &str,
    value_column: &str,
    rows: usize,
    time_of: impl Fn(usize) -> String,
    value: f64,
) {
    let mut out = format!("{time_column},{value_column}\n");
    for i in 0..rows {
        out.push_str(&format!("{},{value}\n", time_of(i)));
    }
    fs::write(path, out).expect("write fixture csv");
}

/// Single-unit GRU whose output is always `output` (normalized).
pub fn constant_gru_json(input_len: usize, output: f64) -> String {
    format!(
        r#"{{
  "architecture": "gru",
  "input_len": {input_len},
  "forward": {{
    "kernel": [0.0, 0.0, 0.0],
    "recurrent_kernel": [[0.0, 0.0, 0.0]],
    "bias": [0.0, 0.0, 0.0]
  }},
  "head": {{ "weights": [[0.0]], "bias": [{output}] }}
}}"#
    )
}
