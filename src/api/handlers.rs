//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::AppState;
use super::types::{DayEntry, DaysQuery, ErrorResponse};

/// `GET /plan` -> 200 + full `WeeklyPlan` JSON
pub async fn get_plan(State(state): State<Arc<AppState>>) -> Response {
    Json(&state.plan).into_response()
}

/// `GET /summary` -> 200 + `WeeklySummary` JSON
pub async fn get_summary(State(state): State<Arc<AppState>>) -> Response {
    Json(&state.plan.summary).into_response()
}

/// Returns day records, optionally filtered by day range.
///
/// `GET /days` -> all seven days
/// `GET /days?from=2&to=4` -> days 2, 3, 4
/// `GET /days?from=5&to=2` -> 400 + `ErrorResponse`
pub async fn get_days(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DaysQuery>,
) -> Response {
    let from = query.from.unwrap_or(1);
    let to = query.to.unwrap_or(usize::MAX);

    if from > to {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("`from` ({from}) must be <= `to` ({to})"),
            }),
        )
            .into_response();
    }

    let days: Vec<DayEntry<'_>> = state
        .plan
        .days
        .iter()
        .enumerate()
        .map(|(i, record)| DayEntry { day: i + 1, record })
        .filter(|e| e.day >= from && e.day <= to)
        .collect();

    Json(days).into_response()
}
