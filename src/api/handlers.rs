//! Report endpoint handlers.
//!
//! Each handler parses the reporting period, invokes the engine, and wraps
//! the result in the response envelope. Percent-valued fields are rounded to
//! 2 decimals here — the engine keeps full precision internally.

use axum::extract::{Query, State};
use axum::response::Response;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::error;

use super::envelope::{ApiErrorResponse, ApiResponse};
use super::AppState;
use crate::error::EngineError;

/// `?month=&year=` query pair shared by all report endpoints.
#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    pub month: u32,
    pub year: i32,
}

fn error_response(err: &EngineError) -> Response {
    match err {
        EngineError::InvalidPeriod(_) => ApiErrorResponse::bad_request(err.to_string()),
        EngineError::DependencyTimeout(_) => ApiErrorResponse::gateway_timeout(err.to_string()),
        EngineError::DependencyUnavailable(_) | EngineError::Cancelled => {
            ApiErrorResponse::service_unavailable(err.to_string())
        }
    }
}

/// GET /api/health
pub async fn health() -> Response {
    ApiResponse::ok(serde_json::json!({ "status": "ok" }))
}

/// GET /api/reports/reliability
pub async fn reliability(
    State(state): State<AppState>,
    Query(period): Query<PeriodQuery>,
) -> Response {
    let cancel = CancellationToken::new();
    match state
        .engine
        .reliability_report(period.month, period.year, &cancel)
        .await
    {
        Ok(report) => ApiResponse::for_period(report.rounded(), period.month, period.year),
        Err(err) => {
            error!(%err, month = period.month, year = period.year, "reliability report failed");
            error_response(&err)
        }
    }
}

/// GET /api/reports/failure-breakdown
pub async fn failure_breakdown(
    State(state): State<AppState>,
    Query(period): Query<PeriodQuery>,
) -> Response {
    let cancel = CancellationToken::new();
    match state
        .engine
        .failure_breakdown(period.month, period.year, &cancel)
        .await
    {
        Ok(report) => ApiResponse::for_period(report.rounded(), period.month, period.year),
        Err(err) => {
            error!(%err, month = period.month, year = period.year, "failure breakdown failed");
            error_response(&err)
        }
    }
}

/// GET /api/reports/component-hours
pub async fn component_hours(
    State(state): State<AppState>,
    Query(period): Query<PeriodQuery>,
) -> Response {
    let cancel = CancellationToken::new();
    match state
        .engine
        .component_hours(period.month, period.year, &cancel)
        .await
    {
        Ok(report) => ApiResponse::for_period(report, period.month, period.year),
        Err(err) => {
            error!(%err, month = period.month, year = period.year, "component hours failed");
            error_response(&err)
        }
    }
}

/// GET /api/reports/component-swaps
pub async fn component_swaps(
    State(state): State<AppState>,
    Query(period): Query<PeriodQuery>,
) -> Response {
    let cancel = CancellationToken::new();
    match state
        .engine
        .component_swaps(period.month, period.year, &cancel)
        .await
    {
        Ok(report) => ApiResponse::for_period(report, period.month, period.year),
        Err(err) => {
            error!(%err, month = period.month, year = period.year, "component swaps failed");
            error_response(&err)
        }
    }
}
