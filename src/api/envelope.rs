//! Response envelope for the report API.
//!
//! Every response carries a `meta` block with the server timestamp, the
//! contract version, and, for report payloads, the reporting period the data
//! was computed for. Success wraps the payload under `data`; failures carry a
//! machine-readable code under `error`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Serialize;

/// The (month, year) pair a report was computed for, echoed back to callers.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReportPeriod {
    pub month: u32,
    pub year: i32,
}

/// Metadata included in every response.
#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub timestamp: String,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<ReportPeriod>,
}

impl ResponseMeta {
    fn now(period: Option<ReportPeriod>) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            version: "1",
            period,
        }
    }
}

/// Successful response: `{ "data": T, "meta": { ... } }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

impl<T: Serialize> ApiResponse<T> {
    /// Success without a reporting period (health and similar).
    pub fn ok(data: T) -> Response {
        Self::respond(data, None)
    }

    /// Success for one computed reporting period.
    pub fn for_period(data: T, month: u32, year: i32) -> Response {
        Self::respond(data, Some(ReportPeriod { month, year }))
    }

    fn respond(data: T, period: Option<ReportPeriod>) -> Response {
        let body = Self {
            data,
            meta: ResponseMeta::now(period),
        };
        (StatusCode::OK, axum::Json(body)).into_response()
    }
}

/// Error detail inside [`ApiErrorResponse`].
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// Error response: `{ "error": { "code": "...", "message": "..." }, "meta": { ... } }`
#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub error: ErrorDetail,
    pub meta: ResponseMeta,
}

impl ApiErrorResponse {
    fn build(status: StatusCode, code: &str, msg: impl Into<String>) -> Response {
        let body = Self {
            error: ErrorDetail {
                code: code.to_string(),
                message: msg.into(),
            },
            meta: ResponseMeta::now(None),
        };
        (status, axum::Json(body)).into_response()
    }

    pub fn bad_request(msg: impl Into<String>) -> Response {
        Self::build(StatusCode::BAD_REQUEST, "BAD_REQUEST", msg)
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Response {
        Self::build(StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", msg)
    }

    pub fn gateway_timeout(msg: impl Into<String>) -> Response {
        Self::build(StatusCode::GATEWAY_TIMEOUT, "GATEWAY_TIMEOUT", msg)
    }
}
