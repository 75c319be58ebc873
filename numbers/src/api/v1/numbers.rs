use crate::api::ErrorResponse;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use numbers_lib::handler::{NumbersHandler, NumbersReport, RequestError};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Clone)]
pub struct NumbersApi {
    handler: NumbersHandler,
}

impl NumbersApi {
    pub fn new(handler: NumbersHandler) -> Self {
        Self { handler }
    }

    pub fn router() -> Router<Self> {
        Router::new().route("/{number_type}", get(get_numbers))
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NumbersResponse {
    /// Window contents before this request's numbers were ingested
    pub window_prev_state: Vec<i64>,
    /// Window contents after ingestion
    pub window_curr_state: Vec<i64>,
    /// Numbers returned by the upstream, as received
    pub numbers: Vec<i64>,
    /// Mean of the current window rounded to two decimals, 0 when empty
    pub avg: f64,
}

impl From<NumbersReport> for NumbersResponse {
    fn from(report: NumbersReport) -> Self {
        Self {
            window_prev_state: report.window_prev_state,
            window_curr_state: report.window_curr_state,
            numbers: report.numbers,
            avg: report.avg,
        }
    }
}

#[utoipa::path(
    get,
    path = "/numbers/{number_type}",
    params(
        ("number_type" = String, Path, description = "p (primes), f (fibonacci), e (even) or r (random)")
    ),
    responses(
        (status = 200, description = "Window state and average after ingesting the fetched numbers", body = NumbersResponse),
        (status = 400, description = "Invalid number type", body = ErrorResponse),
        (status = 500, description = "Upstream failed or timed out", body = ErrorResponse)
    )
)]
pub async fn get_numbers(
    State(state): State<NumbersApi>,
    Path(number_type): Path<String>,
) -> impl IntoResponse {
    match state.handler.handle(&number_type).await {
        Ok(report) => Ok(Json(NumbersResponse::from(report))),
        Err(RequestError::InvalidNumberType(_)) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Invalid number type")),
        )),
        Err(RequestError::Upstream(_)) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("Failed to fetch numbers")),
        )),
    }
}
