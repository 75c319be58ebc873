use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use numbers_lib::metrics::{NumbersMetricsSnapshot, SharedMetrics};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Clone)]
pub struct HealthApi {
    metrics: SharedMetrics,
}

impl HealthApi {
    pub fn new(metrics: SharedMetrics) -> Self {
        Self { metrics }
    }

    pub fn router() -> Router<Self> {
        Router::new()
            .route("/test", get(get_test))
            .route("/metrics", get(get_metrics))
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TestResponse {
    pub message: String,
}

#[utoipa::path(
    get,
    path = "/test",
    responses(
        (status = 200, description = "Liveness probe", body = TestResponse)
    )
)]
pub async fn get_test() -> Json<TestResponse> {
    Json(TestResponse {
        message: "Server is running!".to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/metrics",
    responses(
        (status = 200, description = "Request and window counters", body = NumbersMetricsSnapshot)
    )
)]
pub async fn get_metrics(State(state): State<HealthApi>) -> Json<NumbersMetricsSnapshot> {
    Json(state.metrics.snapshot())
}
