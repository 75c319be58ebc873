use crate::api::v1::health::HealthApi;
use crate::api::v1::numbers::NumbersApi;
use crate::api::ErrorResponse;
use crate::context::ServiceContext;
use axum::Router;
use futures_util::FutureExt;
use numbers_lib::metrics::NumbersMetricsSnapshot;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tracing::error;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
pub mod health;
pub mod numbers;

#[derive(OpenApi)]
#[openapi(
    paths(
        numbers::get_numbers,
        health::get_test,
        health::get_metrics,
    ),
    components(
        schemas(numbers::NumbersResponse, health::TestResponse, NumbersMetricsSnapshot, ErrorResponse)
    ),
    tags(
        (name = "Average Calculator API", description = "Sliding window average over evaluation service numbers")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct Api {
    numbers_api: NumbersApi,
    health_api: HealthApi,
}

impl Api {
    pub fn new(context: ServiceContext) -> Self {
        Self {
            numbers_api: NumbersApi::new(context.handler().clone()),
            health_api: HealthApi::new(context.metrics().clone()),
        }
    }

    pub async fn serve(
        self,
        bind_address: &str,
        shutdown: tokio::sync::oneshot::Receiver<()>,
    ) -> anyhow::Result<()> {
        let addr: SocketAddr = bind_address.parse()?;
        let app = self.router();
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Starting API server on {}", addr);
        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(shutdown.map(|v| {
                _ = v.inspect_err(|_err| error!("shutdown receive error"));
            }))
            .await?;
        Ok(())
    }

    pub fn router(&self) -> Router {
        Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
            .nest(
                "/numbers",
                NumbersApi::router().with_state(self.numbers_api.clone()),
            )
            .merge(HealthApi::router().with_state(self.health_api.clone()))
            .layer(CorsLayer::permissive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use futures_util::future::BoxFuture;
    use numbers_lib::upstream::{NumberSource, NumberType, UpstreamError};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    /// Even stream answers with a fixed batch, everything else times out.
    struct EvenOnlySource(Vec<i64>);

    impl NumberSource for EvenOnlySource {
        fn fetch(&self, number_type: NumberType) -> BoxFuture<'_, Result<Vec<i64>, UpstreamError>> {
            let answer = match number_type {
                NumberType::Even => Ok(self.0.clone()),
                _ => Err(UpstreamError::Timeout(Duration::from_millis(500))),
            };
            async move { answer }.boxed()
        }
    }

    fn test_context(batch: Vec<i64>) -> ServiceContext {
        let config: ServiceConfig = envy::from_iter(Vec::<(String, String)>::new()).unwrap();
        ServiceContext::with_source(config, Arc::new(EvenOnlySource(batch)))
    }

    async fn get(router: Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_liveness_probe() {
        let router = Api::new(test_context(vec![])).router();
        let (status, body) = get(router, "/test").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Server is running!" }));
    }

    #[tokio::test]
    async fn test_numbers_response_shape() {
        let evens: Vec<i64> = (1..=11).map(|n| n * 2).collect();
        let context = test_context(evens);
        let router = Api::new(context.clone()).router();

        let (status, body) = get(router.clone(), "/numbers/e").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "windowPrevState": [],
                "windowCurrState": [4, 6, 8, 10, 12, 14, 16, 18, 20, 22],
                "numbers": [2, 4, 6, 8, 10, 12, 14, 16, 18, 20, 22],
                "avg": 13.0
            })
        );

        let (_, body) = get(router, "/numbers/e").await;
        assert_eq!(body["windowPrevState"], body["windowCurrState"]);
    }

    #[tokio::test]
    async fn test_unknown_type_is_bad_request() {
        let context = test_context(vec![1, 2]);
        let router = Api::new(context.clone()).router();

        let (status, body) = get(router, "/numbers/x").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Invalid number type" }));
        assert!(context.window().is_empty());
    }

    #[tokio::test]
    async fn test_upstream_timeout_is_server_error_and_keeps_window() {
        let context = test_context(vec![2, 4]);
        let router = Api::new(context.clone()).router();
        get(router.clone(), "/numbers/e").await;

        let (status, body) = get(router, "/numbers/p").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Failed to fetch numbers" }));
        assert_eq!(context.window().snapshot(), vec![2, 4]);
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let router = Api::new(test_context(vec![2, 4, 4])).router();
        get(router.clone(), "/numbers/e").await;
        get(router.clone(), "/numbers/r").await;
        get(router.clone(), "/numbers/zzz").await;

        let (status, body) = get(router, "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["requests"], 3);
        assert_eq!(body["successes"], 1);
        assert_eq!(body["upstream_failures"], 1);
        assert_eq!(body["validation_failures"], 1);
        assert_eq!(body["numbers_received"], 3);
        assert_eq!(body["numbers_ingested"], 2);
        assert_eq!(body["window_len"], 2);
    }

    #[tokio::test]
    async fn test_openapi_document_is_served() {
        let router = Api::new(test_context(vec![])).router();
        let (status, body) = get(router, "/api-docs/openapi.json").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/numbers/{number_type}"].is_object());
    }
}
