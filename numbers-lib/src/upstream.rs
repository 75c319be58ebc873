use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::Deserialize;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://20.244.56.144/evaluation-service";
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_millis(500);

/// The four number streams offered by the evaluation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberType {
    Primes,
    Fibonacci,
    Even,
    Random,
}

impl NumberType {
    pub const ALL: [NumberType; 4] = [
        NumberType::Primes,
        NumberType::Fibonacci,
        NumberType::Even,
        NumberType::Random,
    ];

    /// Path segment of the upstream endpoint.
    pub fn upstream_path(self) -> &'static str {
        match self {
            NumberType::Primes => "primes",
            NumberType::Fibonacci => "fibo",
            NumberType::Even => "even",
            NumberType::Random => "rand",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            NumberType::Primes => "p",
            NumberType::Fibonacci => "f",
            NumberType::Even => "e",
            NumberType::Random => "r",
        }
    }
}

impl Display for NumberType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            NumberType::Primes => "primes",
            NumberType::Fibonacci => "fibonacci",
            NumberType::Even => "even",
            NumberType::Random => "random",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid number type: {0:?}")]
pub struct InvalidNumberType(pub String);

impl FromStr for NumberType {
    type Err = InvalidNumberType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "p" | "primes" => Ok(NumberType::Primes),
            "f" | "fibonacci" => Ok(NumberType::Fibonacci),
            "e" | "even" => Ok(NumberType::Even),
            "r" | "random" => Ok(NumberType::Random),
            other => Err(InvalidNumberType(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("invalid base url {0:?}")]
    InvalidBaseUrl(String),
    #[error("auth token is not a valid header value")]
    InvalidAuthToken,
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("upstream did not answer within {0:?}")]
    Timeout(Duration),
    #[error("upstream request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("upstream responded with status {0}")]
    Status(StatusCode),
    #[error("upstream response could not be decoded: {0}")]
    Decode(#[source] reqwest::Error),
}

impl UpstreamError {
    pub(crate) fn from_request(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout(timeout)
        } else if err.is_decode() {
            UpstreamError::Decode(err)
        } else {
            UpstreamError::Transport(err)
        }
    }
}

/// Connection settings shared by every client of the evaluation service.
#[derive(Debug, Clone)]
pub struct EvaluationConfig {
    pub base_url: String,
    pub auth_token: Option<String>,
    pub timeout: Duration,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_token: None,
            timeout: DEFAULT_UPSTREAM_TIMEOUT,
        }
    }
}

impl EvaluationConfig {
    pub(crate) fn parse_base_url(&self) -> Result<Url, UpstreamError> {
        let url = Url::parse(&self.base_url)
            .map_err(|_| UpstreamError::InvalidBaseUrl(self.base_url.clone()))?;
        if url.cannot_be_a_base() {
            return Err(UpstreamError::InvalidBaseUrl(self.base_url.clone()));
        }
        Ok(url)
    }

    pub(crate) fn build_http_client(&self) -> Result<reqwest::Client, UpstreamError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = &self.auth_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| UpstreamError::InvalidAuthToken)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        reqwest::Client::builder()
            .timeout(self.timeout)
            .default_headers(headers)
            .build()
            .map_err(UpstreamError::Client)
    }
}

/// Appends path segments to a base url, keeping any path it already has.
pub(crate) fn endpoint_url(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// Anything able to produce a batch of numbers for a [`NumberType`].
pub trait NumberSource: Send + Sync {
    fn fetch(&self, number_type: NumberType) -> BoxFuture<'_, Result<Vec<i64>, UpstreamError>>;
}

#[derive(Debug, Deserialize)]
struct NumbersPayload {
    numbers: Vec<i64>,
}

/// HTTP client for the evaluation service number endpoints.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl UpstreamClient {
    pub fn new(config: &EvaluationConfig) -> Result<Self, UpstreamError> {
        Ok(Self {
            http: config.build_http_client()?,
            base_url: config.parse_base_url()?,
            timeout: config.timeout,
        })
    }

    pub fn endpoint(&self, number_type: NumberType) -> Url {
        endpoint_url(&self.base_url, &[number_type.upstream_path()])
    }

    pub async fn fetch_numbers(&self, number_type: NumberType) -> Result<Vec<i64>, UpstreamError> {
        let url = self.endpoint(number_type);
        debug!(%url, "fetching numbers");

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|err| UpstreamError::from_request(err, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%url, %status, "upstream returned non-success status");
            return Err(UpstreamError::Status(status));
        }

        let payload: NumbersPayload = response
            .json()
            .await
            .map_err(|err| UpstreamError::from_request(err, self.timeout))?;
        Ok(payload.numbers)
    }
}

impl NumberSource for UpstreamClient {
    fn fetch(&self, number_type: NumberType) -> BoxFuture<'_, Result<Vec<i64>, UpstreamError>> {
        self.fetch_numbers(number_type).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::http::HeaderMap as AxumHeaders;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    async fn spawn_upstream(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/evaluation-service")
    }

    fn test_client(base_url: String, timeout: Duration) -> UpstreamClient {
        UpstreamClient::new(&EvaluationConfig {
            base_url,
            auth_token: Some("secret".to_string()),
            timeout,
        })
        .unwrap()
    }

    #[test]
    fn test_number_type_parses_short_and_long_keys() {
        for number_type in NumberType::ALL {
            assert_eq!(number_type.key().parse::<NumberType>(), Ok(number_type));
            assert_eq!(number_type.to_string().parse::<NumberType>(), Ok(number_type));
        }
        assert_eq!(
            "x".parse::<NumberType>(),
            Err(InvalidNumberType("x".to_string()))
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = test_client(DEFAULT_BASE_URL.to_string(), DEFAULT_UPSTREAM_TIMEOUT);
        assert_eq!(
            client.endpoint(NumberType::Fibonacci).as_str(),
            "http://20.244.56.144/evaluation-service/fibo"
        );

        let client = test_client("http://localhost:8080/".to_string(), DEFAULT_UPSTREAM_TIMEOUT);
        assert_eq!(
            client.endpoint(NumberType::Random).as_str(),
            "http://localhost:8080/rand"
        );
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let err = UpstreamClient::new(&EvaluationConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, UpstreamError::InvalidBaseUrl(_)));
    }

    #[tokio::test]
    async fn test_fetch_sends_bearer_token() {
        let router = Router::new().route(
            "/evaluation-service/{kind}",
            get(|Path(kind): Path<String>, headers: AxumHeaders| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                let numbers = if kind == "even" && auth == "Bearer secret" {
                    vec![2, 4, 6]
                } else {
                    vec![]
                };
                Json(json!({ "numbers": numbers }))
            }),
        );
        let client = test_client(spawn_upstream(router).await, Duration::from_secs(2));

        let numbers = client.fetch_numbers(NumberType::Even).await.unwrap();
        assert_eq!(numbers, vec![2, 4, 6]);
    }

    #[tokio::test]
    async fn test_slow_upstream_times_out() {
        let router = Router::new().route(
            "/evaluation-service/primes",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(800)).await;
                Json(json!({ "numbers": [2, 3, 5] }))
            }),
        );
        let client = test_client(spawn_upstream(router).await, Duration::from_millis(100));

        let err = client.fetch_numbers(NumberType::Primes).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Timeout(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_non_success_status_is_reported() {
        let router = Router::new().route(
            "/evaluation-service/rand",
            get(|| async { (axum::http::StatusCode::UNAUTHORIZED, Json(Value::Null)) }),
        );
        let client = test_client(spawn_upstream(router).await, Duration::from_secs(2));

        let err = client.fetch_numbers(NumberType::Random).await.unwrap_err();
        assert!(matches!(
            err,
            UpstreamError::Status(code) if code == StatusCode::UNAUTHORIZED
        ));
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_decode_error() {
        let router = Router::new().route(
            "/evaluation-service/fibo",
            get(|| async { Json(json!({ "values": [1, 1, 2] })) }),
        );
        let client = test_client(spawn_upstream(router).await, Duration::from_secs(2));

        let err = client.fetch_numbers(NumberType::Fibonacci).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Decode(_)), "{err:?}");
    }
}
