use crate::upstream::{endpoint_url, EvaluationConfig, UpstreamError};
use futures_util::future::try_join_all;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_MINUTES: u32 = 30;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    pub price: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated_at: OffsetDateTime,
}

/// Price history of a single ticker, oldest first as served.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub ticker: String,
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }
}

#[derive(Debug, Deserialize)]
struct StocksPayload {
    stocks: BTreeMap<String, String>,
}

/// Client for the stock price endpoints of the evaluation service.
#[derive(Debug, Clone)]
pub struct StockClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl StockClient {
    pub fn new(config: &EvaluationConfig) -> Result<Self, UpstreamError> {
        Ok(Self {
            http: config.build_http_client()?,
            base_url: config.parse_base_url()?,
            timeout: config.timeout,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, UpstreamError> {
        debug!(%url, "stock request");
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|err| UpstreamError::from_request(err, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%url, %status, "stock endpoint returned non-success status");
            return Err(UpstreamError::Status(status));
        }

        response
            .json()
            .await
            .map_err(|err| UpstreamError::from_request(err, self.timeout))
    }

    /// Company name → ticker, ordered by company name.
    pub async fn list_stocks(&self) -> Result<BTreeMap<String, String>, UpstreamError> {
        let url = endpoint_url(&self.base_url, &["stocks"]);
        let payload: StocksPayload = self.get_json(url).await?;
        Ok(payload.stocks)
    }

    pub async fn price_history(&self, ticker: &str, minutes: u32) -> Result<PriceSeries, UpstreamError> {
        let mut url = endpoint_url(&self.base_url, &["stocks", ticker]);
        url.query_pairs_mut()
            .append_pair("minutes", &minutes.to_string());
        let points = self.get_json(url).await?;
        Ok(PriceSeries {
            ticker: ticker.to_string(),
            points,
        })
    }

    /// Fetches every ticker concurrently; the result keeps the input order.
    /// Fails as soon as any single fetch fails.
    pub async fn price_histories(
        &self,
        tickers: &[String],
        minutes: u32,
    ) -> Result<Vec<PriceSeries>, UpstreamError> {
        try_join_all(
            tickers
                .iter()
                .map(|ticker| self.price_history(ticker, minutes)),
        )
        .await
    }
}
