use anyhow::{Context, bail};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumbersResponse {
    pub window_prev_state: Vec<i64>,
    pub window_curr_state: Vec<i64>,
    pub numbers: Vec<i64>,
    pub avg: f64,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Asks a running numbers service for the next window report.
pub async fn fetch_window_report(
    server_url: &str,
    number_type: &str,
    timeout: Duration,
) -> anyhow::Result<NumbersResponse> {
    let url = format!("{}/numbers/{}", server_url.trim_end_matches('/'), number_type);
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    let response = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("numbers service is not reachable at {url}"))?;

    let status = response.status();
    if !status.is_success() {
        let message = response
            .json::<ErrorResponse>()
            .await
            .map(|err| err.error)
            .unwrap_or_else(|_| status.to_string());
        bail!("numbers service answered {status}: {message}");
    }

    Ok(response.json().await?)
}
