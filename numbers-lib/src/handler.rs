use crate::aggregate::{average, AggregateError};
use crate::metrics::SharedMetrics;
use crate::upstream::{InvalidNumberType, NumberSource, NumberType, UpstreamError};
use crate::window::WindowStore;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum RequestError {
    #[error(transparent)]
    InvalidNumberType(#[from] InvalidNumberType),
    #[error("failed to fetch numbers: {0}")]
    Upstream(#[from] UpstreamError),
}

/// Result of one successful `/numbers/{type}` request.
#[derive(Debug, Clone, PartialEq)]
pub struct NumbersReport {
    pub window_prev_state: Vec<i64>,
    pub window_curr_state: Vec<i64>,
    pub numbers: Vec<i64>,
    pub avg: f64,
}

/// Validates the requested stream, fetches it, folds it into the window and
/// reports the new average.
///
/// The window is only touched after the upstream answered, so a failed or
/// timed-out fetch leaves it exactly as it was.
#[derive(Clone)]
pub struct NumbersHandler {
    source: Arc<dyn NumberSource>,
    window: Arc<WindowStore>,
    metrics: SharedMetrics,
}

impl NumbersHandler {
    pub fn new(
        source: Arc<dyn NumberSource>,
        window: Arc<WindowStore>,
        metrics: SharedMetrics,
    ) -> Self {
        Self {
            source,
            window,
            metrics,
        }
    }

    pub fn window(&self) -> &Arc<WindowStore> {
        &self.window
    }

    pub fn metrics(&self) -> &SharedMetrics {
        &self.metrics
    }

    pub async fn handle(&self, number_type_key: &str) -> Result<NumbersReport, RequestError> {
        self.metrics.increment_requests();

        let number_type = number_type_key.parse::<NumberType>().inspect_err(|err| {
            self.metrics.increment_validation_failures();
            debug!(%err, "rejecting request");
        })?;

        let numbers = self.source.fetch(number_type).await.inspect_err(|err| {
            self.metrics.increment_upstream_failures();
            error!(%err, %number_type, "Error fetching numbers");
        })?;
        self.metrics.add_numbers_received(numbers.len() as u64);

        let outcome = self.window.ingest(&numbers);
        self.metrics.add_numbers_ingested(outcome.appended as u64);
        self.metrics.set_window_len(outcome.snapshot.curr.len() as u64);

        let avg = match average(&outcome.snapshot.curr) {
            Ok(avg) => avg,
            Err(AggregateError::EmptyWindow) => {
                debug!(%number_type, "window is empty, reporting zero average");
                0.0
            }
        };

        info!(
            %number_type,
            received = numbers.len(),
            appended = outcome.appended,
            window = outcome.snapshot.curr.len(),
            avg,
            "numbers request served"
        );
        self.metrics.increment_successes();

        Ok(NumbersReport {
            window_prev_state: outcome.snapshot.prev,
            window_curr_state: outcome.snapshot.curr,
            numbers,
            avg,
        })
    }
}
