use std::sync::Arc;

use numbers_lib::handler::NumbersHandler;
use numbers_lib::metrics::{SharedMetrics, create_shared_metrics};
use numbers_lib::upstream::{NumberSource, UpstreamClient};
use numbers_lib::window::WindowStore;
use tracing::info;

use crate::config::ServiceConfig;

struct InnerServiceContext {
    config: ServiceConfig,
    handler: NumbersHandler,
}

/// Everything the API needs, created once at startup and cheap to clone.
#[derive(Clone)]
pub struct ServiceContext {
    inner: Arc<InnerServiceContext>,
}

impl ServiceContext {
    pub fn try_new(config: ServiceConfig) -> anyhow::Result<Self> {
        let evaluation = config.evaluation();
        info!(
            "Creating upstream client for {} with timeout {:?}",
            evaluation.base_url, evaluation.timeout
        );
        let source = Arc::new(UpstreamClient::new(&evaluation)?);
        Ok(Self::with_source(config, source))
    }

    /// Builds the context around an arbitrary number source.
    pub fn with_source(config: ServiceConfig, source: Arc<dyn NumberSource>) -> Self {
        let window = Arc::new(WindowStore::new(config.window_capacity));
        let metrics = create_shared_metrics();
        let handler = NumbersHandler::new(source, window, metrics);
        Self {
            inner: Arc::new(InnerServiceContext { config, handler }),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.inner.config
    }

    pub fn handler(&self) -> &NumbersHandler {
        &self.inner.handler
    }

    pub fn window(&self) -> &Arc<WindowStore> {
        self.inner.handler.window()
    }

    pub fn metrics(&self) -> &SharedMetrics {
        self.inner.handler.metrics()
    }
}
