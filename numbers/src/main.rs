use dotenv::dotenv;
use numbers_lib::upstream::NumberType;
use rolling_file::{BasicRollingFileAppender, RollingConditionBasic};
use tracing::{error, info};
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::v1::Api;
use crate::config::get_service_config;
use crate::context::ServiceContext;

mod api;
mod config;
mod context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ignore faillures as .env might not be present at runtime, and this use-case is tolerated
    dotenv()
        .inspect_err(|err| println!("[WARN] reading .env files is failed with err {err}"))
        .ok();

    let config = get_service_config()?;

    // logs
    let (non_blocking_appender, _guard_stdout) = tracing_appender::non_blocking(std::io::stdout());
    let stdout_subscriber = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_appender)
        .with_filter(config.rust_log);
    let (file_subscriber, _guard_file) = match &config.log_dir {
        Some(log_dir) => {
            std::fs::create_dir_all(log_dir)?;
            let appender = BasicRollingFileAppender::new(
                log_dir.join("numbers.log"),
                RollingConditionBasic::new().daily(),
                9,
            )?;
            let (non_blocking_appender, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking_appender)
                .with_ansi(false)
                .with_filter(config.rust_log);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };
    tracing_subscriber::registry()
        .with(stdout_subscriber)
        .with(file_subscriber)
        .init();

    info!(
        "Window capacity {}, upstream {} (timeout {} ms)",
        config.window_capacity, config.evaluation_base_url, config.upstream_timeout_ms
    );
    if config.evaluation_auth_token.is_none() {
        info!("EVALUATION_AUTH_TOKEN is not set, upstream requests are sent without authorization");
    }

    let context = ServiceContext::try_new(config)?;
    let bind_address = context.config().bind_address.clone();

    info!("Available endpoints:");
    for number_type in NumberType::ALL {
        info!("- /numbers/{} ({} numbers)", number_type.key(), number_type);
    }

    let (shutdown_api_tx, shutdown_api_rx) = tokio::sync::oneshot::channel();
    let api = Api::new(context.clone());
    let mut api_handle =
        tokio::spawn(async move { api.serve(&bind_address, shutdown_api_rx).await });

    // the server only returns on its own when it failed to start
    let signalled = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            true
        }
        result = &mut api_handle => {
            result??;
            false
        }
    };

    if signalled {
        info!("Termination signal received. Shutting down...");
        _ = shutdown_api_tx
            .send(())
            .inspect_err(|_err| error!("failed to shutdown api"));
        _ = api_handle
            .await?
            .inspect(|_| info!("api has stopped"))
            .inspect_err(|err| error!("api stopped with error: {err}"));
    }

    info!("Final window: {:?}", context.window().snapshot());
    info!("{}", context.metrics().snapshot());
    Ok(())
}
