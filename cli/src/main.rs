use std::time::Duration;

use anyhow::Context;
use clap::{Command, arg, command, value_parser};
use dotenv::dotenv;
use numbers_lib::stats::CorrelationMatrix;
use numbers_lib::stocks::{DEFAULT_MINUTES, StockClient};
use numbers_lib::upstream::NumberType;
use tracing::info;
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::get_cli_config;

mod config;
mod numbers_client;
mod render;

fn minutes_arg() -> clap::Arg {
    arg!(-m --minutes <MINUTES> "price history window in minutes")
        .value_parser(value_parser!(u32).range(1..))
        .default_value("30")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ignore faillures as .env might not be present at runtime, and this use-case is tolerated
    dotenv()
        .inspect_err(|err| println!("[WARN] reading .env files is failed with err {err}"))
        .ok();

    let config = get_cli_config()?;

    // logs
    let (non_blocking_appender, _guard_stderr) = tracing_appender::non_blocking(std::io::stderr());
    let stderr_subscriber = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_appender)
        .with_filter(config.rust_log);
    tracing_subscriber::registry()
        .with(stderr_subscriber)
        .init();

    let matches = command!() // requires `cargo` feature
        .propagate_version(true)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(Command::new("stocks").about("list known companies and tickers"))
        .subcommand(
            Command::new("chart")
                .alias("c")
                .about("price history of one ticker with its average")
                .arg(arg!(<TICKER> "stock ticker, e.g. NVDA"))
                .arg(minutes_arg()),
        )
        .subcommand(
            Command::new("correlation")
                .alias("heatmap")
                .about("pairwise price correlation of every known ticker")
                .arg(minutes_arg()),
        )
        .subcommand(
            Command::new("numbers")
                .alias("n")
                .about("request the next window report from a running numbers service")
                .arg(arg!(<TYPE> "p (primes), f (fibonacci), e (even) or r (random)"))
                .arg(arg!(-s --server <URL> "numbers service base url")),
        )
        .get_matches();

    let stock_client = || {
        StockClient::new(&config.evaluation()).context("invalid evaluation service settings")
    };

    match matches.subcommand() {
        Some(("stocks", _)) => {
            let stocks = stock_client()?.list_stocks().await?;
            println!("{}", render::stocks_table(&stocks));
        }
        Some(("chart", sub_matches)) => {
            let ticker = sub_matches
                .get_one::<String>("TICKER")
                .context("ticker is required")?;
            let minutes = *sub_matches.get_one::<u32>("minutes").unwrap_or(&DEFAULT_MINUTES);

            let series = stock_client()?.price_history(ticker, minutes).await?;
            info!(%ticker, minutes, points = series.points.len(), "price history fetched");
            println!("Stock price chart: {ticker}, last {minutes} minutes");
            println!("{}", render::chart_table(&series));
        }
        Some(("correlation", sub_matches)) => {
            let minutes = *sub_matches.get_one::<u32>("minutes").unwrap_or(&DEFAULT_MINUTES);

            let client = stock_client()?;
            let stocks = client.list_stocks().await?;
            let tickers: Vec<String> = stocks.into_values().collect();
            let series = client.price_histories(&tickers, minutes).await?;
            info!(tickers = tickers.len(), minutes, "price histories fetched");

            let matrix = CorrelationMatrix::compute(&series);
            println!("Stock correlation heatmap, last {minutes} minutes");
            println!("{}", render::series_stats_table(&matrix));
            println!("{}", render::correlation_table(&matrix));
            println!("Blue: positive correlation, red: negative, paler: weaker");
        }
        Some(("numbers", sub_matches)) => {
            let number_type = sub_matches
                .get_one::<String>("TYPE")
                .context("number type is required")?;
            let number_type: NumberType = number_type.parse()?;
            let server = sub_matches
                .get_one::<String>("server")
                .cloned()
                .unwrap_or_else(|| config.numbers_server_url.clone());

            let report = numbers_client::fetch_window_report(
                &server,
                number_type.key(),
                Duration::from_millis(config.upstream_timeout_ms),
            )
            .await?;
            println!("{number_type} numbers from {server}");
            println!("{}", render::window_report_table(&report));
        }
        _ => (),
    };

    Ok(())
}
