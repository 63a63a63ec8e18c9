mod aggregator;
mod config;
mod dataset;
mod dispatcher;
mod engine;
mod openai_engine;
mod parser;
mod prompt;
mod schema;
mod types;

use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use config::Config;
use dispatcher::Dispatcher;
use openai_engine::{OpenAiConfig, OpenAiEngine};
use schema::SchemaContract;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,review_classifier=debug".into()),
        )
        .init();

    let config = Config::parse();
    tracing::info!("Starting review classifier with config: {:?}", config);

    if let Some(address) = config.metrics_address {
        PrometheusBuilder::new()
            .with_http_listener(address)
            .install()?;
        tracing::info!("Metrics available on http://{}/metrics", address);
    }

    let items = dataset::load_dataset(&config.dataset, config.per_class_limit)?;

    let engine = OpenAiEngine::new(OpenAiConfig::from(&config))?;
    tracing::info!(endpoint = engine.endpoint(), "Using inference endpoint");
    let dispatcher = Dispatcher::new(Arc::new(engine), SchemaContract);

    // Stop dispatching new items on Ctrl-C; in-flight requests still finish.
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, cancelling pending items");
                cancel.cancel();
            }
        }
    });

    let results = dispatcher.run(items, config.workers, cancel).await?;

    let summary = results.summary();
    tracing::info!(
        total = summary.total,
        succeeded = summary.succeeded,
        failed = ?summary.failed,
        "Classification finished"
    );
    if results.is_empty() {
        tracing::warn!("Dataset contained no reviews");
    }

    dataset::write_results(&config.output, &results.to_sequence())?;
    Ok(())
}
