mod batch;
mod batched_engine;
mod coa;
mod config;
mod engine;
mod error;
mod openai_engine;
mod parser;
mod prompt;
mod server;
mod taxonomy;
mod trial_balance;
mod types;

use anyhow::Context;
use axum::routing::get;
use axum_prometheus::PrometheusMetricLayer;
use clap::Parser;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use batched_engine::BatchedClassifier;
use config::{ClassifierConfig, Command, Config};
use engine::Engine;
use openai_engine::OpenAiEngine;
use server::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_tracing(config.log_json);
    tracing::info!("Starting COA mapper with config: {:?}", config);

    let classifier_config = ClassifierConfig::try_from(&config)?;

    let completion_engine = OpenAiEngine::new(
        classifier_config.endpoint.clone(),
        classifier_config.api_key.clone(),
        classifier_config.request_timeout,
    )
    .context("Failed to build HTTP client")?;
    let classifier = BatchedClassifier::new(&classifier_config, completion_engine);

    match &config.command {
        Command::Serve { .. } => serve(&config, &classifier_config, classifier).await,
        Command::Map {
            input,
            output,
            skip_rows,
        } => map_file(&classifier, input, output, *skip_rows).await,
    }
}

fn init_tracing(json: bool) {
    let builder = tracing_subscriber::fmt().with_env_filter(
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "info,coa_mapper=debug".into()),
    );
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn serve(
    config: &Config,
    classifier_config: &ClassifierConfig,
    classifier: BatchedClassifier<OpenAiEngine>,
) -> anyhow::Result<()> {
    let address = config
        .server_address()
        .context("Server address is only known for the serve command")?;

    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

    let state = AppState::new(Arc::new(classifier), classifier_config.model.clone());
    let app = server::router(state)
        .route("/metrics", get(|| async move { metric_handle.render() }))
        .layer(prometheus_layer)
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(&address).await?;
    tracing::info!("Server running on http://{}", address);
    tracing::info!(
        "Batch size: {}, max concurrent batches: {:?}",
        classifier_config.batch_size,
        classifier_config.max_concurrent_batches
    );

    axum::serve(listener, app).await?;
    Ok(())
}

#[tracing::instrument(skip(classifier))]
async fn map_file(
    classifier: &BatchedClassifier<OpenAiEngine>,
    input: &Path,
    output: &Path,
    skip_rows: usize,
) -> anyhow::Result<()> {
    let accounts = trial_balance::read_trial_balance(input, skip_rows)
        .with_context(|| format!("Failed to read trial balance {}", input.display()))?;

    let names: Vec<String> = accounts.iter().map(|a| a.name.clone()).collect();
    let labels = classifier.classify(&names).await;
    let failed = labels
        .iter()
        .filter(|label| *label == taxonomy::CLASSIFICATION_ERROR)
        .count();

    let records = coa::build_records(accounts, labels);
    let file = File::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    coa::write_csv(&records, BufWriter::new(file))?;

    tracing::info!(
        records = records.len(),
        failed,
        output = %output.display(),
        "Mapping written"
    );
    if failed > 0 {
        tracing::warn!(failed, "Some accounts could not be classified; re-run them after fixing the cause");
    }
    Ok(())
}
