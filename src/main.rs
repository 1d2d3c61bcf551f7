//! HTTP server entrypoint.
use anyhow::{Context, Result};
use clap::Parser;
use docpipe::{
    api::{self, AppState},
    config,
    database::MongoFileRepository,
    extraction::{ContentExtractor, PdfExtractText},
    logging,
    partition::HttpPartitioner,
    storage::StorageClient,
};
use std::net::IpAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

const DEFAULT_PORT: u16 = 8000;

/// Partition uploaded documents and extract text from stored files over HTTP.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,
    /// Port to listen on; overrides `SERVER_PORT`.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    config::init_config();
    logging::init_tracing();
    let config = config::get_config();

    let partitioner = Arc::new(HttpPartitioner::new().context("failed to build partition client")?);
    let files = MongoFileRepository::connect()
        .await
        .context("failed to connect to MongoDB")?;
    let storage = StorageClient::new().context("failed to build object storage client")?;
    let extractor = ContentExtractor::new(
        Arc::new(files),
        storage,
        Arc::new(PdfExtractText),
        partitioner.clone(),
        config.partition_max_characters,
    );
    let state = AppState::new(partitioner, Arc::new(extractor), config.max_upload_bytes);
    let app = api::create_router(state);

    let port = args.port.or(config.server_port).unwrap_or(DEFAULT_PORT);
    let listener = TcpListener::bind((args.host, port))
        .await
        .with_context(|| format!("failed to bind {}:{port}", args.host))?;
    tracing::info!(
        environment = %config.environment,
        "Listening on http://{}:{}",
        args.host,
        port
    );
    axum::serve(listener, app)
        .await
        .context("HTTP server terminated unexpectedly")?;
    Ok(())
}
