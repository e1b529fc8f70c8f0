//! RAG Server binary
//!
//! Run with: cargo run -p play-rag --bin play-rag-server -- --corpus data/romeo_and_juliet.txt

use clap::Parser;
use play_rag::{
    config::RagConfig,
    server::{state::AppState, RagServer},
    IngestPipeline,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Question answering over Romeo and Juliet
#[derive(Debug, Parser)]
#[command(name = "play-rag-server", version, about)]
struct Args {
    /// TOML configuration file (defaults apply when it does not exist)
    #[arg(long, default_value = "play-rag.toml")]
    config: PathBuf,

    /// Corpus text file, overriding `corpus.path`
    #[arg(long)]
    corpus: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // a non-zero LOCAL_LOGGING switches to the multi-line developer format
    let local = play_rag::config::local_logging_enabled(std::env::var("LOCAL_LOGGING").ok().as_deref());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "play_rag=info,tower_http=debug".into()),
        )
        .with(local.then(|| tracing_subscriber::fmt::layer().pretty()))
        .with((!local).then(|| tracing_subscriber::fmt::layer().compact()))
        .init();

    let args = Args::parse();

    let mut config = RagConfig::load(&args.config)?;
    if let Some(corpus) = args.corpus {
        config.corpus.path = corpus;
    }

    tracing::info!("Configuration loaded");
    tracing::info!("  - Corpus: {}", config.corpus.path.display());
    tracing::info!("  - Embedding model: {}", config.embeddings.model);
    tracing::info!("  - Boundary scan: {:?}", config.corpus.segmenter.boundary_scan);

    let state = AppState::from_config(config.clone())?;

    // Any ingestion failure aborts startup; a partial corpus is never served
    let pipeline = IngestPipeline::from_config(&config)?;
    let count = pipeline.ingest_file(state.index(), &config.corpus.path).await?;
    tracing::info!("Corpus ready: {} chunks indexed", count);

    let server = RagServer::new(state);

    println!("\nServer starting...");
    println!("  Chat: POST http://{}/chat", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  Info: http://{}/info", server.address());
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
