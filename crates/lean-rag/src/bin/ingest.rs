//! Offline ingestion: chunk, embed and index a folder of text files
//!
//! Run with: cargo run -p lean-rag --bin lean-rag-ingest -- corpus_text

use clap::Parser;
use lean_rag::{
    config::{IdStrategy, RagConfig},
    ingestion::{IngestOptions, Ingestor},
    providers::{embedder_from_config, QdrantStore},
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "lean-rag-ingest", version, about = "Index a folder of text files into Qdrant")]
struct Args {
    /// Folder of text files (defaults to the configured corpus_dir)
    folder: Option<PathBuf>,

    /// Drop and recreate the collection first
    #[arg(long)]
    recreate: bool,

    /// Point id scheme: sequential or content-hash
    #[arg(long)]
    id_strategy: Option<IdStrategy>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lean_rag=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let mut config = RagConfig::load()?;
    if let Some(strategy) = args.id_strategy {
        config.ingestion.id_strategy = strategy;
    }
    let folder = args
        .folder
        .unwrap_or_else(|| config.ingestion.corpus_dir.clone());

    let embedder = embedder_from_config(&config.embeddings)?;
    let store = Arc::new(QdrantStore::new(&config.vector_db)?);
    let ingestor = Ingestor::new(embedder, store, &config.chunking, &config.ingestion)?;

    let report = ingestor
        .ingest(
            &folder,
            IngestOptions {
                recreate: args.recreate,
            },
        )
        .await?;

    println!("Ingest complete.");
    println!(
        "  files: {}  chunks: {}  batches: {}",
        report.files, report.chunks, report.batches
    );

    Ok(())
}
