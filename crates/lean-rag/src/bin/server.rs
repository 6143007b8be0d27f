//! RAG Server binary
//!
//! Run with: cargo run -p lean-rag --bin lean-rag-server

use lean_rag::{config::RagConfig, server::RagServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lean_rag=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                        Lean RAG                           ║
║          Grounded answers as structured JSON              ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    let config = RagConfig::load()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Qdrant: {} ({})", config.vector_db.url(), config.vector_db.collection);
    tracing::info!("  - Embedding model: {}", config.embeddings.model);
    tracing::info!("  - LLM model: {}", config.llm.model);
    tracing::info!("  - Top k: {}", config.retrieval.top_k);

    let server = RagServer::new(config)?;

    // Check Ollama and Qdrant
    if !server.state().check_backends().await {
        tracing::warn!("Some backends are unavailable; /ask will degrade until they are up");
        tracing::warn!("Start Ollama with `ollama serve` and pull the models:");
        tracing::warn!("  ollama pull {}", server.state().config().embeddings.model);
        tracing::warn!("  ollama pull {}", server.state().config().llm.model);
    }

    println!("\nServer starting...");
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  GET  /health - Service and index status");
    println!("  POST /ask    - Ask a question {{\"q\": \"...\", \"k\": 8}}");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
