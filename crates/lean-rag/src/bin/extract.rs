//! Batch document-to-text extraction
//!
//! Run with: cargo run -p lean-rag --bin lean-rag-extract -- docs/ --out corpus_text

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use lean_rag::extraction::batch::BatchExtractor;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "lean-rag-extract", version, about = "Convert documents to UTF-8 text files")]
struct Args {
    /// Input file or directory
    path: PathBuf,

    /// Output directory, mirrors the input tree
    #[arg(long, default_value = "corpus_text")]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lean_rag=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let extractor = BatchExtractor::default();
    let plan = BatchExtractor::plan(&args.path)?;

    let pb = ProgressBar::new(plan.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")?
            .progress_chars("#>-"),
    );

    let stats = extractor.run_plan(&plan, &args.out, |file| {
        if let Some(name) = file.file_name() {
            pb.set_message(name.to_string_lossy().into_owned());
        }
        pb.inc(1);
    });
    pb.finish_and_clear();

    println!("Done: {}", serde_json::to_string(&stats)?);

    Ok(())
}
