//! Offline ingestion: word-window chunking and index population

pub mod chunker;
pub mod ingestor;

pub use chunker::{chunk, TextChunker, WordWindows};
pub use ingestor::{content_hash_id, IngestOptions, IngestReport, Ingestor};
