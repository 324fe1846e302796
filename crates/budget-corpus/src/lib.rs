//! Budget Corpus - similarity search and budget estimation over historical
//! spending projects
//!
//! This crate provides:
//! - Dataset readers (Parquet and CSV) for the project corpus
//! - One-time corpus loading with normalized embedding matrices
//! - Blended cosine similarity search with deterministic top-K selection
//! - Similarity-weighted log-mean budget estimation
//! - Configuration management

pub mod config;
pub mod corpus;
pub mod embeddings;
pub mod error;
pub mod loader;
pub mod project;
pub mod search;
pub mod storage;

// Re-export commonly used types
pub use config::{ColumnMapping, DataSourceConfig, EstimatorConfig};
pub use corpus::Corpus;
pub use error::{CorpusError, Result};
pub use loader::{CorpusLoader, CorpusStatus, LoadOutcome};
pub use project::{ProjectRecord, SimilarProject};
pub use search::{Estimation, SimilarityEstimator};
