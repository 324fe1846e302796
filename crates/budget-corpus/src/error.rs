use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading the corpus or answering an estimation query
#[derive(Debug, Error)]
pub enum CorpusError {
    /// None of the candidate dataset paths exist
    #[error("Corpus dataset not found; looked in: {}", format_candidates(.candidates))]
    DataNotFound { candidates: Vec<PathBuf> },

    /// The dataset exists but could not be turned into a corpus
    #[error("Failed to load corpus: {message}")]
    Load {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Estimation was attempted before a successful load
    #[error("Corpus is not loaded; load it before running estimates")]
    NotLoaded,

    /// Query vector dimension disagrees with the corpus matrices
    #[error("Dimension mismatch: query has {query} dimensions, corpus has {corpus}")]
    DimensionMismatch { query: usize, corpus: usize },

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),
}

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

impl CorpusError {
    /// True when the load failed, whether the dataset was missing or unreadable
    ///
    /// Match on [`CorpusError::Load`] to single out a dataset that was found
    /// but could not be parsed.
    pub fn is_load_failure(&self) -> bool {
        matches!(self, CorpusError::DataNotFound { .. } | CorpusError::Load { .. })
    }

    pub(crate) fn load(msg: impl Into<String>) -> Self {
        CorpusError::Load {
            message: msg.into(),
            source: None,
        }
    }

    fn wrap<E>(kind: &str, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        CorpusError::Load {
            message: format!("{}: {}", kind, err),
            source: Some(Box::new(err)),
        }
    }

    /// Prefix a load failure message with where it happened
    pub(crate) fn context(self, ctx: &str) -> Self {
        match self {
            CorpusError::Load { message, source } => CorpusError::Load {
                message: format!("{}: {}", ctx, message),
                source,
            },
            other => other,
        }
    }
}

// Reader errors only surface while parsing a located dataset.
impl From<std::io::Error> for CorpusError {
    fn from(err: std::io::Error) -> Self {
        CorpusError::wrap("I/O error", err)
    }
}

impl From<arrow::error::ArrowError> for CorpusError {
    fn from(err: arrow::error::ArrowError) -> Self {
        CorpusError::wrap("Arrow error", err)
    }
}

impl From<parquet::errors::ParquetError> for CorpusError {
    fn from(err: parquet::errors::ParquetError) -> Self {
        CorpusError::wrap("Parquet error", err)
    }
}

fn format_candidates(candidates: &[PathBuf]) -> String {
    candidates
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, CorpusError>;
