//! Application state for the budget API
//!
//! Holds the corpus loader, the estimator and the optional embedding provider.

use anyhow::{anyhow, Result};
use budget_corpus::{CorpusLoader, DataSourceConfig, EstimatorConfig, LoadOutcome, SimilarityEstimator};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::embeddings::{Embedder, OpenAiEmbedder};
use crate::error::ApiError;

/// Shared application state
pub struct AppState {
    /// Process-wide corpus, loaded once
    pub loader: Arc<CorpusLoader>,
    pub estimator: SimilarityEstimator,
    /// Where the corpus is read from, kept for reload requests
    pub data_source: DataSourceConfig,
    /// Text embedding provider; `None` disables text-based analyses
    pub embedder: Option<Arc<dyn Embedder>>,
}

impl AppState {
    /// Initialize application state from environment configuration
    ///
    /// A corpus load failure is logged, not returned: the service starts with
    /// the corpus unloaded and estimation endpoints answer 503 until a reload
    /// succeeds.
    pub async fn new() -> Result<Self> {
        let data_source = DataSourceConfig::from_env();
        let estimator = SimilarityEstimator::new(EstimatorConfig::from_env()?)?;
        info!("Estimator configuration: {:?}", estimator.config());

        let embedder: Option<Arc<dyn Embedder>> = match OpenAiEmbedder::from_env() {
            Some(embedder) => {
                info!("Embedding provider configured, model: {}", embedder.model());
                Some(Arc::new(embedder))
            }
            None => {
                warn!("OPENAI_API_KEY not set; text analyses are disabled");
                None
            }
        };

        let state = Self::with_parts(data_source, estimator, embedder);

        match state.load_corpus().await {
            Ok(outcome) => info!("Corpus ready: {:?}", outcome),
            Err(e) => error!("Corpus load failed, continuing without corpus: {}", e),
        }

        Ok(state)
    }

    /// Assemble state without touching the environment or loading anything
    pub fn with_parts(
        data_source: DataSourceConfig,
        estimator: SimilarityEstimator,
        embedder: Option<Arc<dyn Embedder>>,
    ) -> Self {
        Self {
            loader: Arc::new(CorpusLoader::new()),
            estimator,
            data_source,
            embedder,
        }
    }

    /// Load the corpus on the blocking pool; no-op once loaded
    pub async fn load_corpus(&self) -> Result<LoadOutcome, ApiError> {
        let loader = Arc::clone(&self.loader);
        let config = self.data_source.clone();

        let outcome = tokio::task::spawn_blocking(move || loader.load_from(&config))
            .await
            .map_err(|e| ApiError::Internal(anyhow!("Corpus load task failed: {}", e)))??;
        Ok(outcome)
    }
}
