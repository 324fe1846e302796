//! One-time corpus loading
//!
//! [`CorpusLoader`] owns the process-wide corpus. The first successful load
//! publishes it; later loads are no-ops. Load attempts are serialized by a
//! mutex, while readers go through a `OnceLock` and never lock.

use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use tracing::{info, warn};

use crate::config::DataSourceConfig;
use crate::corpus::Corpus;
use crate::error::{CorpusError, Result};
use crate::search::{Estimation, SimilarityEstimator};
use crate::storage;

/// What a load call did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// This call parsed and published the corpus
    Loaded { rows: usize, dimension: usize },
    /// A corpus was already published; nothing was read
    AlreadyLoaded,
}

/// Snapshot of the loader state, for health reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorpusStatus {
    Unloaded,
    Loaded {
        rows: usize,
        dimension: usize,
        source: Option<PathBuf>,
    },
}

#[derive(Debug, Default)]
pub struct CorpusLoader {
    corpus: OnceLock<Corpus>,
    load_guard: Mutex<()>,
}

impl CorpusLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locate, parse and publish the corpus described by `config`
    ///
    /// Does nothing if a corpus is already published. On error nothing is
    /// published and the loader stays unloaded, so the call may be retried.
    pub fn load_from(&self, config: &DataSourceConfig) -> Result<LoadOutcome> {
        let _guard = self.load_guard.lock().unwrap_or_else(|e| e.into_inner());

        if self.corpus.get().is_some() {
            warn!("Corpus already loaded; skipping load");
            return Ok(LoadOutcome::AlreadyLoaded);
        }

        let path = storage::locate(&config.candidates)?;
        info!("Loading corpus from {}", path.display());

        let table = storage::read_dataset(&path, &config.columns)?;
        let corpus = Corpus::from_table(table, &path)?;

        let outcome = LoadOutcome::Loaded {
            rows: corpus.len(),
            dimension: corpus.dimension(),
        };
        info!(
            "Corpus loaded: {} rows, {} dimensions",
            corpus.len(),
            corpus.dimension()
        );

        self.publish(corpus);
        Ok(outcome)
    }

    /// Publish an already built corpus, with the same no-op rule as loading
    pub fn install(&self, corpus: Corpus) -> LoadOutcome {
        let _guard = self.load_guard.lock().unwrap_or_else(|e| e.into_inner());

        if self.corpus.get().is_some() {
            warn!("Corpus already loaded; ignoring installed corpus");
            return LoadOutcome::AlreadyLoaded;
        }

        let outcome = LoadOutcome::Loaded {
            rows: corpus.len(),
            dimension: corpus.dimension(),
        };
        self.publish(corpus);
        outcome
    }

    // Callers hold load_guard, so the cell is still empty here.
    fn publish(&self, corpus: Corpus) {
        if self.corpus.set(corpus).is_err() {
            warn!("Corpus was published concurrently; keeping the existing one");
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.corpus.get().is_some()
    }

    /// The published corpus, or `NotLoaded`
    pub fn corpus(&self) -> Result<&Corpus> {
        self.corpus.get().ok_or(CorpusError::NotLoaded)
    }

    pub fn status(&self) -> CorpusStatus {
        match self.corpus.get() {
            None => CorpusStatus::Unloaded,
            Some(corpus) => CorpusStatus::Loaded {
                rows: corpus.len(),
                dimension: corpus.dimension(),
                source: corpus.source().map(|p| p.to_path_buf()),
            },
        }
    }

    /// Run an estimate against the published corpus
    ///
    /// Never loads implicitly; returns `NotLoaded` before a successful load.
    pub fn estimate(
        &self,
        estimator: &SimilarityEstimator,
        overview_query: &[f32],
        situation_query: &[f32],
    ) -> Result<Estimation> {
        estimator.estimate(self.corpus()?, overview_query, situation_query)
    }
}
