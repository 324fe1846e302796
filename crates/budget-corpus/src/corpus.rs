use std::path::{Path, PathBuf};

use crate::embeddings::EmbeddingMatrix;
use crate::error::{CorpusError, Result};
use crate::project::ProjectRecord;
use crate::storage::DatasetTable;

/// In-memory corpus: project rows plus their two normalized embedding matrices
///
/// Row `i` of `rows`, `overview` and `situation` always describe the same
/// project. Immutable once built.
#[derive(Debug, Clone)]
pub struct Corpus {
    rows: Vec<ProjectRecord>,
    overview: EmbeddingMatrix,
    situation: EmbeddingMatrix,
    source: Option<PathBuf>,
}

impl Corpus {
    /// Build a corpus from rows and raw embedding vectors
    ///
    /// Vectors are L2-normalized. Fails if the three inputs are not the same
    /// length or if any vector is empty or has the wrong dimension.
    pub fn from_parts(
        rows: Vec<ProjectRecord>,
        overview_vectors: Vec<Vec<f32>>,
        situation_vectors: Vec<Vec<f32>>,
    ) -> Result<Self> {
        if overview_vectors.len() != rows.len() || situation_vectors.len() != rows.len() {
            return Err(CorpusError::load(format!(
                "misaligned corpus: {} rows, {} overview vectors, {} situation vectors",
                rows.len(),
                overview_vectors.len(),
                situation_vectors.len()
            )));
        }

        let overview = EmbeddingMatrix::from_rows(overview_vectors)
            .map_err(|e| e.context("overview embeddings"))?;
        let situation = EmbeddingMatrix::from_rows(situation_vectors)
            .map_err(|e| e.context("situation embeddings"))?;

        Ok(Self {
            rows,
            overview,
            situation,
            source: None,
        })
    }

    pub(crate) fn from_table(table: DatasetTable, source: &Path) -> Result<Self> {
        let mut corpus =
            Self::from_parts(table.rows, table.overview_vectors, table.situation_vectors)?;
        corpus.source = Some(source.to_path_buf());
        Ok(corpus)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Embedding dimension, taken from the overview matrix
    ///
    /// The situation matrix may have its own dimension; query vectors are
    /// checked against each matrix separately.
    pub fn dimension(&self) -> usize {
        self.overview.dimension()
    }

    pub fn rows(&self) -> &[ProjectRecord] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&ProjectRecord> {
        self.rows.get(index)
    }

    pub fn overview_matrix(&self) -> &EmbeddingMatrix {
        &self.overview
    }

    pub fn situation_matrix(&self) -> &EmbeddingMatrix {
        &self.situation
    }

    /// Dataset file the corpus was read from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}
