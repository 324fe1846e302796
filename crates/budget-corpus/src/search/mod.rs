//! Search module - similarity ranking and budget estimation
//!
//! This module provides:
//! - Blended cosine scoring of a query against both corpus matrices
//! - Deterministic top-K selection
//! - Similarity-weighted log-mean budget estimation

pub mod budget;
pub mod vector;

use serde::{Deserialize, Serialize};

use crate::config::EstimatorConfig;
use crate::corpus::Corpus;
use crate::embeddings::normalized;
use crate::error::{CorpusError, Result};
use crate::project::SimilarProject;

/// Result of one estimation query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Estimation {
    /// `None` when no match carries a usable budget
    pub predicted_budget: Option<f64>,
    /// Best matches, highest similarity first
    pub similar_projects: Vec<SimilarProject>,
}

/// Ranks corpus rows against a query and estimates a budget from the best ones
///
/// Holds only configuration; every call is a pure read of the corpus, so one
/// estimator can serve concurrent requests.
#[derive(Debug, Clone, Default)]
pub struct SimilarityEstimator {
    config: EstimatorConfig,
}

impl SimilarityEstimator {
    /// Build an estimator, rejecting configurations it cannot work with
    pub fn new(config: EstimatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Find the projects most similar to the query and estimate its budget
    ///
    /// # Arguments
    ///
    /// * `overview_query` - Embedding of the new project's overview
    /// * `situation_query` - Embedding of its current-situation description
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if either query's length differs from the
    /// corresponding corpus matrix. An empty corpus yields an empty result.
    pub fn estimate(
        &self,
        corpus: &Corpus,
        overview_query: &[f32],
        situation_query: &[f32],
    ) -> Result<Estimation> {
        if corpus.is_empty() {
            tracing::debug!("Estimate requested against an empty corpus");
            return Ok(Estimation::default());
        }

        check_dimension(overview_query, corpus.overview_matrix().dimension())?;
        check_dimension(situation_query, corpus.situation_matrix().dimension())?;

        let overview_query = normalized(overview_query);
        let situation_query = normalized(situation_query);

        let scores = vector::blended_scores(
            corpus.overview_matrix(),
            corpus.situation_matrix(),
            &overview_query,
            &situation_query,
            self.config.overview_weight,
            self.config.situation_weight,
        );

        let picked = vector::top_k(&scores, self.config.top_k);
        tracing::debug!(
            "Selected {} of {} corpus rows (top_k={})",
            picked.len(),
            corpus.len(),
            self.config.top_k
        );

        let mut usable = Vec::with_capacity(picked.len());
        let mut similar_projects = Vec::with_capacity(picked.len());

        let rows = corpus.rows();
        for &(index, similarity) in &picked {
            let record = &rows[index];
            if let Some(budget) = record.usable_budget() {
                usable.push((similarity, budget));
            }
            similar_projects.push(SimilarProject::from_record(record, similarity));
        }

        let predicted_budget = budget::estimate_budget(&usable, self.config.temperature);
        if predicted_budget.is_none() {
            tracing::warn!(
                "No usable budget among {} matches; returning matches without an estimate",
                similar_projects.len()
            );
        }

        Ok(Estimation {
            predicted_budget,
            similar_projects,
        })
    }
}

fn check_dimension(query: &[f32], corpus: usize) -> Result<()> {
    if query.len() != corpus {
        return Err(CorpusError::DimensionMismatch {
            query: query.len(),
            corpus,
        });
    }
    Ok(())
}
