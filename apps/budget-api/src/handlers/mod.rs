//! HTTP request handlers for the budget API
//!
//! Provides handlers for:
//! - Health checks with corpus status
//! - Similarity search from precomputed embeddings
//! - Text analyses (embed, then search and estimate)
//! - Corpus (re)loading

use axum::{extract::State, Json};
use budget_corpus::{CorpusStatus, Estimation, LoadOutcome, SimilarProject};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use crate::error::ApiError;
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityRequest {
    pub overview_embedding: Vec<f32>,
    pub situation_embedding: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub project_name: String,
    pub project_overview: String,
    pub current_situation: String,
    #[serde(default)]
    pub initial_budget: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub request_data: AnalysisRequest,
    pub references: Vec<SimilarProject>,
    pub estimated_budget: Option<f64>,
    pub initial_budget: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct CorpusHealth {
    pub loaded: bool,
    pub rows: usize,
    pub dimension: usize,
    pub source: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub corpus: CorpusHealth,
    pub embeddings: String,
}

#[derive(Debug, Serialize)]
pub struct LoadResponse {
    pub outcome: String,
    pub rows: usize,
    pub dimension: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let corpus = match state.loader.status() {
        CorpusStatus::Unloaded => CorpusHealth {
            loaded: false,
            rows: 0,
            dimension: 0,
            source: None,
        },
        CorpusStatus::Loaded {
            rows,
            dimension,
            source,
        } => CorpusHealth {
            loaded: true,
            rows,
            dimension,
            source: source.map(|p| p.display().to_string()),
        },
    };

    let embeddings = match &state.embedder {
        Some(embedder) => format!("configured (model={})", embedder.model()),
        None => "disabled".to_string(),
    };

    Json(HealthResponse {
        status: if corpus.loaded { "ok" } else { "degraded" }.to_string(),
        corpus,
        embeddings,
    })
}

/// Similar projects and budget estimate from precomputed embeddings
pub async fn similarity(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SimilarityRequest>,
) -> Result<Json<Estimation>, ApiError> {
    info!(
        "Similarity search: overview dim={}, situation dim={}",
        request.overview_embedding.len(),
        request.situation_embedding.len()
    );

    let estimation = state.loader.estimate(
        &state.estimator,
        &request.overview_embedding,
        &request.situation_embedding,
    )?;

    Ok(Json(estimation))
}

/// Embed the project texts, then search and estimate
pub async fn analyses(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    info!("Analysis: project='{}'", request.project_name);

    if request.project_overview.trim().is_empty() {
        return Err(ApiError::InvalidRequest("projectOverview must not be empty".to_string()));
    }
    if request.current_situation.trim().is_empty() {
        return Err(ApiError::InvalidRequest("currentSituation must not be empty".to_string()));
    }

    // Fail before paying for embeddings
    if !state.loader.is_loaded() {
        return Err(ApiError::CorpusNotLoaded);
    }

    let embedder = state.embedder.as_ref().ok_or(ApiError::EmbeddingUnavailable)?;

    let overview_embedding = embedder.embed(&request.project_overview).await.map_err(|e| {
        error!("Failed to embed project overview: {}", e);
        ApiError::Embedding(e.to_string())
    })?;
    let situation_embedding = embedder.embed(&request.current_situation).await.map_err(|e| {
        error!("Failed to embed current situation: {}", e);
        ApiError::Embedding(e.to_string())
    })?;

    let estimation = state
        .loader
        .estimate(&state.estimator, &overview_embedding, &situation_embedding)?;

    Ok(Json(AnalysisResponse {
        initial_budget: request.initial_budget,
        request_data: request,
        references: estimation.similar_projects,
        estimated_budget: estimation.predicted_budget,
    }))
}

/// Load the corpus if it is not loaded yet
pub async fn load_corpus(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LoadResponse>, ApiError> {
    let outcome = state.load_corpus().await?;

    let response = match outcome {
        LoadOutcome::Loaded { rows, dimension } => LoadResponse {
            outcome: "loaded".to_string(),
            rows,
            dimension,
        },
        LoadOutcome::AlreadyLoaded => {
            let corpus = state.loader.corpus()?;
            LoadResponse {
                outcome: "already_loaded".to_string(),
                rows: corpus.len(),
                dimension: corpus.dimension(),
            }
        }
    };

    Ok(Json(response))
}
