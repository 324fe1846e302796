//! Error types for the budget API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use budget_corpus::CorpusError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Corpus is not loaded")]
    CorpusNotLoaded,

    #[error("Dimension mismatch: query has {query} dimensions, corpus has {corpus}")]
    DimensionMismatch { query: usize, corpus: usize },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Embedding provider is not configured")]
    EmbeddingUnavailable,

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Corpus error: {0}")]
    Corpus(CorpusError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<CorpusError> for ApiError {
    fn from(err: CorpusError) -> Self {
        match err {
            CorpusError::NotLoaded => ApiError::CorpusNotLoaded,
            CorpusError::DimensionMismatch { query, corpus } => {
                ApiError::DimensionMismatch { query, corpus }
            }
            other => ApiError::Corpus(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::CorpusNotLoaded => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Corpus is not loaded".to_string(),
            ),
            ApiError::DimensionMismatch { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.to_string())
            }
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::EmbeddingUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Embedding provider is not configured".to_string(),
            ),
            ApiError::Embedding(e) => {
                tracing::error!("Embedding error: {}", e);
                (StatusCode::BAD_GATEWAY, "Failed to compute embeddings".to_string())
            }
            ApiError::Corpus(e) => {
                tracing::error!("Corpus error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
