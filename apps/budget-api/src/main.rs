//! Budget API - HTTP API for similar-project search and budget estimation
//!
//! Provides REST endpoints for:
//! - Similarity search from precomputed embeddings
//! - Text analyses backed by an embeddings provider
//! - Corpus status and (re)loading

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

mod embeddings;
mod error;
mod handlers;
mod state;

use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("budget_api=info".parse()?)
                .add_directive("budget_corpus=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    // Initialize application state
    info!("Initializing Budget API...");
    let state = AppState::new().await?;
    let state = Arc::new(state);

    let app = router(state);

    // Parse bind address
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting Budget API on http://{}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    // CORS configuration for web clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Estimation endpoints
        .route("/api/v1/similarity", post(handlers::similarity))
        .route("/api/v1/analyses", post(handlers::analyses))
        // Corpus management
        .route("/admin/corpus/load", post(handlers::load_corpus))
        // Add middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::Embedder;
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use budget_corpus::{
        Corpus, DataSourceConfig, EstimatorConfig, ProjectRecord, SimilarityEstimator,
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::io::Write;
    use tower::ServiceExt;

    struct FixedEmbedder(Vec<f32>);

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
            Ok(self.0.clone())
        }

        fn model(&self) -> &str {
            "fixed"
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
            Err(anyhow::anyhow!("provider down"))
        }

        fn model(&self) -> &str {
            "failing"
        }
    }

    fn sample_corpus() -> Corpus {
        let rows = vec![
            ProjectRecord::new("0001")
                .with_name("防災情報システム")
                .with_ministry("総務省")
                .with_budget(Some(100.0)),
            ProjectRecord::new("0002")
                .with_name("港湾整備")
                .with_ministry("国土交通省")
                .with_budget(Some(10_000.0)),
            ProjectRecord::new("0003").with_name("予算なし事業"),
        ];
        let vectors = vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ];
        Corpus::from_parts(rows, vectors.clone(), vectors).unwrap()
    }

    fn test_state(embedder: Option<Arc<dyn Embedder>>, loaded: bool) -> Arc<AppState> {
        let estimator = SimilarityEstimator::new(EstimatorConfig::default().with_top_k(2)).unwrap();
        let state = AppState::with_parts(
            DataSourceConfig::single("/nonexistent/budget.csv"),
            estimator,
            embedder,
        );
        if loaded {
            state.loader.install(sample_corpus());
        }
        Arc::new(state)
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn similarity_body(overview: Vec<f32>, situation: Vec<f32>) -> Value {
        json!({ "overviewEmbedding": overview, "situationEmbedding": situation })
    }

    fn analysis_body(overview: &str, situation: &str) -> Value {
        json!({
            "projectName": "新規防災事業",
            "projectOverview": overview,
            "currentSituation": situation,
            "initialBudget": 120.0,
        })
    }

    // ============================================================================
    // Health
    // ============================================================================

    #[tokio::test]
    async fn test_health_reports_unloaded_corpus() {
        let app = router(test_state(None, false));
        let (status, body) = send(app, "GET", "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["corpus"]["loaded"], false);
        assert_eq!(body["embeddings"], "disabled");
    }

    #[tokio::test]
    async fn test_health_reports_loaded_corpus() {
        let embedder: Arc<dyn Embedder> = Arc::new(FixedEmbedder(vec![1.0, 0.0, 0.0]));
        let app = router(test_state(Some(embedder), true));
        let (status, body) = send(app, "GET", "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["corpus"]["rows"], 3);
        assert_eq!(body["corpus"]["dimension"], 3);
        assert_eq!(body["embeddings"], "configured (model=fixed)");
    }

    // ============================================================================
    // Similarity
    // ============================================================================

    #[tokio::test]
    async fn test_similarity_ranks_and_estimates() {
        let app = router(test_state(None, true));
        let body = similarity_body(vec![2.0, 0.0, 0.0], vec![1.0, 0.0, 0.0]);
        let (status, body) = send(app, "POST", "/api/v1/similarity", Some(body)).await;

        assert_eq!(status, StatusCode::OK);
        let matches = body["similar_projects"].as_array().unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0]["project_id"], "0001");
        // Zero-similarity tie resolves to the lower row
        assert_eq!(matches[1]["project_id"], "0002");

        let predicted = body["predicted_budget"].as_f64().unwrap();
        assert!(predicted >= 100.0 && predicted < 200.0, "predicted {}", predicted);
    }

    #[tokio::test]
    async fn test_similarity_without_corpus_is_unavailable() {
        let app = router(test_state(None, false));
        let body = similarity_body(vec![1.0, 0.0, 0.0], vec![1.0, 0.0, 0.0]);
        let (status, body) = send(app, "POST", "/api/v1/similarity", Some(body)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], 503);
    }

    #[tokio::test]
    async fn test_similarity_dimension_mismatch() {
        let app = router(test_state(None, true));
        let body = similarity_body(vec![1.0, 0.0, 0.0, 0.0], vec![1.0, 0.0, 0.0]);
        let (status, _) = send(app, "POST", "/api/v1/similarity", Some(body)).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    // ============================================================================
    // Analyses
    // ============================================================================

    #[tokio::test]
    async fn test_analyses_echoes_request_and_estimates() {
        let embedder: Arc<dyn Embedder> = Arc::new(FixedEmbedder(vec![1.0, 0.0, 0.0]));
        let app = router(test_state(Some(embedder), true));
        let body = analysis_body("避難情報を配信する", "紙で運用している");
        let (status, body) = send(app, "POST", "/api/v1/analyses", Some(body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["request_data"]["projectName"], "新規防災事業");
        assert_eq!(body["initial_budget"], 120.0);
        assert_eq!(body["references"][0]["project_id"], "0001");
        assert_eq!(body["references"][0]["ministry_name"], "総務省");
        assert!(body["estimated_budget"].as_f64().is_some());
    }

    #[tokio::test]
    async fn test_analyses_rejects_blank_text() {
        let embedder: Arc<dyn Embedder> = Arc::new(FixedEmbedder(vec![1.0, 0.0, 0.0]));
        let app = router(test_state(Some(embedder), true));
        let body = analysis_body("   ", "紙で運用している");
        let (status, _) = send(app, "POST", "/api/v1/analyses", Some(body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_analyses_without_embedder_is_unavailable() {
        let app = router(test_state(None, true));
        let body = analysis_body("避難情報を配信する", "紙で運用している");
        let (status, _) = send(app, "POST", "/api/v1/analyses", Some(body)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_analyses_embedding_failure_is_bad_gateway() {
        let embedder: Arc<dyn Embedder> = Arc::new(FailingEmbedder);
        let app = router(test_state(Some(embedder), true));
        let body = analysis_body("避難情報を配信する", "紙で運用している");
        let (status, _) = send(app, "POST", "/api/v1/analyses", Some(body)).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    // ============================================================================
    // Corpus loading
    // ============================================================================

    #[tokio::test]
    async fn test_load_when_already_loaded() {
        let app = router(test_state(None, true));
        let (status, body) = send(app, "POST", "/admin/corpus/load", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "already_loaded");
        assert_eq!(body["rows"], 3);
    }

    #[tokio::test]
    async fn test_load_failure_can_be_retried() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("budget.csv");
        let state = Arc::new(AppState::with_parts(
            DataSourceConfig::single(&path),
            SimilarityEstimator::default(),
            None,
        ));

        let (status, _) = send(router(state.clone()), "POST", "/admin/corpus/load", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!state.loader.is_loaded());

        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "予算事業ID,事業名,府省庁,当初予算,事業の概要,事業概要URL,embedding_sum,embedding_ass"
        )
        .unwrap();
        writeln!(file, "0001,事業A,総務省,100,概要A,,\"[1.0, 0.0]\",\"[0.0, 1.0]\"").unwrap();
        writeln!(file, "0002,事業B,総務省,,概要B,,\"[0.5, 0.5]\",\"[1.0, 0.0]\"").unwrap();
        drop(file);

        let (status, body) = send(router(state.clone()), "POST", "/admin/corpus/load", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "loaded");
        assert_eq!(body["rows"], 2);
        assert_eq!(body["dimension"], 2);
    }
}
