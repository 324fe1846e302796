//! Configuration for the corpus system
//!
//! Covers where the historical dataset lives, which columns hold what, and the
//! tuning knobs of the similarity estimator.

use std::path::{Path, PathBuf};

use crate::error::{CorpusError, Result};

/// Default number of matches returned per query
pub const DEFAULT_TOP_K: usize = 5;

/// Default softmax temperature used to weight budgets
pub const DEFAULT_TEMPERATURE: f64 = 0.08;

/// Default blend weight for both the overview and the situation similarity
pub const DEFAULT_BLEND_WEIGHT: f32 = 0.5;

/// Dataset file names, in probe order. Parquet is preferred over CSV.
const PARQUET_FILE: &str = "final.parquet";
const CSV_FILE: &str = "final_2024.csv";

/// Names of the dataset columns the loader reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub project_id: String,
    pub project_name: String,
    pub ministry: String,
    pub initial_budget: String,
    pub overview: String,
    pub url: String,
    /// Embedding of the project overview text
    pub overview_embedding: String,
    /// Embedding of the current-situation text
    pub situation_embedding: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            project_id: "予算事業ID".to_string(),
            project_name: "事業名".to_string(),
            ministry: "府省庁".to_string(),
            initial_budget: "当初予算".to_string(),
            overview: "事業の概要".to_string(),
            url: "事業概要URL".to_string(),
            overview_embedding: "embedding_sum".to_string(),
            situation_embedding: "embedding_ass".to_string(),
        }
    }
}

/// Where to find the corpus dataset and how to read it
#[derive(Debug, Clone)]
pub struct DataSourceConfig {
    /// Candidate dataset paths, probed in order
    pub candidates: Vec<PathBuf>,
    pub columns: ColumnMapping,
}

impl DataSourceConfig {
    /// Standard candidate list rooted at `base_dir`
    ///
    /// Every Parquet location is probed before any CSV location.
    pub fn with_defaults(base_dir: &Path) -> Self {
        let parent = base_dir.join("..");
        let dirs = [base_dir.to_path_buf(), base_dir.join("data"), parent.join("data")];

        let mut candidates: Vec<PathBuf> = dirs.iter().map(|d| d.join(PARQUET_FILE)).collect();
        candidates.extend(dirs.iter().map(|d| d.join(CSV_FILE)));

        Self {
            candidates,
            columns: ColumnMapping::default(),
        }
    }

    /// Configuration pointing at exactly one dataset file
    pub fn single(path: impl Into<PathBuf>) -> Self {
        Self {
            candidates: vec![path.into()],
            columns: ColumnMapping::default(),
        }
    }

    /// Override the column mapping
    pub fn with_columns(mut self, columns: ColumnMapping) -> Self {
        self.columns = columns;
        self
    }

    /// Load configuration from environment variables
    ///
    /// Expected variables:
    /// - BUDGET_CORPUS_PATH: explicit dataset path(s), joined with the platform
    ///   path separator; replaces the default candidate list
    /// - BUDGET_CORPUS_DIR: base directory for the default candidates
    ///   (default: current directory)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`DataSourceConfig::from_env`] with an injectable variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(paths) = lookup("BUDGET_CORPUS_PATH").filter(|p| !p.trim().is_empty()) {
            let candidates: Vec<PathBuf> = std::env::split_paths(&paths).collect();
            return Self {
                candidates,
                columns: ColumnMapping::default(),
            };
        }

        let base_dir = lookup("BUDGET_CORPUS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        Self::with_defaults(&base_dir)
    }
}

/// Tuning parameters of the similarity estimator
#[derive(Debug, Clone, PartialEq)]
pub struct EstimatorConfig {
    /// Maximum number of matches returned
    pub top_k: usize,
    /// Softmax temperature applied to match similarities
    pub temperature: f64,
    pub overview_weight: f32,
    pub situation_weight: f32,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            temperature: DEFAULT_TEMPERATURE,
            overview_weight: DEFAULT_BLEND_WEIGHT,
            situation_weight: DEFAULT_BLEND_WEIGHT,
        }
    }
}

impl EstimatorConfig {
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_weights(mut self, overview: f32, situation: f32) -> Self {
        self.overview_weight = overview;
        self.situation_weight = situation;
        self
    }

    /// Reject values the estimator cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(CorpusError::Config("top_k must be at least 1".to_string()));
        }
        if !self.temperature.is_finite() || self.temperature <= 0.0 {
            return Err(CorpusError::Config(format!(
                "temperature must be a positive number, got {}",
                self.temperature
            )));
        }
        for (name, weight) in [
            ("overview_weight", self.overview_weight),
            ("situation_weight", self.situation_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(CorpusError::Config(format!(
                    "{} must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }
        Ok(())
    }

    /// Load estimator settings from environment variables
    ///
    /// Expected variables (all optional):
    /// - BUDGET_TOP_K
    /// - BUDGET_TEMPERATURE
    /// - BUDGET_OVERVIEW_WEIGHT
    /// - BUDGET_SITUATION_WEIGHT
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EstimatorConfig::from_env`] with an injectable variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            top_k: parse_var(&lookup, "BUDGET_TOP_K")?.unwrap_or(defaults.top_k),
            temperature: parse_var(&lookup, "BUDGET_TEMPERATURE")?
                .unwrap_or(defaults.temperature),
            overview_weight: parse_var(&lookup, "BUDGET_OVERVIEW_WEIGHT")?
                .unwrap_or(defaults.overview_weight),
            situation_weight: parse_var(&lookup, "BUDGET_SITUATION_WEIGHT")?
                .unwrap_or(defaults.situation_weight),
        };

        config.validate()?;
        Ok(config)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| CorpusError::Config(format!("{}={:?}: {}", key, raw, e))),
    }
}
