use serde::{Deserialize, Serialize};

/// Placeholder shown when a project has no overview text
pub const MISSING_OVERVIEW: &str = "情報なし";

/// Historical spending project, one per corpus row
///
/// Missing text fields are already defaulted when the row is parsed; only the
/// budget stays optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub project_id: String,
    pub project_name: String,
    pub ministry_name: String,
    /// Initial budget; `None` when missing or not a finite number
    pub initial_budget: Option<f64>,
    pub overview: String,
    pub url: String,
}

impl ProjectRecord {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            project_name: String::new(),
            ministry_name: String::new(),
            initial_budget: None,
            overview: MISSING_OVERVIEW.to_string(),
            url: String::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = name.into();
        self
    }

    pub fn with_ministry(mut self, ministry: impl Into<String>) -> Self {
        self.ministry_name = ministry.into();
        self
    }

    pub fn with_budget(mut self, budget: Option<f64>) -> Self {
        self.initial_budget = budget.filter(|b| b.is_finite());
        self
    }

    pub fn with_overview(mut self, overview: impl Into<String>) -> Self {
        self.overview = overview.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Budget usable for estimation: finite and strictly positive
    pub fn usable_budget(&self) -> Option<f64> {
        self.initial_budget.filter(|b| b.is_finite() && *b > 0.0)
    }
}

/// One ranked match returned by the estimator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarProject {
    pub project_id: String,
    pub project_name: String,
    pub ministry_name: String,
    pub budget: Option<f64>,
    /// Blended cosine similarity to the query
    pub similarity: f32,
    pub project_overview: String,
    pub project_url: String,
}

impl SimilarProject {
    pub fn from_record(record: &ProjectRecord, similarity: f32) -> Self {
        Self {
            project_id: record.project_id.clone(),
            project_name: record.project_name.clone(),
            ministry_name: record.ministry_name.clone(),
            budget: record.initial_budget.filter(|b| b.is_finite()),
            similarity,
            project_overview: record.overview.clone(),
            project_url: record.url.clone(),
        }
    }
}
