//! Repository and analysis-run endpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{list_query, seg, ApiClient, ApiResult};
use crate::http::QueryParams;
use crate::models::{ListParams, Page};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Repository {
    pub id: String,
    pub full_name: String,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub health_score: Option<f64>,
    #[serde(default)]
    pub findings_count: usize,
    #[serde(default)]
    pub last_analyzed_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

/// Lifecycle of an analysis run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    #[default]
    Queued,
    Running,
    Completed,
    Failed,
}

impl AnalysisStatus {
    /// Completed and failed runs never change again
    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisStatus::Completed | AnalysisStatus::Failed)
    }
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisStatus::Queued => write!(f, "queued"),
            AnalysisStatus::Running => write!(f, "running"),
            AnalysisStatus::Completed => write!(f, "completed"),
            AnalysisStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisRun {
    pub id: String,
    #[serde(default)]
    pub repository_id: String,
    #[serde(default)]
    pub status: AnalysisStatus,
    #[serde(default)]
    pub progress_percent: u8,
    #[serde(default)]
    pub current_step: Option<String>,
    #[serde(default)]
    pub findings_count: Option<usize>,
    #[serde(default)]
    pub health_score: Option<f64>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct ConnectBody<'a> {
    full_name: &'a str,
}

/// GET /repositories
pub fn list_repositories(api: &ApiClient, params: &ListParams) -> ApiResult<Page<Repository>> {
    let mut query = QueryParams::new();
    list_query(params, &mut query);
    api.get("/repositories", query)
}

/// GET /repositories/{id}
pub fn get_repository(api: &ApiClient, id: &str) -> ApiResult<Repository> {
    api.get(&format!("/repositories/{}", seg(id)), QueryParams::new())
}

/// POST /repositories
pub fn connect_repository(api: &ApiClient, full_name: &str) -> ApiResult<Repository> {
    api.post("/repositories", &ConnectBody { full_name })
}

/// DELETE /repositories/{id}
pub fn remove_repository(api: &ApiClient, id: &str) -> ApiResult<()> {
    api.delete(&format!("/repositories/{}", seg(id)))
}

/// POST /repositories/{id}/analyze
pub fn trigger_analysis(api: &ApiClient, repository_id: &str) -> ApiResult<AnalysisRun> {
    api.post_empty(&format!("/repositories/{}/analyze", seg(repository_id)))
}

/// GET /analysis/{run_id}/status
pub fn analysis_status(api: &ApiClient, run_id: &str) -> ApiResult<AnalysisRun> {
    api.get(&format!("/analysis/{}/status", seg(run_id)), QueryParams::new())
}

/// GET /repositories/{id}/analyses
pub fn analysis_history(
    api: &ApiClient,
    repository_id: &str,
    params: &ListParams,
) -> ApiResult<Page<AnalysisRun>> {
    let mut query = QueryParams::new();
    list_query(params, &mut query);
    api.get(
        &format!("/repositories/{}/analyses", seg(repository_id)),
        query,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::mock::MockTransport;
    use crate::http::{ClientContext, Method};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_terminal_states() {
        assert!(!AnalysisStatus::Queued.is_terminal());
        assert!(!AnalysisStatus::Running.is_terminal());
        assert!(AnalysisStatus::Completed.is_terminal());
        assert!(AnalysisStatus::Failed.is_terminal());
    }

    #[test]
    fn test_status_endpoint() {
        let mock = Arc::new(MockTransport::new());
        mock.on(
            Method::Get,
            "/api/v1/analysis/run-1/status",
            json!({"id": "run-1", "status": "running", "progress_percent": 40}),
        );
        let api = ApiClient::new(ClientContext::anonymous("http://test"), mock.clone());
        let run = analysis_status(&api, "run-1").unwrap();
        assert_eq!(run.status, AnalysisStatus::Running);
        assert_eq!(run.progress_percent, 40);
    }

    #[test]
    fn test_remove_accepts_empty_body() {
        let mock = Arc::new(MockTransport::new());
        mock.on_raw(Method::Delete, "/api/v1/repositories/r1", 204, "");
        let api = ApiClient::new(ClientContext::anonymous("http://test"), mock.clone());
        remove_repository(&api, "r1").unwrap();
    }
}
