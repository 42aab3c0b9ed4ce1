//! Analytics endpoints: dashboard summary, severity trends, health score

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{ApiClient, ApiResult};
use crate::http::QueryParams;

/// Dashboard counters
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AnalyticsSummary {
    pub total_findings: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
    pub open_findings: usize,
    pub resolved_findings: usize,
    pub fixes_pending: usize,
    pub fixes_approved: usize,
    pub fixes_applied: usize,
    pub repositories: usize,
}

/// Window for trend queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TrendPeriod {
    Week,
    #[default]
    Month,
    Quarter,
}

impl TrendPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendPeriod::Week => "7d",
            TrendPeriod::Month => "30d",
            TrendPeriod::Quarter => "90d",
        }
    }
}

impl std::fmt::Display for TrendPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrendPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "7d" | "week" => Ok(TrendPeriod::Week),
            "30d" | "month" => Ok(TrendPeriod::Month),
            "90d" | "quarter" => Ok(TrendPeriod::Quarter),
            other => Err(format!("unknown period '{}' (use 7d, 30d or 90d)", other)),
        }
    }
}

/// Findings by severity on one day
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TrendPoint {
    pub date: String,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HealthScore {
    pub score: f64,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub structure_score: Option<f64>,
    #[serde(default)]
    pub quality_score: Option<f64>,
    #[serde(default)]
    pub architecture_score: Option<f64>,
    /// Change since the previous analysis
    #[serde(default)]
    pub trend: Option<f64>,
}

impl HealthScore {
    /// Backend grade, or one derived from the score
    pub fn grade(&self) -> String {
        self.grade
            .clone()
            .unwrap_or_else(|| grade_from_score(self.score).to_string())
    }
}

/// Letter grade for a 0-100 score
pub fn grade_from_score(score: f64) -> &'static str {
    if score >= 97.0 {
        "A+"
    } else if score >= 93.0 {
        "A"
    } else if score >= 90.0 {
        "A-"
    } else if score >= 87.0 {
        "B+"
    } else if score >= 83.0 {
        "B"
    } else if score >= 80.0 {
        "B-"
    } else if score >= 77.0 {
        "C+"
    } else if score >= 73.0 {
        "C"
    } else if score >= 70.0 {
        "C-"
    } else if score >= 67.0 {
        "D+"
    } else if score >= 63.0 {
        "D"
    } else if score >= 60.0 {
        "D-"
    } else {
        "F"
    }
}

fn repo_query(repository_id: Option<&str>) -> QueryParams {
    let mut query = QueryParams::new();
    query.push_opt("repository_id", repository_id);
    query
}

/// GET /analytics/summary
pub fn summary(
    api: &ApiClient,
    repository_id: Option<&str>,
) -> ApiResult<AnalyticsSummary> {
    api.get("/analytics/summary", repo_query(repository_id))
}

/// GET /analytics/trends
pub fn trends(
    api: &ApiClient,
    period: TrendPeriod,
    repository_id: Option<&str>,
) -> ApiResult<Vec<TrendPoint>> {
    let mut query = QueryParams::new();
    query
        .push("period", period)
        .push_opt("repository_id", repository_id);
    api.get("/analytics/trends", query)
}

/// GET /analytics/health-score
pub fn health_score(api: &ApiClient, repository_id: Option<&str>) -> ApiResult<HealthScore> {
    api.get("/analytics/health-score", repo_query(repository_id))
}
