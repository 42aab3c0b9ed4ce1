//! Core data models for the Repotoire cloud API
//!
//! These models mirror the JSON the backend returns for findings, fix
//! proposals and paginated collections. Resource-specific payloads
//! (billing, marketplace, analytics) live next to their API module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Severity levels for findings
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            "info" => Ok(Severity::Info),
            other => Err(format!("unknown severity '{}'", other)),
        }
    }
}

/// Triage status of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FindingStatus {
    #[default]
    Open,
    Acknowledged,
    InProgress,
    Resolved,
    Wontfix,
    FalsePositive,
}

impl FindingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingStatus::Open => "open",
            FindingStatus::Acknowledged => "acknowledged",
            FindingStatus::InProgress => "in_progress",
            FindingStatus::Resolved => "resolved",
            FindingStatus::Wontfix => "wontfix",
            FindingStatus::FalsePositive => "false_positive",
        }
    }
}

impl std::fmt::Display for FindingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FindingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "open" => Ok(FindingStatus::Open),
            "acknowledged" => Ok(FindingStatus::Acknowledged),
            "in_progress" => Ok(FindingStatus::InProgress),
            "resolved" => Ok(FindingStatus::Resolved),
            "wontfix" => Ok(FindingStatus::Wontfix),
            "false_positive" => Ok(FindingStatus::FalsePositive),
            other => Err(format!("unknown finding status '{}'", other)),
        }
    }
}

/// A code-quality issue detected by the analysis backend
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Finding {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub detector: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub status: FindingStatus,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub affected_files: Vec<PathBuf>,
    #[serde(default)]
    pub line_start: Option<u32>,
    #[serde(default)]
    pub line_end: Option<u32>,
    #[serde(default)]
    pub suggested_fix: Option<String>,
    #[serde(default)]
    pub estimated_effort: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub cwe_id: Option<String>,
    #[serde(default)]
    pub why_it_matters: Option<String>,
    #[serde(default)]
    pub repository_id: Option<String>,
    #[serde(default)]
    pub analysis_run_id: Option<String>,
    #[serde(default)]
    pub status_reason: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Summary of findings by severity
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FindingsSummary {
    #[serde(default)]
    pub critical: usize,
    #[serde(default)]
    pub high: usize,
    #[serde(default)]
    pub medium: usize,
    #[serde(default)]
    pub low: usize,
    #[serde(default)]
    pub info: usize,
    #[serde(default)]
    pub total: usize,
}

impl FindingsSummary {
    pub fn from_findings(findings: &[Finding]) -> Self {
        let mut summary = Self::default();
        for f in findings {
            match f.severity {
                Severity::Critical => summary.critical += 1,
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
                Severity::Info => summary.info += 1,
            }
            summary.total += 1;
        }
        summary
    }

    pub fn count(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
            Severity::Info => self.info,
        }
    }
}

/// Confidence level of a generated fix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixConfidence {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for FixConfidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FixConfidence::High => write!(f, "high"),
            FixConfidence::Medium => write!(f, "medium"),
            FixConfidence::Low => write!(f, "low"),
        }
    }
}

impl FromStr for FixConfidence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" => Ok(FixConfidence::High),
            "medium" => Ok(FixConfidence::Medium),
            "low" => Ok(FixConfidence::Low),
            other => Err(format!("unknown confidence '{}'", other)),
        }
    }
}

/// Review workflow state of a fix proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FixStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Applied,
    Failed,
    Stale,
}

impl FixStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FixStatus::Pending => "pending",
            FixStatus::Approved => "approved",
            FixStatus::Rejected => "rejected",
            FixStatus::Applied => "applied",
            FixStatus::Failed => "failed",
            FixStatus::Stale => "stale",
        }
    }
}

impl std::fmt::Display for FixStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FixStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(FixStatus::Pending),
            "approved" => Ok(FixStatus::Approved),
            "rejected" => Ok(FixStatus::Rejected),
            "applied" => Ok(FixStatus::Applied),
            "failed" => Ok(FixStatus::Failed),
            "stale" => Ok(FixStatus::Stale),
            other => Err(format!("unknown fix status '{}'", other)),
        }
    }
}

/// A single code change within a fix
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CodeChange {
    pub file_path: PathBuf,
    #[serde(default)]
    pub original_code: String,
    #[serde(default)]
    pub fixed_code: String,
    #[serde(default)]
    pub start_line: u32,
    #[serde(default)]
    pub end_line: u32,
    #[serde(default)]
    pub description: String,
}

/// An AI-generated change addressing one or more findings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FixProposal {
    pub id: String,
    #[serde(default)]
    pub finding_ids: Vec<String>,
    #[serde(default)]
    pub repository_id: Option<String>,
    #[serde(default)]
    pub fix_type: Option<String>,
    pub confidence: FixConfidence,
    #[serde(default)]
    pub status: FixStatus,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub changes: Vec<CodeChange>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl FixProposal {
    /// Unified diff of the proposed changes
    pub fn diff(&self) -> String {
        let mut diff = String::new();

        for change in &self.changes {
            diff.push_str(&format!("--- a/{}\n", change.file_path.display()));
            diff.push_str(&format!("+++ b/{}\n", change.file_path.display()));
            diff.push_str(&format!(
                "@@ -{},{} +{},{} @@\n",
                change.start_line,
                change.end_line.saturating_add(1).saturating_sub(change.start_line),
                change.start_line,
                change.fixed_code.lines().count()
            ));
            for line in change.original_code.lines() {
                diff.push_str(&format!("-{}\n", line));
            }
            for line in change.fixed_code.lines() {
                diff.push_str(&format!("+{}\n", line));
            }
            diff.push('\n');
        }

        diff
    }
}

/// Sort direction for list endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

/// Pagination and sort state shared by every list endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListParams {
    /// 1-indexed
    pub page: u32,
    pub page_size: u32,
    pub sort_by: Option<String>,
    pub sort_direction: SortDirection,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
            sort_by: None,
            sort_direction: SortDirection::Desc,
        }
    }
}

impl ListParams {
    pub fn page(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size,
            ..Default::default()
        }
    }

    pub fn sorted_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_by = Some(field.into());
        self.sort_direction = direction;
        self
    }
}

/// One page of a collection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub total: usize,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub has_more: bool,
}

fn first_page() -> u32 {
    1
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> usize {
        if self.page_size == 0 {
            return 1;
        }
        self.total.div_ceil(self.page_size as usize).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_severity_ordering_and_parse() {
        assert!(Severity::Critical > Severity::High);
        assert_eq!("CRITICAL".parse::<Severity>().unwrap(), Severity::Critical);
        assert!("urgent".parse::<Severity>().is_err());
    }

    #[test]
    fn test_finding_status_wire_names() {
        assert_eq!(
            serde_json::to_value(FindingStatus::FalsePositive).unwrap(),
            json!("false_positive")
        );
        assert_eq!(
            "won't".parse::<FindingStatus>().unwrap_err(),
            "unknown finding status 'won't'"
        );
        assert_eq!(
            "in-progress".parse::<FindingStatus>().unwrap(),
            FindingStatus::InProgress
        );
    }

    #[test]
    fn test_finding_tolerates_sparse_payload() {
        let f: Finding = serde_json::from_value(json!({
            "id": "f1",
            "severity": "high",
            "detector": "BanditDetector"
        }))
        .unwrap();
        assert_eq!(f.status, FindingStatus::Open);
        assert!(f.affected_files.is_empty());
    }

    #[test]
    fn test_summary_from_findings() {
        let findings = vec![
            Finding {
                severity: Severity::Critical,
                ..Default::default()
            },
            Finding {
                severity: Severity::Low,
                ..Default::default()
            },
        ];
        let s = FindingsSummary::from_findings(&findings);
        assert_eq!(s.count(Severity::Critical), 1);
        assert_eq!(s.low, 1);
        assert_eq!(s.total, 2);
    }

    #[test]
    fn test_fix_diff() {
        let fix = FixProposal {
            id: "fx".into(),
            finding_ids: vec!["f1".into()],
            repository_id: None,
            fix_type: None,
            confidence: FixConfidence::High,
            status: FixStatus::Pending,
            title: String::new(),
            description: String::new(),
            rationale: String::new(),
            changes: vec![CodeChange {
                file_path: "app.py".into(),
                original_code: "eval(x)".into(),
                fixed_code: "ast.literal_eval(x)".into(),
                start_line: 3,
                end_line: 3,
                description: String::new(),
            }],
            created_at: None,
        };
        let diff = fix.diff();
        assert!(diff.contains("@@ -3,1 +3,1 @@"));
        assert!(diff.contains("-eval(x)\n+ast.literal_eval(x)"));
    }

    #[test]
    fn test_fix_diff_with_extreme_line_numbers() {
        let fix: FixProposal = serde_json::from_value(json!({
            "id": "fx",
            "confidence": "high",
            "changes": [{
                "file_path": "gen.py",
                "fixed_code": "pass",
                "start_line": 1,
                "end_line": u32::MAX
            }]
        }))
        .unwrap();
        let diff = fix.diff();
        assert!(diff.contains(&format!("@@ -1,{} +1,1 @@", u32::MAX - 1)));
    }

    #[test]
    fn test_page_total_pages() {
        let page: Page<u8> = Page {
            items: vec![],
            total: 41,
            page: 1,
            page_size: 20,
            has_more: true,
        };
        assert_eq!(page.total_pages(), 3);
    }
}
