//! Fix proposal endpoints: listing, review workflow, sandbox preview, comments

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{list_query, seg, ApiClient, ApiResult};
use crate::http::QueryParams;
use crate::models::{FixConfidence, FixProposal, FixStatus, ListParams, Page};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FixFilters {
    pub status: Option<FixStatus>,
    pub confidence: Option<FixConfidence>,
    pub repository_id: Option<String>,
    pub finding_id: Option<String>,
    pub search: Option<String>,
}

impl FixFilters {
    pub fn status(mut self, status: FixStatus) -> Self {
        self.status = Some(status);
        self
    }

    fn append_to(&self, query: &mut QueryParams) {
        query
            .push_opt("status", self.status)
            .push_opt("confidence", self.confidence)
            .push_opt("repository_id", self.repository_id.as_deref())
            .push_opt("finding_id", self.finding_id.as_deref())
            .push_opt("search", self.search.as_deref());
    }
}

/// Counts per review state
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FixStats {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub applied: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FixComment {
    pub id: String,
    #[serde(default)]
    pub fix_id: String,
    #[serde(default)]
    pub author: Option<String>,
    pub content: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// One sandbox check from a preview run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreviewCheck {
    pub name: String,
    pub passed: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Result of running a fix in the verification sandbox
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PreviewResult {
    pub success: bool,
    pub checks: Vec<PreviewCheck>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub duration_ms: Option<u64>,
}

impl PreviewResult {
    pub fn failed_checks(&self) -> impl Iterator<Item = &PreviewCheck> {
        self.checks.iter().filter(|c| !c.passed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchAction {
    Approve,
    Reject,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BatchResult {
    pub processed: usize,
    pub failed: Vec<String>,
}

#[derive(Serialize)]
struct ReasonBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

#[derive(Serialize)]
struct BatchBody<'a> {
    fix_ids: &'a [String],
    action: BatchAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

#[derive(Serialize)]
struct CommentBody<'a> {
    content: &'a str,
}

/// GET /fixes
pub fn list_fixes(
    api: &ApiClient,
    filters: &FixFilters,
    params: &ListParams,
) -> ApiResult<Page<FixProposal>> {
    let mut query = QueryParams::new();
    filters.append_to(&mut query);
    list_query(params, &mut query);
    api.get("/fixes", query)
}

/// GET /fixes/{id}
pub fn get_fix(api: &ApiClient, id: &str) -> ApiResult<FixProposal> {
    api.get(&format!("/fixes/{}", seg(id)), QueryParams::new())
}

/// GET /fixes/stats
pub fn fix_stats(api: &ApiClient, repository_id: Option<&str>) -> ApiResult<FixStats> {
    let mut query = QueryParams::new();
    query.push_opt("repository_id", repository_id);
    api.get("/fixes/stats", query)
}

/// POST /fixes/{id}/approve
pub fn approve_fix(api: &ApiClient, id: &str) -> ApiResult<FixProposal> {
    api.post_empty(&format!("/fixes/{}/approve", seg(id)))
}

/// POST /fixes/{id}/reject
pub fn reject_fix(api: &ApiClient, id: &str, reason: Option<&str>) -> ApiResult<FixProposal> {
    api.post(
        &format!("/fixes/{}/reject", seg(id)),
        &ReasonBody { reason },
    )
}

/// POST /fixes/{id}/apply
pub fn apply_fix(api: &ApiClient, id: &str) -> ApiResult<FixProposal> {
    api.post_empty(&format!("/fixes/{}/apply", seg(id)))
}

/// POST /fixes/{id}/preview
pub fn preview_fix(api: &ApiClient, id: &str) -> ApiResult<PreviewResult> {
    api.post_empty(&format!("/fixes/{}/preview", seg(id)))
}

/// POST /fixes/batch
pub fn batch_update(
    api: &ApiClient,
    fix_ids: &[String],
    action: BatchAction,
    reason: Option<&str>,
) -> ApiResult<BatchResult> {
    api.post(
        "/fixes/batch",
        &BatchBody {
            fix_ids,
            action,
            reason,
        },
    )
}

pub fn batch_approve(api: &ApiClient, fix_ids: &[String]) -> ApiResult<BatchResult> {
    batch_update(api, fix_ids, BatchAction::Approve, None)
}

pub fn batch_reject(
    api: &ApiClient,
    fix_ids: &[String],
    reason: Option<&str>,
) -> ApiResult<BatchResult> {
    batch_update(api, fix_ids, BatchAction::Reject, reason)
}

/// GET /fixes/{id}/comments
pub fn list_comments(api: &ApiClient, id: &str) -> ApiResult<Vec<FixComment>> {
    api.get(&format!("/fixes/{}/comments", seg(id)), QueryParams::new())
}

/// POST /fixes/{id}/comments
pub fn add_comment(api: &ApiClient, id: &str, content: &str) -> ApiResult<FixComment> {
    api.post(
        &format!("/fixes/{}/comments", seg(id)),
        &CommentBody { content },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::mock::MockTransport;
    use crate::http::{ClientContext, Method};
    use serde_json::json;
    use std::sync::Arc;

    fn client(mock: &Arc<MockTransport>) -> ApiClient {
        ApiClient::new(ClientContext::anonymous("http://test"), mock.clone())
    }

    #[test]
    fn test_approve_has_no_body() {
        let mock = Arc::new(MockTransport::new());
        mock.on(
            Method::Post,
            "/api/v1/fixes/fx-1/approve",
            json!({"id": "fx-1", "confidence": "high", "status": "approved"}),
        );
        let fix = approve_fix(&client(&mock), "fx-1").unwrap();
        assert_eq!(fix.status, FixStatus::Approved);
        assert!(mock.requests()[0].body.is_none());
    }

    #[test]
    fn test_reject_reason_optional() {
        let mock = Arc::new(MockTransport::new());
        mock.on(
            Method::Post,
            "/api/v1/fixes/*/reject",
            json!({"id": "fx-1", "confidence": "low", "status": "rejected"}),
        );
        reject_fix(&client(&mock), "fx-1", None).unwrap();
        reject_fix(&client(&mock), "fx-1", Some("too risky")).unwrap();
        let reqs = mock.requests();
        assert_eq!(reqs[0].json_body().unwrap(), json!({}));
        assert_eq!(reqs[1].json_body().unwrap(), json!({"reason": "too risky"}));
    }

    #[test]
    fn test_preview_failed_checks() {
        let mock = Arc::new(MockTransport::new());
        mock.on(
            Method::Post,
            "/api/v1/fixes/fx-1/preview",
            json!({
                "success": false,
                "checks": [
                    {"name": "syntax", "passed": true},
                    {"name": "tests", "passed": false, "message": "2 failed"}
                ]
            }),
        );
        let preview = preview_fix(&client(&mock), "fx-1").unwrap();
        let failed: Vec<_> = preview.failed_checks().map(|c| c.name.as_str()).collect();
        assert_eq!(failed, vec!["tests"]);
    }

    #[test]
    fn test_batch_body() {
        let mock = Arc::new(MockTransport::new());
        mock.on(Method::Post, "/api/v1/fixes/batch", json!({"processed": 2}));
        let ids = vec!["a".to_string(), "b".to_string()];
        let r = batch_approve(&client(&mock), &ids).unwrap();
        assert_eq!(r.processed, 2);
        assert_eq!(
            mock.requests()[0].json_body().unwrap(),
            json!({"fix_ids": ["a", "b"], "action": "approve"})
        );
    }
}
