//! Findings endpoints

use serde::{Deserialize, Serialize};

use super::{list_query, seg, ApiClient, ApiResult};
use crate::http::QueryParams;
use crate::models::{Finding, FindingStatus, FindingsSummary, ListParams, Page, Severity};

/// Server-side filters for the findings list
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FindingFilters {
    pub severity: Option<Severity>,
    pub detector: Option<String>,
    pub status: Option<FindingStatus>,
    pub category: Option<String>,
    pub repository_id: Option<String>,
    pub analysis_run_id: Option<String>,
    pub search: Option<String>,
}

impl FindingFilters {
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn detector(mut self, detector: impl Into<String>) -> Self {
        self.detector = Some(detector.into());
        self
    }

    pub fn status(mut self, status: FindingStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn repository(mut self, repository_id: impl Into<String>) -> Self {
        self.repository_id = Some(repository_id.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Present filters only, in wire order
    fn append_to(&self, query: &mut QueryParams) {
        query
            .push_opt("severity", self.severity)
            .push_opt("detector", self.detector.as_deref())
            .push_opt("status", self.status)
            .push_opt("category", self.category.as_deref())
            .push_opt("repository_id", self.repository_id.as_deref())
            .push_opt("analysis_run_id", self.analysis_run_id.as_deref())
            .push_opt("search", self.search.as_deref());
    }
}

/// Finding count for one detector
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DetectorCount {
    pub detector: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
struct StatusUpdate<'a> {
    status: FindingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct BatchStatusUpdate<'a> {
    finding_ids: &'a [String],
    status: FindingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

/// Outcome of a bulk status change
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BulkUpdateResult {
    #[serde(default)]
    pub updated: usize,
    #[serde(default)]
    pub failed: Vec<String>,
}

/// GET /findings
pub fn list_findings(
    api: &ApiClient,
    filters: &FindingFilters,
    params: &ListParams,
) -> ApiResult<Page<Finding>> {
    let mut query = QueryParams::new();
    filters.append_to(&mut query);
    list_query(params, &mut query);
    api.get("/findings", query)
}

/// GET /findings/{id}
pub fn get_finding(api: &ApiClient, id: &str) -> ApiResult<Finding> {
    api.get(&format!("/findings/{}", seg(id)), QueryParams::new())
}

/// GET /findings/summary
pub fn findings_summary(
    api: &ApiClient,
    repository_id: Option<&str>,
) -> ApiResult<FindingsSummary> {
    let mut query = QueryParams::new();
    query.push_opt("repository_id", repository_id);
    api.get("/findings/summary", query)
}

/// GET /findings/by-detector
pub fn findings_by_detector(
    api: &ApiClient,
    repository_id: Option<&str>,
    limit: u32,
) -> ApiResult<Vec<DetectorCount>> {
    let mut query = QueryParams::new();
    query
        .push_opt("repository_id", repository_id)
        .push("limit", limit);
    api.get("/findings/by-detector", query)
}

/// PATCH /findings/{id}/status
pub fn update_finding_status(
    api: &ApiClient,
    id: &str,
    status: FindingStatus,
    reason: Option<&str>,
) -> ApiResult<Finding> {
    api.patch(
        &format!("/findings/{}/status", seg(id)),
        &StatusUpdate { status, reason },
    )
}

/// POST /findings/batch-status
pub fn bulk_update_status(
    api: &ApiClient,
    finding_ids: &[String],
    status: FindingStatus,
    reason: Option<&str>,
) -> ApiResult<BulkUpdateResult> {
    api.post(
        "/findings/batch-status",
        &BatchStatusUpdate {
            finding_ids,
            status,
            reason,
        },
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
    fn test_list_sends_filters_in_order() {
        let mock = Arc::new(MockTransport::new());
        mock.on(
            Method::Get,
            "/api/v1/findings",
            json!({"items": [], "total": 0, "page": 1, "page_size": 20, "has_more": false}),
        );
        let filters = FindingFilters::default()
            .severity(Severity::Critical)
            .detector("BanditDetector");
        list_findings(&client(&mock), &filters, &ListParams::default()).unwrap();

        let req = &mock.requests()[0];
        assert_eq!(
            req.query_string(),
            "severity=critical&detector=BanditDetector&page=1&page_size=20"
        );
    }

    #[test]
    fn test_absent_filters_are_not_sent() {
        let mock = Arc::new(MockTransport::new());
        mock.on(Method::Get, "/api/v1/findings", json!({"items": []}));
        list_findings(&client(&mock), &FindingFilters::default(), &ListParams::default())
            .unwrap();
        assert!(mock.requests()[0].query_value("severity").is_none());
    }

    #[test]
    fn test_bulk_update_body() {
        let mock = Arc::new(MockTransport::new());
        mock.on(
            Method::Post,
            "/api/v1/findings/batch-status",
            json!({"updated": 2}),
        );
        let ids = vec!["f1".to_string(), "f2".to_string()];
        let result =
            bulk_update_status(&client(&mock), &ids, FindingStatus::Wontfix, None).unwrap();
        assert_eq!(result.updated, 2);
        assert_eq!(
            mock.requests()[0].json_body().unwrap(),
            json!({"finding_ids": ["f1", "f2"], "status": "wontfix"})
        );
    }

    #[test]
    fn test_single_status_update_path() {
        let mock = Arc::new(MockTransport::new());
        mock.on(
            Method::Patch,
            "/api/v1/findings/*/status",
            json!({"id": "f 1", "status": "resolved"}),
        );
        let f = update_finding_status(
            &client(&mock),
            "f 1",
            FindingStatus::Resolved,
            Some("fixed upstream"),
        )
        .unwrap();
        assert_eq!(f.status, FindingStatus::Resolved);
        assert_eq!(mock.requests()[0].path, "/api/v1/findings/f%201/status");
    }
}
