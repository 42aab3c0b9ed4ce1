//! Cached finding reads and status mutations

use crate::api::findings::{self, BulkUpdateResult, DetectorCount, FindingFilters};
use crate::cache::{keys, DomainEvent};
use crate::errors::ClassifiedError;
use crate::models::{Finding, FindingStatus, FindingsSummary, ListParams, Page};

use super::{QueryClient, QueryHandle};

pub fn findings_query<'a>(
    client: &'a QueryClient,
    filters: &FindingFilters,
    params: &ListParams,
) -> QueryHandle<'a, Page<Finding>> {
    let (f, p) = (filters.clone(), params.clone());
    client.query(keys::findings(filters, params), move |api| {
        findings::list_findings(api, &f, &p)
    })
}

pub fn finding_query<'a>(client: &'a QueryClient, id: &str) -> QueryHandle<'a, Finding> {
    let id = id.to_string();
    client.query(keys::finding(&id), move |api| findings::get_finding(api, &id))
}

pub fn summary_query<'a>(
    client: &'a QueryClient,
    repository_id: Option<&str>,
) -> QueryHandle<'a, FindingsSummary> {
    let repo = repository_id.map(String::from);
    client.query(keys::findings_summary(repository_id), move |api| {
        findings::findings_summary(api, repo.as_deref())
    })
}

pub fn by_detector_query<'a>(
    client: &'a QueryClient,
    repository_id: Option<&str>,
    limit: u32,
) -> QueryHandle<'a, Vec<DetectorCount>> {
    let repo = repository_id.map(String::from);
    client.query(keys::findings_by_detector(repository_id, limit), move |api| {
        findings::findings_by_detector(api, repo.as_deref(), limit)
    })
}

pub fn update_status(
    client: &QueryClient,
    id: &str,
    status: FindingStatus,
    reason: Option<&str>,
) -> Result<Finding, ClassifiedError> {
    client.mutate(DomainEvent::FindingsStatusUpdated, Some(id), |api| {
        findings::update_finding_status(api, id, status, reason)
    })
}

pub fn bulk_update_status(
    client: &QueryClient,
    ids: &[String],
    status: FindingStatus,
    reason: Option<&str>,
) -> Result<BulkUpdateResult, ClassifiedError> {
    client.mutate(DomainEvent::FindingsStatusUpdated, None, |api| {
        findings::bulk_update_status(api, ids, status, reason)
    })
}
