//! Cached fix reads and the review workflow

use crate::api::fixes::{self, BatchResult, FixComment, FixFilters, FixStats, PreviewResult};
use crate::cache::{keys, DomainEvent};
use crate::errors::ClassifiedError;
use crate::models::{FixProposal, ListParams, Page};

use super::{QueryClient, QueryHandle, QueryState};

pub fn fixes_query<'a>(
    client: &'a QueryClient,
    filters: &FixFilters,
    params: &ListParams,
) -> QueryHandle<'a, Page<FixProposal>> {
    let (f, p) = (filters.clone(), params.clone());
    client.query(keys::fixes(filters, params), move |api| {
        fixes::list_fixes(api, &f, &p)
    })
}

pub fn fix_query<'a>(client: &'a QueryClient, id: &str) -> QueryHandle<'a, FixProposal> {
    let id = id.to_string();
    client.query(keys::fix(&id), move |api| fixes::get_fix(api, &id))
}

pub fn stats_query<'a>(
    client: &'a QueryClient,
    repository_id: Option<&str>,
) -> QueryHandle<'a, FixStats> {
    let repo = repository_id.map(String::from);
    client.query(keys::fix_stats(repository_id), move |api| {
        fixes::fix_stats(api, repo.as_deref())
    })
}

pub fn comments_query<'a>(client: &'a QueryClient, id: &str) -> QueryHandle<'a, Vec<FixComment>> {
    let id = id.to_string();
    client.query(keys::fix_comments(&id), move |api| {
        fixes::list_comments(api, &id)
    })
}

/// Last preview result, if one was run in this session
pub fn cached_preview(client: &QueryClient, id: &str) -> QueryState<PreviewResult> {
    match client
        .cache()
        .get(&keys::fix_preview(id))
        .and_then(|entry| entry.data)
        .and_then(|v| serde_json::from_value(v).ok())
    {
        Some(preview) => QueryState::ready(preview),
        None => QueryState {
            data: None,
            loading: false,
            error: None,
        },
    }
}

pub fn approve(client: &QueryClient, id: &str) -> Result<FixProposal, ClassifiedError> {
    client.mutate(DomainEvent::FixApproved, Some(id), |api| {
        fixes::approve_fix(api, id)
    })
}

pub fn reject(
    client: &QueryClient,
    id: &str,
    reason: Option<&str>,
) -> Result<FixProposal, ClassifiedError> {
    client.mutate(DomainEvent::FixRejected, Some(id), |api| {
        fixes::reject_fix(api, id, reason)
    })
}

pub fn apply(client: &QueryClient, id: &str) -> Result<FixProposal, ClassifiedError> {
    client.mutate(DomainEvent::FixApplied, Some(id), |api| fixes::apply_fix(api, id))
}

/// Run the sandbox preview and keep the result under the fix's preview key
pub fn preview(client: &QueryClient, id: &str) -> Result<PreviewResult, ClassifiedError> {
    let result = client.mutate(DomainEvent::FixPreviewed, Some(id), |api| {
        fixes::preview_fix(api, id)
    })?;
    if let Ok(json) = serde_json::to_value(&result) {
        client.cache().store_success(keys::fix_preview(id), json);
    }
    Ok(result)
}

pub fn batch_approve(
    client: &QueryClient,
    ids: &[String],
) -> Result<BatchResult, ClassifiedError> {
    client.mutate(DomainEvent::FixesBatchUpdated, None, |api| {
        fixes::batch_approve(api, ids)
    })
}

pub fn batch_reject(
    client: &QueryClient,
    ids: &[String],
    reason: Option<&str>,
) -> Result<BatchResult, ClassifiedError> {
    client.mutate(DomainEvent::FixesBatchUpdated, None, |api| {
        fixes::batch_reject(api, ids, reason)
    })
}

pub fn add_comment(
    client: &QueryClient,
    id: &str,
    content: &str,
) -> Result<FixComment, ClassifiedError> {
    client.mutate(DomainEvent::FixCommentAdded, Some(id), |api| {
        fixes::add_comment(api, id, content)
    })
}
