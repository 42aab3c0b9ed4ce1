//! End-to-end flows against a mocked backend
//!
//! Each test wires a real `QueryClient` to `MockTransport` and drives it the
//! way a view would: read, mutate, read again.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use repotoire_cloud::api::findings::FindingFilters;
use repotoire_cloud::api::fixes::FixFilters;
use repotoire_cloud::cache::{keys, DomainEvent};
use repotoire_cloud::errors::{classify, ErrorCode};
use repotoire_cloud::hooks::{self, AuthGate, PollPhase, QueryClient, Sleeper};
use repotoire_cloud::http::mock::MockTransport;
use repotoire_cloud::http::{ApiClient, ClientContext, Method};
use repotoire_cloud::models::{FindingStatus, ListParams, Severity};
use repotoire_cloud::views::FindingsList;

struct NoSleep;

impl Sleeper for NoSleep {
    fn sleep(&self, _duration: Duration) {}
}

fn setup(auth: AuthGate) -> (Arc<MockTransport>, QueryClient) {
    let mock = Arc::new(MockTransport::new());
    let ctx = ClientContext::new("http://test", || Some("rpt_test".to_string()));
    let api = ApiClient::new(ctx, mock.clone());
    (mock, QueryClient::new(api, auth))
}

fn finding(id: &str, severity: &str, status: &str) -> Value {
    json!({
        "id": id,
        "severity": severity,
        "status": status,
        "detector": "BanditDetector",
        "title": format!("Issue {}", id),
        "affected_files": ["app/views.py"],
        "line_start": 12
    })
}

fn page(items: Vec<Value>) -> Value {
    let total = items.len();
    json!({"items": items, "total": total, "page": 1, "page_size": 20, "has_more": false})
}

fn fix(id: &str, status: &str) -> Value {
    json!({"id": id, "confidence": "high", "status": status, "finding_ids": ["f1"]})
}

#[test]
fn test_filtered_findings_match_summary_counts() {
    let (mock, client) = setup(AuthGate::ready());
    mock.on(
        Method::Get,
        "/api/v1/findings",
        page(vec![
            finding("f1", "critical", "open"),
            finding("f2", "critical", "open"),
        ]),
    );
    mock.on(
        Method::Get,
        "/api/v1/findings/summary",
        json!({"critical": 2, "high": 5, "medium": 1, "low": 0, "info": 0, "total": 8}),
    );

    let mut view = FindingsList::new(&client);
    view.set_filters(
        FindingFilters::default()
            .severity(Severity::Critical)
            .detector("BanditDetector")
            .repository("repo-1"),
    );
    let findings = view.load().into_result().unwrap();
    let summary = view.summary().into_result().unwrap();

    let list_requests = mock.requests_to(Method::Get, "/api/v1/findings");
    assert_eq!(list_requests.len(), 1);
    assert!(list_requests[0]
        .query_string()
        .contains("severity=critical&detector=BanditDetector"));

    let summary_requests = mock.requests_to(Method::Get, "/api/v1/findings/summary");
    assert_eq!(summary_requests[0].query_value("repository_id"), Some("repo-1"));

    let rendered_critical = findings
        .items
        .iter()
        .filter(|f| f.severity == Severity::Critical)
        .count();
    assert_eq!(rendered_critical, summary.count(Severity::Critical));
}

#[test]
fn test_bulk_wontfix_sends_one_request_and_revalidates() {
    let (mock, client) = setup(AuthGate::ready());
    mock.on_sequence(
        Method::Get,
        "/api/v1/findings",
        vec![
            page(vec![
                finding("f1", "high", "open"),
                finding("f2", "high", "open"),
                finding("f3", "medium", "open"),
            ]),
            page(vec![
                finding("f1", "high", "wontfix"),
                finding("f2", "high", "wontfix"),
                finding("f3", "medium", "wontfix"),
            ]),
        ],
    );
    mock.on(
        Method::Post,
        "/api/v1/findings/batch-status",
        json!({"updated": 3, "failed": []}),
    );

    let mut view = FindingsList::new(&client);
    let first = view.load().into_result().unwrap();
    view.select_page(&first);
    assert_eq!(view.selected_count(), 3);

    let result = view
        .bulk_mark(FindingStatus::Wontfix, Some("Vendored code"))
        .unwrap();
    assert_eq!(result.updated, 3);

    let posts = mock.requests_to(Method::Post, "/api/v1/findings/batch-status");
    assert_eq!(posts.len(), 1);
    assert_eq!(
        posts[0].json_body().unwrap(),
        json!({
            "finding_ids": ["f1", "f2", "f3"],
            "status": "wontfix",
            "reason": "Vendored code"
        })
    );
    assert_eq!(view.selected_count(), 0);

    // Same client, same view: the list is stale and refetches on its own
    let reloaded = view.load().into_result().unwrap();
    assert!(reloaded
        .items
        .iter()
        .all(|f| f.status == FindingStatus::Wontfix));
    assert_eq!(mock.requests_to(Method::Get, "/api/v1/findings").len(), 2);
}

#[test]
fn test_fix_approval_invalidates_related_reads_only() {
    let (mock, client) = setup(AuthGate::ready());
    mock.on(Method::Get, "/api/v1/fixes", page(vec![fix("fx-1", "pending")]));
    mock.on(Method::Get, "/api/v1/fixes/stats", json!({"total": 1, "pending": 1}));
    mock.on(Method::Get, "/api/v1/findings/summary", json!({"total": 4}));
    mock.on(Method::Get, "/api/v1/analytics/summary", json!({"fixes_pending": 1}));
    mock.on(
        Method::Get,
        "/api/v1/repositories",
        page(vec![json!({"id": "r1", "full_name": "acme/api"})]),
    );
    mock.on(Method::Post, "/api/v1/fixes/fx-1/approve", fix("fx-1", "approved"));

    let params = ListParams::default();
    let fixes = hooks::fixes::fixes_query(&client, &FixFilters::default(), &params);
    let stats = hooks::fixes::stats_query(&client, None);
    let findings_summary = hooks::findings::summary_query(&client, None);
    let analytics = hooks::analytics::summary_query(&client, None);
    let repos = hooks::repositories::repositories_query(&client, &params);

    assert!(fixes.read().is_ready());
    assert!(stats.read().is_ready());
    assert!(findings_summary.read().is_ready());
    assert!(analytics.read().is_ready());
    assert!(repos.read().is_ready());

    let approved = hooks::fixes::approve(&client, "fx-1").unwrap();
    assert_eq!(approved.id, "fx-1");

    let cache = client.cache();
    assert!(cache.is_stale(fixes.key()));
    assert!(cache.is_stale(stats.key()));
    assert!(cache.is_stale(findings_summary.key()));
    assert!(cache.is_stale(analytics.key()));
    assert!(!cache.is_stale(repos.key()));

    // Untouched reads are still served from cache
    mock.clear_requests();
    assert!(repos.read().is_ready());
    assert_eq!(mock.request_count(), 0);
}

#[test]
fn test_failed_mutation_leaves_cache_fresh() {
    let (mock, client) = setup(AuthGate::ready());
    mock.on(Method::Get, "/api/v1/fixes/stats", json!({"total": 1}));
    mock.on_status(
        Method::Post,
        "/api/v1/fixes/fx-1/approve",
        409,
        json!({"detail": "Fix must be previewed first", "error_code": "FIX_003"}),
    );

    let stats = hooks::fixes::stats_query(&client, None);
    assert!(stats.read().is_ready());

    let err = hooks::fixes::approve(&client, "fx-1").unwrap_err();
    assert_eq!(err.code, "FIX_003");
    assert_eq!(err.message, "Fix must be previewed first");
    assert!(client.cache().is_fresh(stats.key()));
}

#[test]
fn test_analysis_polling_stops_and_refreshes_findings() {
    let (mock, client) = setup(AuthGate::ready());
    mock.on_sequence(
        Method::Get,
        "/api/v1/analysis/run-9/status",
        vec![
            json!({"id": "run-9", "status": "queued"}),
            json!({"id": "run-9", "status": "running", "progress_percent": 40}),
            json!({"id": "run-9", "status": "completed", "progress_percent": 100, "findings_count": 12}),
        ],
    );
    mock.on(Method::Get, "/api/v1/findings", page(vec![]));

    let findings = hooks::findings::findings_query(
        &client,
        &FindingFilters::default(),
        &ListParams::default(),
    );
    assert!(findings.read().is_ready());

    let mut poller =
        hooks::repositories::analysis_status_poller(&client, "run-9", Duration::from_millis(10));
    let mut seen = Vec::new();
    let last = poller.run(&NoSleep, 50, |state| {
        if let Some(run) = &state.data {
            seen.push(run.status.to_string());
        }
    });

    assert_eq!(seen, vec!["queued", "running", "completed"]);
    assert_eq!(poller.phase(), PollPhase::Stopped);
    assert_eq!(poller.polls(), 3);
    assert_eq!(last.data.unwrap().findings_count, Some(12));
    assert!(client.cache().is_stale(findings.key()));

    // Stopped for good: further polls never reach the network
    let before = mock.request_count();
    poller.poll();
    poller.poll();
    assert_eq!(mock.request_count(), before);
}

#[test]
fn test_pending_auth_makes_no_requests() {
    let auth = AuthGate::pending();
    let (mock, client) = setup(auth.clone());
    mock.on(Method::Get, "/api/v1/findings/summary", json!({"total": 3}));

    let summary = hooks::findings::summary_query(&client, None);
    let state = summary.read();
    assert!(state.loading);
    assert!(state.error.is_none());
    assert!(state.data.is_none());

    let err = hooks::fixes::approve(&client, "fx-1").unwrap_err();
    assert!(err.is(ErrorCode::SessionNotReady));
    assert_eq!(mock.request_count(), 0);

    auth.set_ready(true);
    assert_eq!(summary.read().into_result().unwrap().total, 3);
    assert_eq!(mock.request_count(), 1);
}

#[test]
fn test_explicit_error_code_wins_over_status() {
    let (mock, client) = setup(AuthGate::ready());
    mock.on_status(
        Method::Get,
        "/api/v1/repositories/r1",
        404,
        json!({"detail": {"error_code": "REPO_002", "message": "Repository access revoked"}}),
    );
    mock.on_status(
        Method::Get,
        "/api/v1/repositories/r2",
        400,
        json!({"detail": "nope", "error_code": "TEAM_LIMIT_7"}),
    );

    let err = hooks::repositories::repository_query(&client, "r1")
        .read()
        .into_result()
        .unwrap_err();
    assert_eq!(err.code, "REPO_002");
    assert_eq!(err.message, "Repository access revoked");
    assert_eq!(err.status, Some(404));

    // Unknown backend codes are kept verbatim
    let err = hooks::repositories::repository_query(&client, "r2")
        .read()
        .into_result()
        .unwrap_err();
    assert_eq!(err.code, "TEAM_LIMIT_7");
}

#[test]
fn test_refetch_failure_keeps_previous_data() {
    let (mock, client) = setup(AuthGate::ready());
    mock.on(Method::Get, "/api/v1/billing/usage", json!({"repos_used": 2}));

    let usage = hooks::billing::usage_query(&client);
    assert_eq!(usage.read().into_result().unwrap().repos_used, 2);

    client.invalidate(DomainEvent::SubscriptionChanged, None);
    mock.fail(Method::Get, "/api/v1/billing/usage", "connection refused");

    let state = usage.read();
    let err = state.error.clone().unwrap();
    assert!(err.is(ErrorCode::NetworkOffline));
    assert_eq!(err.to_toast().title, "You appear to be offline");
    assert_eq!(state.data.unwrap().repos_used, 2);
    assert!(client.cache().is_stale(&keys::usage()));
}

#[test]
fn test_status_only_errors_use_catalog() {
    let (mock, client) = setup(AuthGate::ready());
    mock.on_raw(Method::Get, "/api/v1/billing/subscription", 503, "");

    let err = hooks::billing::subscription_query(&client)
        .read()
        .into_result()
        .unwrap_err();
    assert!(err.is(ErrorCode::ServiceUnavailable));
    assert!(!err.message.starts_with("HTTP "));

    let same = classify(&repotoire_cloud::http::ApiError::new(503, "HTTP 503"));
    assert_eq!(same.code, err.code);
}

#[test]
fn test_backend_shape_change_is_reported_not_blamed_on_user() {
    let (mock, client) = setup(AuthGate::ready());
    mock.on(Method::Get, "/api/v1/billing/usage", json!({"repos_used": "lots"}));

    let err = hooks::billing::usage_query(&client)
        .read()
        .into_result()
        .unwrap_err();
    assert!(err.is(ErrorCode::MalformedPayload));
    assert_eq!(err.code, "SYS_003");
    assert!(err.reportable);
    assert!(!err.user_actionable);
    assert_ne!(err.code, ErrorCode::ValidationFailed.code());
}
