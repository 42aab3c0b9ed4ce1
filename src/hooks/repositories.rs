//! Repositories, analysis runs and run-status polling

use std::time::Duration;

use crate::api::repositories::{self, AnalysisRun, AnalysisStatus, Repository};
use crate::cache::{keys, DomainEvent};
use crate::errors::ClassifiedError;
use crate::models::{ListParams, Page};

use super::{PollStatus, QueryClient, QueryHandle, StatusPoller};

impl PollStatus for AnalysisRun {
    fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

pub fn repositories_query<'a>(
    client: &'a QueryClient,
    params: &ListParams,
) -> QueryHandle<'a, Page<Repository>> {
    let p = params.clone();
    client.query(keys::repositories(params), move |api| {
        repositories::list_repositories(api, &p)
    })
}

pub fn repository_query<'a>(client: &'a QueryClient, id: &str) -> QueryHandle<'a, Repository> {
    let id = id.to_string();
    client.query(keys::repository(&id), move |api| {
        repositories::get_repository(api, &id)
    })
}

pub fn history_query<'a>(
    client: &'a QueryClient,
    repository_id: &str,
    params: &ListParams,
) -> QueryHandle<'a, Page<AnalysisRun>> {
    let (id, p) = (repository_id.to_string(), params.clone());
    client.query(keys::analysis_history(repository_id, params), move |api| {
        repositories::analysis_history(api, &id, &p)
    })
}

/// Poll a run until it completes or fails.
///
/// Seeing `completed` dispatches [`DomainEvent::AnalysisCompleted`] so
/// findings, fixes and dashboards refetch.
pub fn analysis_status_poller<'a>(
    client: &'a QueryClient,
    run_id: &str,
    interval: Duration,
) -> StatusPoller<'a, AnalysisRun> {
    let id = run_id.to_string();
    let handle = client.query(keys::analysis_status(run_id), move |api| {
        repositories::analysis_status(api, &id)
    });
    StatusPoller::new(handle, interval).on_stop(move |run: &AnalysisRun| {
        if run.status == AnalysisStatus::Completed {
            client.invalidate(DomainEvent::AnalysisCompleted, Some(&run.id));
        } else {
            tracing::info!(
                "Analysis {} failed: {}",
                run.id,
                run.error_message.as_deref().unwrap_or("no details")
            );
        }
    })
}

pub fn connect(client: &QueryClient, full_name: &str) -> Result<Repository, ClassifiedError> {
    client.mutate(DomainEvent::RepositoryConnected, None, |api| {
        repositories::connect_repository(api, full_name)
    })
}

pub fn remove(client: &QueryClient, id: &str) -> Result<(), ClassifiedError> {
    client.mutate(DomainEvent::RepositoryRemoved, Some(id), |api| {
        repositories::remove_repository(api, id)
    })
}

pub fn trigger_analysis(
    client: &QueryClient,
    repository_id: &str,
) -> Result<AnalysisRun, ClassifiedError> {
    client.mutate(DomainEvent::AnalysisStarted, Some(repository_id), |api| {
        repositories::trigger_analysis(api, repository_id)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::findings::FindingFilters;
    use crate::hooks::findings::findings_query;
    use crate::hooks::{AuthGate, PollPhase, Sleeper};
    use crate::http::mock::MockTransport;
    use crate::http::{ApiClient, ClientContext, Method};
    use serde_json::json;
    use std::sync::Arc;

    struct NoSleep;

    impl Sleeper for NoSleep {
        fn sleep(&self, _duration: Duration) {}
    }

    #[test]
    fn test_completed_run_refreshes_findings() {
        let mock = Arc::new(MockTransport::new());
        let api = ApiClient::new(ClientContext::anonymous("http://test"), mock.clone());
        let client = QueryClient::new(api, AuthGate::ready());

        mock.on(Method::Get, "/api/v1/findings", json!({"items": []}));
        mock.on_sequence(
            Method::Get,
            "/api/v1/analysis/run-1/status",
            vec![
                json!({"id": "run-1", "status": "queued"}),
                json!({"id": "run-1", "status": "running", "progress_percent": 50}),
                json!({"id": "run-1", "status": "completed", "progress_percent": 100}),
            ],
        );

        let list = findings_query(&client, &FindingFilters::default(), &ListParams::default());
        list.read();

        let mut poller = analysis_status_poller(&client, "run-1", Duration::from_secs(2));
        let state = poller.run(&NoSleep, 10, |_| {});
        assert_eq!(state.data.unwrap().status, AnalysisStatus::Completed);
        assert_eq!(poller.phase(), PollPhase::Stopped);
        assert!(client.cache().is_stale(list.key()));
    }

    #[test]
    fn test_failed_run_does_not_refresh_findings() {
        let mock = Arc::new(MockTransport::new());
        let api = ApiClient::new(ClientContext::anonymous("http://test"), mock.clone());
        let client = QueryClient::new(api, AuthGate::ready());

        mock.on(Method::Get, "/api/v1/findings", json!({"items": []}));
        mock.on(
            Method::Get,
            "/api/v1/analysis/run-2/status",
            json!({"id": "run-2", "status": "failed", "error_message": "clone failed"}),
        );
        let list = findings_query(&client, &FindingFilters::default(), &ListParams::default());
        list.read();

        let mut poller = analysis_status_poller(&client, "run-2", Duration::from_secs(2));
        poller.run(&NoSleep, 10, |_| {});
        assert_eq!(mock.requests_to(Method::Get, "/api/v1/analysis/*").len(), 1);
        assert!(client.cache().is_fresh(list.key()));
    }
}
