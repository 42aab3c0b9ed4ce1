//! Status polling for long-running server work
//!
//! A [`StatusPoller`] revalidates one query on a fixed interval and stops
//! for good once the observed value is terminal. After it stops, further
//! polls return the last observation without touching the network.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{QueryHandle, QueryState};

/// Values with a terminal state
pub trait PollStatus {
    fn is_terminal(&self) -> bool;
}

/// Waits between polls; swapped out in tests
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    Polling,
    Stopped,
}

type OnStop<'a, T> = Box<dyn FnMut(&T) + 'a>;

pub struct StatusPoller<'a, T> {
    handle: QueryHandle<'a, T>,
    interval: Duration,
    phase: PollPhase,
    polls: u32,
    last: Option<QueryState<T>>,
    on_stop: Option<OnStop<'a, T>>,
}

impl<'a, T> StatusPoller<'a, T>
where
    T: PollStatus + Clone + Serialize + DeserializeOwned,
{
    pub fn new(handle: QueryHandle<'a, T>, interval: Duration) -> Self {
        Self {
            handle,
            interval,
            phase: PollPhase::Polling,
            polls: 0,
            last: None,
            on_stop: None,
        }
    }

    /// Callback run once, with the terminal value, when polling stops
    pub fn on_stop<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&T) + 'a,
    {
        self.on_stop = Some(Box::new(callback));
        self
    }

    pub fn phase(&self) -> PollPhase {
        self.phase
    }

    /// Network polls made so far
    pub fn polls(&self) -> u32 {
        self.polls
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// One poll step
    pub fn poll(&mut self) -> QueryState<T> {
        if self.phase == PollPhase::Stopped {
            return self.last.clone().unwrap_or_else(QueryState::loading);
        }

        let state = self.handle.revalidate();
        if state.loading {
            // Gated: nothing was sent
            return state;
        }
        self.polls += 1;

        if let Some(value) = state.data.as_ref().filter(|v| v.is_terminal()) {
            tracing::debug!(
                "Polling of {} stopped after {} polls",
                self.handle.key(),
                self.polls
            );
            self.phase = PollPhase::Stopped;
            if let Some(mut callback) = self.on_stop.take() {
                callback(value);
            }
        }

        self.last = Some(state.clone());
        state
    }

    /// Poll until terminal or `max_polls` network polls, sleeping between
    /// polls. `on_update` sees every observation.
    pub fn run<F>(&mut self, sleeper: &dyn Sleeper, max_polls: u32, mut on_update: F) -> QueryState<T>
    where
        F: FnMut(&QueryState<T>),
    {
        let mut attempts = 0u32;
        loop {
            let state = self.poll();
            attempts += 1;
            on_update(&state);
            if self.phase == PollPhase::Stopped || attempts >= max_polls {
                return state;
            }
            sleeper.sleep(self.interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::keys;
    use crate::hooks::{AuthGate, QueryClient};
    use crate::http::mock::MockTransport;
    use crate::http::{ApiClient, ClientContext, Method, QueryParams};
    use serde::Deserialize;
    use serde_json::json;
    use std::cell::RefCell;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Job {
        state: String,
    }

    impl PollStatus for Job {
        fn is_terminal(&self) -> bool {
            self.state == "done"
        }
    }

    #[derive(Default)]
    struct RecordingSleeper(RefCell<Vec<Duration>>);

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration) {
            self.0.borrow_mut().push(duration);
        }
    }

    fn setup(auth: AuthGate) -> (Arc<MockTransport>, QueryClient) {
        let mock = Arc::new(MockTransport::new());
        let api = ApiClient::new(ClientContext::anonymous("http://test"), mock.clone());
        (mock, QueryClient::new(api, auth))
    }

    fn job_poller(client: &QueryClient) -> StatusPoller<'_, Job> {
        let handle = client.query(keys::analysis_status("job"), |api| {
            api.get("/jobs/job", QueryParams::new())
        });
        StatusPoller::new(handle, Duration::from_millis(50))
    }

    #[test]
    fn test_stops_after_terminal() {
        let (mock, client) = setup(AuthGate::ready());
        mock.on_sequence(
            Method::Get,
            "/api/v1/jobs/job",
            vec![
                json!({"state": "queued"}),
                json!({"state": "running"}),
                json!({"state": "done"}),
            ],
        );

        let sleeper = RecordingSleeper::default();
        let mut poller = job_poller(&client);
        let final_state = poller.run(&sleeper, 100, |_| {});

        assert_eq!(final_state.data.unwrap().state, "done");
        assert_eq!(poller.phase(), PollPhase::Stopped);
        assert_eq!(mock.request_count(), 3);
        assert_eq!(sleeper.0.borrow().len(), 2);

        // No further network traffic once stopped
        poller.poll();
        poller.poll();
        assert_eq!(mock.request_count(), 3);
    }

    #[test]
    fn test_on_stop_fires_once() {
        let (mock, client) = setup(AuthGate::ready());
        mock.on(Method::Get, "/api/v1/jobs/job", json!({"state": "done"}));

        let fired = RefCell::new(0);
        let mut poller = job_poller(&client).on_stop(|job| {
            assert!(job.is_terminal());
            *fired.borrow_mut() += 1;
        });
        poller.poll();
        poller.poll();
        drop(poller);
        assert_eq!(*fired.borrow(), 1);
    }

    #[test]
    fn test_max_polls_bounds_run() {
        let (mock, client) = setup(AuthGate::ready());
        mock.on(Method::Get, "/api/v1/jobs/job", json!({"state": "running"}));

        let sleeper = RecordingSleeper::default();
        let mut poller = job_poller(&client);
        poller.run(&sleeper, 4, |_| {});
        assert_eq!(poller.phase(), PollPhase::Polling);
        assert_eq!(mock.request_count(), 4);
    }

    #[test]
    fn test_gated_poll_sends_nothing() {
        let (mock, client) = setup(AuthGate::pending());
        mock.on(Method::Get, "/api/v1/jobs/job", json!({"state": "done"}));

        let mut poller = job_poller(&client);
        assert!(poller.poll().loading);
        assert_eq!(poller.polls(), 0);
        assert_eq!(mock.request_count(), 0);
    }
}
