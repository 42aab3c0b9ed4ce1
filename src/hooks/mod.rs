//! Cached data access for views
//!
//! A [`QueryClient`] pairs the API client with the shared [`QueryCache`] and
//! an [`AuthGate`]. Reads go through [`QueryHandle`]: a fresh cached value is
//! returned as-is, a missing or stale one is fetched and stored. While the
//! gate is closed no request is made and the state reports `loading`.
//!
//! Mutations run through [`QueryClient::mutate`], which dispatches the
//! matching [`DomainEvent`] only after the backend confirmed the change.

pub mod analytics;
pub mod billing;
pub mod findings;
pub mod fixes;
pub mod marketplace;
pub mod polling;
pub mod repositories;

pub use polling::{PollPhase, PollStatus, Sleeper, StatusPoller, ThreadSleeper};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::{dispatch, CacheKey, DomainEvent, InvalidationReport, QueryCache};
use crate::errors::{classify, ClassifiedError, ErrorCode};
use crate::http::{ApiClient, ApiResult};

/// Whether the session is ready to make authenticated calls.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct AuthGate(Arc<AtomicBool>);

impl AuthGate {
    pub fn new(ready: bool) -> Self {
        Self(Arc::new(AtomicBool::new(ready)))
    }

    pub fn ready() -> Self {
        Self::new(true)
    }

    pub fn pending() -> Self {
        Self::new(false)
    }

    pub fn is_ready(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn set_ready(&self, ready: bool) {
        self.0.store(ready, Ordering::Release);
    }
}

/// What a view renders from
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<ClassifiedError>,
}

impl<T> QueryState<T> {
    pub fn loading() -> Self {
        Self {
            data: None,
            loading: true,
            error: None,
        }
    }

    pub fn ready(data: T) -> Self {
        Self {
            data: Some(data),
            loading: false,
            error: None,
        }
    }

    pub fn failed(error: ClassifiedError, previous: Option<T>) -> Self {
        Self {
            data: previous,
            loading: false,
            error: Some(error),
        }
    }

    pub fn is_ready(&self) -> bool {
        !self.loading && self.error.is_none() && self.data.is_some()
    }

    /// Data or the error; a gated read becomes `AUTH_004`
    pub fn into_result(self) -> Result<T, ClassifiedError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        self.data
            .ok_or_else(|| ClassifiedError::from_code(ErrorCode::SessionNotReady))
    }
}

pub struct QueryClient {
    api: ApiClient,
    cache: Arc<QueryCache>,
    auth: AuthGate,
}

impl QueryClient {
    pub fn new(api: ApiClient, auth: AuthGate) -> Self {
        Self::with_cache(api, Arc::new(QueryCache::new()), auth)
    }

    /// Share an existing cache between clients
    pub fn with_cache(api: ApiClient, cache: Arc<QueryCache>, auth: AuthGate) -> Self {
        Self { api, cache, auth }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn auth(&self) -> &AuthGate {
        &self.auth
    }

    /// Cached read of `key`, fetched with `fetch` when missing or stale
    pub fn query<'a, T, F>(&'a self, key: CacheKey, fetch: F) -> QueryHandle<'a, T>
    where
        F: Fn(&ApiClient) -> ApiResult<T> + 'a,
    {
        QueryHandle {
            client: self,
            key,
            fetch: Box::new(fetch),
        }
    }

    /// Mark everything `event` affects as stale
    pub fn invalidate(&self, event: DomainEvent, entity_id: Option<&str>) -> InvalidationReport {
        dispatch(self.cache.as_ref(), event, entity_id)
    }

    /// Run a write and, on success, dispatch `event`.
    ///
    /// A failed mutation leaves the cache untouched.
    pub fn mutate<T, F>(
        &self,
        event: DomainEvent,
        entity_id: Option<&str>,
        op: F,
    ) -> Result<T, ClassifiedError>
    where
        F: FnOnce(&ApiClient) -> ApiResult<T>,
    {
        if !self.auth.is_ready() {
            return Err(ClassifiedError::from_code(ErrorCode::SessionNotReady));
        }
        match op(&self.api) {
            Ok(value) => {
                self.invalidate(event, entity_id);
                Ok(value)
            }
            Err(e) => {
                tracing::debug!("Mutation for {} failed: {}", event, e);
                Err(classify(e))
            }
        }
    }
}

type Fetcher<'a, T> = Box<dyn Fn(&ApiClient) -> ApiResult<T> + 'a>;

/// A bound cache key plus the fetch that fills it
pub struct QueryHandle<'a, T> {
    client: &'a QueryClient,
    key: CacheKey,
    fetch: Fetcher<'a, T>,
}

impl<'a, T> QueryHandle<'a, T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Serve from cache when fresh, otherwise fetch
    pub fn read(&self) -> QueryState<T> {
        if !self.client.auth.is_ready() {
            tracing::trace!("Gated read of {}", self.key);
            return QueryState::loading();
        }
        if let Some(entry) = self.client.cache.get(&self.key) {
            if !entry.stale && entry.error.is_none() {
                if let Some(data) = entry.data.and_then(|v| serde_json::from_value(v).ok()) {
                    return QueryState::ready(data);
                }
            }
        }
        self.fetch_now()
    }

    /// Always go to the network (still gated)
    pub fn revalidate(&self) -> QueryState<T> {
        if !self.client.auth.is_ready() {
            return QueryState::loading();
        }
        self.fetch_now()
    }

    fn fetch_now(&self) -> QueryState<T> {
        tracing::debug!("Fetching {}", self.key);
        match (self.fetch)(&self.client.api) {
            Ok(data) => {
                match serde_json::to_value(&data) {
                    Ok(json) => self.client.cache.store_success(self.key.clone(), json),
                    Err(e) => tracing::warn!("Not caching {}: {}", self.key, e),
                }
                QueryState::ready(data)
            }
            Err(e) => {
                let previous = self
                    .client
                    .cache
                    .get(&self.key)
                    .and_then(|entry| entry.data)
                    .and_then(|v| serde_json::from_value(v).ok());
                let classified = classify(&e);
                self.client.cache.store_error(self.key.clone(), e);
                QueryState::failed(classified, previous)
            }
        }
    }
}
