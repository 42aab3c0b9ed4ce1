//! Typed JSON client over a [`Transport`]

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{ApiError, ApiResult, HttpRequest, Method, QueryParams, Transport, UreqTransport};
use crate::config::ClientConfig;

/// Versioned prefix of every backend route
pub const API_PREFIX: &str = "/api/v1";

/// Source of the bearer token attached to each request
pub trait TokenProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// A fixed token (or none)
#[derive(Debug, Clone, Default)]
pub struct StaticToken(pub Option<String>);

impl TokenProvider for StaticToken {
    fn token(&self) -> Option<String> {
        self.0.clone()
    }
}

impl<F> TokenProvider for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn token(&self) -> Option<String> {
        self()
    }
}

/// Explicit environment for the client: where to talk and as whom.
///
/// Passed in by the caller instead of being read from globals.
#[derive(Clone)]
pub struct ClientContext {
    pub base_url: String,
    token: Arc<dyn TokenProvider>,
}

impl ClientContext {
    pub fn new(base_url: impl Into<String>, token: impl TokenProvider + 'static) -> Self {
        Self {
            base_url: base_url.into(),
            token: Arc::new(token),
        }
    }

    pub fn anonymous(base_url: impl Into<String>) -> Self {
        Self::new(base_url, StaticToken(None))
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            config.base_url(),
            StaticToken(config.api_key().map(String::from)),
        )
    }

    pub fn token(&self) -> Option<String> {
        self.token.token()
    }
}

impl std::fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientContext")
            .field("base_url", &self.base_url)
            .field("has_token", &self.token().is_some())
            .finish()
    }
}

/// JSON API client
#[derive(Clone)]
pub struct ApiClient {
    ctx: ClientContext,
    transport: Arc<dyn Transport>,
}

impl ApiClient {
    pub fn new(ctx: ClientContext, transport: Arc<dyn Transport>) -> Self {
        Self { ctx, transport }
    }

    /// Client backed by a real `ureq` agent
    pub fn with_ureq(ctx: ClientContext, timeout: Duration) -> Self {
        Self::new(ctx, Arc::new(UreqTransport::new(timeout)))
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::with_ureq(ClientContext::from_config(config), config.timeout())
    }

    pub fn context(&self) -> &ClientContext {
        &self.ctx
    }

    pub fn get<T: DeserializeOwned>(&self, path: &str, query: QueryParams) -> ApiResult<T> {
        let mut req = self.request(Method::Get, path);
        req.query = query.into_vec();
        self.execute(req)
    }

    pub fn post<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.with_body(Method::Post, path, body)
    }

    /// POST without a request body
    pub fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.execute(self.request(Method::Post, path))
    }

    pub fn put<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.with_body(Method::Put, path, body)
    }

    pub fn patch<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.with_body(Method::Patch, path, body)
    }

    pub fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.execute(self.request(Method::Delete, path))
    }

    fn with_body<B, T>(&self, method: Method, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut req = self.request(method, path);
        let json = serde_json::to_string(body).map_err(|e| ApiError::encode(e.to_string()))?;
        req.headers
            .push(("Content-Type".to_string(), "application/json".to_string()));
        req.body = Some(json);
        self.execute(req)
    }

    fn request(&self, method: Method, path: &str) -> HttpRequest {
        let mut req = HttpRequest::new(method, format!("{}{}", API_PREFIX, path));
        req.headers
            .push(("Accept".to_string(), "application/json".to_string()));
        req.headers
            .push(("X-Request-ID".to_string(), uuid::Uuid::new_v4().to_string()));
        if let Some(token) = self.ctx.token() {
            req.headers
                .push(("Authorization".to_string(), format!("Bearer {}", token)));
        }
        req
    }

    fn execute<T: DeserializeOwned>(&self, req: HttpRequest) -> ApiResult<T> {
        let url = req.url(&self.ctx.base_url);
        tracing::debug!("{} {}", req.method, url);

        let response = self.transport.send(&url, &req).map_err(|e| {
            tracing::warn!("{} {} failed: {}", req.method, req.path, e.message);
            e
        })?;

        if !response.is_success() {
            let err = ApiError::from_response(response.status, &response.body);
            tracing::warn!(
                "{} {} -> {} ({})",
                req.method,
                req.path,
                response.status,
                err.error_code.as_deref().unwrap_or("no code")
            );
            return Err(err);
        }

        let body = if response.body.trim().is_empty() {
            "null"
        } else {
            response.body.as_str()
        };
        serde_json::from_str(body).map_err(|e| ApiError::parse(response.status, e.to_string()))
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient").field("ctx", &self.ctx).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::mock::MockTransport;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Thing {
        id: String,
    }

    fn client(token: Option<&str>) -> (ApiClient, Arc<MockTransport>) {
        let mock = Arc::new(MockTransport::new());
        let ctx = ClientContext::new(
            "https://api.test",
            StaticToken(token.map(String::from)),
        );
        (ApiClient::new(ctx, mock.clone()), mock)
    }

    #[test]
    fn test_attaches_bearer_token() {
        let (client, mock) = client(Some("tok-123"));
        mock.on(Method::Get, "/api/v1/things/1", json!({"id": "1"}));

        let thing: Thing = client.get("/things/1", QueryParams::new()).unwrap();
        assert_eq!(thing.id, "1");

        let req = &mock.requests()[0];
        assert_eq!(req.header("Authorization"), Some("Bearer tok-123"));
        assert!(req.header("X-Request-ID").is_some());
        assert!(req.header("Content-Type").is_none());
    }

    #[test]
    fn test_no_token_means_no_auth_header() {
        let (client, mock) = client(None);
        mock.on(Method::Get, "/api/v1/things/*", json!({"id": "2"}));
        let _: Thing = client.get("/things/2", QueryParams::new()).unwrap();
        assert!(mock.requests()[0].header("Authorization").is_none());
    }

    #[test]
    fn test_token_provider_closure_is_read_per_request() {
        let mock = Arc::new(MockTransport::new());
        let ctx = ClientContext::new("https://api.test", || Some("fresh".to_string()));
        let client = ApiClient::new(ctx, mock.clone());
        mock.on(Method::Post, "/api/v1/things", json!({"id": "3"}));

        let _: Thing = client.post("/things", &json!({"name": "x"})).unwrap();
        let req = &mock.requests()[0];
        assert_eq!(req.header("Authorization"), Some("Bearer fresh"));
        assert_eq!(req.header("Content-Type"), Some("application/json"));
        assert_eq!(req.json_body(), Some(json!({"name": "x"})));
    }

    #[test]
    fn test_error_status_is_normalized() {
        let (client, mock) = client(Some("t"));
        mock.on_status(
            Method::Post,
            "/api/v1/fixes/*/approve",
            409,
            json!({"detail": "Fix is stale", "error_code": "FIX_002"}),
        );
        let err = client
            .post_empty::<serde_json::Value>("/fixes/abc/approve")
            .unwrap_err();
        assert_eq!(err.status, 409);
        assert_eq!(err.error_code.as_deref(), Some("FIX_002"));
        assert_eq!(err.message, "Fix is stale");
    }

    #[test]
    fn test_unparseable_success_body_is_an_error() {
        let (client, mock) = client(None);
        mock.on(Method::Get, "/api/v1/things/1", json!({"unexpected": true}));
        let err = client
            .get::<Thing>("/things/1", QueryParams::new())
            .unwrap_err();
        assert_eq!(err.status, 200);
        assert!(err.message.starts_with("Failed to parse response"));
        assert!(err.is_malformed());
        assert!(!err.is_network());
    }

    #[test]
    fn test_unencodable_body_is_not_sent() {
        let (client, mock) = client(None);
        let mut body = std::collections::BTreeMap::new();
        body.insert(vec![1u8, 2], "tuple keys are not valid JSON");

        let err = client
            .post::<_, serde_json::Value>("/things", &body)
            .unwrap_err();
        assert_eq!(err.kind, crate::http::ApiErrorKind::Malformed);
        assert_eq!(err.status, 0);
        assert!(!err.is_network());
        assert_eq!(mock.request_count(), 0);
    }

    #[test]
    fn test_empty_body_deserializes_to_unit() {
        let (client, mock) = client(None);
        mock.on_raw(Method::Delete, "/api/v1/things/1", 204, "");
        client.delete::<()>("/things/1").unwrap();
        assert_eq!(mock.request_count(), 1);
    }

    #[test]
    fn test_transport_failure_has_status_zero() {
        let (client, mock) = client(None);
        mock.fail(Method::Get, "/api/v1/things/*", "connection refused");
        let err = client
            .get::<Thing>("/things/9", QueryParams::new())
            .unwrap_err();
        assert!(err.is_network());
        assert_eq!(err.message, "connection refused");
    }
}
