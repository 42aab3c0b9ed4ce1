//! HTTP boundary for the Repotoire cloud API
//!
//! Everything that talks to the network goes through [`ApiClient`], which
//! attaches the bearer token, serializes JSON bodies and normalizes every
//! failure (transport, status, parse) into a single [`ApiError`].
//!
//! The wire is abstracted behind [`Transport`] so the same client runs
//! against `ureq` in production and [`mock::MockTransport`] in tests.

mod client;
pub mod mock;
mod transport;

pub use client::{ApiClient, ClientContext, StaticToken, TokenProvider, API_PREFIX};
pub use transport::{Transport, UreqTransport};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// HTTP verbs used by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered query parameters. Order is preserved on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: &str, value: impl ToString) -> &mut Self {
        self.0.push((key.to_string(), value.to_string()));
        self
    }

    /// Push only when the value is present
    pub fn push_opt<V: ToString>(&mut self, key: &str, value: Option<V>) -> &mut Self {
        if let Some(v) = value {
            self.push(key, v);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<(String, String)> {
        self.0
    }
}

/// A request as handed to a [`Transport`]
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    /// Path below the base URL, including the `/api/v1` prefix
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// URL-encoded query string in insertion order (no leading `?`)
    pub fn query_string(&self) -> String {
        self.query
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// First value of a query parameter
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Header lookup, case-insensitive
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body parsed as JSON, if any
    pub fn json_body(&self) -> Option<Value> {
        self.body
            .as_deref()
            .and_then(|b| serde_json::from_str(b).ok())
    }

    /// Absolute URL for this request against `base_url`
    pub fn url(&self, base_url: &str) -> String {
        let base = base_url.trim_end_matches('/');
        if self.query.is_empty() {
            format!("{}{}", base, self.path)
        } else {
            format!("{}{}?{}", base, self.path, self.query_string())
        }
    }
}

/// Raw response from a [`Transport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Where a failed call broke down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiErrorKind {
    /// The backend answered with an error status
    #[default]
    Response,
    /// No response was received
    Network,
    /// A request or response body did not match the expected shape
    Malformed,
}

/// Single structured error for every failed API call.
///
/// `status` is 0 when no response was received at all (DNS, refused
/// connection, timeout) or when the request body could not be encoded.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("HTTP {status}: {message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub status: u16,
    pub message: String,
    /// Raw `detail` payload from the error body (string or structured)
    pub detail: Option<Value>,
    /// Machine-readable code supplied by the backend
    pub error_code: Option<String>,
    /// Suggested remedy supplied by the backend
    pub action: Option<String>,
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<Value>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ApiError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        let kind = if status == 0 {
            ApiErrorKind::Network
        } else {
            ApiErrorKind::Response
        };
        Self {
            kind,
            status,
            message: message.into(),
            detail: None,
            error_code: None,
            action: None,
        }
    }

    /// No response was received
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(0, message)
    }

    /// The response arrived but its body could not be decoded
    pub fn parse(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Malformed,
            ..Self::new(status, format!("Failed to parse response: {}", message.into()))
        }
    }

    /// The request body could not be encoded; nothing was sent
    pub fn encode(message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Malformed,
            ..Self::new(0, format!("Failed to serialize request: {}", message.into()))
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn is_network(&self) -> bool {
        self.kind == ApiErrorKind::Network
    }

    pub fn is_malformed(&self) -> bool {
        self.kind == ApiErrorKind::Malformed
    }

    /// Build from a non-2xx response, extracting `detail`/`error_code`/`action`.
    ///
    /// Accepts both flat bodies and bodies whose `detail` is itself an
    /// object carrying `error_code`/`message`/`action`.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
        let nested = parsed.detail.as_ref().and_then(Value::as_object);

        let error_code = parsed.error_code.or_else(|| {
            nested
                .and_then(|d| d.get("error_code"))
                .and_then(Value::as_str)
                .map(String::from)
        });
        let action = parsed.action.or_else(|| {
            nested
                .and_then(|d| d.get("action"))
                .and_then(Value::as_str)
                .map(String::from)
        });

        let message = parsed
            .detail
            .as_ref()
            .and_then(detail_text)
            .or(parsed.message)
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() || trimmed.starts_with('{') {
                    format!("HTTP {}", status)
                } else {
                    trimmed.chars().take(200).collect()
                }
            });

        Self {
            kind: ApiErrorKind::Response,
            status,
            message,
            detail: parsed.detail,
            error_code,
            action,
        }
    }
}

/// Human text of a `detail` payload.
///
/// Validation errors arrive as a list of `{loc, msg}` objects.
fn detail_text(detail: &Value) -> Option<String> {
    match detail {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let msgs: Vec<String> = items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Object(o) => o.get("msg").and_then(Value::as_str).map(String::from),
                    _ => None,
                })
                .collect();
            (!msgs.is_empty()).then(|| msgs.join("; "))
        }
        Value::Object(o) => o
            .get("message")
            .or_else(|| o.get("msg"))
            .and_then(Value::as_str)
            .map(String::from),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_string_preserves_order_and_encodes() {
        let mut req = HttpRequest::new(Method::Get, "/api/v1/findings");
        req.query = vec![
            ("severity".into(), "critical".into()),
            ("detector".into(), "BanditDetector".into()),
            ("search".into(), "sql injection".into()),
        ];
        assert_eq!(
            req.query_string(),
            "severity=critical&detector=BanditDetector&search=sql%20injection"
        );
        assert_eq!(
            req.url("https://api.repotoire.io/"),
            "https://api.repotoire.io/api/v1/findings?severity=critical&detector=BanditDetector&search=sql%20injection"
        );
    }

    #[test]
    fn test_error_from_flat_body() {
        let body = json!({
            "detail": "Fix must be previewed before approval",
            "error_code": "FIX_001",
            "action": "Run a preview first"
        })
        .to_string();
        let err = ApiError::from_response(400, &body);
        assert_eq!(err.status, 400);
        assert_eq!(err.message, "Fix must be previewed before approval");
        assert_eq!(err.error_code.as_deref(), Some("FIX_001"));
        assert_eq!(err.action.as_deref(), Some("Run a preview first"));
    }

    #[test]
    fn test_error_from_nested_detail() {
        let body = json!({
            "detail": {"error_code": "BILLING_001", "message": "Repository limit reached"}
        })
        .to_string();
        let err = ApiError::from_response(403, &body);
        assert_eq!(err.error_code.as_deref(), Some("BILLING_001"));
        assert_eq!(err.message, "Repository limit reached");
    }

    #[test]
    fn test_error_from_validation_list() {
        let body = json!({
            "detail": [
                {"loc": ["body", "status"], "msg": "field required"},
                {"loc": ["body", "finding_ids"], "msg": "ensure this value has at least 1 items"}
            ]
        })
        .to_string();
        let err = ApiError::from_response(422, &body);
        assert_eq!(
            err.message,
            "field required; ensure this value has at least 1 items"
        );
        assert!(err.error_code.is_none());
    }

    #[test]
    fn test_error_from_non_json_body() {
        let err = ApiError::from_response(502, "Bad Gateway");
        assert_eq!(err.message, "Bad Gateway");
        let err = ApiError::from_response(500, "");
        assert_eq!(err.message, "HTTP 500");
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let mut req = HttpRequest::new(Method::Post, "/x");
        req.headers
            .push(("Authorization".into(), "Bearer abc".into()));
        assert_eq!(req.header("authorization"), Some("Bearer abc"));
        assert!(req.header("x-missing").is_none());
    }
}
