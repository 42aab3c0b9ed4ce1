//! Interception mock for the HTTP layer
//!
//! Matches method + path pattern and answers with canned JSON, recording
//! every request so tests can assert on what was sent. Patterns are matched
//! against the full request path (`/api/v1/...`); `*` matches any run of
//! characters. Later routes take precedence over earlier ones, so a test can
//! re-stub an endpoint mid-scenario.

use std::sync::Mutex;

use regex::Regex;
use serde_json::Value;

use super::{ApiError, ApiResult, HttpRequest, HttpResponse, Method, Transport};

#[derive(Debug, Clone)]
enum Reply {
    Response(HttpResponse),
    NetworkError(String),
}

struct Route {
    method: Method,
    pattern: Option<Regex>,
    replies: Vec<Reply>,
    served: usize,
}

impl Route {
    /// Next reply; the last one repeats once the sequence is exhausted
    fn next_reply(&mut self) -> Reply {
        let idx = self.served.min(self.replies.len().saturating_sub(1));
        self.served += 1;
        self.replies[idx].clone()
    }
}

/// In-memory [`Transport`] for tests
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<HttpRequest>>,
}

fn compile(pattern: &str) -> Option<Regex> {
    let escaped: Vec<String> = pattern.split('*').map(regex::escape).collect();
    let source = format!("^{}$", escaped.join(".*"));
    match Regex::new(&source) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!("Ignoring mock route '{}': {}", pattern, e);
            None
        }
    }
}

fn matches(pattern: &Option<Regex>, path: &str) -> bool {
    pattern.as_ref().is_some_and(|re| re.is_match(path))
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn add(&self, method: Method, pattern: &str, replies: Vec<Reply>) -> &Self {
        let route = Route {
            method,
            pattern: compile(pattern),
            replies,
            served: 0,
        };
        self.routes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(route);
        self
    }

    /// Respond 200 with `body`
    pub fn on(&self, method: Method, pattern: &str, body: Value) -> &Self {
        self.on_status(method, pattern, 200, body)
    }

    pub fn on_status(&self, method: Method, pattern: &str, status: u16, body: Value) -> &Self {
        self.on_raw(method, pattern, status, &body.to_string())
    }

    /// Respond with a raw body (for empty or non-JSON payloads)
    pub fn on_raw(&self, method: Method, pattern: &str, status: u16, body: &str) -> &Self {
        let reply = Reply::Response(HttpResponse {
            status,
            body: body.to_string(),
        });
        self.add(method, pattern, vec![reply])
    }

    /// Respond 200 with each body in turn; the last one repeats
    pub fn on_sequence(&self, method: Method, pattern: &str, bodies: Vec<Value>) -> &Self {
        let replies = bodies
            .into_iter()
            .map(|b| {
                Reply::Response(HttpResponse {
                    status: 200,
                    body: b.to_string(),
                })
            })
            .collect::<Vec<_>>();
        if replies.is_empty() {
            return self;
        }
        self.add(method, pattern, replies)
    }

    /// Simulate a transport failure (no response)
    pub fn fail(&self, method: Method, pattern: &str, message: &str) -> &Self {
        self.add(
            method,
            pattern,
            vec![Reply::NetworkError(message.to_string())],
        )
    }

    /// Every request seen so far, in order
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Requests matching a method and path pattern
    pub fn requests_to(&self, method: Method, pattern: &str) -> Vec<HttpRequest> {
        let re = compile(pattern);
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && matches(&re, &r.path))
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn clear_requests(&self) {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

impl Transport for MockTransport {
    fn send(&self, _url: &str, req: &HttpRequest) -> ApiResult<HttpResponse> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(req.clone());

        let reply = {
            let mut routes = self.routes.lock().unwrap_or_else(|e| e.into_inner());
            routes
                .iter_mut()
                .rev()
                .find(|r| r.method == req.method && matches(&r.pattern, &req.path))
                .map(Route::next_reply)
        };

        match reply {
            Some(Reply::Response(resp)) => Ok(resp),
            Some(Reply::NetworkError(msg)) => Err(ApiError::network(msg)),
            None => Ok(HttpResponse {
                status: 404,
                body: serde_json::json!({
                    "detail": format!("No mock for {} {}", req.method, req.path)
                })
                .to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn get(path: &str) -> HttpRequest {
        HttpRequest::new(Method::Get, path)
    }

    #[test]
    fn test_wildcard_matching() {
        let mock = MockTransport::new();
        mock.on(Method::Get, "/api/v1/fixes/*/comments", json!([]));
        let resp = mock.send("", &get("/api/v1/fixes/abc/comments")).unwrap();
        assert_eq!(resp.status, 200);
        let resp = mock.send("", &get("/api/v1/fixes/abc")).unwrap();
        assert_eq!(resp.status, 404);
    }

    #[test]
    fn test_method_must_match() {
        let mock = MockTransport::new();
        mock.on(Method::Post, "/api/v1/fixes", json!({}));
        let resp = mock.send("", &get("/api/v1/fixes")).unwrap();
        assert_eq!(resp.status, 404);
    }

    #[test]
    fn test_sequence_repeats_last() {
        let mock = MockTransport::new();
        mock.on_sequence(
            Method::Get,
            "/s",
            vec![json!({"n": 1}), json!({"n": 2})],
        );
        let bodies: Vec<String> = (0..3)
            .map(|_| mock.send("", &get("/s")).unwrap().body)
            .collect();
        assert_eq!(bodies, vec![r#"{"n":1}"#, r#"{"n":2}"#, r#"{"n":2}"#]);
        assert_eq!(mock.request_count(), 3);
    }

    #[test]
    fn test_later_route_wins() {
        let mock = MockTransport::new();
        mock.on(Method::Get, "/x", json!({"v": "old"}));
        mock.on(Method::Get, "/x", json!({"v": "new"}));
        let resp = mock.send("", &get("/x")).unwrap();
        assert_eq!(resp.body, r#"{"v":"new"}"#);
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let mock = MockTransport::new();
        mock.on(Method::Get, "/a.b", json!({}));
        assert_eq!(mock.send("", &get("/a.b")).unwrap().status, 200);
        assert_eq!(mock.send("", &get("/axb")).unwrap().status, 404);
    }

    #[test]
    fn test_fail_route() {
        let mock = MockTransport::new();
        mock.fail(Method::Get, "/down", "connection refused");
        let err = mock.send("", &get("/down")).unwrap_err();
        assert!(err.is_network());
        assert_eq!(mock.requests_to(Method::Get, "/down").len(), 1);
    }
}
