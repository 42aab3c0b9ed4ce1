//! Wire transports
//!
//! Uses ureq (sync HTTP) so no async runtime is needed.

use std::time::Duration;

use super::{ApiError, ApiResult, HttpRequest, HttpResponse, Method};

/// Sends one request and returns the raw response.
///
/// Implementations report only transport failures as errors; any HTTP
/// status (including 4xx/5xx) is a successful [`HttpResponse`].
pub trait Transport: Send + Sync {
    fn send(&self, url: &str, req: &HttpRequest) -> ApiResult<HttpResponse>;
}

/// Production transport over a shared `ureq` agent
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::config::Config::builder()
            .http_status_as_error(false) // Status codes are classified by ApiClient
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn transport_error(err: ureq::Error) -> ApiError {
    match err {
        ureq::Error::Timeout(_) => ApiError::network("Request timed out"),
        other => ApiError::network(other.to_string()),
    }
}

impl Transport for UreqTransport {
    fn send(&self, url: &str, req: &HttpRequest) -> ApiResult<HttpResponse> {
        let result = match req.method {
            Method::Get => with_headers(self.agent.get(url), &req.headers).call(),
            Method::Delete => with_headers(self.agent.delete(url), &req.headers).call(),
            Method::Post | Method::Put | Method::Patch => {
                let builder = match req.method {
                    Method::Post => self.agent.post(url),
                    Method::Put => self.agent.put(url),
                    _ => self.agent.patch(url),
                };
                let builder = with_headers(builder, &req.headers);
                match req.body.as_deref() {
                    Some(body) => builder.send(body),
                    None => builder.send_empty(),
                }
            }
        };

        let response = result.map_err(transport_error)?;
        let status = response.status().as_u16();
        let body = response
            .into_body()
            .read_to_string()
            .map_err(|e| ApiError::parse(status, e.to_string()))?;

        Ok(HttpResponse { status, body })
    }
}
