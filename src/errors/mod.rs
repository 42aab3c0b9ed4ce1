//! Error classification
//!
//! Any failure (an [`ApiError`], a plain error, a bare message or an
//! arbitrary JSON value) is turned into a [`ClassifiedError`] with a stable
//! code, a category and user-facing text. Resolution order:
//!
//! 1. an explicit backend `error_code` (kept verbatim even if unrecognized)
//! 2. a body that could not be encoded or decoded
//! 3. the HTTP status
//! 4. message patterns
//! 5. transport failure without a usable message
//! 6. `UNKNOWN`

mod catalog;

pub use catalog::{CatalogEntry, ErrorCategory, ErrorCode};

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::sync::OnceLock;
use thiserror::Error;

use crate::http::ApiError;

/// Anything that can be classified
#[derive(Debug, Clone)]
pub enum ErrorSource {
    Api(ApiError),
    /// A non-API error, reduced to its display text
    Error(String),
    Message(String),
    Unknown(Value),
}

impl From<ApiError> for ErrorSource {
    fn from(e: ApiError) -> Self {
        ErrorSource::Api(e)
    }
}

impl From<&ApiError> for ErrorSource {
    fn from(e: &ApiError) -> Self {
        ErrorSource::Api(e.clone())
    }
}

impl From<&anyhow::Error> for ErrorSource {
    fn from(e: &anyhow::Error) -> Self {
        match e.downcast_ref::<ApiError>() {
            Some(api) => ErrorSource::Api(api.clone()),
            None => ErrorSource::Error(format!("{:#}", e)),
        }
    }
}

impl From<&str> for ErrorSource {
    fn from(s: &str) -> Self {
        ErrorSource::Message(s.to_string())
    }
}

impl From<String> for ErrorSource {
    fn from(s: String) -> Self {
        ErrorSource::Message(s)
    }
}

impl From<Value> for ErrorSource {
    fn from(v: Value) -> Self {
        ErrorSource::Unknown(v)
    }
}

/// Fields pulled out of a source before classification
#[derive(Debug, Default)]
struct Facts {
    status: Option<u16>,
    message: Option<String>,
    code: Option<String>,
    action: Option<String>,
    transport_failure: bool,
    malformed: bool,
}

impl ErrorSource {
    fn facts(&self) -> Facts {
        match self {
            ErrorSource::Api(e) => Facts {
                status: (e.status != 0).then_some(e.status),
                message: Some(e.message.clone()),
                code: e.error_code.clone(),
                action: e.action.clone(),
                transport_failure: e.is_network(),
                malformed: e.is_malformed(),
            },
            ErrorSource::Error(msg) | ErrorSource::Message(msg) => Facts {
                message: Some(msg.clone()),
                ..Default::default()
            },
            ErrorSource::Unknown(value) => facts_from_value(value),
        }
    }
}

fn facts_from_value(value: &Value) -> Facts {
    let text = |keys: &[&str]| {
        keys.iter()
            .find_map(|k| value.get(*k).and_then(Value::as_str))
            .map(String::from)
    };
    match value {
        Value::String(s) => Facts {
            message: Some(s.clone()),
            ..Default::default()
        },
        Value::Object(_) => Facts {
            status: ["status", "status_code"]
                .iter()
                .find_map(|k| value.get(*k).and_then(Value::as_u64))
                .and_then(|s| u16::try_from(s).ok())
                .filter(|s| *s != 0),
            message: text(&["message", "detail", "error"]),
            code: text(&["error_code", "code"]),
            action: text(&["action"]),
            ..Default::default()
        },
        _ => Facts::default(),
    }
}

struct Pattern {
    regex: Regex,
    code: ErrorCode,
}

fn patterns() -> &'static [Pattern] {
    static PATTERNS: OnceLock<Vec<Pattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let table: &[(&str, ErrorCode)] = &[
            (r"timed? ?out|timeout|deadline exceeded", ErrorCode::NetworkTimeout),
            (
                r"failed to fetch|network ?error|connection (refused|reset|closed)|dns|unreachable|offline",
                ErrorCode::NetworkOffline,
            ),
            (r"(token|session|jwt) (has )?expired", ErrorCode::SessionExpired),
            (
                r"unauthori[sz]ed|not authenticated|invalid (api )?key|invalid token",
                ErrorCode::Unauthorized,
            ),
            (r"forbidden|permission denied|not allowed", ErrorCode::Forbidden),
            (r"rate limit|too many requests", ErrorCode::RateLimited),
            (r"quota", ErrorCode::QuotaExceeded),
            (r"plan limit|upgrade (your )?plan|limit reached", ErrorCode::PlanLimitReached),
            (r"payment required|subscription required", ErrorCode::PaymentRequired),
            (r"merge conflict|conflicts? with", ErrorCode::FixMergeConflict),
            (r"preview (is )?required|must be previewed", ErrorCode::FixPreviewRequired),
            (r"\bstale\b|out of date|outdated", ErrorCode::FixStale),
            (r"not connected|installation (not found|missing)", ErrorCode::RepoNotConnected),
            (r"analysis (failed|error)", ErrorCode::AnalysisFailed),
            (r"already running|already in progress", ErrorCode::AnalysisInProgress),
            (r"not found", ErrorCode::NotFound),
            (r"validation|invalid|field required", ErrorCode::ValidationFailed),
            (r"maintenance", ErrorCode::Maintenance),
            (r"internal server error", ErrorCode::InternalError),
        ];
        table
            .iter()
            .filter_map(|(source, code)| {
                match Regex::new(&format!("(?i){}", source)) {
                    Ok(regex) => Some(Pattern { regex, code: *code }),
                    Err(e) => {
                        tracing::warn!("Skipping error pattern {:?}: {}", source, e);
                        None
                    }
                }
            })
            .collect()
    })
}

fn match_message(message: &str) -> Option<ErrorCode> {
    patterns()
        .iter()
        .find(|p| p.regex.is_match(message))
        .map(|p| p.code)
}

/// Backend text worth showing instead of the catalog sentence
fn meaningful(message: &Option<String>) -> Option<&str> {
    message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty() && !m.starts_with("HTTP "))
}

/// A failure, normalized for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{title}: {message} [{code}]")]
pub struct ClassifiedError {
    /// Stable code such as `FIX_002`, or the backend's own code verbatim
    pub code: String,
    pub category: ErrorCategory,
    pub title: String,
    pub message: String,
    pub action: String,
    pub status: Option<u16>,
    /// The user can resolve this themselves
    pub user_actionable: bool,
    /// Worth sending to error reporting
    pub reportable: bool,
}

impl ClassifiedError {
    /// Catalog text for `code`
    pub fn from_code(code: ErrorCode) -> Self {
        let e = code.entry();
        let system = e.category == ErrorCategory::System;
        Self {
            code: e.code.to_string(),
            category: e.category,
            title: e.title.to_string(),
            message: e.message.to_string(),
            action: e.action.to_string(),
            status: None,
            user_actionable: !system,
            reportable: system,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Catalog code, if the code is one we know
    pub fn error_code(&self) -> Option<ErrorCode> {
        ErrorCode::from_code(&self.code)
    }

    pub fn is(&self, code: ErrorCode) -> bool {
        self.error_code() == Some(code)
    }

    /// Notification payload; network and auth failures get friendlier titles
    pub fn to_toast(&self) -> Toast {
        let title = match (self.category, self.error_code()) {
            (ErrorCategory::Network, _) => "You appear to be offline".to_string(),
            (
                ErrorCategory::Authentication,
                Some(ErrorCode::SessionExpired | ErrorCode::Unauthorized),
            ) => "Please sign in again".to_string(),
            _ => self.title.clone(),
        };
        Toast {
            title,
            description: self.message.clone(),
            action: Some(self.action.clone()).filter(|a| !a.is_empty()),
            code: self.code.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub title: String,
    pub description: String,
    pub action: Option<String>,
    pub code: String,
}

/// Classify any failure
pub fn classify(source: impl Into<ErrorSource>) -> ClassifiedError {
    let source = source.into();
    let facts = source.facts();
    let backend_text = meaningful(&facts.message).map(String::from);

    let mut classified = if let Some(raw) = facts.code.as_deref().filter(|c| !c.is_empty()) {
        match ErrorCode::from_code(raw) {
            Some(code) => {
                let mut c = ClassifiedError::from_code(code);
                c.code = raw.to_string();
                if let Some(text) = &backend_text {
                    c.message = text.clone();
                }
                c
            }
            None => {
                // Unrecognized backend code: keep it, describe generically
                let mut c = ClassifiedError::from_code(ErrorCode::Unknown);
                c.code = raw.to_string();
                c.title = "Request failed".to_string();
                if let Some(text) = &backend_text {
                    c.message = text.clone();
                }
                c
            }
        }
    } else if facts.malformed {
        ClassifiedError::from_code(ErrorCode::MalformedPayload)
    } else if let Some(code) = facts.status.and_then(ErrorCode::from_status) {
        let mut c = ClassifiedError::from_code(code);
        if let Some(text) = &backend_text {
            c.message = text.clone();
        }
        c
    } else if let Some(code) = backend_text.as_deref().and_then(match_message) {
        ClassifiedError::from_code(code)
    } else if facts.transport_failure {
        ClassifiedError::from_code(ErrorCode::NetworkOffline)
    } else {
        let c = ClassifiedError::from_code(ErrorCode::Unknown);
        match &backend_text {
            Some(text) => c.with_message(text.clone()),
            None => c,
        }
    };

    if let Some(action) = facts.action.filter(|a| !a.trim().is_empty()) {
        classified.action = action;
    }
    classified.status = facts.status;
    classified
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_explicit_code_beats_status() {
        let err = ApiError::new(500, "The fix no longer applies").with_code("FIX_002");
        let c = classify(err);
        assert_eq!(c.code, "FIX_002");
        assert_eq!(c.category, ErrorCategory::FixWorkflow);
        assert_eq!(c.message, "The fix no longer applies");
        assert_eq!(c.status, Some(500));
    }

    #[test]
    fn test_known_code_keeps_backend_spelling() {
        let c = classify(ApiError::new(500, "boom").with_code("fix_002"));
        assert_eq!(c.code, "fix_002");
        assert_eq!(c.category, ErrorCategory::FixWorkflow);
        assert!(c.is(ErrorCode::FixStale));

        let c = classify(ApiError::new(409, "stale").with_code(" FIX_002 "));
        assert_eq!(c.code, " FIX_002 ");
        assert_eq!(c.to_toast().code, " FIX_002 ");
    }

    #[test]
    fn test_undecodable_body_is_a_system_error() {
        let c = classify(ApiError::parse(
            200,
            "invalid type: string \"lots\", expected u32",
        ));
        assert!(c.is(ErrorCode::MalformedPayload));
        assert_eq!(c.category, ErrorCategory::System);
        assert!(c.reportable);
        assert!(!c.user_actionable);
        assert_eq!(c.status, Some(200));

        let c = classify(ApiError::encode("key must be a string"));
        assert!(c.is(ErrorCode::MalformedPayload));
        assert_ne!(c.category, ErrorCategory::Network);
        assert_eq!(c.status, None);
    }

    #[test]
    fn test_unrecognized_code_is_kept() {
        let c = classify(ApiError::new(400, "nope").with_code("WIDGET_042"));
        assert_eq!(c.code, "WIDGET_042");
        assert_eq!(c.message, "nope");
        assert!(c.error_code().is_none());
    }

    #[test]
    fn test_status_mapping() {
        let c = classify(ApiError::new(429, "HTTP 429"));
        assert!(c.is(ErrorCode::RateLimited));
        // Generic "HTTP nnn" text falls back to the catalog sentence
        assert_eq!(c.message, ErrorCode::RateLimited.entry().message);
    }

    #[test]
    fn test_network_messages() {
        assert!(classify(ApiError::network("Request timed out")).is(ErrorCode::NetworkTimeout));
        assert!(
            classify(ApiError::network("Connection refused (os error 111)"))
                .is(ErrorCode::NetworkOffline)
        );
        assert!(classify(ApiError::network("weird")).is(ErrorCode::NetworkOffline));
    }

    #[test]
    fn test_plain_messages() {
        assert!(classify("You have exceeded your analysis quota").is(ErrorCode::QuotaExceeded));
        assert!(classify("Fix must be previewed first").is(ErrorCode::FixPreviewRequired));
        let c = classify("something odd happened");
        assert!(c.is(ErrorCode::Unknown));
        assert_eq!(c.message, "something odd happened");
        assert!(c.reportable);
    }

    #[test]
    fn test_unknown_values() {
        let c = classify(json!({"code": "BILLING_003", "message": "card declined"}));
        assert!(c.is(ErrorCode::SubscriptionInactive));
        assert_eq!(c.message, "card declined");

        let c = classify(json!(42));
        assert!(c.is(ErrorCode::Unknown));
    }

    #[test]
    fn test_backend_action_wins() {
        let c = classify(ApiError::new(402, "Pro only").with_action("Start a trial"));
        assert_eq!(c.action, "Start a trial");
        assert_eq!(c.category, ErrorCategory::Billing);
    }

    #[test]
    fn test_anyhow_downcast() {
        let err = anyhow::Error::new(ApiError::new(404, "gone"));
        assert!(classify(&err).is(ErrorCode::NotFound));
        let other = anyhow::anyhow!("disk full");
        assert!(classify(&other).is(ErrorCode::Unknown));
    }

    #[test]
    fn test_toast_titles() {
        let toast = classify(ApiError::network("dns failure")).to_toast();
        assert_eq!(toast.title, "You appear to be offline");
        let toast = classify(ApiError::new(401, "expired")).to_toast();
        assert_eq!(toast.title, "Please sign in again");
        let toast = classify(ApiError::new(403, "no")).to_toast();
        assert_eq!(toast.title, "Access denied");
        assert_eq!(toast.code, "AUTH_003");
    }
}
