//! Stable error codes and their user-facing text

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Authentication,
    Network,
    Validation,
    Resource,
    RateLimit,
    Billing,
    FixWorkflow,
    Repository,
    Analysis,
    System,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorCategory::Authentication => "authentication",
            ErrorCategory::Network => "network",
            ErrorCategory::Validation => "validation",
            ErrorCategory::Resource => "resource",
            ErrorCategory::RateLimit => "rate_limit",
            ErrorCategory::Billing => "billing",
            ErrorCategory::FixWorkflow => "fix_workflow",
            ErrorCategory::Repository => "repository",
            ErrorCategory::Analysis => "analysis",
            ErrorCategory::System => "system",
        };
        f.write_str(s)
    }
}

/// Catalog text for one code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub code: &'static str,
    pub category: ErrorCategory,
    pub title: &'static str,
    pub message: &'static str,
    pub action: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    SessionExpired,
    Unauthorized,
    Forbidden,
    SessionNotReady,
    NetworkOffline,
    NetworkTimeout,
    ServiceUnavailable,
    ValidationFailed,
    InvalidFilter,
    NotFound,
    Conflict,
    RateLimited,
    QuotaExceeded,
    PlanLimitReached,
    PaymentRequired,
    SubscriptionInactive,
    FixPreviewRequired,
    FixStale,
    FixMergeConflict,
    FixAlreadyApplied,
    FixPreviewFailed,
    RepoNotConnected,
    RepoAccessDenied,
    RepoTooLarge,
    AnalysisFailed,
    AnalysisInProgress,
    AnalysisTimeout,
    InternalError,
    Maintenance,
    MalformedPayload,
    Unknown,
}

const UPGRADE: &str = "Upgrade your plan at https://repotoire.com/pricing";

impl ErrorCode {
    pub const ALL: [ErrorCode; 31] = [
        ErrorCode::SessionExpired,
        ErrorCode::Unauthorized,
        ErrorCode::Forbidden,
        ErrorCode::SessionNotReady,
        ErrorCode::NetworkOffline,
        ErrorCode::NetworkTimeout,
        ErrorCode::ServiceUnavailable,
        ErrorCode::ValidationFailed,
        ErrorCode::InvalidFilter,
        ErrorCode::NotFound,
        ErrorCode::Conflict,
        ErrorCode::RateLimited,
        ErrorCode::QuotaExceeded,
        ErrorCode::PlanLimitReached,
        ErrorCode::PaymentRequired,
        ErrorCode::SubscriptionInactive,
        ErrorCode::FixPreviewRequired,
        ErrorCode::FixStale,
        ErrorCode::FixMergeConflict,
        ErrorCode::FixAlreadyApplied,
        ErrorCode::FixPreviewFailed,
        ErrorCode::RepoNotConnected,
        ErrorCode::RepoAccessDenied,
        ErrorCode::RepoTooLarge,
        ErrorCode::AnalysisFailed,
        ErrorCode::AnalysisInProgress,
        ErrorCode::AnalysisTimeout,
        ErrorCode::InternalError,
        ErrorCode::Maintenance,
        ErrorCode::MalformedPayload,
        ErrorCode::Unknown,
    ];

    pub fn entry(self) -> CatalogEntry {
        use ErrorCategory::*;
        let (code, category, title, message, action) = match self {
            ErrorCode::SessionExpired => (
                "AUTH_001",
                Authentication,
                "Session expired",
                "Your session has expired.",
                "Sign in again to continue.",
            ),
            ErrorCode::Unauthorized => (
                "AUTH_002",
                Authentication,
                "Authentication required",
                "You need to be signed in to do that.",
                "Sign in, or set REPOTOIRE_API_KEY.",
            ),
            ErrorCode::Forbidden => (
                "AUTH_003",
                Authentication,
                "Access denied",
                "You don't have permission to perform this action.",
                "Ask an organization admin for access.",
            ),
            ErrorCode::SessionNotReady => (
                "AUTH_004",
                Authentication,
                "Session not ready",
                "Authentication has not finished initializing.",
                "Wait a moment and try again.",
            ),
            ErrorCode::NetworkOffline => (
                "NET_001",
                Network,
                "Connection failed",
                "Could not reach the Repotoire servers.",
                "Check your internet connection and try again.",
            ),
            ErrorCode::NetworkTimeout => (
                "NET_002",
                Network,
                "Request timed out",
                "The server took too long to respond.",
                "Try again. Large repositories can take longer.",
            ),
            ErrorCode::ServiceUnavailable => (
                "NET_003",
                Network,
                "Service unavailable",
                "Repotoire is temporarily unavailable.",
                "Try again in a few minutes.",
            ),
            ErrorCode::ValidationFailed => (
                "VAL_001",
                Validation,
                "Invalid request",
                "Some of the submitted data is invalid.",
                "Review the input and try again.",
            ),
            ErrorCode::InvalidFilter => (
                "VAL_002",
                Validation,
                "Invalid filter",
                "One of the filters is not supported.",
                "Clear the filters and try again.",
            ),
            ErrorCode::NotFound => (
                "RES_001",
                Resource,
                "Not found",
                "The requested resource could not be found.",
                "It may have been deleted. Refresh and try again.",
            ),
            ErrorCode::Conflict => (
                "RES_002",
                Resource,
                "Conflict",
                "The resource was changed by someone else.",
                "Refresh to get the latest version.",
            ),
            ErrorCode::RateLimited => (
                "RATE_001",
                RateLimit,
                "Too many requests",
                "You're sending requests too quickly.",
                "Wait a minute and try again.",
            ),
            ErrorCode::QuotaExceeded => (
                "RATE_002",
                RateLimit,
                "Quota exceeded",
                "You've used all analyses included this month.",
                UPGRADE,
            ),
            ErrorCode::PlanLimitReached => (
                "BILLING_001",
                Billing,
                "Plan limit reached",
                "This action exceeds your current plan's limits.",
                UPGRADE,
            ),
            ErrorCode::PaymentRequired => (
                "BILLING_002",
                Billing,
                "Upgrade required",
                "This feature requires a paid subscription.",
                UPGRADE,
            ),
            ErrorCode::SubscriptionInactive => (
                "BILLING_003",
                Billing,
                "Subscription inactive",
                "Your subscription is past due or cancelled.",
                "Update your payment method in the billing portal.",
            ),
            ErrorCode::FixPreviewRequired => (
                "FIX_001",
                FixWorkflow,
                "Preview required",
                "This fix must be previewed before it can be applied.",
                "Run a preview of the fix first.",
            ),
            ErrorCode::FixStale => (
                "FIX_002",
                FixWorkflow,
                "Fix is out of date",
                "The code changed since this fix was generated.",
                "Regenerate the fix against the latest code.",
            ),
            ErrorCode::FixMergeConflict => (
                "FIX_003",
                FixWorkflow,
                "Merge conflict",
                "The fix conflicts with recent changes in the repository.",
                "Resolve the conflict manually or regenerate the fix.",
            ),
            ErrorCode::FixAlreadyApplied => (
                "FIX_004",
                FixWorkflow,
                "Already applied",
                "This fix has already been applied.",
                "Refresh the fix list.",
            ),
            ErrorCode::FixPreviewFailed => (
                "FIX_005",
                FixWorkflow,
                "Preview failed",
                "The fix did not pass sandbox verification.",
                "Review the preview output before approving.",
            ),
            ErrorCode::RepoNotConnected => (
                "REPO_001",
                Repository,
                "Repository not connected",
                "The GitHub App is not installed for this repository.",
                "Reconnect the repository from settings.",
            ),
            ErrorCode::RepoAccessDenied => (
                "REPO_002",
                Repository,
                "Repository access denied",
                "Repotoire can no longer read this repository.",
                "Check the GitHub App permissions.",
            ),
            ErrorCode::RepoTooLarge => (
                "REPO_003",
                Repository,
                "Repository too large",
                "This repository exceeds the size your plan can analyze.",
                UPGRADE,
            ),
            ErrorCode::AnalysisFailed => (
                "ANALYSIS_001",
                Analysis,
                "Analysis failed",
                "The analysis could not be completed.",
                "Try running the analysis again.",
            ),
            ErrorCode::AnalysisInProgress => (
                "ANALYSIS_002",
                Analysis,
                "Analysis already running",
                "An analysis is already in progress for this repository.",
                "Wait for it to finish.",
            ),
            ErrorCode::AnalysisTimeout => (
                "ANALYSIS_003",
                Analysis,
                "Analysis timed out",
                "The analysis took longer than allowed.",
                "Try again, or exclude generated files.",
            ),
            ErrorCode::InternalError => (
                "SYS_001",
                System,
                "Something went wrong",
                "An unexpected server error occurred.",
                "Try again. If it keeps happening, contact support with the error code.",
            ),
            ErrorCode::Maintenance => (
                "SYS_002",
                System,
                "Scheduled maintenance",
                "Repotoire is undergoing maintenance.",
                "Try again shortly.",
            ),
            ErrorCode::MalformedPayload => (
                "SYS_003",
                System,
                "Unexpected response",
                "The server sent data this client could not read.",
                "Update repotoire-cloud. If it keeps happening, contact support with the error code.",
            ),
            ErrorCode::Unknown => (
                "UNKNOWN",
                System,
                "Unexpected error",
                "An unexpected error occurred.",
                "Try again or contact support.",
            ),
        };
        CatalogEntry {
            code,
            category,
            title,
            message,
            action,
        }
    }

    pub fn code(self) -> &'static str {
        self.entry().code
    }

    /// Look up a stable code, ignoring case and surrounding whitespace.
    /// Callers keep the original spelling.
    pub fn from_code(code: &str) -> Option<ErrorCode> {
        let code = code.trim();
        ErrorCode::ALL
            .iter()
            .copied()
            .find(|c| c.code().eq_ignore_ascii_case(code))
    }

    /// Code implied by an HTTP status. Status 0 (no response) maps to nothing.
    pub fn from_status(status: u16) -> Option<ErrorCode> {
        match status {
            400 | 422 => Some(ErrorCode::ValidationFailed),
            401 => Some(ErrorCode::SessionExpired),
            402 => Some(ErrorCode::PaymentRequired),
            403 => Some(ErrorCode::Forbidden),
            404 => Some(ErrorCode::NotFound),
            408 | 504 => Some(ErrorCode::NetworkTimeout),
            409 => Some(ErrorCode::Conflict),
            429 => Some(ErrorCode::RateLimited),
            502 | 503 => Some(ErrorCode::ServiceUnavailable),
            500..=599 => Some(ErrorCode::InternalError),
            _ => None,
        }
    }
}
