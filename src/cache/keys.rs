//! Cache key registry
//!
//! Every fetchable resource gets a pure key factory. A key is an ordered
//! tuple whose first element is the resource family tag and whose remaining
//! elements are the filter/sort/pagination parameters. Equal inputs always
//! produce structurally equal keys, and two different resources never share
//! a family tag, so invalidating by family touches exactly the variants of
//! one logical resource.
//!
//! Optional filters are encoded as explicit nulls so every key of a family
//! has the same arity and parameters stay positionally aligned.

use serde::Serialize;

use crate::api::analytics::TrendPeriod;
use crate::api::findings::FindingFilters;
use crate::api::fixes::FixFilters;
use crate::api::marketplace::AssetFilters;
use crate::models::ListParams;

/// Resource families. The string form is the leading tuple element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyFamily {
    Findings,
    Finding,
    FindingsSummary,
    FindingsByDetector,
    Fixes,
    Fix,
    FixStats,
    FixComments,
    FixPreview,
    AnalyticsSummary,
    AnalyticsTrends,
    HealthScore,
    Repositories,
    Repository,
    AnalysisStatus,
    AnalysisHistory,
    Subscription,
    Usage,
    Invoices,
    MarketplaceAssets,
    MarketplaceAsset,
    InstalledAssets,
}

impl KeyFamily {
    pub const ALL: [KeyFamily; 22] = [
        KeyFamily::Findings,
        KeyFamily::Finding,
        KeyFamily::FindingsSummary,
        KeyFamily::FindingsByDetector,
        KeyFamily::Fixes,
        KeyFamily::Fix,
        KeyFamily::FixStats,
        KeyFamily::FixComments,
        KeyFamily::FixPreview,
        KeyFamily::AnalyticsSummary,
        KeyFamily::AnalyticsTrends,
        KeyFamily::HealthScore,
        KeyFamily::Repositories,
        KeyFamily::Repository,
        KeyFamily::AnalysisStatus,
        KeyFamily::AnalysisHistory,
        KeyFamily::Subscription,
        KeyFamily::Usage,
        KeyFamily::Invoices,
        KeyFamily::MarketplaceAssets,
        KeyFamily::MarketplaceAsset,
        KeyFamily::InstalledAssets,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KeyFamily::Findings => "findings",
            KeyFamily::Finding => "finding",
            KeyFamily::FindingsSummary => "findings-summary",
            KeyFamily::FindingsByDetector => "findings-by-detector",
            KeyFamily::Fixes => "fixes",
            KeyFamily::Fix => "fix",
            KeyFamily::FixStats => "fix-stats",
            KeyFamily::FixComments => "fix-comments",
            KeyFamily::FixPreview => "fix-preview",
            KeyFamily::AnalyticsSummary => "analytics-summary",
            KeyFamily::AnalyticsTrends => "analytics-trends",
            KeyFamily::HealthScore => "health-score",
            KeyFamily::Repositories => "repositories",
            KeyFamily::Repository => "repository",
            KeyFamily::AnalysisStatus => "analysis-status",
            KeyFamily::AnalysisHistory => "analysis-history",
            KeyFamily::Subscription => "subscription",
            KeyFamily::Usage => "usage",
            KeyFamily::Invoices => "invoices",
            KeyFamily::MarketplaceAssets => "marketplace-assets",
            KeyFamily::MarketplaceAsset => "marketplace-asset",
            KeyFamily::InstalledAssets => "installed-assets",
        }
    }

    /// Zero-argument form of the key: the family head
    pub fn head(self) -> CacheKey {
        CacheKey {
            family: self,
            parts: Vec::new(),
        }
    }
}

impl std::fmt::Display for KeyFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One positional parameter of a key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum KeyPart {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
}

impl From<&str> for KeyPart {
    fn from(s: &str) -> Self {
        KeyPart::Text(s.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(s: String) -> Self {
        KeyPart::Text(s)
    }
}

impl From<&String> for KeyPart {
    fn from(s: &String) -> Self {
        KeyPart::Text(s.clone())
    }
}

impl From<u32> for KeyPart {
    fn from(n: u32) -> Self {
        KeyPart::Int(i64::from(n))
    }
}

impl From<usize> for KeyPart {
    fn from(n: usize) -> Self {
        KeyPart::Int(n as i64)
    }
}

impl From<bool> for KeyPart {
    fn from(b: bool) -> Self {
        KeyPart::Bool(b)
    }
}

impl<T: Into<KeyPart>> From<Option<T>> for KeyPart {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(KeyPart::Null)
    }
}

/// Canonical cache key: `(family, params...)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    family: KeyFamily,
    parts: Vec<KeyPart>,
}

impl CacheKey {
    pub fn family(&self) -> KeyFamily {
        self.family
    }

    /// Leading tuple element
    pub fn head(&self) -> &'static str {
        self.family.as_str()
    }

    pub fn parts(&self) -> &[KeyPart] {
        &self.parts
    }

    pub fn is_family_head(&self) -> bool {
        self.parts.is_empty()
    }

    /// First-element equality
    pub fn same_family(&self, other: &CacheKey) -> bool {
        self.family == other.family
    }

    fn with(mut self, part: impl Into<KeyPart>) -> Self {
        self.parts.push(part.into());
        self
    }

    fn with_list(self, params: &ListParams) -> Self {
        self.with(params.page)
            .with(params.page_size)
            .with(params.sort_by.as_deref())
            .with(params.sort_direction.to_string())
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut tuple = vec![serde_json::Value::String(self.head().to_string())];
        tuple.extend(
            self.parts
                .iter()
                .map(|p| serde_json::to_value(p).unwrap_or(serde_json::Value::Null)),
        );
        write!(f, "{}", serde_json::Value::Array(tuple))
    }
}

// ── Findings ──

pub fn findings(filters: &FindingFilters, params: &ListParams) -> CacheKey {
    KeyFamily::Findings
        .head()
        .with(filters.severity.map(|s| s.to_string()))
        .with(filters.detector.as_deref())
        .with(filters.status.map(|s| s.to_string()))
        .with(filters.category.as_deref())
        .with(filters.repository_id.as_deref())
        .with(filters.analysis_run_id.as_deref())
        .with(filters.search.as_deref())
        .with_list(params)
}

pub fn finding(id: &str) -> CacheKey {
    KeyFamily::Finding.head().with(id)
}

pub fn findings_summary(repository_id: Option<&str>) -> CacheKey {
    KeyFamily::FindingsSummary.head().with(repository_id)
}

pub fn findings_by_detector(repository_id: Option<&str>, limit: u32) -> CacheKey {
    KeyFamily::FindingsByDetector
        .head()
        .with(repository_id)
        .with(limit)
}

// ── Fixes ──

pub fn fixes(filters: &FixFilters, params: &ListParams) -> CacheKey {
    KeyFamily::Fixes
        .head()
        .with(filters.status.map(|s| s.to_string()))
        .with(filters.confidence.map(|c| c.to_string()))
        .with(filters.repository_id.as_deref())
        .with(filters.finding_id.as_deref())
        .with(filters.search.as_deref())
        .with_list(params)
}

pub fn fix(id: &str) -> CacheKey {
    KeyFamily::Fix.head().with(id)
}

pub fn fix_stats(repository_id: Option<&str>) -> CacheKey {
    KeyFamily::FixStats.head().with(repository_id)
}

pub fn fix_comments(fix_id: &str) -> CacheKey {
    KeyFamily::FixComments.head().with(fix_id)
}

pub fn fix_preview(fix_id: &str) -> CacheKey {
    KeyFamily::FixPreview.head().with(fix_id)
}

// ── Analytics ──

pub fn analytics_summary(repository_id: Option<&str>) -> CacheKey {
    KeyFamily::AnalyticsSummary.head().with(repository_id)
}

pub fn analytics_trends(period: TrendPeriod, repository_id: Option<&str>) -> CacheKey {
    KeyFamily::AnalyticsTrends
        .head()
        .with(period.as_str())
        .with(repository_id)
}

pub fn health_score(repository_id: Option<&str>) -> CacheKey {
    KeyFamily::HealthScore.head().with(repository_id)
}

// ── Repositories & analysis runs ──

pub fn repositories(params: &ListParams) -> CacheKey {
    KeyFamily::Repositories.head().with_list(params)
}

pub fn repository(id: &str) -> CacheKey {
    KeyFamily::Repository.head().with(id)
}

pub fn analysis_status(run_id: &str) -> CacheKey {
    KeyFamily::AnalysisStatus.head().with(run_id)
}

pub fn analysis_history(repository_id: &str, params: &ListParams) -> CacheKey {
    KeyFamily::AnalysisHistory
        .head()
        .with(repository_id)
        .with_list(params)
}

// ── Billing ──

pub fn subscription() -> CacheKey {
    KeyFamily::Subscription.head()
}

pub fn usage() -> CacheKey {
    KeyFamily::Usage.head()
}

pub fn invoices(params: &ListParams) -> CacheKey {
    KeyFamily::Invoices.head().with_list(params)
}

// ── Marketplace ──

pub fn marketplace_assets(filters: &AssetFilters, params: &ListParams) -> CacheKey {
    KeyFamily::MarketplaceAssets
        .head()
        .with(filters.asset_type.map(|t| t.to_string()))
        .with(filters.search.as_deref())
        .with(filters.verified_only)
        .with_list(params)
}

pub fn marketplace_asset(slug: &str) -> CacheKey {
    KeyFamily::MarketplaceAsset.head().with(slug)
}

pub fn installed_assets() -> CacheKey {
    KeyFamily::InstalledAssets.head()
}
