//! Mutation-driven cache invalidation
//!
//! Each domain event maps to a fixed set of key families. Dispatching an
//! event marks every cached key in those families stale, regardless of the
//! key's parameters. That over-invalidates within a family (a
//! severity-filtered list is refreshed even if the mutation could not have
//! changed it) but never leaves a dependent view showing stale data.
//!
//! Events scoped to one entity (a comment on a fix, a preview run) touch
//! only that entity's keys and leave the collection families alone.

use std::str::FromStr;

use super::keys::{self, CacheKey, KeyFamily};
use super::traits::CacheLayer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainEvent {
    FixApproved,
    FixRejected,
    FixApplied,
    FixesBatchUpdated,
    FixPreviewed,
    FixCommentAdded,
    FindingsStatusUpdated,
    AnalysisStarted,
    AnalysisCompleted,
    RepositoryConnected,
    RepositoryRemoved,
    SubscriptionChanged,
    AssetInstalled,
    AssetUninstalled,
}

use super::keys::KeyFamily as F;

const FIX_REVIEW: &[KeyFamily] = &[
    F::Fixes,
    F::FixStats,
    F::FindingsSummary,
    F::AnalyticsSummary,
];

const FIX_APPLIED: &[KeyFamily] = &[
    F::Fixes,
    F::FixStats,
    F::Findings,
    F::Finding,
    F::FindingsSummary,
    F::FindingsByDetector,
    F::AnalyticsSummary,
    F::AnalyticsTrends,
    F::HealthScore,
];

const FIXES_BATCH: &[KeyFamily] = &[
    F::Fixes,
    F::Fix,
    F::FixStats,
    F::FindingsSummary,
    F::AnalyticsSummary,
];

const FINDINGS_STATUS: &[KeyFamily] = &[
    F::Findings,
    F::Finding,
    F::FindingsSummary,
    F::FindingsByDetector,
    F::AnalyticsSummary,
    F::AnalyticsTrends,
    F::HealthScore,
];

const ANALYSIS_STARTED: &[KeyFamily] = &[F::AnalysisHistory, F::Repositories, F::Usage];

const ANALYSIS_COMPLETED: &[KeyFamily] = &[
    F::Findings,
    F::Finding,
    F::FindingsSummary,
    F::FindingsByDetector,
    F::Fixes,
    F::FixStats,
    F::AnalyticsSummary,
    F::AnalyticsTrends,
    F::HealthScore,
    F::Repositories,
    F::Repository,
    F::AnalysisHistory,
];

const REPOSITORY_CONNECTED: &[KeyFamily] = &[F::Repositories, F::AnalyticsSummary, F::Usage];

const REPOSITORY_REMOVED: &[KeyFamily] = &[
    F::Repositories,
    F::Repository,
    F::Findings,
    F::FindingsSummary,
    F::FindingsByDetector,
    F::Fixes,
    F::FixStats,
    F::AnalyticsSummary,
    F::AnalyticsTrends,
    F::HealthScore,
    F::Usage,
];

const SUBSCRIPTION: &[KeyFamily] = &[F::Subscription, F::Usage, F::Invoices];

const MARKETPLACE: &[KeyFamily] = &[F::MarketplaceAssets, F::MarketplaceAsset, F::InstalledAssets];

impl DomainEvent {
    pub const ALL: [DomainEvent; 14] = [
        DomainEvent::FixApproved,
        DomainEvent::FixRejected,
        DomainEvent::FixApplied,
        DomainEvent::FixesBatchUpdated,
        DomainEvent::FixPreviewed,
        DomainEvent::FixCommentAdded,
        DomainEvent::FindingsStatusUpdated,
        DomainEvent::AnalysisStarted,
        DomainEvent::AnalysisCompleted,
        DomainEvent::RepositoryConnected,
        DomainEvent::RepositoryRemoved,
        DomainEvent::SubscriptionChanged,
        DomainEvent::AssetInstalled,
        DomainEvent::AssetUninstalled,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::FixApproved => "fix-approved",
            DomainEvent::FixRejected => "fix-rejected",
            DomainEvent::FixApplied => "fix-applied",
            DomainEvent::FixesBatchUpdated => "fixes-batch-updated",
            DomainEvent::FixPreviewed => "fix-previewed",
            DomainEvent::FixCommentAdded => "fix-comment-added",
            DomainEvent::FindingsStatusUpdated => "findings-status-updated",
            DomainEvent::AnalysisStarted => "analysis-started",
            DomainEvent::AnalysisCompleted => "analysis-completed",
            DomainEvent::RepositoryConnected => "repository-connected",
            DomainEvent::RepositoryRemoved => "repository-removed",
            DomainEvent::SubscriptionChanged => "subscription-changed",
            DomainEvent::AssetInstalled => "asset-installed",
            DomainEvent::AssetUninstalled => "asset-uninstalled",
        }
    }

    /// Families invalidated wholesale by this event
    pub fn families(&self) -> &'static [KeyFamily] {
        match self {
            DomainEvent::FixApproved | DomainEvent::FixRejected => FIX_REVIEW,
            DomainEvent::FixApplied => FIX_APPLIED,
            DomainEvent::FixesBatchUpdated => FIXES_BATCH,
            DomainEvent::FixPreviewed | DomainEvent::FixCommentAdded => &[],
            DomainEvent::FindingsStatusUpdated => FINDINGS_STATUS,
            DomainEvent::AnalysisStarted => ANALYSIS_STARTED,
            DomainEvent::AnalysisCompleted => ANALYSIS_COMPLETED,
            DomainEvent::RepositoryConnected => REPOSITORY_CONNECTED,
            DomainEvent::RepositoryRemoved => REPOSITORY_REMOVED,
            DomainEvent::SubscriptionChanged => SUBSCRIPTION,
            DomainEvent::AssetInstalled | DomainEvent::AssetUninstalled => MARKETPLACE,
        }
    }

    /// Exact keys for the entity the event happened to
    pub fn entity_keys(&self, id: &str) -> Vec<CacheKey> {
        match self {
            DomainEvent::FixApproved | DomainEvent::FixRejected | DomainEvent::FixApplied => {
                vec![keys::fix(id)]
            }
            DomainEvent::FixPreviewed => vec![keys::fix_preview(id), keys::fix(id)],
            DomainEvent::FixCommentAdded => vec![keys::fix_comments(id), keys::fix(id)],
            DomainEvent::FindingsStatusUpdated => vec![keys::finding(id)],
            DomainEvent::AnalysisStarted => vec![keys::repository(id)],
            DomainEvent::AnalysisCompleted => vec![keys::analysis_status(id)],
            _ => Vec::new(),
        }
    }

    /// Touches only the entity's own keys
    pub fn is_entity_scoped(&self) -> bool {
        self.families().is_empty()
    }
}

impl std::fmt::Display for DomainEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DomainEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DomainEvent::ALL
            .iter()
            .copied()
            .find(|e| e.name() == s)
            .ok_or_else(|| format!("unknown event '{}'", s))
    }
}

/// What a dispatch touched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidationReport {
    pub event: DomainEvent,
    pub families: Vec<KeyFamily>,
    pub entity_keys: Vec<CacheKey>,
    /// Cached entries marked stale
    pub entries_marked: usize,
}

/// Mark every key affected by `event` stale in `cache`.
///
/// `entity_id` names the fix/finding/run the event concerns; without it
/// entity-scoped events are a no-op.
pub fn dispatch(
    cache: &dyn CacheLayer,
    event: DomainEvent,
    entity_id: Option<&str>,
) -> InvalidationReport {
    let families = event.families();
    let mut marked = if families.is_empty() {
        0
    } else {
        cache.invalidate_matching(&|key| families.contains(&key.family()))
    };

    let entity_keys = entity_id.map(|id| event.entity_keys(id)).unwrap_or_default();
    for key in &entity_keys {
        // Already counted when its family was swept
        if families.contains(&key.family()) {
            continue;
        }
        if cache.invalidate_key(key) {
            marked += 1;
        }
    }

    tracing::debug!(
        "Dispatched {} on {}: {} families, {} entity keys, {} entries stale",
        event,
        cache.name(),
        families.len(),
        entity_keys.len(),
        marked
    );

    InvalidationReport {
        event,
        families: families.to_vec(),
        entity_keys,
        entries_marked: marked,
    }
}
