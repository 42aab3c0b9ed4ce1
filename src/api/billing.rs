//! Billing endpoints: subscription, usage, invoices, checkout and portal

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{list_query, ApiClient, ApiResult};
use crate::http::QueryParams;
use crate::models::{ListParams, Page};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    #[default]
    Free,
    Pro,
    Enterprise,
}

impl std::fmt::Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanTier::Free => write!(f, "free"),
            PlanTier::Pro => write!(f, "pro"),
            PlanTier::Enterprise => write!(f, "enterprise"),
        }
    }
}

impl std::str::FromStr for PlanTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(PlanTier::Free),
            "pro" => Ok(PlanTier::Pro),
            "enterprise" => Ok(PlanTier::Enterprise),
            other => Err(format!("unknown plan '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    #[default]
    Active,
    Trialing,
    PastDue,
    Canceled,
    Incomplete,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Subscription {
    pub tier: PlanTier,
    pub status: SubscriptionStatus,
    pub seats: u32,
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
}

impl Subscription {
    pub fn is_paid(&self) -> bool {
        self.tier != PlanTier::Free
            && matches!(
                self.status,
                SubscriptionStatus::Active | SubscriptionStatus::Trialing
            )
    }
}

/// Current usage against plan limits. A `None` limit is unlimited.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Usage {
    pub repos_used: u32,
    pub repos_limit: Option<u32>,
    pub analyses_this_month: u32,
    pub analyses_limit: Option<u32>,
    pub seats_used: u32,
    pub seats_limit: Option<u32>,
}

impl Usage {
    pub fn remaining_analyses(&self) -> Option<u32> {
        self.analyses_limit
            .map(|limit| limit.saturating_sub(self.analyses_this_month))
    }

    pub fn at_repo_limit(&self) -> bool {
        self.repos_limit.is_some_and(|limit| self.repos_used >= limit)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Invoice {
    pub id: String,
    #[serde(default)]
    pub number: Option<String>,
    pub amount_cents: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pdf_url: Option<String>,
}

fn default_currency() -> String {
    "usd".to_string()
}

impl Invoice {
    /// "$12.50 USD"
    pub fn formatted_amount(&self) -> String {
        let sign = if self.amount_cents < 0 { "-" } else { "" };
        let cents = self.amount_cents.unsigned_abs();
        format!(
            "{}${}.{:02} {}",
            sign,
            cents / 100,
            cents % 100,
            self.currency.to_uppercase()
        )
    }
}

/// Hosted page the user is sent to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RedirectSession {
    pub url: String,
}

#[derive(Serialize)]
struct CheckoutBody {
    tier: PlanTier,
    seats: u32,
}

/// GET /billing/subscription
pub fn subscription(api: &ApiClient) -> ApiResult<Subscription> {
    api.get("/billing/subscription", QueryParams::new())
}

/// GET /billing/usage
pub fn usage(api: &ApiClient) -> ApiResult<Usage> {
    api.get("/billing/usage", QueryParams::new())
}

/// GET /billing/invoices
pub fn invoices(api: &ApiClient, params: &ListParams) -> ApiResult<Page<Invoice>> {
    let mut query = QueryParams::new();
    list_query(params, &mut query);
    api.get("/billing/invoices", query)
}

/// POST /billing/checkout
pub fn create_checkout(api: &ApiClient, tier: PlanTier, seats: u32) -> ApiResult<RedirectSession> {
    api.post("/billing/checkout", &CheckoutBody { tier, seats })
}

/// POST /billing/portal
pub fn create_portal_session(api: &ApiClient) -> ApiResult<RedirectSession> {
    api.post_empty("/billing/portal")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_limits() {
        let usage = Usage {
            repos_used: 3,
            repos_limit: Some(3),
            analyses_this_month: 12,
            analyses_limit: Some(10),
            ..Default::default()
        };
        assert!(usage.at_repo_limit());
        assert_eq!(usage.remaining_analyses(), Some(0));

        let unlimited = Usage::default();
        assert!(!unlimited.at_repo_limit());
        assert_eq!(unlimited.remaining_analyses(), None);
    }

    #[test]
    fn test_invoice_amount() {
        let inv: Invoice =
            serde_json::from_str(r#"{"id": "in_1", "amount_cents": 1250}"#).unwrap();
        assert_eq!(inv.formatted_amount(), "$12.50 USD");
    }

    #[test]
    fn test_paid_requires_active_status() {
        let sub = Subscription {
            tier: PlanTier::Pro,
            status: SubscriptionStatus::PastDue,
            ..Default::default()
        };
        assert!(!sub.is_paid());
        assert!(!Subscription::default().is_paid());
    }
}
