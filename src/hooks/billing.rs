use crate::api::billing::{self, Invoice, PlanTier, RedirectSession, Subscription, Usage};
use crate::cache::{keys, DomainEvent};
use crate::errors::ClassifiedError;
use crate::models::{ListParams, Page};

use super::{QueryClient, QueryHandle};

pub fn subscription_query(client: &QueryClient) -> QueryHandle<'_, Subscription> {
    client.query(keys::subscription(), billing::subscription)
}

pub fn usage_query(client: &QueryClient) -> QueryHandle<'_, Usage> {
    client.query(keys::usage(), billing::usage)
}

pub fn invoices_query<'a>(
    client: &'a QueryClient,
    params: &ListParams,
) -> QueryHandle<'a, Page<Invoice>> {
    let p = params.clone();
    client.query(keys::invoices(params), move |api| billing::invoices(api, &p))
}

/// Start a hosted checkout; billing reads refetch afterwards
pub fn checkout(
    client: &QueryClient,
    tier: PlanTier,
    seats: u32,
) -> Result<RedirectSession, ClassifiedError> {
    client.mutate(DomainEvent::SubscriptionChanged, None, |api| {
        billing::create_checkout(api, tier, seats)
    })
}

pub fn portal(client: &QueryClient) -> Result<RedirectSession, ClassifiedError> {
    client.mutate(DomainEvent::SubscriptionChanged, None, billing::create_portal_session)
}
