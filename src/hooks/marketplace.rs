use crate::api::marketplace::{self, AssetFilters, InstalledAsset, MarketplaceAsset};
use crate::cache::{keys, DomainEvent};
use crate::errors::ClassifiedError;
use crate::models::{ListParams, Page};

use super::{QueryClient, QueryHandle};

pub fn assets_query<'a>(
    client: &'a QueryClient,
    filters: &AssetFilters,
    params: &ListParams,
) -> QueryHandle<'a, Page<MarketplaceAsset>> {
    let (f, p) = (filters.clone(), params.clone());
    client.query(keys::marketplace_assets(filters, params), move |api| {
        marketplace::browse_assets(api, &f, &p)
    })
}

pub fn asset_query<'a>(client: &'a QueryClient, slug: &str) -> QueryHandle<'a, MarketplaceAsset> {
    let slug = slug.to_string();
    client.query(keys::marketplace_asset(&slug), move |api| {
        marketplace::get_asset(api, &slug)
    })
}

pub fn installed_query(client: &QueryClient) -> QueryHandle<'_, Vec<InstalledAsset>> {
    client.query(keys::installed_assets(), marketplace::installed_assets)
}

pub fn install(client: &QueryClient, slug: &str) -> Result<InstalledAsset, ClassifiedError> {
    client.mutate(DomainEvent::AssetInstalled, Some(slug), |api| {
        marketplace::install_asset(api, slug)
    })
}

pub fn uninstall(client: &QueryClient, slug: &str) -> Result<(), ClassifiedError> {
    client.mutate(DomainEvent::AssetUninstalled, Some(slug), |api| {
        marketplace::uninstall_asset(api, slug)
    })
}
