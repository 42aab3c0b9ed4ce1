//! Marketplace endpoints: browse, inspect, install and uninstall assets

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{list_query, seg, ApiClient, ApiResult};
use crate::http::QueryParams;
use crate::models::{ListParams, Page};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Command,
    Skill,
    Style,
    Hook,
    Prompt,
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetType::Command => write!(f, "command"),
            AssetType::Skill => write!(f, "skill"),
            AssetType::Style => write!(f, "style"),
            AssetType::Hook => write!(f, "hook"),
            AssetType::Prompt => write!(f, "prompt"),
        }
    }
}

impl FromStr for AssetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "command" => Ok(AssetType::Command),
            "skill" => Ok(AssetType::Skill),
            "style" => Ok(AssetType::Style),
            "hook" => Ok(AssetType::Hook),
            "prompt" => Ok(AssetType::Prompt),
            other => Err(format!("unknown asset type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AssetFilters {
    pub asset_type: Option<AssetType>,
    pub search: Option<String>,
    pub verified_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketplaceAsset {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub asset_type: AssetType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub install_count: u64,
    #[serde(default)]
    pub is_installed: bool,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub price_cents: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstalledAsset {
    pub asset: MarketplaceAsset,
    #[serde(default)]
    pub installed_version: Option<String>,
    #[serde(default)]
    pub installed_at: Option<DateTime<Utc>>,
}

/// GET /marketplace/assets
pub fn browse_assets(
    api: &ApiClient,
    filters: &AssetFilters,
    params: &ListParams,
) -> ApiResult<Page<MarketplaceAsset>> {
    let mut query = QueryParams::new();
    query
        .push_opt("asset_type", filters.asset_type)
        .push_opt("search", filters.search.as_deref());
    if filters.verified_only {
        query.push("verified", true);
    }
    list_query(params, &mut query);
    api.get("/marketplace/assets", query)
}

/// GET /marketplace/assets/{slug}
pub fn get_asset(api: &ApiClient, slug: &str) -> ApiResult<MarketplaceAsset> {
    api.get(
        &format!("/marketplace/assets/{}", seg(slug)),
        QueryParams::new(),
    )
}

/// GET /marketplace/installed
pub fn installed_assets(api: &ApiClient) -> ApiResult<Vec<InstalledAsset>> {
    api.get("/marketplace/installed", QueryParams::new())
}

/// POST /marketplace/assets/{slug}/install
pub fn install_asset(api: &ApiClient, slug: &str) -> ApiResult<InstalledAsset> {
    api.post_empty(&format!("/marketplace/assets/{}/install", seg(slug)))
}

/// DELETE /marketplace/assets/{slug}/install
pub fn uninstall_asset(api: &ApiClient, slug: &str) -> ApiResult<()> {
    api.delete(&format!("/marketplace/assets/{}/install", seg(slug)))
}
