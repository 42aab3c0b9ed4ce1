//! Marketplace commands

use anyhow::Result;
use console::style;

use repotoire_cloud::api::marketplace::{AssetFilters, AssetType, MarketplaceAsset};
use repotoire_cloud::hooks::marketplace as hooks;
use repotoire_cloud::models::ListParams;

use super::{parse_flag, Session};

fn print_asset(asset: &MarketplaceAsset) {
    let verified = if asset.is_verified {
        style("✓").green().to_string()
    } else {
        " ".to_string()
    };
    let installed = if asset.is_installed {
        style("installed").green().to_string()
    } else {
        String::new()
    };
    println!(
        "   {} {:<32} {:<8} {:>7} installs  {}",
        verified,
        style(&asset.slug).bold(),
        asset.asset_type,
        asset.install_count,
        installed
    );
    if !asset.description.is_empty() {
        println!("     {}", style(&asset.description).dim());
    }
}

pub fn browse(
    session: &Session,
    asset_type: Option<&str>,
    search: Option<String>,
    verified: bool,
    page: u32,
) -> Result<()> {
    let filters = AssetFilters {
        asset_type: parse_flag::<AssetType>("type", asset_type)?,
        search,
        verified_only: verified,
    };
    let assets = hooks::assets_query(&session.client, &filters, &ListParams::page(page, 20))
        .read()
        .into_result()?;
    session.emit(&assets, |assets| {
        println!("{}", style("🛒 Marketplace").bold());
        println!();
        if assets.items.is_empty() {
            println!("No assets match these filters.");
        }
        for asset in &assets.items {
            print_asset(asset);
        }
        if assets.has_more {
            println!();
            println!(
                "   Use {} to see more",
                style(format!("--page {}", assets.page + 1)).yellow()
            );
        }
    })
}

pub fn installed(session: &Session) -> Result<()> {
    let assets = hooks::installed_query(&session.client).read().into_result()?;
    session.emit(&assets, |assets| {
        println!("{}", style("📥 Installed Assets").bold());
        println!();
        if assets.is_empty() {
            println!("Nothing installed yet.");
        }
        for item in assets {
            print_asset(&item.asset);
            if let Some(version) = &item.installed_version {
                println!("     {}", style(format!("v{}", version)).dim());
            }
        }
    })
}

pub fn install(session: &Session, slug: &str) -> Result<()> {
    let installed = hooks::install(&session.client, slug)?;
    session.emit(&installed, |i| {
        println!("✅ Installed {}", style(&i.asset.name).bold());
    })
}

pub fn uninstall(session: &Session, slug: &str) -> Result<()> {
    hooks::uninstall(&session.client, slug)?;
    session.emit(&serde_json::json!({ "uninstalled": slug }), |_| {
        println!("🗑  Uninstalled {}", style(slug).bold());
    })
}
