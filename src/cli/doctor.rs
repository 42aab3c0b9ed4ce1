//! Doctor command - check configuration and connectivity

use anyhow::Result;
use console::style;

use repotoire_cloud::config::{ClientConfig, PreferenceStore};
use repotoire_cloud::errors::{classify, ErrorCategory};
use repotoire_cloud::http::ApiClient;

pub fn run(api_url: Option<&str>) -> Result<()> {
    println!("🩺 Repotoire Cloud Doctor\n");
    let mut failures = 0;

    let mut config = match ClientConfig::load() {
        Ok(config) => {
            println!("✓ Config: OK");
            config
        }
        Err(e) => {
            failures += 1;
            println!("{} Config: {}", style("✗").red(), e);
            ClientConfig::default()
        }
    };
    if let Some(url) = api_url {
        config.api.base_url = Some(url.to_string());
    }
    println!("  API: {}", config.base_url());

    if config.has_api_key() {
        println!("✓ API key: configured");
    } else {
        println!("○ API key: not set");
        println!("  Set REPOTOIRE_API_KEY or run `repotoire-cloud config set api.api_key <key>`");
    }

    match PreferenceStore::default_path() {
        Some(path) => println!("✓ Preferences: {}", path.display()),
        None => println!("○ Preferences: no data directory, using defaults"),
    }

    let api = ApiClient::from_config(&config);
    match repotoire_cloud::api::billing::subscription(&api) {
        Ok(sub) => println!("✓ Backend: reachable ({} plan)", sub.tier),
        Err(e) => {
            let classified = classify(&e);
            match classified.category {
                ErrorCategory::Authentication if !config.has_api_key() => {
                    println!("✓ Backend: reachable (not signed in)");
                }
                _ => {
                    failures += 1;
                    println!(
                        "{} Backend: {} [{}]",
                        style("✗").red(),
                        classified.title,
                        classified.code
                    );
                    println!("  {}", classified.action);
                }
            }
        }
    }

    if failures == 0 {
        println!("\n✅ All checks passed!");
        Ok(())
    } else {
        anyhow::bail!("{} check(s) failed", failures)
    }
}
