//! Local configuration commands: `config` and `prefs`

use anyhow::{Context, Result};
use console::style;

use repotoire_cloud::config::{ClientConfig, PreferenceStore};

use super::{ConfigAction, PrefsAction};

pub fn config(action: ConfigAction, json: bool) -> Result<()> {
    match action {
        ConfigAction::Init => {
            let path = ClientConfig::init_user_config()?;
            println!("✅ Config initialized at: {}", path.display());
            println!("\nEdit to add your API key:");
            println!("  {}", path.display());
            println!("\nOr set via environment:");
            println!("  export REPOTOIRE_API_KEY=\"rpt_...\"");
            Ok(())
        }
        ConfigAction::Show => show_config(json),
        ConfigAction::Set { key, value } => {
            let path = ClientConfig::user_config_path()
                .context("Could not determine config directory")?;
            let mut config = if path.exists() {
                ClientConfig::load_from(&path)?
            } else {
                ClientConfig::default()
            };
            config.set(&key, &value)?;
            config.save_to(&path)?;
            println!("✅ Set {} in {}", style(&key).bold(), path.display());
            Ok(())
        }
    }
}

fn show_config(json: bool) -> Result<()> {
    let config = ClientConfig::load()?;
    if json {
        let mut redacted = config.clone();
        if redacted.api.api_key.is_some() {
            redacted.api.api_key = Some("***".to_string());
        }
        println!("{}", serde_json::to_string_pretty(&redacted)?);
        return Ok(());
    }

    println!("📁 Config path:");
    if let Some(user_path) = ClientConfig::user_config_path() {
        let status = if user_path.exists() { "✓" } else { "(not found)" };
        println!("  {} {}", user_path.display(), status);
    }
    println!();
    println!("🌐 API: {}", config.base_url());
    let key_status = if config.has_api_key() {
        style("✓ configured").green()
    } else {
        style("✗ not set").red()
    };
    println!("  API key:  {}", key_status);
    println!("  Timeout:  {}s", config.timeout().as_secs());
    println!();
    println!("⏱  Polling");
    println!("  Interval:  {}ms", config.poll_interval().as_millis());
    println!("  Max polls: {}", config.max_polls());
    Ok(())
}

pub fn prefs(action: PrefsAction, json: bool) -> Result<()> {
    let mut store = PreferenceStore::open_default()?;
    let prefs = match action {
        PrefsAction::Show => store.get(),
        PrefsAction::Set { key, value } => {
            let mut next = store.get();
            next.set(&key, value)?;
            store.update(|p| *p = next)?
        }
        PrefsAction::Reset => store.reset()?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&prefs)?);
        return Ok(());
    }
    println!("🎨 Display preferences ({})", style(store.path().display()).dim());
    for (name, on) in [
        ("enable_3d_effects", prefs.enable_3d_effects),
        ("enable_glow", prefs.enable_glow),
        ("animated_backgrounds", prefs.animated_backgrounds),
        ("onboarding_seen", prefs.onboarding_seen),
    ] {
        let mark = if on {
            style("on").green()
        } else {
            style("off").dim()
        };
        println!("  {:<22} {}", name, mark);
    }
    Ok(())
}
