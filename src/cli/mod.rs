//! CLI command definitions and handlers

mod analytics;
mod billing;
mod doctor;
mod findings;
mod fixes;
mod marketplace;
mod repos;
mod settings;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use serde::Serialize;

use repotoire_cloud::config::ClientConfig;
use repotoire_cloud::errors::{classify, ClassifiedError};
use repotoire_cloud::hooks::{AuthGate, QueryClient};
use repotoire_cloud::http::ApiClient;

/// Parse a page number (1-indexed)
fn parse_page(s: &str) -> Result<u32, String> {
    let n: u32 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("pages start at 1".to_string())
    } else {
        Ok(n)
    }
}

/// Parse a page size (1-100)
fn parse_per_page(s: &str) -> Result<u32, String> {
    let n: u32 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("per-page must be at least 1".to_string())
    } else if n > 100 {
        Err("per-page cannot exceed 100".to_string())
    } else {
        Ok(n)
    }
}

/// Repotoire Cloud - findings, AI fixes and analytics from your terminal
#[derive(Parser, Debug)]
#[command(name = "repotoire-cloud")]
#[command(
    version,
    about = "Command-line client for the Repotoire cloud: triage findings, review AI fixes, follow analyses",
    long_about = "Talks to the Repotoire cloud API. Reads are cached for the lifetime of \
a command and refetched after every change you make, so what is printed after a \
mutation always reflects the server.\n\n\
Authenticate with REPOTOIRE_API_KEY or `repotoire-cloud config set api.api_key <key>`.",
    after_help = "\
Examples:
  repotoire-cloud findings --severity critical        Critical findings
  repotoire-cloud triage f1 f2 --status wontfix       Bulk-mark findings
  repotoire-cloud fix approve fx_123                  Approve a fix
  repotoire-cloud analyze r_42 --wait                 Run an analysis and follow it
  repotoire-cloud analytics --json                    Dashboard counters as JSON

Documentation: https://github.com/Zach-hammad/repotoire"
)]
pub struct Cli {
    /// Backend base URL (overrides cloud.toml)
    #[arg(long, global = true, env = "REPOTOIRE_API_URL")]
    pub api_url: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Print raw JSON instead of formatted output
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List findings, or show one finding in detail
    #[command(after_help = "\
Examples:
  repotoire-cloud findings                                   First page of findings
  repotoire-cloud findings --severity critical --detector BanditDetector
  repotoire-cloud findings --repo r_42 --status open --page 2
  repotoire-cloud findings f_123                             One finding in detail")]
    Findings {
        /// Finding ID to show in detail
        id: Option<String>,

        #[command(flatten)]
        filters: FindingArgs,

        /// Page number (1-indexed)
        #[arg(long, default_value = "1", value_parser = parse_page)]
        page: u32,

        /// Findings per page
        #[arg(long, default_value = "20", value_parser = parse_per_page)]
        per_page: u32,

        /// Sort field (e.g. severity, created_at)
        #[arg(long)]
        sort: Option<String>,

        /// Sort ascending instead of descending
        #[arg(long, requires = "sort")]
        asc: bool,
    },

    /// Findings by severity and the noisiest detectors
    Summary {
        /// Limit to one repository
        #[arg(long)]
        repo: Option<String>,

        /// Number of detectors to list
        #[arg(long, default_value = "5")]
        top: u32,
    },

    /// Set the triage status of one or more findings
    #[command(after_help = "\
Examples:
  repotoire-cloud triage f_1 --status resolved
  repotoire-cloud triage f_1 f_2 f_3 --status wontfix --reason \"Legacy module\"")]
    Triage {
        /// Finding IDs
        #[arg(required = true)]
        ids: Vec<String>,

        /// New status (open, acknowledged, in_progress, resolved, wontfix, false_positive)
        #[arg(long)]
        status: String,

        /// Why the status changed
        #[arg(long)]
        reason: Option<String>,
    },

    /// List AI fix proposals
    Fixes {
        /// Review state (pending, approved, rejected, applied, failed, stale)
        #[arg(long)]
        status: Option<String>,

        /// Confidence (high, medium, low)
        #[arg(long)]
        confidence: Option<String>,

        /// Limit to one repository
        #[arg(long)]
        repo: Option<String>,

        /// Only fixes addressing this finding
        #[arg(long)]
        finding: Option<String>,

        /// Page number (1-indexed)
        #[arg(long, default_value = "1", value_parser = parse_page)]
        page: u32,

        /// Fixes per page
        #[arg(long, default_value = "20", value_parser = parse_per_page)]
        per_page: u32,
    },

    /// Review a single fix proposal
    Fix {
        #[command(subcommand)]
        action: FixAction,
    },

    /// Dashboard counters and health score
    Analytics {
        /// Limit to one repository
        #[arg(long)]
        repo: Option<String>,
    },

    /// Findings over time
    Trends {
        /// Window: 7d, 30d or 90d
        #[arg(long, default_value = "30d")]
        period: String,

        /// Limit to one repository
        #[arg(long)]
        repo: Option<String>,
    },

    /// Connected repositories
    Repos {
        #[command(subcommand)]
        action: Option<RepoAction>,
    },

    /// Start an analysis of a repository
    #[command(after_help = "\
Examples:
  repotoire-cloud analyze r_42            Queue an analysis and return
  repotoire-cloud analyze r_42 --wait     Follow it until it finishes")]
    Analyze {
        /// Repository ID
        repo: String,

        /// Poll until the run completes or fails
        #[arg(long)]
        wait: bool,
    },

    /// Status of an analysis run
    Run {
        /// Analysis run ID
        id: String,

        /// Poll until the run completes or fails
        #[arg(long)]
        wait: bool,
    },

    /// Subscription, usage and invoices
    Billing {
        #[command(subcommand)]
        action: Option<BillingAction>,
    },

    /// Browse marketplace assets
    Marketplace {
        /// Asset type (command, skill, style, hook, prompt)
        #[arg(long = "type")]
        asset_type: Option<String>,

        /// Free-text search
        #[arg(long)]
        search: Option<String>,

        /// Only verified publishers
        #[arg(long)]
        verified: bool,

        /// Show installed assets instead
        #[arg(long, conflicts_with_all = ["asset_type", "search", "verified"])]
        installed: bool,

        /// Page number (1-indexed)
        #[arg(long, default_value = "1", value_parser = parse_page)]
        page: u32,
    },

    /// Install a marketplace asset
    Install {
        /// Asset slug
        slug: String,
    },

    /// Uninstall a marketplace asset
    Uninstall {
        /// Asset slug
        slug: String,
    },

    /// Manage cloud.toml
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Manage display preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },

    /// Check configuration and connectivity
    Doctor,

    /// Show version info
    Version,
}

/// Finding filter flags shared by list commands
#[derive(clap::Args, Debug, Default)]
pub struct FindingArgs {
    /// Severity (critical, high, medium, low, info)
    #[arg(long)]
    pub severity: Option<String>,

    /// Detector name (e.g. BanditDetector)
    #[arg(long)]
    pub detector: Option<String>,

    /// Triage status
    #[arg(long)]
    pub status: Option<String>,

    /// Category
    #[arg(long)]
    pub category: Option<String>,

    /// Limit to one repository
    #[arg(long)]
    pub repo: Option<String>,

    /// Limit to one analysis run
    #[arg(long)]
    pub run: Option<String>,

    /// Free-text search
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum FixAction {
    /// Show a fix and its diff
    Show { id: String },

    /// Approve one or more fixes
    Approve {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Reject one or more fixes
    Reject {
        #[arg(required = true)]
        ids: Vec<String>,

        #[arg(long)]
        reason: Option<String>,
    },

    /// Apply an approved fix
    Apply { id: String },

    /// Run the fix in the verification sandbox
    Preview { id: String },

    /// Add a review comment
    Comment { id: String, text: String },

    /// List review comments
    Comments { id: String },
}

#[derive(Subcommand, Debug)]
pub enum RepoAction {
    /// List connected repositories (default)
    List {
        #[arg(long, default_value = "1", value_parser = parse_page)]
        page: u32,
    },

    /// Connect a repository by its full name (owner/name)
    Connect { full_name: String },

    /// Disconnect a repository
    Remove { id: String },

    /// Past analysis runs of a repository
    History {
        id: String,

        #[arg(long, default_value = "1", value_parser = parse_page)]
        page: u32,
    },
}

#[derive(Subcommand, Debug)]
pub enum BillingAction {
    /// Subscription and usage (default)
    Show,

    /// List invoices
    Invoices {
        #[arg(long, default_value = "1", value_parser = parse_page)]
        page: u32,
    },

    /// Open a checkout session for a plan
    Upgrade {
        /// Plan (pro, enterprise)
        #[arg(long)]
        tier: String,

        #[arg(long, default_value = "1")]
        seats: u32,
    },

    /// Open the billing portal
    Portal,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create ~/.config/repotoire/cloud.toml with example settings
    Init,
    /// Show the effective configuration
    Show,
    /// Set a value (e.g. api.base_url, polling.interval_ms)
    Set { key: String, value: String },
}

#[derive(Subcommand, Debug)]
pub enum PrefsAction {
    /// Show current preferences
    Show,
    /// Set a flag (enable_3d_effects, enable_glow, animated_backgrounds, onboarding_seen)
    Set {
        key: String,
        #[arg(action = clap::ArgAction::Set)]
        value: bool,
    },
    /// Restore defaults
    Reset,
}

/// Connection state shared by every API-backed command
pub(crate) struct Session {
    pub client: QueryClient,
    pub config: ClientConfig,
    pub json: bool,
}

impl Session {
    fn open(api_url: Option<&str>, json: bool) -> Result<Self> {
        let mut config = ClientConfig::load().context("Failed to load cloud configuration")?;
        if let Some(url) = api_url {
            config.api.base_url = Some(url.to_string());
        }
        if !config.has_api_key() {
            tracing::warn!(
                "No API key configured; set REPOTOIRE_API_KEY or run `repotoire-cloud config set api.api_key <key>`"
            );
        }
        tracing::debug!("Using API at {}", config.base_url());
        let client = QueryClient::new(ApiClient::from_config(&config), AuthGate::ready());
        Ok(Self {
            client,
            config,
            json,
        })
    }

    /// Print `value` as JSON, or hand it to `render`
    pub fn emit<T: Serialize>(&self, value: &T, render: impl FnOnce(&T)) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            render(value);
        }
        Ok(())
    }
}

/// Parse a user-supplied enum value, naming the flag on failure
pub(crate) fn parse_flag<T>(flag: &str, value: Option<&str>) -> Result<Option<T>>
where
    T: std::str::FromStr<Err = String>,
{
    value
        .map(|v| v.parse::<T>())
        .transpose()
        .map_err(|e| anyhow::anyhow!("--{}: {}", flag, e))
}

/// Print a failure the way the dashboard would toast it
pub fn report_error(err: &anyhow::Error) {
    let classified = match err.downcast_ref::<ClassifiedError>() {
        Some(c) => c.clone(),
        None if err.downcast_ref::<repotoire_cloud::http::ApiError>().is_some() => classify(err),
        None => {
            eprintln!("{} {:#}", style("error:").red().bold(), err);
            return;
        }
    };
    tracing::debug!("Classified failure: {:?}", classified);
    let toast = classified.to_toast();
    eprintln!(
        "{} {} {}",
        style("✗").red().bold(),
        style(&toast.title).bold(),
        style(format!("[{}]", toast.code)).dim()
    );
    eprintln!("  {}", toast.description);
    if let Some(action) = &toast.action {
        eprintln!("  {} {}", style("→").cyan(), action);
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let api_url = cli.api_url.as_deref();
    match cli.command {
        Commands::Findings {
            id,
            filters,
            page,
            per_page,
            sort,
            asc,
        } => {
            let session = Session::open(api_url, cli.json)?;
            match id {
                Some(id) => findings::show(&session, &id),
                None => findings::list(&session, &filters, page, per_page, sort, asc),
            }
        }

        Commands::Summary { repo, top } => {
            findings::summary(&Session::open(api_url, cli.json)?, repo.as_deref(), top)
        }

        Commands::Triage {
            ids,
            status,
            reason,
        } => findings::triage(
            &Session::open(api_url, cli.json)?,
            ids,
            &status,
            reason.as_deref(),
        ),

        Commands::Fixes {
            status,
            confidence,
            repo,
            finding,
            page,
            per_page,
        } => fixes::list(
            &Session::open(api_url, cli.json)?,
            status.as_deref(),
            confidence.as_deref(),
            repo,
            finding,
            page,
            per_page,
        ),

        Commands::Fix { action } => fixes::run(&Session::open(api_url, cli.json)?, action),

        Commands::Analytics { repo } => {
            analytics::summary(&Session::open(api_url, cli.json)?, repo.as_deref())
        }

        Commands::Trends { period, repo } => {
            analytics::trends(&Session::open(api_url, cli.json)?, &period, repo.as_deref())
        }

        Commands::Repos { action } => repos::run(
            &Session::open(api_url, cli.json)?,
            action.unwrap_or(RepoAction::List { page: 1 }),
        ),

        Commands::Analyze { repo, wait } => {
            repos::analyze(&Session::open(api_url, cli.json)?, &repo, wait)
        }

        Commands::Run { id, wait } => repos::status(&Session::open(api_url, cli.json)?, &id, wait),

        Commands::Billing { action } => billing::run(
            &Session::open(api_url, cli.json)?,
            action.unwrap_or(BillingAction::Show),
        ),

        Commands::Marketplace {
            asset_type,
            search,
            verified,
            installed,
            page,
        } => {
            let session = Session::open(api_url, cli.json)?;
            if installed {
                marketplace::installed(&session)
            } else {
                marketplace::browse(&session, asset_type.as_deref(), search, verified, page)
            }
        }

        Commands::Install { slug } => {
            marketplace::install(&Session::open(api_url, cli.json)?, &slug)
        }

        Commands::Uninstall { slug } => {
            marketplace::uninstall(&Session::open(api_url, cli.json)?, &slug)
        }

        Commands::Config { action } => settings::config(action, cli.json),

        Commands::Prefs { action } => settings::prefs(action, cli.json),

        Commands::Doctor => doctor::run(api_url),

        Commands::Version => {
            println!("repotoire-cloud {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("repotoire-cloud").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_findings_filters_parse() {
        let cli = parse(&[
            "findings",
            "--severity",
            "critical",
            "--detector",
            "BanditDetector",
            "--per-page",
            "50",
        ]);
        match cli.command {
            Commands::Findings {
                id,
                filters,
                page,
                per_page,
                ..
            } => {
                assert!(id.is_none());
                assert_eq!(filters.severity.as_deref(), Some("critical"));
                assert_eq!(filters.detector.as_deref(), Some("BanditDetector"));
                assert_eq!(page, 1);
                assert_eq!(per_page, 50);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["summary", "--json", "--api-url", "http://localhost:8000"]);
        assert!(cli.json);
        assert_eq!(cli.api_url.as_deref(), Some("http://localhost:8000"));
        assert_eq!(cli.log_level, "warn");
    }

    #[test]
    fn test_triage_requires_ids_and_status() {
        assert!(Cli::try_parse_from(["repotoire-cloud", "triage", "--status", "wontfix"]).is_err());
        assert!(Cli::try_parse_from(["repotoire-cloud", "triage", "f1"]).is_err());
        let cli = parse(&["triage", "f1", "f2", "f3", "--status", "wontfix", "--reason", "legacy"]);
        match cli.command {
            Commands::Triage { ids, reason, .. } => {
                assert_eq!(ids.len(), 3);
                assert_eq!(reason.as_deref(), Some("legacy"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_fix_subcommands() {
        let cli = parse(&["fix", "reject", "fx1", "fx2", "--reason", "too broad"]);
        assert!(matches!(
            cli.command,
            Commands::Fix {
                action: FixAction::Reject { ref ids, .. }
            } if ids.len() == 2
        ));
        let cli = parse(&["fix", "comment", "fx1", "looks good"]);
        assert!(matches!(
            cli.command,
            Commands::Fix {
                action: FixAction::Comment { .. }
            }
        ));
    }

    #[test]
    fn test_page_validation() {
        assert!(Cli::try_parse_from(["repotoire-cloud", "findings", "--page", "0"]).is_err());
        assert!(Cli::try_parse_from(["repotoire-cloud", "fixes", "--per-page", "500"]).is_err());
        assert_eq!(parse_page("3"), Ok(3));
    }

    #[test]
    fn test_marketplace_installed_conflicts_with_filters() {
        assert!(Cli::try_parse_from([
            "repotoire-cloud",
            "marketplace",
            "--installed",
            "--search",
            "lint"
        ])
        .is_err());
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        assert!(Cli::try_parse_from(["repotoire-cloud", "--log-level", "loud", "version"]).is_err());
    }

    #[test]
    fn test_parse_flag_names_the_flag() {
        use repotoire_cloud::models::Severity;
        let err = parse_flag::<Severity>("severity", Some("urgent")).unwrap_err();
        assert!(err.to_string().starts_with("--severity:"));
        assert_eq!(parse_flag::<Severity>("severity", None).unwrap(), None);
    }
}
