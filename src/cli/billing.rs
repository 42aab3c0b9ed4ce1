//! Billing commands

use anyhow::Result;
use console::style;

use repotoire_cloud::api::billing::{PlanTier, Usage};
use repotoire_cloud::hooks::billing::{checkout, invoices_query, portal, subscription_query, usage_query};
use repotoire_cloud::models::ListParams;

use super::{BillingAction, Session};

fn limit(used: u32, limit: Option<u32>) -> String {
    match limit {
        Some(l) => format!("{}/{}", used, l),
        None => format!("{} (unlimited)", used),
    }
}

fn print_usage(usage: &Usage) {
    println!("   {} {}", style("Repositories:").bold(), limit(usage.repos_used, usage.repos_limit));
    println!(
        "   {} {}",
        style("Analyses:").bold(),
        limit(usage.analyses_this_month, usage.analyses_limit)
    );
    println!("   {} {}", style("Seats:").bold(), limit(usage.seats_used, usage.seats_limit));
    if usage.at_repo_limit() {
        println!(
            "   {} Repository limit reached; upgrade to connect more",
            style("!").yellow().bold()
        );
    }
    if usage.remaining_analyses() == Some(0) {
        println!(
            "   {} No analyses left this month",
            style("!").yellow().bold()
        );
    }
}

pub fn run(session: &Session, action: BillingAction) -> Result<()> {
    let client = &session.client;
    match action {
        BillingAction::Show => {
            let sub = subscription_query(client).read().into_result()?;
            let usage = usage_query(client).read().into_result()?;
            if session.json {
                let out = serde_json::json!({ "subscription": sub, "usage": usage });
                println!("{}", serde_json::to_string_pretty(&out)?);
                return Ok(());
            }
            println!("{}", style("💳 Billing").bold());
            println!();
            let tier = if sub.is_paid() {
                style(sub.tier.to_string()).green().bold()
            } else {
                style(sub.tier.to_string()).bold()
            };
            println!("   {} {} ({:?})", style("Plan:").bold(), tier, sub.status);
            if let Some(end) = sub.current_period_end {
                let verb = if sub.cancel_at_period_end {
                    "Ends"
                } else {
                    "Renews"
                };
                println!("   {} {}", style(format!("{}:", verb)).bold(), end.format("%Y-%m-%d"));
            }
            print_usage(&usage);
            Ok(())
        }

        BillingAction::Invoices { page } => {
            let invoices = invoices_query(client, &ListParams::page(page, 20))
                .read()
                .into_result()?;
            session.emit(&invoices, |page| {
                if page.items.is_empty() {
                    println!("No invoices yet.");
                }
                for inv in &page.items {
                    let date = inv
                        .created_at
                        .map(|t| t.format("%Y-%m-%d").to_string())
                        .unwrap_or_default();
                    println!(
                        "   {}  {:>14}  {:<6}  {}",
                        style(date).dim(),
                        inv.formatted_amount(),
                        inv.status,
                        inv.number.as_deref().unwrap_or(&inv.id)
                    );
                }
            })
        }

        BillingAction::Upgrade { tier, seats } => {
            let tier: PlanTier = tier.parse().map_err(|e| anyhow::anyhow!("--tier: {}", e))?;
            if tier == PlanTier::Free {
                anyhow::bail!("--tier: choose a paid plan (pro, enterprise)");
            }
            let session_url = checkout(client, tier, seats)?;
            session.emit(&session_url, |s| {
                println!("Complete your upgrade at:");
                println!("   {}", style(&s.url).cyan().underlined());
            })
        }

        BillingAction::Portal => {
            let session_url = portal(client)?;
            session.emit(&session_url, |s| {
                println!("Manage billing at:");
                println!("   {}", style(&s.url).cyan().underlined());
            })
        }
    }
}
