//! Fix review commands

use anyhow::Result;
use console::style;

use repotoire_cloud::api::fixes::FixFilters;
use repotoire_cloud::hooks::fixes as hooks;
use repotoire_cloud::models::{FixConfidence, FixProposal, FixStatus, ListParams};

use super::{parse_flag, FixAction, Session};

fn confidence_label(c: FixConfidence) -> console::StyledObject<String> {
    match c {
        FixConfidence::High => style(c.to_string()).green(),
        FixConfidence::Medium => style(c.to_string()).yellow(),
        FixConfidence::Low => style(c.to_string()).red(),
    }
}

pub fn list(
    session: &Session,
    status: Option<&str>,
    confidence: Option<&str>,
    repo: Option<String>,
    finding: Option<String>,
    page: u32,
    per_page: u32,
) -> Result<()> {
    let filters = FixFilters {
        status: parse_flag::<FixStatus>("status", status)?,
        confidence: parse_flag::<FixConfidence>("confidence", confidence)?,
        repository_id: repo,
        finding_id: finding,
        search: None,
    };
    let params = ListParams::page(page, per_page);
    let fixes = hooks::fixes_query(&session.client, &filters, &params)
        .read()
        .into_result()?;
    if session.json {
        println!("{}", serde_json::to_string_pretty(&fixes)?);
        return Ok(());
    }

    let stats = hooks::stats_query(&session.client, filters.repository_id.as_deref())
        .read()
        .into_result()?;
    println!("{}", style("🔧 Fix Proposals").bold());
    println!();
    println!(
        "   {} pending  {} approved  {} applied  {} rejected",
        style(stats.pending).yellow().bold(),
        style(stats.approved).cyan(),
        style(stats.applied).green(),
        style(stats.rejected).dim(),
    );
    println!();

    if fixes.items.is_empty() {
        println!("{}", style("No fixes match these filters.").green());
        return Ok(());
    }
    for fix in &fixes.items {
        println!(
            "   {}  {:<9} {:<7} {}",
            style(&fix.id).dim(),
            fix.status,
            confidence_label(fix.confidence),
            style(&fix.title).bold()
        );
    }
    if fixes.has_more {
        println!();
        println!(
            "   Use {} to see more",
            style(format!("--page {}", fixes.page + 1)).yellow()
        );
    }
    Ok(())
}

pub fn run(session: &Session, action: FixAction) -> Result<()> {
    let client = &session.client;
    match action {
        FixAction::Show { id } => {
            let fix = hooks::fix_query(client, &id).read().into_result()?;
            session.emit(&fix, print_fix)
        }

        FixAction::Approve { ids } => {
            if let [id] = ids.as_slice() {
                let fix = hooks::approve(client, id)?;
                return session.emit(&fix, |f| println!("✅ Approved {}", style(&f.id).bold()));
            }
            let result = hooks::batch_approve(client, &ids)?;
            session.emit(&result, |r| {
                println!("✅ Approved {} of {} fixes", style(r.processed).bold(), ids.len());
                for id in &r.failed {
                    println!("   {} {}", style("✗").red(), id);
                }
            })
        }

        FixAction::Reject { ids, reason } => {
            if let [id] = ids.as_slice() {
                let fix = hooks::reject(client, id, reason.as_deref())?;
                return session.emit(&fix, |f| println!("🚫 Rejected {}", style(&f.id).bold()));
            }
            let result = hooks::batch_reject(client, &ids, reason.as_deref())?;
            session.emit(&result, |r| {
                println!("🚫 Rejected {} of {} fixes", style(r.processed).bold(), ids.len());
                for id in &r.failed {
                    println!("   {} {}", style("✗").red(), id);
                }
            })
        }

        FixAction::Apply { id } => {
            let fix = hooks::apply(client, &id)?;
            session.emit(&fix, |f| {
                println!("✅ Applied {} ({})", style(&f.id).bold(), f.status);
            })
        }

        FixAction::Preview { id } => {
            let preview = hooks::preview(client, &id)?;
            session.emit(&preview, |p| {
                let verdict = if p.success {
                    style("passed").green().bold()
                } else {
                    style("failed").red().bold()
                };
                println!("🧪 Preview {}", verdict);
                for check in &p.checks {
                    let mark = if check.passed {
                        style("✓").green()
                    } else {
                        style("✗").red()
                    };
                    match &check.message {
                        Some(msg) => println!("   {} {}: {}", mark, check.name, msg),
                        None => println!("   {} {}", mark, check.name),
                    }
                }
                if let Some(ms) = p.duration_ms {
                    println!("   {}", style(format!("{} ms", ms)).dim());
                }
                if let Some(stderr) = p.stderr.as_deref().filter(|s| !s.is_empty()) {
                    println!();
                    println!("{}", style(stderr).dim());
                }
            })
        }

        FixAction::Comment { id, text } => {
            let comment = hooks::add_comment(client, &id, &text)?;
            session.emit(&comment, |c| println!("💬 Comment {} added", style(&c.id).dim()))
        }

        FixAction::Comments { id } => {
            let comments = hooks::comments_query(client, &id).read().into_result()?;
            session.emit(&comments, |list| {
                if list.is_empty() {
                    println!("No comments yet.");
                }
                for c in list {
                    let when = c
                        .created_at
                        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_default();
                    println!(
                        "{} {}",
                        style(c.author.as_deref().unwrap_or("unknown")).bold(),
                        style(when).dim()
                    );
                    println!("   {}", c.content);
                }
            })
        }
    }
}

fn print_fix(fix: &FixProposal) {
    println!();
    println!("{} {}", style("🔧").bold(), style(&fix.title).bold());
    println!();
    println!("   {} {}", style("ID:").bold(), fix.id);
    println!("   {} {}", style("Status:").bold(), fix.status);
    println!("   {} {}", style("Confidence:").bold(), confidence_label(fix.confidence));
    if !fix.finding_ids.is_empty() {
        println!("   {} {}", style("Findings:").bold(), fix.finding_ids.join(", "));
    }
    if !fix.description.is_empty() {
        println!();
        println!("   {}", fix.description);
    }
    if !fix.rationale.is_empty() {
        println!();
        println!("{}", style("💡 Rationale").bold());
        println!("   {}", fix.rationale);
    }
    if !fix.changes.is_empty() {
        println!();
        for line in fix.diff().lines() {
            if line.starts_with("+++") || line.starts_with("---") {
                println!("{}", style(line).bold());
            } else if line.starts_with('+') {
                println!("{}", style(line).green());
            } else if line.starts_with('-') {
                println!("{}", style(line).red());
            } else if line.starts_with("@@") {
                println!("{}", style(line).cyan());
            } else {
                println!("{}", line);
            }
        }
    }
}
