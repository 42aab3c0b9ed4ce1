//! Findings commands: list, detail, summary and triage

use anyhow::Result;
use console::{style, StyledObject};

use repotoire_cloud::api::findings::FindingFilters;
use repotoire_cloud::hooks::findings::{by_detector_query, finding_query, summary_query, update_status};
use repotoire_cloud::models::{
    Finding, FindingStatus, FindingsSummary, ListParams, Page, Severity, SortDirection,
};
use repotoire_cloud::views::FindingsList;

use super::{parse_flag, FindingArgs, Session};

pub(super) fn severity_badge(severity: Severity) -> StyledObject<&'static str> {
    match severity {
        Severity::Critical => style("CRITICAL").red().bold(),
        Severity::High => style("HIGH").yellow().bold(),
        Severity::Medium => style("MEDIUM").cyan(),
        Severity::Low => style("LOW").dim(),
        Severity::Info => style("INFO").dim(),
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        "finding"
    } else {
        "findings"
    }
}

fn to_filters(args: &FindingArgs) -> Result<FindingFilters> {
    Ok(FindingFilters {
        severity: parse_flag::<Severity>("severity", args.severity.as_deref())?,
        detector: args.detector.clone(),
        status: parse_flag::<FindingStatus>("status", args.status.as_deref())?,
        category: args.category.clone(),
        repository_id: args.repo.clone(),
        analysis_run_id: args.run.clone(),
        search: args.search.clone(),
    })
}

pub fn list(
    session: &Session,
    args: &FindingArgs,
    page: u32,
    per_page: u32,
    sort: Option<String>,
    asc: bool,
) -> Result<()> {
    let mut params = ListParams::page(page, per_page);
    if let Some(field) = sort {
        let direction = if asc {
            SortDirection::Asc
        } else {
            SortDirection::Desc
        };
        params = params.sorted_by(field, direction);
    }

    let mut view = FindingsList::new(&session.client);
    view.set_filters(to_filters(args)?);
    view.set_params(params);

    let findings = view.load().into_result()?;
    if session.json {
        println!("{}", serde_json::to_string_pretty(&findings)?);
        return Ok(());
    }
    let summary = view.summary().into_result()?;
    print_list(&findings, &summary);
    Ok(())
}

fn print_list(findings: &Page<Finding>, summary: &FindingsSummary) {
    println!("{}", style("🔍 Findings").bold());
    println!();
    println!(
        "   {} critical  {} high  {} medium  {} low",
        style(summary.critical).red().bold(),
        style(summary.high).yellow().bold(),
        style(summary.medium).cyan(),
        style(summary.low).dim(),
    );
    println!();

    if findings.items.is_empty() {
        println!("{}", style("No findings match these filters.").green());
        return;
    }

    let offset = (findings.page.saturating_sub(1) as usize) * findings.page_size as usize;
    for (i, finding) in findings.items.iter().enumerate() {
        let location = finding
            .affected_files
            .first()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let line = finding
            .line_start
            .map(|l| format!(":{}", l))
            .unwrap_or_default();

        println!(
            "{:>3}. {:<8} {}",
            style(offset + i + 1).dim(),
            severity_badge(finding.severity),
            style(&finding.title).bold()
        );
        println!(
            "     {} {}{}  {} {}",
            style("└─").dim(),
            style(&location).dim(),
            style(&line).dim(),
            style(&finding.id).dim(),
            style(format!("({})", finding.status)).dim()
        );
    }

    if findings.total_pages() > 1 {
        println!();
        println!(
            "{}Page {} of {} ({} total)",
            style("📑 ").bold(),
            style(findings.page).cyan(),
            style(findings.total_pages()).cyan(),
            style(findings.total).cyan(),
        );
        if findings.has_more {
            println!(
                "   Use {} to see more",
                style(format!("--page {}", findings.page + 1)).yellow()
            );
        }
    }
}

pub fn show(session: &Session, id: &str) -> Result<()> {
    let finding = finding_query(&session.client, id).read().into_result()?;
    session.emit(&finding, |f| {
        println!();
        println!("{} {}", style("📋").bold(), style(&f.title).bold());
        println!();
        println!("   {} {}", style("ID:").bold(), f.id);
        println!("   {} {}", style("Severity:").bold(), severity_badge(f.severity));
        println!("   {} {}", style("Status:").bold(), f.status);
        println!("   {} {}", style("Detector:").bold(), f.detector);
        if let Some(cat) = &f.category {
            println!("   {} {}", style("Category:").bold(), cat);
        }
        if let Some(cwe) = &f.cwe_id {
            println!("   {} {}", style("CWE:").bold(), cwe);
        }
        if let Some(reason) = &f.status_reason {
            println!("   {} {}", style("Reason:").bold(), reason);
        }

        if !f.affected_files.is_empty() {
            println!();
            println!("{}", style("📁 Affected Files").bold());
            for file in &f.affected_files {
                match (f.line_start, f.line_end) {
                    (Some(start), Some(end)) if end != start => {
                        println!("   {}:{}-{}", file.display(), start, end)
                    }
                    (Some(start), _) => println!("   {}:{}", file.display(), start),
                    _ => println!("   {}", file.display()),
                }
            }
        }

        if !f.description.is_empty() {
            println!();
            println!("{}", style("📝 Description").bold());
            println!("   {}", f.description);
        }
        if let Some(why) = &f.why_it_matters {
            println!();
            println!("{}", style("⚠️  Why It Matters").bold());
            println!("   {}", why);
        }
        if let Some(fix) = &f.suggested_fix {
            println!();
            println!("{}", style("💡 Suggested Fix").bold());
            println!("   {}", fix);
        }
    })
}

pub fn summary(session: &Session, repo: Option<&str>, top: u32) -> Result<()> {
    let summary = summary_query(&session.client, repo).read().into_result()?;
    let detectors = by_detector_query(&session.client, repo, top)
        .read()
        .into_result()?;

    if session.json {
        let out = serde_json::json!({ "summary": summary, "by_detector": detectors });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{}", style("📊 Findings Summary").bold());
    println!();
    for severity in [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ] {
        let n = summary.count(severity);
        println!("   {:>5} {} {}", n, plural(n), severity_badge(severity));
    }
    println!("   {:>5} total", style(summary.total).bold());

    if !detectors.is_empty() {
        println!();
        println!("{}", style("🔎 Top Detectors").bold());
        for d in &detectors {
            println!("   {:>5}  {}", style(d.count).cyan(), d.detector);
        }
    }
    Ok(())
}

pub fn triage(session: &Session, ids: Vec<String>, status: &str, reason: Option<&str>) -> Result<()> {
    let status: FindingStatus = status
        .parse()
        .map_err(|e| anyhow::anyhow!("--status: {}", e))?;

    if let [id] = ids.as_slice() {
        let finding = update_status(&session.client, id, status, reason)?;
        return session.emit(&finding, |f| {
            println!("✅ Marked {} as {}", style(&f.id).bold(), style(f.status).cyan());
        });
    }

    let mut view = FindingsList::new(&session.client);
    for id in ids {
        view.select(id);
    }
    let count = view.selected_count();
    let result = view.bulk_mark(status, reason)?;
    session.emit(&result, |r| {
        println!(
            "✅ Marked {} of {} {} as {}",
            style(r.updated).bold(),
            count,
            plural(count),
            style(status).cyan()
        );
        for id in &r.failed {
            println!("   {} {}", style("✗").red(), id);
        }
    })
}
