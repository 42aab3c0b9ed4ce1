//! Dashboard analytics commands

use anyhow::Result;
use console::style;

use repotoire_cloud::api::analytics::TrendPeriod;
use repotoire_cloud::hooks::analytics::{health_query, summary_query, trends_query};

use super::Session;

pub fn summary(session: &Session, repo: Option<&str>) -> Result<()> {
    let summary = summary_query(&session.client, repo).read().into_result()?;
    let health = health_query(&session.client, repo).read().into_result()?;

    if session.json {
        let out = serde_json::json!({ "summary": summary, "health": health });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let grade = health.grade();
    let grade_style = match grade.chars().next() {
        Some('A') => style(grade.clone()).green().bold(),
        Some('B') => style(grade.clone()).cyan().bold(),
        Some('C') => style(grade.clone()).yellow().bold(),
        _ => style(grade.clone()).red().bold(),
    };

    println!("{}", style("📈 Analytics").bold());
    println!();
    println!(
        "   {} {:.1}/100  {}",
        style("Health:").bold(),
        health.score,
        grade_style
    );
    if let Some(delta) = health.trend {
        let arrow = if delta >= 0.0 {
            style(format!("▲ {:.1}", delta)).green()
        } else {
            style(format!("▼ {:.1}", delta.abs())).red()
        };
        println!("   {} {} since last analysis", style("Trend:").bold(), arrow);
    }
    for (label, score) in [
        ("Structure", health.structure_score),
        ("Quality", health.quality_score),
        ("Architecture", health.architecture_score),
    ] {
        if let Some(s) = score {
            println!("     {:<13} {:.1}", label, s);
        }
    }

    println!();
    println!(
        "   {} {} open, {} resolved",
        style("Findings:").bold(),
        style(summary.open_findings).yellow(),
        style(summary.resolved_findings).green()
    );
    println!(
        "     {} critical  {} high  {} medium  {} low",
        style(summary.critical).red().bold(),
        style(summary.high).yellow().bold(),
        style(summary.medium).cyan(),
        style(summary.low).dim(),
    );
    println!(
        "   {} {} pending, {} approved, {} applied",
        style("Fixes:").bold(),
        summary.fixes_pending,
        summary.fixes_approved,
        summary.fixes_applied
    );
    println!("   {} {}", style("Repositories:").bold(), summary.repositories);
    Ok(())
}

pub fn trends(session: &Session, period: &str, repo: Option<&str>) -> Result<()> {
    let period: TrendPeriod = period
        .parse()
        .map_err(|e| anyhow::anyhow!("--period: {}", e))?;
    let points = trends_query(&session.client, period, repo)
        .read()
        .into_result()?;

    session.emit(&points, |points| {
        println!("{} ({})", style("📉 Findings Trend").bold(), period);
        println!();
        if points.is_empty() {
            println!("No data for this period yet.");
            return;
        }
        let max = points.iter().map(|p| p.total).max().unwrap_or(0).max(1);
        for p in points {
            let width = p.total * 40 / max;
            println!(
                "   {}  {:>5}  {}{}",
                style(&p.date).dim(),
                p.total,
                style("█".repeat(width)).cyan(),
                if p.critical > 0 {
                    style(format!(" {} critical", p.critical)).red().to_string()
                } else {
                    String::new()
                }
            );
        }
    })
}
