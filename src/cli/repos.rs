//! Repository and analysis-run commands

use std::time::Duration;

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use repotoire_cloud::api::repositories::{AnalysisRun, AnalysisStatus};
use repotoire_cloud::hooks::repositories as hooks;
use repotoire_cloud::hooks::ThreadSleeper;
use repotoire_cloud::models::ListParams;

use super::{RepoAction, Session};

fn create_spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn status_label(status: AnalysisStatus) -> console::StyledObject<String> {
    let s = status.to_string();
    match status {
        AnalysisStatus::Completed => style(s).green().bold(),
        AnalysisStatus::Failed => style(s).red().bold(),
        AnalysisStatus::Running => style(s).cyan(),
        AnalysisStatus::Queued => style(s).dim(),
    }
}

fn progress_message(run: &AnalysisRun) -> String {
    match &run.current_step {
        Some(step) => format!("{} {}% · {}", run.status, run.progress_percent, step),
        None => format!("{} {}%", run.status, run.progress_percent),
    }
}

pub fn run(session: &Session, action: RepoAction) -> Result<()> {
    let client = &session.client;
    match action {
        RepoAction::List { page } => {
            let repos = hooks::repositories_query(client, &ListParams::page(page, 20))
                .read()
                .into_result()?;
            session.emit(&repos, |repos| {
                println!("{}", style("📦 Repositories").bold());
                println!();
                if repos.items.is_empty() {
                    println!(
                        "No repositories connected. Run {}",
                        style("repotoire-cloud repos connect <owner/name>").cyan()
                    );
                }
                for r in &repos.items {
                    let health = r
                        .health_score
                        .map(|s| format!("{:.0}", s))
                        .unwrap_or_else(|| "-".to_string());
                    let analyzed = r
                        .last_analyzed_at
                        .map(|t| t.format("%Y-%m-%d").to_string())
                        .unwrap_or_else(|| "never".to_string());
                    println!(
                        "   {}  {:<40} health {:>3}  {:>4} findings  {}",
                        style(&r.id).dim(),
                        style(&r.full_name).bold(),
                        health,
                        r.findings_count,
                        style(analyzed).dim()
                    );
                }
            })
        }

        RepoAction::Connect { full_name } => {
            let repo = hooks::connect(client, &full_name)?;
            session.emit(&repo, |r| {
                println!("✅ Connected {} ({})", style(&r.full_name).bold(), r.id);
                println!(
                    "   Run {} to analyze it",
                    style(format!("repotoire-cloud analyze {} --wait", r.id)).cyan()
                );
            })
        }

        RepoAction::Remove { id } => {
            hooks::remove(client, &id)?;
            session.emit(&serde_json::json!({ "removed": id }), |_| {
                println!("🗑  Removed repository {}", style(&id).bold());
            })
        }

        RepoAction::History { id, page } => {
            let runs = hooks::history_query(client, &id, &ListParams::page(page, 20))
                .read()
                .into_result()?;
            session.emit(&runs, |runs| {
                println!("{}", style("🕘 Analysis History").bold());
                println!();
                for run in &runs.items {
                    let started = run
                        .started_at
                        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_default();
                    println!(
                        "   {}  {:<9}  {}  {}",
                        style(&run.id).dim(),
                        status_label(run.status),
                        style(started).dim(),
                        run.findings_count
                            .map(|n| format!("{} findings", n))
                            .unwrap_or_default()
                    );
                }
            })
        }
    }
}

pub fn analyze(session: &Session, repo: &str, wait: bool) -> Result<()> {
    let run = hooks::trigger_analysis(&session.client, repo)?;
    tracing::info!("Analysis {} queued for {}", run.id, repo);
    if !wait {
        return session.emit(&run, |r| {
            println!("🚀 Analysis {} queued", style(&r.id).bold());
            println!(
                "   Follow it with {}",
                style(format!("repotoire-cloud run {} --wait", r.id)).cyan()
            );
        });
    }
    status(session, &run.id, true)
}

pub fn status(session: &Session, run_id: &str, wait: bool) -> Result<()> {
    let interval = session.config.poll_interval();
    let mut poller = hooks::analysis_status_poller(&session.client, run_id, interval);

    let state = if wait {
        let spinner = if session.json {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_spinner()
        };
        spinner.set_style(create_spinner_style());
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner.set_message(format!("Waiting for analysis {}", run_id));

        let state = poller.run(&ThreadSleeper, session.config.max_polls(), |state| {
            if let Some(run) = &state.data {
                spinner.set_message(progress_message(run));
            }
        });
        spinner.finish_and_clear();
        state
    } else {
        poller.poll()
    };

    let run = state.into_result()?;
    if wait && !run.status.is_terminal() {
        tracing::warn!(
            "Stopped waiting for {} after {} polls",
            run.id,
            poller.polls()
        );
    }
    print_run(session, &run)
}

fn print_run(session: &Session, run: &AnalysisRun) -> Result<()> {
    session.emit(run, |r| {
        println!("{} {}", style("🔬 Analysis").bold(), style(&r.id).dim());
        println!("   {} {}", style("Status:").bold(), status_label(r.status));
        if !r.status.is_terminal() {
            println!("   {} {}", style("Progress:").bold(), progress_message(r));
        }
        if let Some(n) = r.findings_count {
            println!("   {} {}", style("Findings:").bold(), n);
        }
        if let Some(score) = r.health_score {
            println!("   {} {:.1}", style("Health:").bold(), score);
        }
        if let Some(err) = &r.error_message {
            println!("   {} {}", style("Error:").red().bold(), err);
        }
        if r.status == AnalysisStatus::Completed {
            println!();
            println!(
                "   Run {} to see what was found",
                style(format!("repotoire-cloud findings --run {}", r.id)).cyan()
            );
        }
    })
}
