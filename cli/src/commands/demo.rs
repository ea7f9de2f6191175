// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Scripted walkthrough of one engagement
//!
//! Posts a job, collects applications, hires one student and runs the staged
//! payment protocol to completion, printing every step and the events it
//! published.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing::info;

use stutask_core::application::lifecycle::{CompletionReport, HireReport};
use stutask_core::domain::application::{ApplicationId, Decision};
use stutask_core::domain::effects::{EffectLog, StepOutcome};
use stutask_core::domain::identity::CurrentUser;
use stutask_core::domain::job::JobDraft;
use stutask_core::domain::message::Message;
use stutask_core::domain::payment::Money;
use stutask_core::domain::profile::UserProfile;

use crate::embedded::EmbeddedMarketplace;

#[derive(Args, Debug, Clone)]
pub struct DemoArgs {
    /// Agreed price of the engagement
    #[arg(long, default_value = "1000000")]
    pub amount: Decimal,

    /// Currency of the job payout (default: configured currency)
    #[arg(long)]
    pub currency: Option<String>,

    /// Number of students applying
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..=10))]
    pub applicants: u32,

    /// Print the hire and completion reports as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: DemoArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut embedded = EmbeddedMarketplace::new(config_path)?;
    let currency = args
        .currency
        .clone()
        .unwrap_or_else(|| embedded.marketplace().config.spec.payments.default_currency.clone());
    info!(applicants = args.applicants, amount = %args.amount, currency = %currency, "Starting demo walkthrough");

    let employer = CurrentUser::new("demo-employer", Some("Acme Studio"), "hr@acme.test");
    let students: Vec<CurrentUser> = (1..=args.applicants)
        .map(|n| {
            let name = format!("Student {}", n);
            CurrentUser::new(format!("demo-student-{}", n), Some(name.as_str()), format!("s{}@campus.test", n))
        })
        .collect();
    let hiree = &students[0];

    // Setup
    heading("Setup");
    let market = embedded.marketplace();
    for student in &students {
        let profile = UserProfile::new(student.uid.as_str(), student.sender_name()).with_skills(&["React", "Figma"]);
        market.repositories.profiles.save(&profile).await?;
    }
    let job = market
        .jobs
        .post_job(
            &employer,
            JobDraft {
                title: "Company profile website".to_string(),
                role: "Web developer".to_string(),
                description: "Five page marketing site with a contact form".to_string(),
                categories: vec!["React".to_string(), "CSS".to_string()],
                payout: Money::new(args.amount, currency.as_str()),
                max_proposals: None,
            },
        )
        .await?;
    step(&format!("{} posted \"{}\" paying {}", employer.sender_name(), job.title, job.payout));

    let recommended = market.jobs.recommended_jobs(hiree, 5).await?;
    step(&format!("{} sees {} recommended job(s)", hiree.sender_name(), recommended.len()));
    embedded.print_events();

    // Applications
    heading("Applications");
    let market = embedded.marketplace();
    let mut applications: Vec<ApplicationId> = Vec::new();
    for student in &students {
        let application = market
            .lifecycle
            .submit_application(
                student,
                job.id,
                "I have shipped similar sites for campus clubs.",
                &["https://github.com/example".to_string()],
            )
            .await?;
        step(&format!("{} applied ({})", student.sender_name(), application.status));
        applications.push(application.id);
    }
    let chosen = applications[0];
    let shortlisted = market.lifecycle.decide(&employer, chosen, Decision::ShortList).await?;
    step(&format!("{} is {}", hiree.sender_name(), shortlisted.status));
    if let Some(last) = applications.get(2) {
        let rejected = market.lifecycle.decide(&employer, *last, Decision::Rejected).await?;
        step(&format!("{} is {}", rejected.applicant_name, rejected.status));
    }
    let profile = market.lifecycle.applicant_profile(&employer, chosen).await?;
    step(&format!("Employer reads profile of {}: {}", profile.full_name, profile.skills.join(", ")));
    embedded.print_events();

    // Hire
    heading("Hire");
    let market = embedded.marketplace();
    let hire = market.lifecycle.confirm_hire(&employer, chosen).await?;
    print_hire(&hire, args.json)?;
    let job_now = market.jobs.get_job(job.id).await?;
    step(&format!("Job is now {}", job_now.status));
    embedded.print_events();

    // Payments
    heading("Payments");
    let market = embedded.marketplace();
    let payments = market.payments.clone();
    let mut feed = payments.open_feed(hiree, chosen).await?;

    payments.send_chat(&employer, chosen, "Welcome aboard! Kickoff tomorrow?").await?;
    let proposal = payments.propose_pay(&employer, chosen, args.amount, None).await?;
    show_message(&proposal);
    let snapshot = payments.snapshot(hiree, chosen).await?;
    step(&format!(
        "Stage {} ({})",
        snapshot.stage,
        if snapshot.your_turn { "applicant's turn" } else { "waiting" }
    ));
    show_message(&payments.respond_to_proposal(hiree, chosen, proposal.id, true).await?);
    show_message(&payments.send_partial_pay(&employer, chosen).await?);
    show_message(&payments.confirm_partial_received(hiree, chosen).await?);
    show_message(&payments.mark_delivered(hiree, chosen).await?);
    show_message(&payments.send_full_pay(&employer, chosen).await?);
    step(&format!("Stage {}", payments.current_stage(hiree, chosen).await?));

    let changes = feed.sync().await?;
    step(&format!(
        "Live feed applied {} change(s) and shows {} message(s)",
        changes,
        feed.messages().len()
    ));

    // Completion
    heading("Completion");
    let completion = payments.end_project(hiree, chosen).await?;
    print_completion(&completion, args.json)?;
    let job_after = market.jobs.get_job(job.id).await?;
    step(&format!("Job is now {}", job_after.status));
    embedded.print_events();

    // Financials
    heading("Financials");
    let market = embedded.marketplace();
    for (who, user) in [("Applicant", hiree), ("Employer", &employer)] {
        let summary = market.financials.financial_summary(user).await?;
        for totals in &summary.totals {
            let share = totals
                .gain_share_pct
                .map(|pct| format!("{}%", pct))
                .unwrap_or_else(|| "-".to_string());
            step(&format!(
                "{} {}: gain {} spend {} net {} share {}",
                who, totals.currency, totals.gain, totals.spend, totals.net, share
            ));
        }
    }

    println!();
    println!("{}", "✓ Demo finished".green());
    Ok(())
}

fn heading(title: &str) {
    println!();
    println!("{}", title.bold());
}

fn step(line: &str) {
    println!("  {} {}", "•".green(), line);
}

fn show_message(message: &Message) {
    let detail = message.money().map(|m| format!(" {}", m)).unwrap_or_default();
    step(&format!(
        "{} sent {}{}",
        message.sender_name,
        message.kind.type_name().yellow(),
        detail
    ));
}

fn print_effects(effects: &EffectLog) {
    for effect in effects.steps() {
        let outcome = match &effect.outcome {
            StepOutcome::Succeeded => "ok".green(),
            StepOutcome::Skipped(reason) => format!("skipped: {}", reason).yellow(),
            StepOutcome::Failed(reason) => format!("failed: {}", reason).red(),
        };
        println!("      {} {}", effect.name.dimmed(), outcome);
    }
}

fn print_hire(report: &HireReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report).context("Failed to render hire report")?);
        return Ok(());
    }
    step(&format!(
        "{} hired, {} competing application(s) removed",
        report.application.applicant_name,
        report.removed.len()
    ));
    print_effects(&report.effects);
    Ok(())
}

fn print_completion(report: &CompletionReport, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(report).context("Failed to render completion report")?
        );
        return Ok(());
    }
    let payout = report
        .application
        .payout
        .as_ref()
        .map(|m| m.to_string())
        .unwrap_or_else(|| "-".to_string());
    step(&format!(
        "Project {} with payout {}, {} message(s) cleared",
        report.application.status, payout, report.messages_removed
    ));
    print_effects(&report.effects);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_demo_runs_to_completion() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stutask-config.yaml");
        std::fs::write(&path, crate::commands::config::MINIMAL_TEMPLATE).unwrap();

        let args = DemoArgs {
            amount: Decimal::new(500, 0),
            currency: Some("USD".to_string()),
            applicants: 2,
            json: true,
        };
        run(args, Some(path)).await.unwrap();
    }
}
