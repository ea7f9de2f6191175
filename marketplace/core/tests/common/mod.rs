// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Fixtures shared by the integration suites.

#![allow(dead_code)]

use rust_decimal::Decimal;
use stutask_core::domain::application::{Application, Decision};
use stutask_core::domain::config::MarketplaceConfig;
use stutask_core::domain::identity::CurrentUser;
use stutask_core::domain::job::{Job, JobDraft};
use stutask_core::domain::payment::Money;
use stutask_core::Marketplace;

pub fn employer() -> CurrentUser {
    CurrentUser::new("emp-1", Some("Acme Studio"), "hr@acme.test")
}

pub fn student(n: u32) -> CurrentUser {
    let name = format!("Student {}", n);
    CurrentUser::new(format!("stu-{}", n), Some(name.as_str()), format!("stu{}@campus.test", n))
}

pub fn marketplace() -> Marketplace {
    Marketplace::in_memory(MarketplaceConfig::default())
}

pub fn draft(max_proposals: Option<u32>) -> JobDraft {
    JobDraft {
        title: "Company profile website".to_string(),
        role: "Web developer".to_string(),
        description: "Build a five page company profile site".to_string(),
        categories: vec!["React".to_string(), "CSS".to_string()],
        payout: Money::new(Decimal::new(1_000_000, 0), "IDR"),
        max_proposals,
    }
}

pub async fn post_job(market: &Marketplace, max_proposals: Option<u32>) -> Job {
    market.jobs.post_job(&employer(), draft(max_proposals)).await.unwrap()
}

pub async fn apply(market: &Marketplace, job: &Job, applicant: &CurrentUser) -> Application {
    market
        .lifecycle
        .submit_application(applicant, job.id, "I have shipped three similar sites.", &[])
        .await
        .unwrap()
}

/// A job with `student(1)` hired on it
pub async fn hired(market: &Marketplace) -> (Job, Application) {
    let job = post_job(market, None).await;
    let application = apply(market, &job, &student(1)).await;
    market
        .lifecycle
        .decide(&employer(), application.id, Decision::ShortList)
        .await
        .unwrap();
    let report = market.lifecycle.confirm_hire(&employer(), application.id).await.unwrap();
    (job, report.application)
}
