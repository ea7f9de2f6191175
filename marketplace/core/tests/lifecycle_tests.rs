// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Integration tests for the application lifecycle engine.
//!
//! Covers submission rules (duplicates, caps, closed jobs, own jobs), the
//! employer's decision, hire confirmation with sibling removal, and the
//! dashboard read models.

mod common;

use common::{apply, employer, hired, marketplace, post_job, student};
use stutask_core::domain::application::{ApplicationStatus, Decision};
use stutask_core::domain::events::ApplicationEvent;
use stutask_core::domain::job::JobStatus;
use stutask_core::domain::profile::UserProfile;
use stutask_core::domain::repository::{ApplicationRepository, ProfileRepository, RepositoryError};
use stutask_core::infrastructure::event_bus::DomainEvent;
use stutask_core::MarketplaceError;

#[tokio::test]
async fn test_cap_of_one_closes_job_and_refuses_next_applicant() {
    let market = marketplace();
    let job = post_job(&market, Some(1)).await;

    apply(&market, &job, &student(1)).await;
    let job_after = market.jobs.get_job(job.id).await.unwrap();
    assert_eq!(job_after.status, JobStatus::Closed);

    let err = market
        .lifecycle
        .submit_application(&student(2), job.id, "Me too", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, MarketplaceError::Conflict(_)));
    assert_eq!(err.user_message(), "Applications are closed for this job.");
}

#[tokio::test]
async fn test_duplicate_application_is_a_conflict() {
    let market = marketplace();
    let job = post_job(&market, None).await;
    apply(&market, &job, &student(1)).await;

    let err = market
        .lifecycle
        .submit_application(&student(1), job.id, "Again", &[])
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "You already applied to this job.");
}

#[tokio::test]
async fn test_submission_validation() {
    let market = marketplace();
    let job = post_job(&market, None).await;

    let err = market
        .lifecycle
        .submit_application(&student(1), job.id, "   ", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, MarketplaceError::Validation(_)));
    assert_eq!(err.user_message(), "Please add a cover letter.");

    let err = market
        .lifecycle
        .submit_application(&employer(), job.id, "Hire me", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, MarketplaceError::Authorization(_)));

    let missing = stutask_core::domain::job::JobId::new();
    let err = market
        .lifecycle
        .submit_application(&student(1), missing, "Hello", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, MarketplaceError::Store(RepositoryError::NotFound(_))));
}

#[tokio::test]
async fn test_links_are_trimmed_and_limited() {
    let market = marketplace();
    let job = post_job(&market, None).await;
    let links = vec![
        "  https://github.com/rina ".to_string(),
        "".to_string(),
        "https://dribbble.com/rina".to_string(),
        "https://behance.net/rina".to_string(),
    ];

    let application = market
        .lifecycle
        .submit_application(&student(1), job.id, "Portfolio attached", &links)
        .await
        .unwrap();
    assert_eq!(
        application.links,
        vec!["https://github.com/rina", "https://dribbble.com/rina"]
    );
    assert_eq!(application.job_title, "Company profile website");
    assert_eq!(application.employer_name, "Acme Studio");
}

#[tokio::test]
async fn test_manually_closed_job_refuses_applications() {
    let market = marketplace();
    let job = post_job(&market, None).await;
    market
        .jobs
        .set_job_status(&employer(), job.id, JobStatus::Closed)
        .await
        .unwrap();

    let err = market
        .lifecycle
        .submit_application(&student(1), job.id, "Hello", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, MarketplaceError::Conflict(_)));
}

#[tokio::test]
async fn test_only_employer_of_record_decides_once() {
    let market = marketplace();
    let job = post_job(&market, None).await;
    let application = apply(&market, &job, &student(1)).await;

    let err = market
        .lifecycle
        .decide(&student(1), application.id, Decision::ShortList)
        .await
        .unwrap_err();
    assert!(matches!(err, MarketplaceError::Authorization(_)));

    let rejected = market
        .lifecycle
        .decide(&employer(), application.id, Decision::Rejected)
        .await
        .unwrap();
    assert_eq!(rejected.status, ApplicationStatus::Rejected);

    let err = market
        .lifecycle
        .decide(&employer(), application.id, Decision::ShortList)
        .await
        .unwrap_err();
    assert!(matches!(err, MarketplaceError::Conflict(_)));
}

#[tokio::test]
async fn test_hire_sets_hired_and_removes_siblings() {
    let market = marketplace();
    let mut events = market.event_bus.subscribe();
    let job = post_job(&market, None).await;
    let chosen = apply(&market, &job, &student(1)).await;
    let pending = apply(&market, &job, &student(2)).await;
    let rejected = apply(&market, &job, &student(3)).await;
    market
        .lifecycle
        .decide(&employer(), rejected.id, Decision::Rejected)
        .await
        .unwrap();
    market
        .lifecycle
        .decide(&employer(), chosen.id, Decision::ShortList)
        .await
        .unwrap();

    let report = market.lifecycle.confirm_hire(&employer(), chosen.id).await.unwrap();
    assert_eq!(report.application.status, ApplicationStatus::Hired);
    assert!(report.application.hired_at.is_some());
    assert!(report.effects.is_complete());
    assert_eq!(report.removed.len(), 2);

    let remaining = market.repositories.applications.find_by_job(job.id).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, chosen.id);
    assert!(market
        .repositories
        .applications
        .find_by_id(pending.id)
        .await
        .unwrap()
        .is_none());

    let job_after = market.jobs.get_job(job.id).await.unwrap();
    assert_eq!(job_after.status, JobStatus::Closed);

    let mut hire_seen = false;
    let mut siblings_seen = 0;
    while let Ok(event) = events.try_recv() {
        match event {
            DomainEvent::Application(ApplicationEvent::HireConfirmed { application_id, .. }) => {
                assert_eq!(application_id, chosen.id);
                hire_seen = true;
            }
            DomainEvent::Application(ApplicationEvent::SiblingRemoved { .. }) => siblings_seen += 1,
            _ => {}
        }
    }
    assert!(hire_seen);
    assert_eq!(siblings_seen, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_decision_racing_a_hire_never_restores_a_sibling() {
    for _ in 0..20 {
        let market = marketplace();
        let job = post_job(&market, None).await;
        let chosen = apply(&market, &job, &student(1)).await.id;
        let sibling = apply(&market, &job, &student(2)).await.id;
        market
            .lifecycle
            .decide(&employer(), chosen, Decision::ShortList)
            .await
            .unwrap();

        let decision = {
            let lifecycle = market.lifecycle.clone();
            tokio::spawn(async move { lifecycle.decide(&employer(), sibling, Decision::ShortList).await })
        };
        let hire = {
            let lifecycle = market.lifecycle.clone();
            tokio::spawn(async move { lifecycle.confirm_hire(&employer(), chosen).await })
        };
        hire.await.unwrap().unwrap();
        let _ = decision.await.unwrap();

        let remaining = market.repositories.applications.find_by_job(job.id).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, chosen);
    }
}

#[tokio::test]
async fn test_deciding_a_removed_sibling_is_not_found() {
    let market = marketplace();
    let job = post_job(&market, None).await;
    let chosen = apply(&market, &job, &student(1)).await;
    let sibling = apply(&market, &job, &student(2)).await;
    market
        .lifecycle
        .decide(&employer(), chosen.id, Decision::ShortList)
        .await
        .unwrap();
    market.lifecycle.confirm_hire(&employer(), chosen.id).await.unwrap();

    let err = market
        .lifecycle
        .decide(&employer(), sibling.id, Decision::Rejected)
        .await
        .unwrap_err();
    assert!(matches!(err, MarketplaceError::Store(RepositoryError::NotFound(_))));
    assert!(market
        .repositories
        .applications
        .find_by_id(sibling.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_hire_requires_short_list() {
    let market = marketplace();
    let job = post_job(&market, None).await;
    let application = apply(&market, &job, &student(1)).await;

    let err = market
        .lifecycle
        .confirm_hire(&employer(), application.id)
        .await
        .unwrap_err();
    assert!(matches!(err, MarketplaceError::Conflict(_)));

    let unchanged = market
        .repositories
        .applications
        .find_by_id(application.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.status, ApplicationStatus::Pending);
}

#[tokio::test]
async fn test_second_hire_on_same_job_is_refused() {
    let market = marketplace();
    let (job, hired_application) = hired(&market).await;

    // A stale short-listed sibling written behind the engine's back
    let mut straggler = stutask_core::domain::application::Application::submit(
        &job,
        &student(7),
        "Late",
        vec![],
    );
    straggler.decide(Decision::ShortList).unwrap();
    market.repositories.applications.save(&straggler).await.unwrap();

    let err = market
        .lifecycle
        .confirm_hire(&employer(), straggler.id)
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "This job already has a hired applicant.");

    let hires = market.lifecycle.hires(&employer()).await.unwrap();
    assert_eq!(hires.len(), 1);
    assert_eq!(hires[0].id, hired_application.id);

    let hired_anywhere = market
        .repositories
        .applications
        .find_by_status(ApplicationStatus::Hired)
        .await
        .unwrap();
    assert_eq!(hired_anywhere.len(), 1);
}

#[tokio::test]
async fn test_dashboards_split_by_status() {
    let market = marketplace();
    let first = post_job(&market, None).await;
    let second = post_job(&market, None).await;
    let applicant = student(1);

    let active = apply(&market, &first, &applicant).await;
    let turned_down = apply(&market, &second, &applicant).await;
    market
        .lifecycle
        .decide(&employer(), turned_down.id, Decision::Rejected)
        .await
        .unwrap();

    let mine = market.lifecycle.applications_for_applicant(&applicant).await.unwrap();
    assert_eq!(mine.active.len(), 1);
    assert_eq!(mine.active[0].id, active.id);
    assert_eq!(mine.rejected.len(), 1);
    assert_eq!(mine.rejected[0].id, turned_down.id);

    let queue = market.lifecycle.applications_for_employer(&employer()).await.unwrap();
    assert_eq!(queue.len(), 2);
    assert!(market.lifecycle.hires(&employer()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_applicant_profile_only_while_short_listed() {
    let market = marketplace();
    let job = post_job(&market, None).await;
    let applicant = student(1);
    market
        .repositories
        .profiles
        .save(&UserProfile::new("stu-1", "Student 1").with_skills(&["React"]))
        .await
        .unwrap();
    let application = apply(&market, &job, &applicant).await;

    let err = market
        .lifecycle
        .applicant_profile(&employer(), application.id)
        .await
        .unwrap_err();
    assert!(matches!(err, MarketplaceError::Conflict(_)));

    market
        .lifecycle
        .decide(&employer(), application.id, Decision::ShortList)
        .await
        .unwrap();
    let profile = market
        .lifecycle
        .applicant_profile(&employer(), application.id)
        .await
        .unwrap();
    assert_eq!(profile.skills, vec!["React"]);

    let err = market
        .lifecycle
        .applicant_profile(&student(2), application.id)
        .await
        .unwrap_err();
    assert!(matches!(err, MarketplaceError::Authorization(_)));
}

#[tokio::test]
async fn test_outsider_cannot_read_application() {
    let market = marketplace();
    let (_job, application) = hired(&market).await;

    assert!(market.lifecycle.get_application(&employer(), application.id).await.is_ok());
    assert!(market.lifecycle.get_application(&student(1), application.id).await.is_ok());
    let err = market
        .lifecycle
        .get_application(&student(9), application.id)
        .await
        .unwrap_err();
    assert!(matches!(err, MarketplaceError::Authorization(_)));
}
