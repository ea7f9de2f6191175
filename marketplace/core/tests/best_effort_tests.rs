// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Failure handling of multi-document workflows.
//!
//! Wraps the in-memory repositories in doubles that fail selected writes and
//! checks that primary writes are surfaced while side steps are only logged
//! in the effect report.

mod common;

use async_trait::async_trait;
use common::{apply, employer, hired, student};
use rust_decimal_macros::dec;
use std::sync::Arc;
use stutask_core::application::Repositories;
use stutask_core::domain::application::{Application, ApplicationId, ApplicationStatus, Decision};
use stutask_core::domain::config::MarketplaceConfig;
use stutask_core::domain::effects::StepOutcome;
use stutask_core::domain::identity::UserId;
use stutask_core::domain::job::{Job, JobId, JobStatus};
use stutask_core::domain::message::{Message, MessageId};
use stutask_core::domain::repository::{
    ApplicationRepository, JobRepository, MessageRepository, RepositoryError,
};
use stutask_core::infrastructure::event_bus::EventBus;
use stutask_core::infrastructure::repositories::{
    InMemoryApplicationRepository, InMemoryJobRepository, InMemoryMessageRepository,
};
use stutask_core::{Marketplace, MarketplaceError};

fn unavailable() -> RepositoryError {
    RepositoryError::Unavailable("simulated outage".to_string())
}

/// Refuses to store a job in `closed` status
struct CloseFailingJobRepository {
    inner: InMemoryJobRepository,
}

#[async_trait]
impl JobRepository for CloseFailingJobRepository {
    async fn save(&self, job: &Job) -> Result<(), RepositoryError> {
        if job.status == JobStatus::Closed {
            return Err(unavailable());
        }
        self.inner.save(job).await
    }

    async fn find_by_id(&self, id: JobId) -> Result<Option<Job>, RepositoryError> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_owner(&self, owner: &UserId) -> Result<Vec<Job>, RepositoryError> {
        self.inner.find_by_owner(owner).await
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<Job>, RepositoryError> {
        self.inner.list_recent(limit).await
    }

    async fn delete(&self, id: JobId) -> Result<(), RepositoryError> {
        self.inner.delete(id).await
    }
}

/// Fails every delete
struct DeleteFailingApplicationRepository {
    inner: InMemoryApplicationRepository,
}

#[async_trait]
impl ApplicationRepository for DeleteFailingApplicationRepository {
    async fn save(&self, application: &Application) -> Result<(), RepositoryError> {
        self.inner.save(application).await
    }

    async fn find_by_id(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_job(&self, job_id: JobId) -> Result<Vec<Application>, RepositoryError> {
        self.inner.find_by_job(job_id).await
    }

    async fn find_by_job_and_applicant(
        &self,
        job_id: JobId,
        applicant: &UserId,
    ) -> Result<Option<Application>, RepositoryError> {
        self.inner.find_by_job_and_applicant(job_id, applicant).await
    }

    async fn find_by_employer(&self, employer: &UserId) -> Result<Vec<Application>, RepositoryError> {
        self.inner.find_by_employer(employer).await
    }

    async fn find_by_applicant(&self, applicant: &UserId) -> Result<Vec<Application>, RepositoryError> {
        self.inner.find_by_applicant(applicant).await
    }

    async fn find_by_status(&self, status: ApplicationStatus) -> Result<Vec<Application>, RepositoryError> {
        self.inner.find_by_status(status).await
    }

    async fn delete(&self, _id: ApplicationId) -> Result<(), RepositoryError> {
        Err(unavailable())
    }
}

/// Fails every delete; optionally fails appends too
struct FlakyMessageRepository {
    inner: InMemoryMessageRepository,
    fail_appends: bool,
}

#[async_trait]
impl MessageRepository for FlakyMessageRepository {
    async fn append(&self, message: &Message) -> Result<(), RepositoryError> {
        if self.fail_appends {
            return Err(unavailable());
        }
        self.inner.append(message).await
    }

    async fn update(&self, message: &Message) -> Result<(), RepositoryError> {
        self.inner.update(message).await
    }

    async fn find_by_id(
        &self,
        application_id: ApplicationId,
        id: MessageId,
    ) -> Result<Option<Message>, RepositoryError> {
        self.inner.find_by_id(application_id, id).await
    }

    async fn list_all(&self, application_id: ApplicationId) -> Result<Vec<Message>, RepositoryError> {
        self.inner.list_all(application_id).await
    }

    async fn page(
        &self,
        application_id: ApplicationId,
        before: Option<MessageId>,
        limit: usize,
    ) -> Result<Vec<Message>, RepositoryError> {
        self.inner.page(application_id, before, limit).await
    }

    async fn delete(&self, _application_id: ApplicationId, _id: MessageId) -> Result<(), RepositoryError> {
        Err(unavailable())
    }
}

fn marketplace_with(configure: impl FnOnce(&mut Repositories, &EventBus)) -> Marketplace {
    let event_bus = EventBus::new(64);
    let mut repositories = Repositories::in_memory(&event_bus);
    configure(&mut repositories, &event_bus);
    Marketplace::new(MarketplaceConfig::default(), repositories, event_bus)
}

#[tokio::test]
async fn test_submission_survives_failed_cap_close() {
    let market = marketplace_with(|repos, _| {
        repos.jobs = Arc::new(CloseFailingJobRepository {
            inner: InMemoryJobRepository::new(),
        });
    });
    let job = common::post_job(&market, Some(1)).await;

    let application = apply(&market, &job, &student(1)).await;
    assert_eq!(application.status, ApplicationStatus::Pending);
    // Close failed, so the job is still stored as open
    assert_eq!(market.jobs.get_job(job.id).await.unwrap().status, JobStatus::Open);

    // The cap still holds through the application count
    let err = market
        .lifecycle
        .submit_application(&student(2), job.id, "Me too", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, MarketplaceError::Conflict(_)));
}

#[tokio::test]
async fn test_hire_reports_failed_side_steps_without_rollback() {
    let market = marketplace_with(|repos, _| {
        repos.jobs = Arc::new(CloseFailingJobRepository {
            inner: InMemoryJobRepository::new(),
        });
        repos.applications = Arc::new(DeleteFailingApplicationRepository {
            inner: InMemoryApplicationRepository::new(),
        });
    });
    let job = common::post_job(&market, None).await;
    let chosen = apply(&market, &job, &student(1)).await;
    let sibling = apply(&market, &job, &student(2)).await;
    market
        .lifecycle
        .decide(&employer(), chosen.id, Decision::ShortList)
        .await
        .unwrap();

    let report = market.lifecycle.confirm_hire(&employer(), chosen.id).await.unwrap();
    assert_eq!(report.application.status, ApplicationStatus::Hired);
    assert!(report.removed.is_empty());
    assert!(!report.effects.is_complete());

    let failed: Vec<&str> = report.effects.failures().map(|s| s.name.as_str()).collect();
    assert_eq!(failed, vec!["close_job".to_string(), format!("delete_application:{}", sibling.id)]);

    // Primary write landed
    let stored = market
        .repositories
        .applications
        .find_by_id(chosen.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, ApplicationStatus::Hired);
}

#[tokio::test]
async fn test_completion_reports_failed_message_wipe() {
    let market = marketplace_with(|repos, bus| {
        repos.messages = Arc::new(FlakyMessageRepository {
            inner: InMemoryMessageRepository::with_event_bus(bus.clone()),
            fail_appends: false,
        });
    });
    let (_job, application) = hired(&market).await;
    let payments = &market.payments;
    let applicant = student(1);

    let proposal = payments
        .propose_pay(&employer(), application.id, dec!(10.01), None)
        .await
        .unwrap();
    payments
        .respond_to_proposal(&applicant, application.id, proposal.id, true)
        .await
        .unwrap();
    let partial = payments.send_partial_pay(&employer(), application.id).await.unwrap();
    assert_eq!(partial.money().unwrap().amount, dec!(2.50));
    payments
        .confirm_partial_received(&applicant, application.id)
        .await
        .unwrap();
    payments.mark_delivered(&applicant, application.id).await.unwrap();
    let full = payments.send_full_pay(&employer(), application.id).await.unwrap();
    assert_eq!(full.money().unwrap().amount, dec!(7.51));

    let report = payments.end_project(&applicant, application.id).await.unwrap();
    assert_eq!(report.application.status, ApplicationStatus::Completed);
    assert_eq!(report.messages_removed, 0);
    assert_eq!(report.effects.failures().count(), 5);
    assert!(report
        .effects
        .steps()
        .iter()
        .any(|s| s.name == "reopen_job" && s.outcome == StepOutcome::Succeeded));
}

#[tokio::test]
async fn test_failed_primary_append_is_surfaced() {
    let market = marketplace_with(|repos, bus| {
        repos.messages = Arc::new(FlakyMessageRepository {
            inner: InMemoryMessageRepository::with_event_bus(bus.clone()),
            fail_appends: true,
        });
    });
    let (_job, application) = hired(&market).await;

    let err = market
        .payments
        .propose_pay(&employer(), application.id, dec!(100), None)
        .await
        .unwrap_err();
    assert!(matches!(err, MarketplaceError::Store(RepositoryError::Unavailable(_))));
    assert_eq!(err.user_message(), "Something went wrong. Please try again.");
}
