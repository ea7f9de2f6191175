// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Persistence Gateway Contracts
//!
//! One repository per aggregate, interface defined in the domain layer and
//! implemented in `crate::infrastructure::repositories`.
//!
//! | Trait | Collection | Implementations |
//! |-------|------------|----------------|
//! | `JobRepository` | `jobs` | `InMemoryJobRepository` |
//! | `ApplicationRepository` | `applications` | `InMemoryApplicationRepository` |
//! | `MessageRepository` | `applications/{id}/messages` | `InMemoryMessageRepository` |
//! | `ProfileRepository` | `users` | `InMemoryProfileRepository` |
//!
//! Every call is a suspension point and may fail with [`RepositoryError`].
//! No trait offers multi-document transactions; callers that touch several
//! documents record their progress in an
//! [`EffectLog`](crate::domain::effects::EffectLog).
//!
//! Change subscription is not part of these traits: implementations publish
//! [`FeedEvent`](crate::domain::events::FeedEvent)s on the
//! [`EventBus`](crate::infrastructure::event_bus::EventBus) after each write.

use async_trait::async_trait;

use crate::domain::application::{Application, ApplicationId, ApplicationStatus};
use crate::domain::identity::UserId;
use crate::domain::job::{Job, JobId};
use crate::domain::message::{Message, MessageId};
use crate::domain::profile::UserProfile;

/// Repository interface for Job aggregates
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Save job (create or update)
    async fn save(&self, job: &Job) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: JobId) -> Result<Option<Job>, RepositoryError>;

    /// Jobs posted by `owner`, newest first
    async fn find_by_owner(&self, owner: &UserId) -> Result<Vec<Job>, RepositoryError>;

    /// Most recently posted jobs, newest first
    async fn list_recent(&self, limit: usize) -> Result<Vec<Job>, RepositoryError>;

    async fn delete(&self, id: JobId) -> Result<(), RepositoryError>;
}

/// Repository interface for Application aggregates
#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    /// Save application (create or update, last write wins)
    async fn save(&self, application: &Application) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError>;

    /// All applications of a job, any status
    async fn find_by_job(&self, job_id: JobId) -> Result<Vec<Application>, RepositoryError>;

    /// Existing application of `applicant` to `job_id`, if any
    async fn find_by_job_and_applicant(
        &self,
        job_id: JobId,
        applicant: &UserId,
    ) -> Result<Option<Application>, RepositoryError>;

    /// Applications received by `employer`, newest first
    async fn find_by_employer(&self, employer: &UserId) -> Result<Vec<Application>, RepositoryError>;

    /// Applications sent by `applicant`, newest first
    async fn find_by_applicant(&self, applicant: &UserId) -> Result<Vec<Application>, RepositoryError>;

    async fn find_by_status(&self, status: ApplicationStatus) -> Result<Vec<Application>, RepositoryError>;

    /// Delete application by ID. Deleting a missing application is an error.
    async fn delete(&self, id: ApplicationId) -> Result<(), RepositoryError>;
}

/// Repository interface for the per-application message feed
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Append a message; the store orders the feed by arrival
    async fn append(&self, message: &Message) -> Result<(), RepositoryError>;

    /// Replace an existing message in place
    async fn update(&self, message: &Message) -> Result<(), RepositoryError>;

    async fn find_by_id(
        &self,
        application_id: ApplicationId,
        id: MessageId,
    ) -> Result<Option<Message>, RepositoryError>;

    /// Entire feed in chronological order
    async fn list_all(&self, application_id: ApplicationId) -> Result<Vec<Message>, RepositoryError>;

    /// Up to `limit` messages strictly older than `before` (or the newest ones
    /// when `before` is `None`), newest first
    async fn page(
        &self,
        application_id: ApplicationId,
        before: Option<MessageId>,
        limit: usize,
    ) -> Result<Vec<Message>, RepositoryError>;

    async fn delete(&self, application_id: ApplicationId, id: MessageId) -> Result<(), RepositoryError>;
}

/// Read access to account profiles
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn save(&self, profile: &UserProfile) -> Result<(), RepositoryError>;

    async fn find_by_uid(&self, uid: &UserId) -> Result<Option<UserProfile>, RepositoryError>;
}

/// Repository errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Permission denied by store: {0}")]
    PermissionDenied(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}
