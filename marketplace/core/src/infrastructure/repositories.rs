// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! In-Memory Persistence Gateway
//!
//! Implementations of the repository contracts defined in
//! [`crate::domain::repository`], backed by `HashMap`s behind
//! `parking_lot::RwLock`s. Used by the CLI demo and the test suites; a
//! hosted document store plugs in behind the same traits.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Persist and retrieve marketplace aggregates
//! - **Pattern:** Repository (DDD), Adapter (Hexagonal Architecture)
//!
//! The message store keeps each conversation as an append-ordered `Vec`, so
//! arrival order is the feed order, and publishes a
//! [`FeedEvent`](crate::domain::events::FeedEvent) after every write when
//! attached to an [`EventBus`].

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::domain::application::{Application, ApplicationId, ApplicationStatus};
use crate::domain::events::FeedEvent;
use crate::domain::identity::UserId;
use crate::domain::job::{Job, JobId};
use crate::domain::message::{Message, MessageId};
use crate::domain::profile::UserProfile;
use crate::domain::repository::{
    ApplicationRepository, JobRepository, MessageRepository, ProfileRepository, RepositoryError,
};
use crate::infrastructure::event_bus::EventBus;

#[derive(Clone, Default)]
pub struct InMemoryJobRepository {
    jobs: Arc<RwLock<HashMap<JobId, Job>>>,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first_jobs(mut jobs: Vec<Job>) -> Vec<Job> {
    jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    jobs
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn save(&self, job: &Job) -> Result<(), RepositoryError> {
        self.jobs.write().insert(job.id, job.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: JobId) -> Result<Option<Job>, RepositoryError> {
        Ok(self.jobs.read().get(&id).cloned())
    }

    async fn find_by_owner(&self, owner: &UserId) -> Result<Vec<Job>, RepositoryError> {
        let jobs = self.jobs.read();
        let owned = jobs.values().filter(|j| j.is_owned_by(owner)).cloned().collect();
        Ok(newest_first_jobs(owned))
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<Job>, RepositoryError> {
        let all = self.jobs.read().values().cloned().collect();
        Ok(newest_first_jobs(all).into_iter().take(limit).collect())
    }

    async fn delete(&self, id: JobId) -> Result<(), RepositoryError> {
        self.jobs
            .write()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(format!("job {}", id)))
    }
}

#[derive(Clone, Default)]
pub struct InMemoryApplicationRepository {
    applications: Arc<RwLock<HashMap<ApplicationId, Application>>>,
}

impl InMemoryApplicationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn select(&self, predicate: impl Fn(&Application) -> bool) -> Vec<Application> {
        let mut selected: Vec<Application> = self
            .applications
            .read()
            .values()
            .filter(|a| predicate(a))
            .cloned()
            .collect();
        selected.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        selected
    }
}

#[async_trait]
impl ApplicationRepository for InMemoryApplicationRepository {
    async fn save(&self, application: &Application) -> Result<(), RepositoryError> {
        self.applications.write().insert(application.id, application.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Ok(self.applications.read().get(&id).cloned())
    }

    async fn find_by_job(&self, job_id: JobId) -> Result<Vec<Application>, RepositoryError> {
        Ok(self.select(|a| a.job_id == job_id))
    }

    async fn find_by_job_and_applicant(
        &self,
        job_id: JobId,
        applicant: &UserId,
    ) -> Result<Option<Application>, RepositoryError> {
        Ok(self
            .applications
            .read()
            .values()
            .find(|a| a.job_id == job_id && &a.applicant_id == applicant)
            .cloned())
    }

    async fn find_by_employer(&self, employer: &UserId) -> Result<Vec<Application>, RepositoryError> {
        Ok(self.select(|a| &a.employer_id == employer))
    }

    async fn find_by_applicant(&self, applicant: &UserId) -> Result<Vec<Application>, RepositoryError> {
        Ok(self.select(|a| &a.applicant_id == applicant))
    }

    async fn find_by_status(&self, status: ApplicationStatus) -> Result<Vec<Application>, RepositoryError> {
        Ok(self.select(|a| a.status == status))
    }

    async fn delete(&self, id: ApplicationId) -> Result<(), RepositoryError> {
        self.applications
            .write()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(format!("application {}", id)))
    }
}

#[derive(Clone, Default)]
pub struct InMemoryMessageRepository {
    feeds: Arc<RwLock<HashMap<ApplicationId, Vec<Message>>>>,
    event_bus: Option<EventBus>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish feed events on `event_bus` after every write
    pub fn with_event_bus(event_bus: EventBus) -> Self {
        Self {
            feeds: Arc::default(),
            event_bus: Some(event_bus),
        }
    }

    fn notify(&self, event: FeedEvent) {
        if let Some(bus) = &self.event_bus {
            bus.publish_feed_event(event);
        }
    }

    fn missing(application_id: ApplicationId, id: MessageId) -> RepositoryError {
        RepositoryError::NotFound(format!("message {} of application {}", id, application_id))
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn append(&self, message: &Message) -> Result<(), RepositoryError> {
        self.feeds
            .write()
            .entry(message.application_id)
            .or_default()
            .push(message.clone());

        self.notify(FeedEvent::MessageAppended {
            application_id: message.application_id,
            message_id: message.id,
            appended_at: Utc::now(),
        });
        Ok(())
    }

    async fn update(&self, message: &Message) -> Result<(), RepositoryError> {
        {
            let mut feeds = self.feeds.write();
            let slot = feeds
                .get_mut(&message.application_id)
                .and_then(|feed| feed.iter_mut().find(|m| m.id == message.id))
                .ok_or_else(|| Self::missing(message.application_id, message.id))?;
            *slot = message.clone();
        }

        self.notify(FeedEvent::MessageUpdated {
            application_id: message.application_id,
            message_id: message.id,
            updated_at: Utc::now(),
        });
        Ok(())
    }

    async fn find_by_id(
        &self,
        application_id: ApplicationId,
        id: MessageId,
    ) -> Result<Option<Message>, RepositoryError> {
        Ok(self
            .feeds
            .read()
            .get(&application_id)
            .and_then(|feed| feed.iter().find(|m| m.id == id).cloned()))
    }

    async fn list_all(&self, application_id: ApplicationId) -> Result<Vec<Message>, RepositoryError> {
        Ok(self.feeds.read().get(&application_id).cloned().unwrap_or_default())
    }

    async fn page(
        &self,
        application_id: ApplicationId,
        before: Option<MessageId>,
        limit: usize,
    ) -> Result<Vec<Message>, RepositoryError> {
        let feeds = self.feeds.read();
        let Some(feed) = feeds.get(&application_id) else {
            return Ok(Vec::new());
        };

        let end = match before {
            None => feed.len(),
            Some(cursor) => match feed.iter().position(|m| m.id == cursor) {
                Some(index) => index,
                None => {
                    debug!(application_id = %application_id, cursor = %cursor, "Page cursor no longer in feed");
                    return Ok(Vec::new());
                }
            },
        };

        Ok(feed[..end].iter().rev().take(limit).cloned().collect())
    }

    async fn delete(&self, application_id: ApplicationId, id: MessageId) -> Result<(), RepositoryError> {
        {
            let mut feeds = self.feeds.write();
            let feed = feeds
                .get_mut(&application_id)
                .ok_or_else(|| Self::missing(application_id, id))?;
            let index = feed
                .iter()
                .position(|m| m.id == id)
                .ok_or_else(|| Self::missing(application_id, id))?;
            feed.remove(index);
        }

        self.notify(FeedEvent::MessageDeleted {
            application_id,
            message_id: id,
            deleted_at: Utc::now(),
        });
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryProfileRepository {
    profiles: Arc<RwLock<HashMap<UserId, UserProfile>>>,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn save(&self, profile: &UserProfile) -> Result<(), RepositoryError> {
        self.profiles.write().insert(profile.uid.clone(), profile.clone());
        Ok(())
    }

    async fn find_by_uid(&self, uid: &UserId) -> Result<Option<UserProfile>, RepositoryError> {
        Ok(self.profiles.read().get(uid).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::identity::CurrentUser;
    use crate::domain::message::MessageKind;

    fn chat(application_id: ApplicationId, text: &str) -> Message {
        let sender = CurrentUser::new("emp-1", Some("Acme"), "hr@acme.test");
        Message::new(application_id, &sender, MessageKind::Chat { text: text.to_string() })
    }

    #[tokio::test]
    async fn test_page_walks_backwards_from_cursor() {
        let repo = InMemoryMessageRepository::new();
        let app = ApplicationId::new();
        let mut ids = Vec::new();
        for i in 0..5 {
            let message = chat(app, &format!("m{}", i));
            ids.push(message.id);
            repo.append(&message).await.unwrap();
        }

        let newest = repo.page(app, None, 2).await.unwrap();
        assert_eq!(newest.iter().map(|m| m.id).collect::<Vec<_>>(), vec![ids[4], ids[3]]);

        let older = repo.page(app, Some(ids[3]), 2).await.unwrap();
        assert_eq!(older.iter().map(|m| m.id).collect::<Vec<_>>(), vec![ids[2], ids[1]]);

        let oldest = repo.page(app, Some(ids[1]), 2).await.unwrap();
        assert_eq!(oldest.len(), 1);
        assert_eq!(oldest[0].id, ids[0]);
    }

    #[tokio::test]
    async fn test_writes_publish_feed_events() {
        let bus = EventBus::new(16);
        let repo = InMemoryMessageRepository::with_event_bus(bus.clone());
        let app = ApplicationId::new();
        let mut receiver = bus.subscribe_feed(app);

        let message = chat(app, "hi");
        repo.append(&message).await.unwrap();
        repo.update(&message).await.unwrap();
        repo.delete(app, message.id).await.unwrap();

        assert!(matches!(receiver.recv().await.unwrap(), FeedEvent::MessageAppended { .. }));
        assert!(matches!(receiver.recv().await.unwrap(), FeedEvent::MessageUpdated { .. }));
        assert!(matches!(receiver.recv().await.unwrap(), FeedEvent::MessageDeleted { .. }));
        assert!(repo.list_all(app).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete_of_missing_message_fail() {
        let repo = InMemoryMessageRepository::new();
        let message = chat(ApplicationId::new(), "ghost");
        assert!(matches!(repo.update(&message).await, Err(RepositoryError::NotFound(_))));
        assert!(matches!(
            repo.delete(message.application_id, message.id).await,
            Err(RepositoryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_application_delete_missing_is_error() {
        let repo = InMemoryApplicationRepository::new();
        assert!(matches!(
            repo.delete(ApplicationId::new()).await,
            Err(RepositoryError::NotFound(_))
        ));
    }
}
