// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::application::{ApplicationId, ApplicationStatus};
use crate::domain::identity::UserId;
use crate::domain::job::{JobId, JobStatus};
use crate::domain::message::MessageId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ApplicationEvent {
    ApplicationSubmitted {
        application_id: ApplicationId,
        job_id: JobId,
        applicant_id: UserId,
        submitted_at: DateTime<Utc>,
    },
    ApplicationDecided {
        application_id: ApplicationId,
        status: ApplicationStatus,
        decided_at: DateTime<Utc>,
    },
    HireConfirmed {
        application_id: ApplicationId,
        job_id: JobId,
        hired_at: DateTime<Utc>,
    },
    SiblingRemoved {
        application_id: ApplicationId,
        job_id: JobId,
        removed_at: DateTime<Utc>,
    },
    ProjectCompleted {
        application_id: ApplicationId,
        job_id: JobId,
        completed_at: DateTime<Utc>,
    },
}

impl ApplicationEvent {
    pub fn application_id(&self) -> ApplicationId {
        match self {
            ApplicationEvent::ApplicationSubmitted { application_id, .. }
            | ApplicationEvent::ApplicationDecided { application_id, .. }
            | ApplicationEvent::HireConfirmed { application_id, .. }
            | ApplicationEvent::SiblingRemoved { application_id, .. }
            | ApplicationEvent::ProjectCompleted { application_id, .. } => *application_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum JobEvent {
    JobPosted {
        job_id: JobId,
        posted_at: DateTime<Utc>,
    },
    JobStatusChanged {
        job_id: JobId,
        status: JobStatus,
        changed_at: DateTime<Utc>,
    },
}

/// Store-level change notifications for a conversation feed. These back the
/// live subscription of [`crate::application::feed::LiveFeed`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FeedEvent {
    MessageAppended {
        application_id: ApplicationId,
        message_id: MessageId,
        appended_at: DateTime<Utc>,
    },
    MessageUpdated {
        application_id: ApplicationId,
        message_id: MessageId,
        updated_at: DateTime<Utc>,
    },
    MessageDeleted {
        application_id: ApplicationId,
        message_id: MessageId,
        deleted_at: DateTime<Utc>,
    },
}

impl FeedEvent {
    pub fn application_id(&self) -> ApplicationId {
        match self {
            FeedEvent::MessageAppended { application_id, .. }
            | FeedEvent::MessageUpdated { application_id, .. }
            | FeedEvent::MessageDeleted { application_id, .. } => *application_id,
        }
    }
}
